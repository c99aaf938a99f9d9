//! Search and region predicates.
//!
//! Region names arrive from upstream in a mix of English and Portuguese, with and
//! without diacritics ("América do Sul", "South America", "Brasil"). Every value is
//! folded before comparison: canonical decomposition, combining marks dropped,
//! lower-cased and trimmed.

use std::str::FromStr;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::record::Record;
use crate::domain::NewsrankError;

/// Geographic scope selected in the region picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    All,
    Brasil,
    Internacional,
    AmericaDoSul,
    AmericaDoNorte,
    Africa,
    Europa,
    Asia,
    Oceania,
}

const BRAZIL_NAMES: &[&str] = &["brazil", "brasil"];

impl Region {
    /// Picker slug, e.g. `america-do-sul`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Brasil => "brasil",
            Self::Internacional => "internacional",
            Self::AmericaDoSul => "america-do-sul",
            Self::AmericaDoNorte => "america-do-norte",
            Self::Africa => "africa",
            Self::Europa => "europa",
            Self::Asia => "asia",
            Self::Oceania => "oceania",
        }
    }

    /// Folded continent names accepted for continent regions.
    const fn continent_names(self) -> &'static [&'static str] {
        match self {
            Self::AmericaDoSul => &["south america", "america do sul"],
            Self::AmericaDoNorte => &["north america", "america do norte"],
            Self::Africa => &["africa"],
            Self::Europa => &["europe", "europa"],
            Self::Asia => &["asia"],
            Self::Oceania => &["oceania"],
            Self::All | Self::Brasil | Self::Internacional => &[],
        }
    }

    /// Whether a record located at `country`/`continent` belongs to this region.
    #[must_use]
    pub fn matches(self, country: &str, continent: &str) -> bool {
        match self {
            Self::All => true,
            Self::Brasil => is_brazil(country),
            Self::Internacional => !is_brazil(country),
            continent_region => {
                let folded = fold(continent);
                continent_region.continent_names().contains(&folded.as_str())
            }
        }
    }
}

impl FromStr for Region {
    type Err = NewsrankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let region = match fold(s).as_str() {
            "all" | "" => Self::All,
            "brasil" | "brazil" => Self::Brasil,
            "internacional" | "international" => Self::Internacional,
            "america-do-sul" => Self::AmericaDoSul,
            "america-do-norte" => Self::AmericaDoNorte,
            "africa" => Self::Africa,
            "europa" => Self::Europa,
            "asia" => Self::Asia,
            "oceania" => Self::Oceania,
            other => return Err(NewsrankError::Config(format!("unknown region: {other}"))),
        };
        Ok(region)
    }
}

fn is_brazil(country: &str) -> bool {
    BRAZIL_NAMES.contains(&fold(country).as_str())
}

/// Strips diacritics, lower-cases and trims.
#[must_use]
pub fn fold(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Case-insensitive substring match on the record's primary text or any tag.
///
/// A blank search term matches everything.
pub fn matches_search<T: Record>(record: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record.primary_text().to_lowercase().contains(&needle)
        || record.tags().iter().any(|tag| tag.to_lowercase().contains(&needle))
}

/// Region predicate. Records without a location are never filtered out.
pub fn matches_region<T: Record>(record: &T, region: Region) -> bool {
    record
        .location()
        .map_or(true, |(country, continent)| region.matches(country, continent))
}
