//! Data directory resolution and tilde expansion.
//!
//! The data directory holds the dataset file and, when enabled, the span
//! export file. It is resolved in this order:
//!
//! 1. `NEWSRANK_DATA_DIR`
//! 2. `$XDG_DATA_HOME/newsrank`
//! 3. `$HOME/.local/share/newsrank`
//! 4. `.newsrank` in the working directory

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "newsrank";

/// File name of the dataset inside the data directory.
pub const DATASET_FILE: &str = "dataset.json";

/// File name of the span export inside the data directory.
pub const TRACE_FILE: &str = "newsrank-spans.jsonl";

/// Returns the data directory for the current environment.
///
/// # Examples
///
/// ```no_run
/// use newsrank::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// println!("datasets live in {}", data_dir.display());
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    resolve_data_dir(
        std::env::var_os("NEWSRANK_DATA_DIR"),
        std::env::var_os("XDG_DATA_HOME"),
        std::env::var_os("HOME"),
    )
}

fn resolve_data_dir(explicit: Option<OsString>, xdg: Option<OsString>, home: Option<OsString>) -> PathBuf {
    let non_empty = |v: Option<OsString>| v.filter(|s| !s.is_empty()).map(PathBuf::from);

    if let Some(dir) = non_empty(explicit) {
        return dir;
    }
    if let Some(xdg) = non_empty(xdg) {
        return xdg.join(APP_DIR);
    }
    if let Some(home) = non_empty(home) {
        return home.join(".local").join("share").join(APP_DIR);
    }
    PathBuf::from(".").join(format!(".{APP_DIR}"))
}

/// Default dataset location, `<data dir>/dataset.json`.
#[must_use]
pub fn default_dataset_path() -> PathBuf {
    get_data_dir().join(DATASET_FILE)
}

/// Default span export location, `<data dir>/newsrank-spans.jsonl`.
#[must_use]
pub fn default_trace_path() -> PathBuf {
    get_data_dir().join(TRACE_FILE)
}

/// Expands a leading `~` to `$HOME`. Other paths are returned unchanged.
///
/// # Examples
///
/// ```
/// use newsrank::infrastructure::expand_tilde;
/// use std::path::PathBuf;
///
/// assert_eq!(expand_tilde("/srv/news.json"), PathBuf::from("/srv/news.json"));
/// ```
#[must_use]
pub fn expand_tilde(path: impl AsRef<Path>) -> PathBuf {
    expand_with_home(path.as_ref(), std::env::var_os("HOME"))
}

fn expand_with_home(path: &Path, home: Option<OsString>) -> PathBuf {
    let Some(home) = home.filter(|h| !h.is_empty()).map(PathBuf::from) else {
        return path.to_path_buf();
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
