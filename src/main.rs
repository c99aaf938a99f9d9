//! Command-line front-end for the newsrank dashboard.
//!
//! Reads a JSON dataset, applies a date range and the requested filters, and
//! prints one page of a collection. `rate` persists a rating and prints the
//! rescored articles.
//!
//! # Examples
//!
//! ```text
//! newsrank --preset last7 articles --search eleição --region brasil --page 2
//! newsrank --from 2024-03-01 --to 2024-03-31 keywords --sort trendScore
//! newsrank keywords --articles-for inflação
//! newsrank competitors --competitor c1
//! newsrank --set items_per_page=25 rate a42 5
//! ```

#![allow(clippy::multiple_crate_versions)]

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

use newsrank::app::{Collection, Event, Notice, PageView};
use newsrank::pipeline::{Record, SortField};
use newsrank::{
    initialize, ArticleField, Config, Dashboard, DateRange, KeywordField, Preset, Region, SortDirection,
};

#[derive(Debug, Parser)]
#[command(name = "newsrank", version, about = "News keyword relevance rankings")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset file, overriding the configured one.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Configuration override, `key=value`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    /// First day of the range (YYYY-MM-DD).
    #[arg(long, global = true, conflicts_with = "preset")]
    from: Option<NaiveDate>,

    /// Last day of the range. Defaults to `--from`.
    #[arg(long, global = true, requires = "from")]
    to: Option<NaiveDate>,

    /// today, last7, last30, thisMonth or lastMonth.
    #[arg(long, global = true)]
    preset: Option<Preset>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ranked articles.
    Articles {
        #[command(flatten)]
        view: ViewArgs,

        /// Region filter, e.g. brasil, europa, international.
        #[arg(long, default_value = "all")]
        region: Region,

        /// Sort column, e.g. averageScore, totalScore, title, publishedAt.
        #[arg(long)]
        sort: Option<ArticleField>,
    },
    /// Ranked keywords.
    Keywords {
        #[command(flatten)]
        view: ViewArgs,

        /// Sort column, e.g. overallScore, trendScore, name.
        #[arg(long)]
        sort: Option<KeywordField>,

        /// List the articles tagged with this keyword instead, from any date.
        #[arg(long, value_name = "KEYWORD", conflicts_with_all = ["sort", "search", "ascending"])]
        articles_for: Option<String>,
    },
    /// Competitor SEO articles, ranking and keyword comparison.
    Competitors {
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Also compare keywords against this competitor.
        #[arg(long)]
        competitor: Option<String>,
    },
    /// Rate an article from 1 to 5.
    Rate { article_id: String, rating: i64 },
}

#[derive(Debug, Args)]
struct ViewArgs {
    #[arg(long)]
    search: Option<String>,

    /// Sort ascending instead of descending.
    #[arg(long)]
    ascending: bool,

    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let dashboard = initialize(&config).context("failed to open dataset")?;
    let range = date_range(&cli);

    match cli.command {
        Command::Articles { view, region, sort } => {
            report(dashboard.handle_event(Event::SetDateRange(range)).await?);
            if region != Region::All {
                report(
                    dashboard
                        .handle_event(Event::SetRegion {
                            collection: Collection::Articles,
                            region,
                        })
                        .await?,
                );
            }
            apply_view(&dashboard, Collection::Articles, &view).await?;
            if let Some(field) = sort {
                sort_until(&dashboard, Event::SortArticles(field), view.ascending).await?;
            }
            go_to_page(&dashboard, Collection::Articles, view.page).await?;
            print_view(&dashboard.articles().view().await, |a| {
                format!(
                    "{:<60} total={:>8.2} avg={:>7.2} {:<12} {}",
                    truncate(&a.title, 60),
                    a.total_score,
                    a.average_score,
                    a.source,
                    a.published_at.format("%Y-%m-%d")
                )
            });
        }
        Command::Keywords {
            view,
            articles_for: Some(keyword),
            ..
        } => {
            let page = dashboard.keyword_articles(&keyword, view.page).await?;
            println!(
                "Articles for \"{keyword}\" (page {}/{}, {} total)",
                page.page,
                page.total_pages.max(1),
                page.total_count
            );
            for article in &page.records {
                println!(
                    "  {:<60} avg={:>7.2} {:<12} {}",
                    truncate(&article.title, 60),
                    article.average_score,
                    article.source,
                    article.published_at.format("%Y-%m-%d")
                );
            }
        }
        Command::Keywords { view, sort, .. } => {
            report(dashboard.handle_event(Event::SetDateRange(range)).await?);
            apply_view(&dashboard, Collection::Keywords, &view).await?;
            if let Some(field) = sort {
                sort_until(&dashboard, Event::SortKeywords(field), view.ascending).await?;
            }
            go_to_page(&dashboard, Collection::Keywords, view.page).await?;
            print_view(&dashboard.keywords().view().await, |k| {
                format!(
                    "{:<40} overall={:>6.2} q={:>6.2} rec={:>6.2} rel={:>6.2} trend={:>6.2} rating={:.1}",
                    truncate(&k.name, 40),
                    k.overall_score,
                    k.quantity_score,
                    k.recency_score,
                    k.relevance_score,
                    k.trend_score,
                    k.average_article_rating
                )
            });
        }
        Command::Competitors { page, competitor } => {
            let top = dashboard.top_competitor_articles(&range, page).await?;
            println!("Top competitor articles (page {}/{}, {} total)", top.page, top.total_pages.max(1), top.total_count);
            for article in &top.records {
                println!(
                    "  seo={:>3} {:<20} {}",
                    article.seo_score,
                    truncate(&article.competitor_name, 20),
                    article.title
                );
            }

            println!("Competitors by average keyword position");
            for (rank, c) in dashboard.competitor_ranking().await.iter().enumerate() {
                println!(
                    "  {:>2}. {:<24} avg position {:>5.1}, {} ranked keywords",
                    rank + 1,
                    c.name,
                    c.avg_keyword_position,
                    c.ranked_keywords_count
                );
            }

            if let Some(id) = competitor {
                let (leading, trailing) = dashboard.keyword_comparison(&id).await;
                println!("We lead on {} keyword(s)", leading.len());
                for c in &leading {
                    println!("  {:<30} {:>6.1} vs {:>6.1}", c.keyword, c.own_score, c.competitor_score);
                }
                println!("{id} leads on {} keyword(s)", trailing.len());
                for c in &trailing {
                    println!("  {:<30} {:>6.1} vs {:>6.1}", c.keyword, c.own_score, c.competitor_score);
                }
            }
        }
        Command::Rate { article_id, rating } => {
            report(dashboard.handle_event(Event::SetDateRange(range)).await?);
            let notices = dashboard
                .handle_event(Event::RateArticle { article_id, rating })
                .await
                .context("rating was not saved")?;
            for notice in notices {
                if let Notice::RatingSaved(outcome) = notice {
                    println!("Saved rating {} ({} stars)", outcome.rating.id, outcome.rating.rating);
                    if let Some(error) = &outcome.recalculation_error {
                        eprintln!("warning: scores may be stale: {error}");
                    }
                    for article in &outcome.updated {
                        println!(
                            "  {:<60} total={:>8.2} avg={:>7.2}",
                            truncate(&article.title, 60),
                            article.total_score,
                            article.average_score
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let base = match &cli.config {
        Some(path) => Config::from_file(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::default(),
    };

    let mut overrides = BTreeMap::new();
    for pair in &cli.overrides {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("--set expects key=value, got `{pair}`");
        };
        overrides.insert(key.trim().to_string(), value.to_string());
    }
    if let Some(data) = &cli.data {
        overrides.insert("data_file".to_string(), data.display().to_string());
    }
    Ok(base.merge_map(&overrides))
}

fn date_range(cli: &Cli) -> DateRange {
    match (cli.from, cli.preset) {
        (Some(from), _) => DateRange::days(from, cli.to.unwrap_or(from)),
        (None, Some(preset)) => DateRange::preset(preset, Utc::now()),
        (None, None) => DateRange::today(),
    }
}

async fn apply_view(dashboard: &Dashboard, collection: Collection, view: &ViewArgs) -> anyhow::Result<()> {
    if let Some(term) = &view.search {
        report(
            dashboard
                .handle_event(Event::Search {
                    collection,
                    term: term.clone(),
                })
                .await?,
        );
    }
    Ok(())
}

/// Clicks the column header until the sort direction matches.
async fn sort_until(dashboard: &Dashboard, click: Event, ascending: bool) -> anyhow::Result<()> {
    let wanted = if ascending { SortDirection::Asc } else { SortDirection::Desc };
    for _ in 0..2 {
        report(dashboard.handle_event(click.clone()).await?);
        let direction = match click.collection() {
            Some(Collection::Keywords) => dashboard.keywords().view().await.sort.direction,
            _ => dashboard.articles().view().await.sort.direction,
        };
        if direction == wanted {
            break;
        }
    }
    Ok(())
}

async fn go_to_page(dashboard: &Dashboard, collection: Collection, page: usize) -> anyhow::Result<()> {
    if page != 1 {
        report(dashboard.handle_event(Event::GoToPage { collection, page }).await?);
    }
    Ok(())
}

fn report(notices: Vec<Notice>) {
    for notice in notices {
        if let Notice::FetchFailed { collection, message } = notice {
            eprintln!("warning: could not load {}: {message}", collection.as_str());
        }
    }
}

fn print_view<T: Record>(view: &PageView<T>, line: impl Fn(&T) -> String) {
    println!(
        "Page {}/{} ({} of {} buffered{}) sorted by {} {}",
        view.current_page,
        view.total_pages.max(1),
        view.total_count,
        view.buffered_count,
        if view.has_more { ", more available" } else { "" },
        view.sort.field.name(),
        view.sort.direction.as_str()
    );
    for record in &view.records {
        println!("  {}", line(record));
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
