//! ebay-stats: marketplace price statistics from the command line.
//!
//! Usage:
//!   ebay-stats search <term...> [--token <token>] [--no-save]
//!   ebay-stats analyze <response.json> [--term <term>] [--save]
//!   ebay-stats history [--limit <n>] [--prices]
//!   ebay-stats token set <token> | clear | status

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use listing_core::{Config, EmptyResult, Error, StatsSummary};
use listing_fetch::{BrowseClient, TokenCache};
use listing_ingestion::{decode_search_str, SearchPage};
use listing_stats::{ListingAggregator, Report};
use listing_storage::SearchStore;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "ebay_stats=info,listing_fetch=info,listing_storage=info,listing_stats=warn";

#[derive(Parser)]
#[command(name = "ebay-stats")]
#[command(about = "Price statistics for marketplace listings")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the marketplace and summarize prices
    Search {
        /// Search term, e.g. "ThinkPad T14s i7 16GB"
        #[arg(required = true)]
        query: Vec<String>,
        /// OAuth token (cached for later runs)
        #[arg(long, env = "EBAY_OAUTH_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Do not store the summary
        #[arg(long)]
        no_save: bool,
    },
    /// Summarize a saved search response
    Analyze {
        /// File holding an item summary search response
        file: PathBuf,
        /// Search term shown in the report and stored with the summary
        #[arg(long)]
        term: Option<String>,
        /// Store the summary
        #[arg(long)]
        save: bool,
    },
    /// List stored searches
    History {
        /// Number of searches to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Also show the stored prices of each search
        #[arg(long)]
        prices: bool,
    },
    /// Manage the cached OAuth token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Store a token
    Set {
        /// OAuth token value
        token: String,
    },
    /// Remove the cached token
    Clear,
    /// Report whether a valid token is cached
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.db)?;

    match cli.command {
        Commands::Search {
            query,
            token,
            no_save,
        } => run_search(&config, &query.join(" "), token, !no_save),
        Commands::Analyze { file, term, save } => run_analyze(&config, &file, term, save),
        Commands::History { limit, prices } => run_history(&config, limit, prices),
        Commands::Token { action } => run_token(&config, action),
    }
}

fn load_config(path: Option<&Path>, db: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(db) = db {
        config.storage.database_path = db;
    }
    Ok(config)
}

/// Obtain a token from the command line, the cache, or an interactive prompt.
fn resolve_token(cache: &TokenCache, explicit: Option<String>, expiry_hours: u32) -> Result<String> {
    if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
        let token = token.trim().to_string();
        store_token(cache, &token);
        return Ok(token);
    }
    if let Some(token) = cache.load() {
        return Ok(token);
    }

    eprint!("Enter OAuth token (valid {} hours): ", expiry_hours);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let token = line.trim();
    if token.is_empty() {
        bail!("a token is required to use the marketplace API");
    }
    store_token(cache, token);
    Ok(token.to_string())
}

/// Cache a token; a failed write is logged and the token stays usable.
fn store_token(cache: &TokenCache, token: &str) {
    if let Err(e) = cache.save(token) {
        warn!(path = %cache.path().display(), error = %e, "could not cache token");
    }
}

fn run_search(config: &Config, query: &str, token: Option<String>, save: bool) -> Result<()> {
    let cache = TokenCache::from_config(&config.token);
    let token = resolve_token(&cache, token, config.token.expiry_hours)?;
    let client = BrowseClient::new(config.marketplace.clone())?;

    println!("Searching... Please wait...");
    let page = match client.search(query, &token) {
        Ok(page) => page,
        Err(Error::NoResults) => {
            println!("No listings found for this search term");
            return Ok(());
        }
        Err(e @ Error::Token(_)) => {
            if cache.clear()? {
                warn!("removed rejected token from cache");
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    present(config, query.trim(), &page, save)
}

fn run_analyze(config: &Config, file: &Path, term: Option<String>, save: bool) -> Result<()> {
    let page = load_page(file)?;
    let term = term.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    present(config, &term, &page, save)
}

fn load_page(file: &Path) -> Result<SearchPage> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(decode_search_str(&text)?)
}

/// Summarize a page and render its report.
fn analyze_page(
    config: &Config,
    term: &str,
    page: &SearchPage,
    now: DateTime<Utc>,
) -> std::result::Result<(StatsSummary, String), EmptyResult> {
    let aggregator = ListingAggregator::from_config(&config.aggregation);
    let summary = aggregator.summarize(&page.listings, page.total)?;
    let report = Report::new(term, &summary, now)
        .with_config(&config.report)
        .to_string();
    Ok((summary, report))
}

fn present(config: &Config, term: &str, page: &SearchPage, save: bool) -> Result<()> {
    let now = Utc::now();
    let (summary, report) = match analyze_page(config, term, page, now) {
        Ok(result) => result,
        Err(empty) => {
            println!("No Valid Prices: {}", empty);
            return Ok(());
        }
    };

    print!("{}", report);
    if save {
        let mut store = SearchStore::open(&config.storage.database_path)?;
        let id = store.save_summary(term, now, &summary)?;
        info!(search_id = id, "summary saved");
    }
    println!();
    println!("Search complete. Found {} listings.", summary.total_listings);
    Ok(())
}

fn run_history(config: &Config, limit: usize, show_prices: bool) -> Result<()> {
    let store = SearchStore::open(&config.storage.database_path)?;
    let searches = store.recent_searches(limit)?;
    if searches.is_empty() {
        println!("No stored searches");
        return Ok(());
    }

    for search in searches {
        let r = &search.record;
        println!(
            "#{:<5} {}  {:<30} total {:>7}  avg ${:.2}  min ${:.2}  max ${:.2}",
            search.id,
            r.timestamp.format("%Y-%m-%d %H:%M"),
            r.search_term,
            r.total_listings,
            r.avg_price,
            r.min_price,
            r.max_price
        );
        if show_prices {
            for price in store.prices_for(search.id)? {
                let kind = if price.is_auction { "auction" } else { "buy it now" };
                println!("         ${:.2} ({})", price.price, kind);
            }
        }
    }
    Ok(())
}

fn run_token(config: &Config, action: TokenAction) -> Result<()> {
    let cache = TokenCache::from_config(&config.token);
    match action {
        TokenAction::Set { token } => {
            let expiry = cache.save(&token)?;
            println!("Token stored in {} until {}", cache.path().display(), expiry);
        }
        TokenAction::Clear => {
            if cache.clear()? {
                println!("Token removed");
            } else {
                println!("No cached token");
            }
        }
        TokenAction::Status => match cache.load() {
            Some(_) => println!("A valid token is cached in {}", cache.path().display()),
            None => println!("No valid token cached"),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    const RESPONSE: &str = r#"{
        "total": 340,
        "itemSummaries": [
            {"price": {"value": "20.00"}, "buyingOptions": ["FIXED_PRICE"]},
            {"price": {"value": "N/A"}, "buyingOptions": ["FIXED_PRICE"]},
            {"price": {"value": "10.00"}, "buyingOptions": ["FIXED_PRICE", "BEST_OFFER"]},
            {"price": {"value": "55.00"}, "buyingOptions": ["AUCTION"], "itemEndDate": "2025-05-10T15:00:00.000Z"},
            {"price": {"value": "75.00"}, "buyingOptions": ["AUCTION"], "itemEndDate": "bad-date"}
        ]
    }"#;

    fn make_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_joins_terms() {
        let cli = Cli::try_parse_from(["ebay-stats", "search", "thinkpad", "t14s", "--no-save"]).unwrap();
        match cli.command {
            Commands::Search { query, no_save, .. } => {
                assert_eq!(query.join(" "), "thinkpad t14s");
                assert!(no_save);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_db_override() {
        let config = load_config(None, Some(PathBuf::from("other.db"))).unwrap();
        assert_eq!(config.storage.database_path, PathBuf::from("other.db"));
    }

    #[test]
    fn test_analyze_saved_response() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("thinkpad.json");
        fs::write(&file, RESPONSE).unwrap();

        let page = load_page(&file).unwrap();
        let (summary, report) = analyze_page(&Config::default(), "thinkpad", &page, make_now()).unwrap();

        assert_eq!(summary.total_listings, 340);
        assert_eq!(summary.all_prices, vec![20.0, 10.0, 55.0]);
        assert_eq!(summary.top_fixed_price, vec![10.0, 20.0]);
        assert_eq!(summary.top_auction, vec![55.0]);
        assert!(report.contains("Total Listings: 340"));
        assert!(report.contains("$55.00 (Ends in 3h 0m)"));
    }

    #[test]
    fn test_analyze_without_usable_prices() {
        let page = decode_search_str(
            r#"{"itemSummaries": [{"price": {"value": "x"}, "buyingOptions": ["FIXED_PRICE"]}]}"#,
        )
        .unwrap();
        assert!(analyze_page(&Config::default(), "x", &page, make_now()).is_err());
    }

    #[test]
    fn test_explicit_token_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("token.json"), 2);

        let token = resolve_token(&cache, Some(" abc ".to_string()), 2).unwrap();
        assert_eq!(token, "abc");
        assert_eq!(cache.load().as_deref(), Some("abc"));

        // A cached token is used without prompting.
        assert_eq!(resolve_token(&cache, None, 2).unwrap(), "abc");
    }

    #[test]
    fn test_token_used_when_cache_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let cache = TokenCache::new(blocker.join("token.json"), 2);

        let token = resolve_token(&cache, Some("abc".to_string()), 2).unwrap();
        assert_eq!(token, "abc");
        assert!(cache.load().is_none());
    }
}
