pub mod channels;
pub mod classifier;
pub mod error;
pub mod extractor;
pub mod output;
pub mod schedule;
pub mod utils;

use std::path::PathBuf;
use tracing::{info, warn};

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================
pub use channels::{detect_channels, extract_channel_from_text, normalize_channel_name, KNOWN_CHANNELS};
pub use classifier::{DateMode, RowKind, RowScanner, ScanStats};
pub use error::ScrapeError;
pub use extractor::{extract_match, extract_matches, Extraction};
pub use output::{print_match_list, print_summary, write_matches_json};
pub use schedule::{filter_matches, load_matches, unique_competitions, unique_teams, Match, MatchFilter, UNSPECIFIED};
pub use utils::{fetch_html, today_date};

/// Schedule page listing today's televised matches
pub const DEFAULT_URL: &str = "https://www.futbolenvivomexico.com/";

/// Where the match list is written, relative to the working directory
pub const DEFAULT_OUTPUT_FILE: &str = "matches-today.json";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Settings for one scrape run
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub url: String,
    pub output: PathBuf,
    /// Target date as DD/MM/YYYY
    pub today: String,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            url: DEFAULT_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            today: today_date(),
            user_agent: utils::USER_AGENT.to_string(),
        }
    }
}

/// What a finished run produced
#[derive(Debug)]
pub struct ScrapeReport {
    pub matches: Vec<Match>,
    pub stats: ScanStats,
    pub mode: DateMode,
    pub output: PathBuf,
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// Fetches the schedule page, extracts today's matches and writes them out.
/// An empty result is written too; only fetch and write failures are errors.
pub async fn scrape(config: &ScrapeConfig) -> Result<ScrapeReport, ScrapeError> {
    info!("Starting extraction of today's matches ({})", config.today);

    let html = fetch_html(&config.url, &config.user_agent).await?;
    info!("Page downloaded from {} ({} bytes)", config.url, html.len());

    process_html(&html, config)
}

/// The offline half of `scrape`: extraction plus persistence.
pub fn process_html(html: &str, config: &ScrapeConfig) -> Result<ScrapeReport, ScrapeError> {
    let Extraction {
        matches,
        stats,
        mode,
    } = extract_matches(html, &config.today);

    if matches.is_empty() {
        warn!("No matches found for today. The site may load its schedule dynamically; a headless browser would be needed then.");
    } else {
        info!("Found {} match(es)", matches.len());
    }

    write_matches_json(&matches, &config.output)?;
    info!("Matches written to {}", config.output.display());

    Ok(ScrapeReport {
        matches,
        stats,
        mode,
        output: config.output.clone(),
    })
}
