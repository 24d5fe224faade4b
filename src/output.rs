use std::fs;
use std::path::Path;

use crate::classifier::ScanStats;
use crate::error::ScrapeError;
use crate::schedule::Match;

// ============================================================================
// JSON OUTPUT
// ============================================================================

/// Writes the match list as pretty-printed JSON, replacing any previous file.
pub fn write_matches_json(matches: &[Match], path: &Path) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(matches)?;
    fs::write(path, json)?;
    Ok(())
}

// ============================================================================
// OUTPUT FORMATTING
// ============================================================================

/// One summary line: "18:00 - Club A vs Club B (Liga MX)"
pub fn format_match_line(m: &Match) -> String {
    format!(
        "{} - {} vs {} ({})",
        m.time, m.home_team, m.away_team, m.competition
    )
}

/// Prints the numbered match summary followed by the row counters
pub fn print_summary(matches: &[Match], stats: &ScanStats, path: &Path) {
    println!("\nMatches saved to: {}", path.display());
    println!("\nSummary:");
    for (i, m) in matches.iter().enumerate() {
        println!("{}. {}", i + 1, format_match_line(m));
    }

    println!("\nProcessing statistics:");
    println!("  - Rows scanned: {}", stats.rows_scanned);
    println!("  - Rows with a time: {}", stats.rows_with_time);
    println!("  - Rows with teams: {}", stats.rows_with_teams);
    println!("  - Matches found: {}", stats.matches_accepted);
}

/// Prints matches with their channels, for browsing a saved file
pub fn print_match_list(matches: &[Match]) {
    if matches.is_empty() {
        println!("No matches.");
        return;
    }

    println!("{:-<80}", "");
    for m in matches {
        println!("{}", format_match_line(m));
        println!("    Channels: {}", m.channels.join(", "));
    }
    println!("{:-<80}", "");
    println!("{} match(es)", matches.len());
}

/// Prints a sorted name list, one per line
pub fn print_names(title: &str, names: &[String]) {
    println!("{} ({}):", title, names.len());
    for name in names {
        println!("  {}", name);
    }
}
