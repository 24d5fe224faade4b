use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::channels::detect_channels;
use crate::classifier::{
    competition_link, enclosing_table, rows_in_tables, select_tables, DateMode, RowKind,
    RowScanner, ScanStats, TEAM_ABBREVIATIONS, TEAM_LINK, TEAM_NAMES,
};
use crate::schedule::Match;
use crate::utils::{element_text, find_clock_time};

static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static LOOSE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th, div, span").expect("valid selector"));

/// Preceding rows checked for a competition link when nothing is carried
const COMPETITION_LOOKBACK: usize = 3;

/// Everything one pass over a page produced
#[derive(Debug)]
pub struct Extraction {
    pub matches: Vec<Match>,
    pub stats: ScanStats,
    pub mode: DateMode,
}

// ============================================================================
// PAGE EXTRACTION
// ============================================================================

/// Extracts today's matches from a schedule page. `today` is DD/MM/YYYY.
pub fn extract_matches(html: &str, today: &str) -> Extraction {
    let document = Html::parse_document(html);
    info!("Looking for matches dated {}", today);

    let selection = select_tables(&document, today);
    let mut scanner = RowScanner::new(today, selection.mode);
    let mut matches = Vec::new();

    let mut current_table = None;
    for row in rows_in_tables(&document, &selection.tables) {
        let table = enclosing_table(row);
        let table_id = table.map(|t| t.id());
        if table_id != current_table {
            current_table = table_id;
            if table.is_some_and(|t| selection.opens_today(t)) {
                debug!("Entering a table headed with today's date");
                scanner.enter_today_section();
            }
        }

        if scanner.classify(row) != RowKind::Candidate {
            continue;
        }

        let Some(found) = extract_match(row, scanner.competition_mut()) else {
            continue;
        };

        if !scanner.accepts(row) {
            debug!(
                "Skipping {} vs {}: not dated today",
                found.home_team, found.away_team
            );
            continue;
        }

        scanner.record_accepted();
        matches.push(found);
    }

    let stats = scanner.stats();
    info!(
        rows_scanned = stats.rows_scanned,
        rows_with_time = stats.rows_with_time,
        rows_with_teams = stats.rows_with_teams,
        matches = stats.matches_accepted,
        "Extraction finished"
    );

    Extraction {
        matches,
        stats,
        mode: scanner.mode(),
    }
}

// ============================================================================
// ROW EXTRACTION
// ============================================================================

/// Builds a match from a candidate row.
/// `competition` is the value carried from earlier rows; it is updated when
/// this row (or one just above it) names a competition.
pub fn extract_match(row: ElementRef, competition: &mut Option<String>) -> Option<Match> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.is_empty() && row.select(&LOOSE_CELL).next().is_none() {
        return None;
    }

    let row_text = element_text(row);
    let row_text = row_text.trim();

    let time = extract_time(&cells, row_text)?;
    let competition = resolve_competition(row, competition);
    let (home_team, away_team) = extract_teams(row, &cells, row_text)?;
    let channels = detect_channels(row);

    Match::new(time, competition, home_team, away_team, channels)
}

/// First H:MM in the first cell, else anywhere in the row
fn extract_time(cells: &[ElementRef], row_text: &str) -> Option<String> {
    let first_cell = cells.first().map(|c| element_text(*c)).unwrap_or_default();
    find_clock_time(first_cell.trim())
        .or_else(|| find_clock_time(row_text))
        .map(str::to_string)
}

/// Own competition link, then the carried value, then a few rows back
fn resolve_competition(row: ElementRef, carried: &mut Option<String>) -> Option<String> {
    if let Some(own) = competition_link(row) {
        *carried = own.clone();
        return own;
    }

    if carried.is_some() {
        return carried.clone();
    }

    let previous = row
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .take(COMPETITION_LOOKBACK)
        .find_map(|prev| competition_link(prev).flatten());

    if previous.is_some() {
        *carried = previous.clone();
    }
    previous
}

/// Team links, then "Name vs Name" text, then the second and third cells
fn extract_teams(row: ElementRef, cells: &[ElementRef], row_text: &str) -> Option<(String, String)> {
    let links: Vec<String> = row
        .select(&TEAM_LINK)
        .map(|link| element_text(link).trim().to_string())
        .collect();

    let (home, away) = if links.len() >= 2 {
        (links[0].clone(), links[1].clone())
    } else if let Some(caps) = TEAM_NAMES
        .captures(row_text)
        .or_else(|| TEAM_ABBREVIATIONS.captures(row_text))
    {
        (caps[1].trim().to_string(), caps[2].trim().to_string())
    } else if cells.len() >= 3 {
        (
            element_text(cells[1]).trim().to_string(),
            element_text(cells[2]).trim().to_string(),
        )
    } else {
        return None;
    };

    if home.is_empty() || away.is_empty() {
        return None;
    }
    Some((home, away))
}
