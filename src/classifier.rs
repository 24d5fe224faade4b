use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::utils::{date_tokens, element_text, has_time_token, preview};

static DATE_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, caption, h2, h3, div").expect("valid selector"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static ANY_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").expect("valid selector"));

pub(crate) static COMPETITION_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/competicion/"]"#).expect("valid selector"));
pub(crate) static TEAM_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/equipo/"]"#).expect("valid selector"));

/// "Club América vs Cruz Azul": capitalised word runs around a separator
pub(crate) static TEAM_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)*)\s+(?:vs|v|VS|V|-|–|—)\s+(\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)*)")
        .expect("valid team regex")
});
/// "PSG - OM": abbreviations of at least two capitals
pub(crate) static TEAM_ABBREVIATIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\p{Lu}{2,})\s+(?:vs|v|VS|V|-|–|—)\s+(\p{Lu}{2,})").expect("valid team regex")
});

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// How strictly rows are tied to today's date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMode {
    /// The page has header elements carrying today's date
    Strict,
    /// No date headers anywhere; rows without a date are assumed to be today's
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Scanning,
    InsideToday,
}

/// What a single row turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Competition header; its link text is now the carried competition
    Header(Option<String>),
    /// Dated for another day
    OtherDay,
    /// Missing a time token or team evidence
    NotAMatch,
    /// Has both a time and two teams; worth extracting
    Candidate,
}

/// Row counters reported at the end of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub rows_scanned: usize,
    pub rows_with_time: usize,
    pub rows_with_teams: usize,
    pub matches_accepted: usize,
}

/// Tables picked for scanning, plus the date mode the page implies
#[derive(Debug)]
pub struct PageSelection<'a> {
    pub mode: DateMode,
    pub tables: Vec<ElementRef<'a>>,
    /// Tables whose today-dated header sits outside their rows (caption,
    /// preceding heading). Scanning one of them starts inside today's section.
    pub dated: Vec<ElementRef<'a>>,
}

impl<'a> PageSelection<'a> {
    pub fn opens_today(&self, table: ElementRef<'a>) -> bool {
        self.dated.iter().any(|t| t.id() == table.id())
    }
}

// ============================================================================
// TABLE SELECTION
// ============================================================================

/// Header-like elements whose text contains today's date
pub fn find_date_headers<'a>(document: &'a Html, today: &str) -> Vec<ElementRef<'a>> {
    document
        .select(&DATE_HEADER)
        .filter(|header| element_text(*header).contains(today))
        .collect()
}

/// Nearest table the element sits in
pub fn enclosing_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn inside_row(element: ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().name() == "tr")
}

/// Enclosing table, or failing that the next table among the following siblings
fn table_for_header(header: ElementRef<'_>) -> Option<ElementRef<'_>> {
    enclosing_table(header).or_else(|| {
        header
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "table")
    })
}

/// Picks the tables that hold today's matches.
/// Preference: tables tied to date headers, then tables mentioning today, then every table.
pub fn select_tables<'a>(document: &'a Html, today: &str) -> PageSelection<'a> {
    let headers = find_date_headers(document, today);
    debug!("Date headers found: {}", headers.len());

    let mode = if headers.is_empty() {
        DateMode::Permissive
    } else {
        DateMode::Strict
    };

    // Headers inside a row are picked up by the row scan itself
    let dated: Vec<ElementRef<'a>> = headers
        .iter()
        .filter(|header| !inside_row(**header))
        .filter_map(|header| table_for_header(*header))
        .collect();

    let mut seen = HashSet::new();
    let mut tables: Vec<ElementRef<'a>> = headers
        .into_iter()
        .filter_map(table_for_header)
        .filter(|table| seen.insert(table.id()))
        .collect();

    if tables.is_empty() {
        debug!("No header-linked tables, looking for tables containing {}", today);
        tables = document
            .select(&TABLE)
            .filter(|table| element_text(*table).contains(today))
            .collect();
    }

    if tables.is_empty() {
        tables = document.select(&TABLE).collect();
        debug!("No section found for today, processing all {} tables", tables.len());
    } else {
        debug!("Tables to process: {}", tables.len());
    }

    PageSelection { mode, tables, dated }
}

/// Rows inside any of the tables, in document order and without repeats
pub fn rows_in_tables<'a>(document: &'a Html, tables: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    let table_ids: HashSet<_> = tables.iter().map(|t| t.id()).collect();
    document
        .select(&ROW)
        .filter(|row| row.ancestors().any(|node| table_ids.contains(&node.id())))
        .collect()
}

// ============================================================================
// ROW PREDICATES
// ============================================================================

/// Trimmed text of the first competition link in the element, if it has one.
/// The outer option is the link, the inner one its (possibly empty) text.
pub fn competition_link(element: ElementRef) -> Option<Option<String>> {
    let link = element.select(&COMPETITION_LINK).next()?;
    let text = element_text(link).trim().to_string();
    Some((!text.is_empty()).then_some(text))
}

/// Two team links, or text shaped like "Name vs Name"
pub fn has_team_evidence(row: ElementRef, row_text: &str) -> bool {
    row.select(&TEAM_LINK).count() >= 2
        || TEAM_NAMES.is_match(row_text)
        || TEAM_ABBREVIATIONS.is_match(row_text)
}

// ============================================================================
// ROW SCANNER
// ============================================================================

/// Walks the selected rows in order, carrying the current competition and
/// whether the scan is inside today's section. One scanner per page.
#[derive(Debug)]
pub struct RowScanner<'t> {
    today: &'t str,
    mode: DateMode,
    state: SectionState,
    competition: Option<String>,
    stats: ScanStats,
}

impl<'t> RowScanner<'t> {
    pub fn new(today: &'t str, mode: DateMode) -> Self {
        let state = match mode {
            DateMode::Strict => SectionState::Scanning,
            DateMode::Permissive => SectionState::InsideToday,
        };
        RowScanner {
            today,
            mode,
            state,
            competition: None,
            stats: ScanStats::default(),
        }
    }

    pub fn mode(&self) -> DateMode {
        self.mode
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn current_competition(&self) -> Option<&str> {
        self.competition.as_deref()
    }

    /// Carried competition, for the extractor to read and update
    pub fn competition_mut(&mut self) -> &mut Option<String> {
        &mut self.competition
    }

    /// A today-dated header outside the rows opens the section (strict mode only)
    pub fn enter_today_section(&mut self) {
        if self.mode == DateMode::Strict {
            self.state = SectionState::InsideToday;
        }
    }

    pub fn record_accepted(&mut self) {
        self.stats.matches_accepted += 1;
    }

    /// Classifies the next row and advances the scan state.
    pub fn classify(&mut self, row: ElementRef) -> RowKind {
        let row_text = element_text(row);
        let row_text = row_text.trim();
        self.stats.rows_scanned += 1;
        let row_number = self.stats.rows_scanned;

        if row_number <= 3 {
            log_row_preview(row, row_text, row_number);
        }

        if let Some(name) = competition_link(row) {
            debug!("Competition header: {:?}", name);
            self.competition = name.clone();
            return RowKind::Header(name);
        }

        if !self.update_section(row_text) {
            return RowKind::OtherDay;
        }

        let has_time = has_time_token(row_text);
        let has_teams = has_team_evidence(row, row_text);

        if has_time {
            self.stats.rows_with_time += 1;
        }
        if has_teams {
            self.stats.rows_with_teams += 1;
        }

        if row_number <= 5 && has_time != has_teams {
            let missing = if has_time { "teams" } else { "a time" };
            debug!(
                "Row {} has no {} detected: {}",
                row_number,
                missing,
                preview(row_text, 150)
            );
        }

        if has_time && has_teams {
            RowKind::Candidate
        } else {
            RowKind::NotAMatch
        }
    }

    /// Applies the row's date tokens to the section state.
    /// Returns false when the row belongs to another day.
    fn update_section(&mut self, row_text: &str) -> bool {
        let dates = date_tokens(row_text);
        let has_today = dates.iter().any(|d| *d == self.today);
        let has_other = dates.iter().any(|d| *d != self.today);

        match self.mode {
            DateMode::Strict => {
                if has_today {
                    self.state = SectionState::InsideToday;
                } else if has_other {
                    self.state = SectionState::Scanning;
                    return false;
                }
                true
            }
            DateMode::Permissive => {
                if has_other && !has_today {
                    return false;
                }
                self.state = SectionState::InsideToday;
                true
            }
        }
    }

    /// Final gate before a match is kept. In strict mode the scan has to be
    /// inside today's section and today's date has to appear in the row itself
    /// or in its enclosing table. Permissive mode keeps everything.
    pub fn accepts(&self, row: ElementRef) -> bool {
        match self.mode {
            DateMode::Permissive => true,
            DateMode::Strict => {
                if self.state != SectionState::InsideToday {
                    return false;
                }
                element_text(row).contains(self.today)
                    || enclosing_table(row).is_some_and(|table| element_text(table).contains(self.today))
            }
        }
    }
}

fn log_row_preview(row: ElementRef, row_text: &str, row_number: usize) {
    let cells: Vec<ElementRef> = row.select(&ANY_CELL).collect();
    debug!(
        "Row {}: text={:?} cells={}",
        row_number,
        preview(row_text, 100),
        cells.len()
    );
    for (i, cell) in cells.iter().take(5).enumerate() {
        debug!("  cell {}: {}", i, preview(element_text(*cell).trim(), 50));
    }
}
