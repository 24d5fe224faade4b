use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use tracing::trace;

use crate::utils::element_text;

// ============================================================================
// KNOWN VALUES
// ============================================================================

/// Broadcasters the schedule site is known to list
pub const KNOWN_CHANNELS: &[&str] = &[
    "ESPN", "ESPN 2", "ESPN 3", "ESPN 4", "ESPN+", "ESPN Deportes",
    "TUDN", "TUDN USA",
    "Fox", "Fox Sports", "Fox Sports 1", "Fox Sports 2", "FOX One", "FOX",
    "Sky", "SKY Sports", "Sky Sports", "Sky Sports 1", "Sky Sports 2",
    "Claro", "Claro Sports",
    "Azteca", "Azteca 7", "Azteca 13", "Azteca Deportes",
    "Disney", "Disney+", "Disney+ Premium", "Disney+ Estándar",
    "YouTube", "Youtube",
    "HBO MAX", "HBO Max",
    "TNT", "TNT Sports",
    "Tubi",
    "TV5MONDE",
    "OneFootball", "OneFootball PPV",
    "FIFA+",
    "MLS Season Pass", "MLS Season Pass (Apple TV)",
    "Apple TV",
    "Paramount+",
    "DAZN",
    "FuboTV",
    "Peacock",
    "TyC Sports", "TyC Sports Internacional",
    "RCN", "RCN Nuestra Tele",
    "FUTV",
    "ElCanalDelFutbol.com",
    "Caliente TV",
    "L1 Max", "L1 Max YouTube",
    "FC Barcelona PPV YouTube",
    "A-Leagues YouTube",
    "Arkema Première Ligue YouTube",
    "AYM Sports",
    "Latin American Sports TV",
];

/// Alias substring -> display name. Checked in order, first containment wins.
const CHANNEL_ALIASES: &[(&str, &str)] = &[
    ("Youtube", "YouTube"),
    ("SKY Sports", "SKY Sports"),
    ("Sky Sports", "SKY Sports"),
    ("Disney+", "Disney+"),
    ("Disney Plus", "Disney+"),
    ("HBO MAX", "HBO MAX"),
    ("HBO Max", "HBO MAX"),
    ("TNT Sports", "TNT Sports"),
    ("TNT", "TNT"),
];

/// Case-insensitive channel patterns, most specific first
const CHANNEL_PATTERNS: &[&str] = &[
    r"MLS\s*Season\s*Pass\s*\(Apple\s*TV\)",
    r"MLS\s*Season\s*Pass",
    r"Disney\+\s*Premium",
    r"Disney\+\s*Estándar",
    r"ESPN\s*Deportes",
    r"ESPN\s*[0-9]+",
    r"ESPN\+",
    r"ESPN",
    r"TUDN\s*USA",
    r"TUDN",
    r"Fox\s*Sports\s*[0-9]+",
    r"Fox\s*Sports",
    r"FOX\s*One",
    r"FOX",
    r"SKY\s*Sports",
    r"Disney\+",
    r"Disney",
    r"HBO\s*MAX",
    r"TNT\s*Sports",
    r"TNT",
    r"OneFootball\s*PPV",
    r"OneFootball",
    r"FIFA\+",
    r"Paramount\+",
    r"TyC\s*Sports\s*Internacional",
    r"TyC\s*Sports",
    r"RCN\s*Nuestra\s*Tele",
    r"RCN",
    r"Caliente\s*TV",
    r"Claro\s*Sports",
    r"Azteca\s*[0-9]+",
    r"Azteca",
    r"L1\s*Max\s*YouTube",
    r"L1\s*Max",
    r"FC\s*Barcelona\s*PPV\s*YouTube",
    r"A-Leagues\s*YouTube",
    r"Arkema\s*Première\s*Ligue\s*YouTube",
    r"YouTube",
    r"TV5MONDE",
    r"AYM\s*Sports",
    r"Latin\s*American\s*Sports\s*TV",
    r"ElCanalDelFutbol\.com",
    r"FUTV",
    r"DAZN",
    r"FuboTV",
    r"Peacock",
    r"Apple\s*TV",
    r"Tubi",
];

/// Inline text longer than this is prose, not a channel label
const MAX_INLINE_CHARS: usize = 50;

static COMPILED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CHANNEL_PATTERNS
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("valid channel pattern"))
        .collect()
});

static CHANNEL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/canal/"]"#).expect("valid selector"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("valid selector"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static INLINE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div, p, strong, b").expect("valid selector"));

// ============================================================================
// LEXICON LOOKUPS
// ============================================================================

/// Collapses known aliases to their display name; anything else is just trimmed.
pub fn normalize_channel_name(name: &str) -> String {
    CHANNEL_ALIASES
        .iter()
        .find(|(alias, _)| name.contains(alias))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

/// Longest known channel contained in the text ("ESPN Deportes" beats "ESPN").
/// On equal length the entry listed first wins.
pub fn extract_channel_from_text(text: &str) -> Option<&'static str> {
    let mut longest: Option<&'static str> = None;
    for &channel in KNOWN_CHANNELS {
        let longer = longest.map_or(true, |l| channel.chars().count() > l.chars().count());
        if text.contains(channel) && longer {
            longest = Some(channel);
        }
    }
    longest
}

/// Maps a loose pattern hit back onto the catalog.
/// Exact (case-insensitive) entries first, then containment in either direction.
fn resolve_catalog_name(hit: &str) -> Option<&'static str> {
    let hit = hit.to_lowercase();
    KNOWN_CHANNELS
        .iter()
        .copied()
        .find(|c| c.to_lowercase() == hit)
        .or_else(|| {
            KNOWN_CHANNELS.iter().copied().find(|c| {
                let c = c.to_lowercase();
                hit.contains(&c) || c.contains(&hit)
            })
        })
}

// ============================================================================
// ROW DETECTORS
// ============================================================================

/// A single channel heuristic run against a match row
pub type ChannelDetector = fn(ElementRef) -> Vec<String>;

/// Every detector, in the order their hits are merged
pub const CHANNEL_DETECTORS: &[(&str, ChannelDetector)] = &[
    ("channel links", from_channel_links),
    ("image attributes", from_image_attributes),
    ("cell text", from_cell_text),
    ("row patterns", from_row_patterns),
    ("inline elements", from_inline_elements),
];

/// Text of links pointing at a channel page
pub fn from_channel_links(row: ElementRef) -> Vec<String> {
    row.select(&CHANNEL_LINK)
        .map(|link| element_text(link).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Logos often carry the channel only in alt/title/src
pub fn from_image_attributes(row: ElementRef) -> Vec<String> {
    let mut found = Vec::new();
    for img in row.select(&IMAGE) {
        for attr in ["alt", "title", "src"] {
            let value = img.value().attr(attr).unwrap_or("");
            if value.is_empty() {
                continue;
            }
            if let Some(channel) = extract_channel_from_text(value) {
                found.push(channel.to_string());
            }
        }
    }
    found
}

/// Every catalog entry appearing in a cell's text or markup
pub fn from_cell_text(row: ElementRef) -> Vec<String> {
    let mut found = Vec::new();
    for cell in row.select(&CELL) {
        let text = element_text(cell);
        let markup = cell.inner_html();
        for &channel in KNOWN_CHANNELS {
            if text.contains(channel) || markup.contains(channel) {
                found.push(channel.to_string());
            }
        }
    }
    found
}

/// Regex scan of the whole row, visible text and raw markup alike
pub fn from_row_patterns(row: ElementRef) -> Vec<String> {
    let text = element_text(row);
    let markup = row.inner_html();
    let mut found = Vec::new();

    for pattern in COMPILED_PATTERNS.iter() {
        let hits = pattern
            .find_iter(&text)
            .chain(pattern.find_iter(&markup))
            .map(|m| m.as_str().trim());

        for hit in hits {
            if hit.chars().count() <= 1 {
                continue;
            }
            let channel = resolve_catalog_name(hit).map_or_else(|| hit.to_string(), str::to_string);
            found.push(channel);
        }
    }
    found
}

/// Short inline labels fuzzily matched against the catalog
pub fn from_inline_elements(row: ElementRef) -> Vec<String> {
    let mut found = Vec::new();
    for element in row.select(&INLINE) {
        let text = element_text(element);
        let text = text.trim();
        let len = text.chars().count();
        if len == 0 || len >= MAX_INLINE_CHARS {
            continue;
        }
        for &channel in KNOWN_CHANNELS {
            if text.contains(channel) || channel.contains(text) {
                let label = if len > channel.chars().count() { text } else { channel };
                found.push(label.to_string());
            }
        }
    }
    found
}

/// Runs every detector over the row and returns the normalized channel list.
pub fn detect_channels(row: ElementRef) -> Vec<String> {
    let mut raw = Vec::new();
    for (name, detector) in CHANNEL_DETECTORS {
        let hits = detector(row);
        if !hits.is_empty() {
            trace!(detector = *name, ?hits, "channel detector hits");
        }
        raw.extend(hits);
    }
    finalize_channels(raw)
}

/// Normalizes, drops empties and removes exact duplicates, keeping first-seen order.
pub fn finalize_channels<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut channels: Vec<String> = Vec::new();
    for name in raw {
        let name = normalize_channel_name(&name);
        if !name.is_empty() && !channels.contains(&name) {
            channels.push(name);
        }
    }
    channels
}
