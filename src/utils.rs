use chrono::{Local, NaiveDate};
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

use crate::error::ScrapeError;

/// Browser-like user agent; the schedule site serves a stripped page to unknown clients
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Date format the schedule site prints in its headers
pub const DATE_FORMAT: &str = "%d/%m/%Y";

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{2}/[0-9]{2}/[0-9]{4}").expect("valid date regex"));
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,2}:[0-9]{2}").expect("valid clock regex"));
static BARE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("valid bare time regex"));

// ============================================================================
// FETCHING
// ============================================================================

/// Fetches HTML content from a URL with a single GET.
/// Non-2xx responses are errors; nothing is retried.
pub async fn fetch_html(url: &str, user_agent: &str) -> Result<String, ScrapeError> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|e| ScrapeError::from_reqwest(url, e))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ScrapeError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| ScrapeError::from_reqwest(url, e))
}

// ============================================================================
// DATES AND TIMES
// ============================================================================

/// Today's local date as DD/MM/YYYY
pub fn today_date() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Validates a DD/MM/YYYY date, returning it unchanged when it names a real day.
pub fn parse_date_arg(s: &str) -> Result<String, ScrapeError> {
    let s = s.trim();
    match NaiveDate::parse_from_str(s, DATE_FORMAT) {
        // Round-trip to reject single-digit days and months the site never prints
        Ok(date) if date.format(DATE_FORMAT).to_string() == s => Ok(s.to_string()),
        _ => Err(ScrapeError::InvalidDate(s.to_string())),
    }
}

/// All DD/MM/YYYY tokens in a piece of text, in order
pub fn date_tokens(text: &str) -> Vec<&str> {
    DATE_TOKEN.find_iter(text).map(|m| m.as_str()).collect()
}

/// True for H:MM, HH:MM, or (fallback) any run of four digits
pub fn has_time_token(text: &str) -> bool {
    CLOCK_TIME.is_match(text) || BARE_TIME.is_match(text)
}

/// First H:MM or HH:MM in the text
pub fn find_clock_time(text: &str) -> Option<&str> {
    CLOCK_TIME.find(text).map(|m| m.as_str())
}

// ============================================================================
// TEXT
// ============================================================================

/// Concatenated text of every descendant text node
pub fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// First `max_chars` characters, for log previews
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_date_shape() {
        let today = today_date();
        assert_eq!(date_tokens(&today), vec![today.as_str()]);
    }

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(parse_date_arg("15/03/2025").unwrap(), "15/03/2025");
        assert_eq!(parse_date_arg(" 01/12/2024 ").unwrap(), "01/12/2024");
        assert!(parse_date_arg("2025-03-15").is_err());
        assert!(parse_date_arg("31/02/2025").is_err());
        assert!(parse_date_arg("5/3/2025").is_err());
    }

    #[test]
    fn test_date_tokens() {
        let text = "Sábado 15/03/2025 - Domingo 16/03/2025";
        assert_eq!(date_tokens(text), vec!["15/03/2025", "16/03/2025"]);
        assert!(date_tokens("no dates here").is_empty());
    }

    #[test]
    fn test_time_tokens() {
        assert!(has_time_token("18:00"));
        assert!(has_time_token("9:30 Liga MX"));
        assert!(has_time_token("kick off 1930"));
        assert!(!has_time_token("Club A vs Club B"));

        assert_eq!(find_clock_time("Hoy 9:30 y 21:05"), Some("9:30"));
        assert_eq!(find_clock_time("1930"), None);
    }

    #[test]
    fn test_only_ascii_digits_count() {
        // Arabic-Indic and fullwidth digits
        assert!(!has_time_token("١٩:٣٠"));
        assert!(!has_time_token("１９３０"));
        assert!(date_tokens("١٥/٠٣/٢٠٢٥").is_empty());
        assert_eq!(find_clock_time("١٩:٣٠ o 21:00"), Some("21:00"));
    }

    #[test]
    fn test_preview_counts_chars() {
        assert_eq!(preview("Estándar", 4), "Está");
        assert_eq!(preview("ab", 10), "ab");
    }
}
