use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Stand-in for a competition or channel list the page did not provide
pub const UNSPECIFIED: &str = "unspecified";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One of today's matches as persisted to the JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub time: String,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub channels: Vec<String>,
}

impl Match {
    /// Builds a match, filling the competition and channel sentinels.
    /// Returns None when either team name is blank.
    pub fn new(
        time: String,
        competition: Option<String>,
        home_team: String,
        away_team: String,
        channels: Vec<String>,
    ) -> Option<Match> {
        let home_team = home_team.trim().to_string();
        let away_team = away_team.trim().to_string();
        if home_team.is_empty() || away_team.is_empty() {
            return None;
        }

        let competition = competition
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNSPECIFIED.to_string());
        let channels = if channels.is_empty() {
            vec![UNSPECIFIED.to_string()]
        } else {
            channels
        };

        Some(Match {
            time,
            competition,
            home_team,
            away_team,
            channels,
        })
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

/// Filters for browsing a saved match list; `None` or an empty search admits everything
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub search: Option<String>,
    pub competition: Option<String>,
    pub team: Option<String>,
}

// ============================================================================
// LOADING
// ============================================================================

/// Reads a saved match list. A missing or malformed file reads as empty.
pub fn load_matches(path: &Path) -> Vec<Match> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Could not read matches file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        warn!("Could not parse matches file {}: {}", path.display(), e);
        Vec::new()
    })
}

// ============================================================================
// QUERIES
// ============================================================================

/// Competition names, sorted and deduplicated
pub fn unique_competitions(matches: &[Match]) -> Vec<String> {
    matches
        .iter()
        .map(|m| m.competition.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Home and away team names, sorted and deduplicated
pub fn unique_teams(matches: &[Match]) -> Vec<String> {
    matches
        .iter()
        .flat_map(|m| [m.home_team.clone(), m.away_team.clone()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Case-insensitive search over teams and competition, plus exact competition/team filters
pub fn filter_matches(matches: &[Match], filter: &MatchFilter) -> Vec<Match> {
    let search = filter
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    matches
        .iter()
        .filter(|m| match &search {
            Some(term) => {
                m.home_team.to_lowercase().contains(term)
                    || m.away_team.to_lowercase().contains(term)
                    || m.competition.to_lowercase().contains(term)
            }
            None => true,
        })
        .filter(|m| {
            filter
                .competition
                .as_deref()
                .map_or(true, |c| m.competition == c)
        })
        .filter(|m| filter.team.as_deref().map_or(true, |t| m.involves(t)))
        .cloned()
        .collect()
}
