use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a canonical team, allocated by the store.
pub type TeamId = i64;

/// A canonical Liga MX club
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub nickname: String,
    /// URL-friendly handle, unique per team
    pub slug: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub logo: Option<String>,
    pub stadium: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    pub nickname: String,
    pub slug: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub logo: Option<String>,
    pub stadium: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Finished,
}

impl MatchStatus {
    /// Parse a free-text status label as it appears on scraped pages.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" | "scheduled" | "ns" | "not started" => Some(MatchStatus::Upcoming),
            "live" | "in progress" | "ht" | "half time" => Some(MatchStatus::Live),
            "finished" | "ft" | "final" | "full time" => Some(MatchStatus::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// A fixture between two canonical teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i64,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    /// `None` until the match kicks off
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: MatchStatus,
    pub match_date: DateTime<Utc>,
    pub venue: Option<String>,
    /// In-progress minute, only meaningful while live
    pub minute: Option<i32>,
    pub competition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: MatchStatus,
    pub match_date: DateTime<Utc>,
    pub venue: Option<String>,
    pub minute: Option<i32>,
    pub competition: String,
}

/// One row of the league table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub id: i64,
    pub team_id: TeamId,
    pub position: i32,
    pub matches_played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
    /// e.g. "2024-25"
    pub season: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStanding {
    pub team_id: TeamId,
    pub position: i32,
    pub matches_played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
    pub season: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub team_id: TeamId,
    /// "Forward", "Midfielder", ...
    pub position: Option<String>,
    pub goals: i32,
    pub assists: i32,
    pub appearances: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    pub team_id: TeamId,
    pub position: Option<String>,
    pub goals: i32,
    pub assists: i32,
    pub appearances: i32,
}

// ── Joined read models ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWithTeams {
    #[serde(flatten)]
    pub fixture: Match,
    pub home_team: Team,
    pub away_team: Team,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingWithTeam {
    #[serde(flatten)]
    pub standing: Standing,
    pub team: Team,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWithTeam {
    #[serde(flatten)]
    pub player: Player,
    pub team: Team,
}
