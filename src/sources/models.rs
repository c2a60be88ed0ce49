//! Intermediate records emitted by every data source.
//!
//! Teams are referenced by the free-text name the source used, never by ID;
//! the reconciler maps names onto canonical teams later.

use chrono::{DateTime, Utc};

use crate::store::models::MatchStatus;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedMatch {
    pub home_team_name: Option<String>,
    pub away_team_name: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: Option<MatchStatus>,
    pub match_date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub minute: Option<i32>,
    pub competition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedStanding {
    pub team_name: Option<String>,
    pub position: Option<i32>,
    pub matches_played: Option<i32>,
    pub wins: Option<i32>,
    pub draws: Option<i32>,
    pub losses: Option<i32>,
    pub goals_for: Option<i32>,
    pub goals_against: Option<i32>,
    pub goal_difference: Option<i32>,
    pub points: Option<i32>,
    pub season: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedPlayer {
    pub name: Option<String>,
    pub team_name: Option<String>,
    pub position: Option<String>,
    pub goals: Option<i32>,
    pub assists: Option<i32>,
    pub appearances: Option<i32>,
}

/// Everything one source (or one aggregated run) produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedData {
    pub matches: Vec<ScrapedMatch>,
    pub standings: Vec<ScrapedStanding>,
    pub players: Vec<ScrapedPlayer>,
}

impl ScrapedData {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.standings.is_empty() && self.players.is_empty()
    }

    /// Append another source's records after ours, preserving order.
    pub fn extend(&mut self, other: ScrapedData) {
        self.matches.extend(other.matches);
        self.standings.extend(other.standings);
        self.players.extend(other.players);
    }
}
