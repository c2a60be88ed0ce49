//! Maps scraped records onto canonical teams and hands them to the store.
//!
//! Team names are resolved by a case- and accent-insensitive exact match on
//! the canonical name first, then by substring containment in either
//! direction against name or nickname. Records whose teams cannot be resolved
//! are dropped. Records that resolve but fail validation are logged and
//! skipped; neither case stops the run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::sources::{ScrapedData, ScrapedMatch, ScrapedPlayer, ScrapedStanding};
use crate::store::models::{MatchStatus, NewMatch, NewPlayer, NewStanding, Team, TeamId};
use crate::store::Store;

const MAX_MATCH_MINUTE: i32 = 130;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i32 },

    #[error("minute {0} outside 0..=130")]
    MinuteOutOfRange(i32),

    #[error("team {0} cannot play itself")]
    SameTeam(TeamId),

    #[error("position must be at least 1 (got {0})")]
    InvalidPosition(i32),

    #[error("player name is empty")]
    EmptyName,

    #[error("{wins}W+{draws}D+{losses}L exceeds {played} matches played")]
    InconsistentRecord {
        played: i32,
        wins: i32,
        draws: i32,
        losses: i32,
    },
}

/// Values applied when a scraped record leaves them out
#[derive(Debug, Clone)]
pub struct RecordDefaults {
    pub season: String,
    pub competition: String,
}

/// How many records of each kind reached the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub matches: usize,
    pub standings: usize,
    pub players: usize,
}

impl RecordCounts {
    pub fn of(data: &ScrapedData) -> Self {
        RecordCounts {
            matches: data.matches.len(),
            standings: data.standings.len(),
            players: data.players.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub persisted: RecordCounts,
    pub unresolved: usize,
    pub invalid: usize,
}

// ── Team resolution ──────────────────────────────────────────────────────────

struct RegistryEntry {
    team: Team,
    name_key: String,
    nickname_key: String,
}

/// Read-only snapshot of the canonical teams used as the matching target.
pub struct TeamRegistry {
    entries: Vec<RegistryEntry>,
}

impl TeamRegistry {
    pub fn new(teams: Vec<Team>) -> Self {
        let entries = teams
            .into_iter()
            .map(|team| RegistryEntry {
                name_key: fold_name(&team.name),
                nickname_key: fold_name(&team.nickname),
                team,
            })
            .collect();
        TeamRegistry { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolve a free-text team name to a canonical team ID.
    pub fn resolve_team(&self, name: &str) -> Option<TeamId> {
        self.resolve(name).map(|t| t.id)
    }

    fn resolve(&self, name: &str) -> Option<&Team> {
        let needle = fold_name(name);
        if needle.is_empty() {
            return None;
        }

        if let Some(entry) = self.entries.iter().find(|e| e.name_key == needle) {
            return Some(&entry.team);
        }

        let overlaps = |key: &str| !key.is_empty() && (key.contains(&needle) || needle.contains(key));
        self.entries
            .iter()
            .find(|e| overlaps(&e.name_key) || overlaps(&e.nickname_key))
            .map(|e| &e.team)
    }
}

/// Lowercase, strip Spanish diacritics and collapse whitespace.
///
/// "Club  América" → "club america", "Querétaro FC" → "queretaro fc"
pub fn fold_name(name: &str) -> String {
    let folded: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Record building ──────────────────────────────────────────────────────────

fn non_negative(field: &'static str, value: i32) -> Result<i32, ValidationError> {
    if value < 0 {
        Err(ValidationError::Negative { field, value })
    } else {
        Ok(value)
    }
}

fn non_negative_opt(field: &'static str, value: Option<i32>) -> Result<Option<i32>, ValidationError> {
    value.map(|v| non_negative(field, v)).transpose()
}

pub struct Reconciler<'a> {
    registry: &'a TeamRegistry,
    defaults: &'a RecordDefaults,
}

impl<'a> Reconciler<'a> {
    pub fn new(registry: &'a TeamRegistry, defaults: &'a RecordDefaults) -> Self {
        Reconciler { registry, defaults }
    }

    fn team_for(&self, name: Option<&str>) -> Option<&'a Team> {
        self.registry.resolve(name?)
    }

    pub fn build_match(
        &self,
        ir: &ScrapedMatch,
        now: DateTime<Utc>,
    ) -> Option<Result<NewMatch, ValidationError>> {
        let home = self.team_for(ir.home_team_name.as_deref())?;
        let away = self.team_for(ir.away_team_name.as_deref())?;
        Some(self.validate_match(ir, home, away, now))
    }

    fn validate_match(
        &self,
        ir: &ScrapedMatch,
        home: &Team,
        away: &Team,
        now: DateTime<Utc>,
    ) -> Result<NewMatch, ValidationError> {
        if home.id == away.id {
            return Err(ValidationError::SameTeam(home.id));
        }
        let minute = ir.minute;
        if let Some(m) = minute {
            if !(0..=MAX_MATCH_MINUTE).contains(&m) {
                return Err(ValidationError::MinuteOutOfRange(m));
            }
        }
        Ok(NewMatch {
            home_team_id: home.id,
            away_team_id: away.id,
            home_score: non_negative_opt("homeScore", ir.home_score)?,
            away_score: non_negative_opt("awayScore", ir.away_score)?,
            status: ir.status.unwrap_or(MatchStatus::Upcoming),
            match_date: ir.match_date.unwrap_or(now),
            venue: ir
                .venue
                .clone()
                .or_else(|| home.stadium.clone())
                .or_else(|| Some("TBD".to_string())),
            minute,
            competition: ir
                .competition
                .clone()
                .unwrap_or_else(|| self.defaults.competition.clone()),
        })
    }

    pub fn build_standing(
        &self,
        ir: &ScrapedStanding,
    ) -> Option<Result<NewStanding, ValidationError>> {
        let team = self.team_for(ir.team_name.as_deref())?;
        Some(self.validate_standing(ir, team.id))
    }

    fn validate_standing(
        &self,
        ir: &ScrapedStanding,
        team_id: TeamId,
    ) -> Result<NewStanding, ValidationError> {
        let position = ir.position.unwrap_or(1);
        if position < 1 {
            return Err(ValidationError::InvalidPosition(position));
        }
        let played = non_negative("matchesPlayed", ir.matches_played.unwrap_or(0))?;
        let wins = non_negative("wins", ir.wins.unwrap_or(0))?;
        let draws = non_negative("draws", ir.draws.unwrap_or(0))?;
        let losses = non_negative("losses", ir.losses.unwrap_or(0))?;
        let decided = wins.checked_add(draws).and_then(|n| n.checked_add(losses));
        if decided.map_or(true, |n| n > played) {
            return Err(ValidationError::InconsistentRecord {
                played,
                wins,
                draws,
                losses,
            });
        }
        let goals_for = non_negative("goalsFor", ir.goals_for.unwrap_or(0))?;
        let goals_against = non_negative("goalsAgainst", ir.goals_against.unwrap_or(0))?;

        Ok(NewStanding {
            team_id,
            position,
            matches_played: played,
            wins,
            draws,
            losses,
            goals_for,
            goals_against,
            goal_difference: goals_for - goals_against,
            points: non_negative("points", ir.points.unwrap_or(0))?,
            season: ir
                .season
                .clone()
                .unwrap_or_else(|| self.defaults.season.clone()),
        })
    }

    pub fn build_player(&self, ir: &ScrapedPlayer) -> Option<Result<NewPlayer, ValidationError>> {
        let team = self.team_for(ir.team_name.as_deref())?;
        Some(self.validate_player(ir, team.id))
    }

    fn validate_player(&self, ir: &ScrapedPlayer, team_id: TeamId) -> Result<NewPlayer, ValidationError> {
        let name = ir.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(NewPlayer {
            name: name.to_string(),
            team_id,
            position: ir.position.clone().or_else(|| Some("Forward".to_string())),
            goals: non_negative("goals", ir.goals.unwrap_or(0))?,
            assists: non_negative("assists", ir.assists.unwrap_or(0))?,
            appearances: non_negative("appearances", ir.appearances.unwrap_or(0))?,
        })
    }

    /// Reconcile every record and create the valid ones in `store`.
    pub fn persist(&self, data: &ScrapedData, store: &Store) -> PersistReport {
        let now = Utc::now();
        let mut report = PersistReport::default();

        for ir in &data.matches {
            match self.build_match(ir, now) {
                Some(Ok(new)) => {
                    store.create_match(new);
                    report.persisted.matches += 1;
                }
                Some(Err(e)) => {
                    warn!(
                        "Match {:?} vs {:?} rejected: {}",
                        ir.home_team_name, ir.away_team_name, e
                    );
                    report.invalid += 1;
                }
                None => {
                    debug!(
                        "Match {:?} vs {:?}: team not in registry, dropped",
                        ir.home_team_name, ir.away_team_name
                    );
                    report.unresolved += 1;
                }
            }
        }

        for ir in &data.standings {
            match self.build_standing(ir) {
                Some(Ok(new)) => {
                    store.create_standing(new);
                    report.persisted.standings += 1;
                }
                Some(Err(e)) => {
                    warn!("Standing for {:?} rejected: {}", ir.team_name, e);
                    report.invalid += 1;
                }
                None => {
                    debug!("Standing for {:?}: team not in registry, dropped", ir.team_name);
                    report.unresolved += 1;
                }
            }
        }

        for ir in &data.players {
            match self.build_player(ir) {
                Some(Ok(new)) => {
                    store.create_player(new);
                    report.persisted.players += 1;
                }
                Some(Err(e)) => {
                    warn!("Player {:?} rejected: {}", ir.name, e);
                    report.invalid += 1;
                }
                None => {
                    debug!("Player {:?} ({:?}): team not in registry, dropped", ir.name, ir.team_name);
                    report.unresolved += 1;
                }
            }
        }

        report
    }
}
