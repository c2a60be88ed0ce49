use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod models;
pub mod seed;

use models::*;

/// Shared in-memory store (single map set behind a mutex).
///
/// IDs come from per-table monotonic counters, so iteration order of every
/// table is insertion order.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
}

struct StoreInner {
    teams: BTreeMap<TeamId, Team>,
    matches: BTreeMap<i64, Match>,
    standings: BTreeMap<i64, Standing>,
    players: BTreeMap<i64, Player>,
    next_team_id: i64,
    next_match_id: i64,
    next_standing_id: i64,
    next_player_id: i64,
}

impl Default for StoreInner {
    fn default() -> Self {
        StoreInner {
            teams: BTreeMap::new(),
            matches: BTreeMap::new(),
            standings: BTreeMap::new(),
            players: BTreeMap::new(),
            next_team_id: 1,
            next_match_id: 1,
            next_standing_id: 1,
            next_player_id: 1,
        }
    }
}

fn alloc(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

impl Store {
    /// Empty store without any canonical teams
    pub fn new() -> Self {
        Store::default()
    }

    /// Store pre-loaded with the 18 Liga MX clubs
    pub fn seeded() -> Self {
        let store = Store::new();
        for team in seed::liga_mx_teams() {
            store.create_team(team);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Teams ─────────────────────────────────────────────────────────────────

    pub fn teams(&self) -> Vec<Team> {
        self.lock().teams.values().cloned().collect()
    }

    pub fn team_by_slug(&self, slug: &str) -> Option<Team> {
        self.lock().teams.values().find(|t| t.slug == slug).cloned()
    }

    pub fn create_team(&self, new: NewTeam) -> Team {
        let mut inner = self.lock();
        let id = alloc(&mut inner.next_team_id);
        let team = Team {
            id,
            name: new.name,
            nickname: new.nickname,
            slug: new.slug,
            primary_color: new.primary_color,
            secondary_color: new.secondary_color,
            logo: new.logo,
            stadium: new.stadium,
            city: new.city,
        };
        inner.teams.insert(id, team.clone());
        team
    }

    // ── Matches ───────────────────────────────────────────────────────────────

    pub fn create_match(&self, new: NewMatch) -> Match {
        let mut inner = self.lock();
        let id = alloc(&mut inner.next_match_id);
        let fixture = Match {
            id,
            home_team_id: new.home_team_id,
            away_team_id: new.away_team_id,
            home_score: new.home_score,
            away_score: new.away_score,
            status: new.status,
            match_date: new.match_date,
            venue: new.venue,
            minute: new.minute,
            competition: new.competition,
        };
        inner.matches.insert(id, fixture.clone());
        fixture
    }

    /// All matches whose teams are known, oldest kick-off first
    pub fn matches(&self) -> Vec<MatchWithTeams> {
        let inner = self.lock();
        let mut out: Vec<MatchWithTeams> = inner
            .matches
            .values()
            .filter_map(|m| {
                let home_team = inner.teams.get(&m.home_team_id)?.clone();
                let away_team = inner.teams.get(&m.away_team_id)?.clone();
                Some(MatchWithTeams {
                    fixture: m.clone(),
                    home_team,
                    away_team,
                })
            })
            .collect();
        out.sort_by_key(|m| m.fixture.match_date);
        out
    }

    pub fn live_matches(&self) -> Vec<MatchWithTeams> {
        self.matches()
            .into_iter()
            .filter(|m| m.fixture.status == MatchStatus::Live)
            .collect()
    }

    /// Next ten scheduled matches
    pub fn upcoming_matches(&self) -> Vec<MatchWithTeams> {
        self.matches()
            .into_iter()
            .filter(|m| m.fixture.status == MatchStatus::Upcoming)
            .take(10)
            .collect()
    }

    // ── Standings ─────────────────────────────────────────────────────────────

    pub fn create_standing(&self, new: NewStanding) -> Standing {
        let mut inner = self.lock();
        let id = alloc(&mut inner.next_standing_id);
        let standing = Standing {
            id,
            team_id: new.team_id,
            position: new.position,
            matches_played: new.matches_played,
            wins: new.wins,
            draws: new.draws,
            losses: new.losses,
            goals_for: new.goals_for,
            goals_against: new.goals_against,
            goal_difference: new.goal_difference,
            points: new.points,
            season: new.season,
        };
        inner.standings.insert(id, standing.clone());
        standing
    }

    /// League table: points desc, then goal difference desc
    pub fn standings(&self) -> Vec<StandingWithTeam> {
        let inner = self.lock();
        let mut out: Vec<StandingWithTeam> = inner
            .standings
            .values()
            .filter_map(|s| {
                let team = inner.teams.get(&s.team_id)?.clone();
                Some(StandingWithTeam {
                    standing: s.clone(),
                    team,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            b.standing
                .points
                .cmp(&a.standing.points)
                .then(b.standing.goal_difference.cmp(&a.standing.goal_difference))
        });
        out
    }

    // ── Players ───────────────────────────────────────────────────────────────

    pub fn create_player(&self, new: NewPlayer) -> Player {
        let mut inner = self.lock();
        let id = alloc(&mut inner.next_player_id);
        let player = Player {
            id,
            name: new.name,
            team_id: new.team_id,
            position: new.position,
            goals: new.goals,
            assists: new.assists,
            appearances: new.appearances,
        };
        inner.players.insert(id, player.clone());
        player
    }

    /// Players with the most goals first, capped at `limit`
    pub fn top_scorers(&self, limit: usize) -> Vec<PlayerWithTeam> {
        let inner = self.lock();
        let mut out: Vec<PlayerWithTeam> = inner
            .players
            .values()
            .filter_map(|p| {
                let team = inner.teams.get(&p.team_id)?.clone();
                Some(PlayerWithTeam {
                    player: p.clone(),
                    team,
                })
            })
            .collect();
        out.sort_by(|a, b| b.player.goals.cmp(&a.player.goals));
        out.truncate(limit);
        out
    }

    // ── Data management ───────────────────────────────────────────────────────

    /// Wipe matches, standings and players and reset their ID counters.
    /// Canonical teams are kept.
    pub fn clear_all_data(&self) {
        let mut inner = self.lock();
        inner.matches.clear();
        inner.standings.clear();
        inner.players.clear();
        inner.next_match_id = 1;
        inner.next_standing_id = 1;
        inner.next_player_id = 1;
    }

    /// (matches, standings, players) currently stored
    pub fn counts(&self) -> (usize, usize, usize) {
        let inner = self.lock();
        (
            inner.matches.len(),
            inner.standings.len(),
            inner.players.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn new_match(home: TeamId, away: TeamId, status: MatchStatus, offset_hours: i64) -> NewMatch {
        NewMatch {
            home_team_id: home,
            away_team_id: away,
            home_score: None,
            away_score: None,
            status,
            match_date: Utc::now() + Duration::hours(offset_hours),
            venue: None,
            minute: None,
            competition: "Liga MX".into(),
        }
    }

    fn new_standing(team_id: TeamId, points: i32, gd: i32) -> NewStanding {
        NewStanding {
            team_id,
            position: 0,
            matches_played: 10,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: gd,
            points,
            season: "2024-25".into(),
        }
    }

    #[test]
    fn test_seeded_registry() {
        let store = Store::seeded();
        let teams = store.teams();
        assert_eq!(teams.len(), 18);
        assert_eq!(teams[0].id, 1);
        assert_eq!(teams[0].name, "Club América");
        assert_eq!(store.team_by_slug("chivas").map(|t| t.id), Some(2));
        assert!(store.team_by_slug("nope").is_none());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let store = Store::seeded();
        let a = store.create_match(new_match(1, 2, MatchStatus::Upcoming, 1));
        let b = store.create_match(new_match(3, 4, MatchStatus::Upcoming, 2));
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[test]
    fn test_clear_all_data_resets_counters_and_keeps_teams() {
        let store = Store::seeded();
        store.create_match(new_match(1, 2, MatchStatus::Finished, -1));
        store.create_standing(new_standing(1, 30, 5));
        store.clear_all_data();
        assert_eq!(store.counts(), (0, 0, 0));
        assert_eq!(store.teams().len(), 18);
        let m = store.create_match(new_match(1, 2, MatchStatus::Finished, -1));
        assert_eq!(m.id, 1);
    }

    #[test]
    fn test_matches_sorted_by_date_and_filtered() {
        let store = Store::seeded();
        store.create_match(new_match(1, 2, MatchStatus::Upcoming, 48));
        store.create_match(new_match(3, 4, MatchStatus::Live, 0));
        store.create_match(new_match(5, 6, MatchStatus::Finished, -48));
        // unknown team: hidden from joined reads
        store.create_match(new_match(1, 99, MatchStatus::Upcoming, 1));

        let all = store.matches();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].fixture.status, MatchStatus::Finished);
        assert_eq!(all[2].fixture.status, MatchStatus::Upcoming);
        assert_eq!(store.live_matches().len(), 1);
        assert_eq!(store.upcoming_matches().len(), 1);
    }

    #[test]
    fn test_standings_sorted_by_points_then_goal_difference() {
        let store = Store::seeded();
        store.create_standing(new_standing(1, 20, 1));
        store.create_standing(new_standing(2, 25, 0));
        store.create_standing(new_standing(3, 20, 7));
        let table: Vec<TeamId> = store.standings().iter().map(|s| s.team.id).collect();
        assert_eq!(table, vec![2, 3, 1]);
    }

    #[test]
    fn test_top_scorers_limit_and_order() {
        let store = Store::seeded();
        for (name, goals) in [("A", 3), ("B", 9), ("C", 5)] {
            store.create_player(NewPlayer {
                name: name.into(),
                team_id: 1,
                position: Some("Forward".into()),
                goals,
                assists: 0,
                appearances: 10,
            });
        }
        let top: Vec<String> = store
            .top_scorers(2)
            .into_iter()
            .map(|p| p.player.name)
            .collect();
        assert_eq!(top, vec!["B", "C"]);
        assert_eq!(store.top_scorers(10).len(), 3);
    }
}
