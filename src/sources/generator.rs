//! Synthetic Liga MX data used as the reliable fallback source.
//!
//! Produces recent results, upcoming fixtures, at most one live match, a full
//! league table and a fixed roster of top scorers. With a seed the output is
//! reproducible; without one every scrape draws fresh numbers.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use super::models::{ScrapedData, ScrapedMatch, ScrapedPlayer, ScrapedStanding};
use super::provider::DataSource;
use crate::store::models::MatchStatus;

/// Team names as a typical listings site spells them (not the canonical names).
const LEAGUE_TEAMS: [&str; 18] = [
    "Club América",
    "Chivas Guadalajara",
    "Cruz Azul",
    "Pumas UNAM",
    "Tigres UANL",
    "Monterrey",
    "Santos Laguna",
    "León",
    "Toluca",
    "Atlas",
    "Puebla",
    "Pachuca",
    "Querétaro",
    "Mazatlán FC",
    "Juárez",
    "Tijuana",
    "Necaxa",
    "San Luis",
];

/// (name, team, position, goals, assists, appearances)
const TOP_SCORERS: [(&str, &str, &str, i32, i32, i32); 8] = [
    ("André-Pierre Gignac", "Tigres UANL", "Forward", 18, 5, 15),
    ("Rogelio Funes Mori", "Monterrey", "Forward", 15, 3, 16),
    ("Henry Martín", "Club América", "Forward", 14, 4, 17),
    ("Julián Quiñones", "Atlas", "Forward", 12, 6, 15),
    ("Germán Berterame", "Monterrey", "Forward", 11, 2, 14),
    ("Jonathan Rodríguez", "Cruz Azul", "Forward", 10, 4, 16),
    ("Nico López", "Tigres UANL", "Forward", 9, 7, 15),
    ("Juan Brunetta", "Santos Laguna", "Midfielder", 8, 9, 17),
];

const RECENT_MATCHES: usize = 10;
const UPCOMING_MATCHES: usize = 8;
const GENERIC_VENUE: &str = "Estadio Liga MX";
const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

pub struct SyntheticSource {
    seed: Option<u64>,
    season: String,
    competition: String,
}

impl SyntheticSource {
    pub fn new(seed: Option<u64>, season: &str, competition: &str) -> Self {
        SyntheticSource {
            seed,
            season: season.to_string(),
            competition: competition.to_string(),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn generate(&self, rng: &mut impl Rng, now: DateTime<Utc>) -> ScrapedData {
        ScrapedData {
            matches: self.generate_matches(rng, now),
            standings: self.generate_standings(rng),
            players: top_scorers(),
        }
    }

    fn generate_standings(&self, rng: &mut impl Rng) -> Vec<ScrapedStanding> {
        let mut table: Vec<ScrapedStanding> = LEAGUE_TEAMS
            .iter()
            .map(|team| {
                let matches_played = 15 + rng.gen_range(0..3);
                let wins = (rng.gen::<f64>() * matches_played as f64 * 0.6) as i32;
                let losses = (rng.gen::<f64>() * (matches_played - wins) as f64 * 0.5) as i32;
                let draws = matches_played - wins - losses;
                let goals_for = wins * 2 + draws + rng.gen_range(0..10);
                let goals_against = losses * 2 + rng.gen_range(0..8);

                ScrapedStanding {
                    team_name: Some(team.to_string()),
                    position: None,
                    matches_played: Some(matches_played),
                    wins: Some(wins),
                    draws: Some(draws),
                    losses: Some(losses),
                    goals_for: Some(goals_for),
                    goals_against: Some(goals_against),
                    goal_difference: Some(goals_for - goals_against),
                    points: Some(wins * 3 + draws),
                    season: Some(self.season.clone()),
                }
            })
            .collect();

        rank_table(&mut table);
        table
    }

    fn generate_matches(&self, rng: &mut impl Rng, now: DateTime<Utc>) -> Vec<ScrapedMatch> {
        let mut matches = Vec::with_capacity(RECENT_MATCHES + UPCOMING_MATCHES + 1);

        for _ in 0..RECENT_MATCHES {
            let (home, away) = pick_pair(rng);
            let kickoff = now - Duration::milliseconds(rng.gen_range(0..WEEK_MS));
            matches.push(self.fixture(
                home,
                away,
                MatchStatus::Finished,
                kickoff,
                Some((rng.gen_range(0..4), rng.gen_range(0..4))),
                None,
            ));
        }

        for _ in 0..UPCOMING_MATCHES {
            let (home, away) = pick_pair(rng);
            let kickoff = now + Duration::milliseconds(rng.gen_range(1..WEEK_MS));
            matches.push(self.fixture(home, away, MatchStatus::Upcoming, kickoff, None, None));
        }

        if rng.gen_bool(0.5) {
            let (home, away) = pick_pair(rng);
            let score = (rng.gen_range(0..3), rng.gen_range(0..3));
            let minute = 45 + rng.gen_range(0..45);
            matches.push(self.fixture(
                home,
                away,
                MatchStatus::Live,
                now,
                Some(score),
                Some(minute),
            ));
        }

        matches
    }

    fn fixture(
        &self,
        home: &str,
        away: &str,
        status: MatchStatus,
        kickoff: DateTime<Utc>,
        score: Option<(i32, i32)>,
        minute: Option<i32>,
    ) -> ScrapedMatch {
        ScrapedMatch {
            home_team_name: Some(home.to_string()),
            away_team_name: Some(away.to_string()),
            home_score: score.map(|(h, _)| h),
            away_score: score.map(|(_, a)| a),
            status: Some(status),
            match_date: Some(kickoff),
            venue: Some(GENERIC_VENUE.to_string()),
            minute,
            competition: Some(self.competition.clone()),
        }
    }
}

#[async_trait]
impl DataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn scrape(&self) -> Result<ScrapedData> {
        let mut rng = self.rng();
        Ok(self.generate(&mut rng, Utc::now()))
    }
}

/// Sort by points then goal difference (both descending) and number rows 1..N.
pub fn rank_table(table: &mut [ScrapedStanding]) {
    table.sort_by(|a, b| {
        b.points
            .unwrap_or(0)
            .cmp(&a.points.unwrap_or(0))
            .then(b.goal_difference.unwrap_or(0).cmp(&a.goal_difference.unwrap_or(0)))
    });
    for (i, row) in table.iter_mut().enumerate() {
        row.position = Some(i as i32 + 1);
    }
}

fn pick_pair(rng: &mut impl Rng) -> (&'static str, &'static str) {
    let picked = index::sample(rng, LEAGUE_TEAMS.len(), 2);
    (LEAGUE_TEAMS[picked.index(0)], LEAGUE_TEAMS[picked.index(1)])
}

fn top_scorers() -> Vec<ScrapedPlayer> {
    TOP_SCORERS
        .iter()
        .map(|&(name, team, position, goals, assists, appearances)| ScrapedPlayer {
            name: Some(name.to_string()),
            team_name: Some(team.to_string()),
            position: Some(position.to_string()),
            goals: Some(goals),
            assists: Some(assists),
            appearances: Some(appearances),
        })
        .collect()
}
