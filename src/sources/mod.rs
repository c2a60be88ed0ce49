pub mod fetch;
pub mod generator;
pub mod models;
pub mod provider;
pub mod search;
pub mod stubs;

pub use fetch::{Fetcher, RetryPolicy};
pub use generator::SyntheticSource;
pub use models::{ScrapedData, ScrapedMatch, ScrapedPlayer, ScrapedStanding};
pub use provider::DataSource;
pub use search::SearchPageSource;
pub use stubs::InertSource;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scrape **all sources concurrently**, one task per source.
///
/// Returns one result per source in declared order. A source that errors or
/// panics yields an `Err`; the others are never cancelled.
pub async fn fetch_all(sources: &[Arc<dyn DataSource>]) -> Vec<Result<ScrapedData>> {
    let handles: Vec<_> = sources
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            tokio::spawn(async move { source.scrape().await })
        })
        .collect();

    futures_util::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| {
            joined
                .map_err(|e| anyhow!("task aborted: {}", e))
                .and_then(|result| result)
        })
        .collect()
}

/// Merge what succeeded in declared source order, then deduplicate with
/// first-seen-wins. Failed sources are logged and contribute nothing.
pub fn aggregate(sources: &[Arc<dyn DataSource>], results: Vec<Result<ScrapedData>>) -> ScrapedData {
    let mut merged = ScrapedData::default();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(data) => {
                info!(
                    "Source '{}' scraped: {} matches, {} standings, {} players",
                    source.name(),
                    data.matches.len(),
                    data.standings.len(),
                    data.players.len()
                );
                merged.extend(data);
            }
            Err(e) => warn!("Source '{}' failed: {:#}", source.name(), e),
        }
    }

    dedupe(merged)
}

/// Collapse duplicate records across sources by natural key.
pub fn dedupe(data: ScrapedData) -> ScrapedData {
    let before = (data.matches.len(), data.standings.len(), data.players.len());
    let out = ScrapedData {
        matches: dedupe_by_key(data.matches, match_key),
        standings: dedupe_by_key(data.standings, |s| {
            (s.team_name.clone(), s.season.clone())
        }),
        players: dedupe_by_key(data.players, |p| (p.name.clone(), p.team_name.clone())),
    };
    debug!(
        "Dedup: matches {}→{}, standings {}→{}, players {}→{}",
        before.0,
        out.matches.len(),
        before.1,
        out.standings.len(),
        before.2,
        out.players.len()
    );
    out
}

type MatchKey = (Option<String>, Option<String>, Option<DateTime<Utc>>);

fn match_key(m: &ScrapedMatch) -> MatchKey {
    (
        m.home_team_name.clone(),
        m.away_team_name.clone(),
        m.match_date,
    )
}

/// Keep the first record for every key, preserving order.
fn dedupe_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::{Datelike, TimeZone};

    struct Fixed(&'static str, ScrapedData);

    #[async_trait]
    impl DataSource for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        async fn scrape(&self) -> Result<ScrapedData> {
            Ok(self.1.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl DataSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        async fn scrape(&self) -> Result<ScrapedData> {
            bail!("blocked by upstream")
        }
    }

    struct Panicking;

    #[async_trait]
    impl DataSource for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }
        async fn scrape(&self) -> Result<ScrapedData> {
            panic!("adapter bug")
        }
    }

    async fn scrape_all(sources: &[Arc<dyn DataSource>]) -> ScrapedData {
        aggregate(sources, fetch_all(sources).await)
    }

    fn fixture(home: &str, away: &str, day: u32, goals: i32) -> ScrapedMatch {
        ScrapedMatch {
            home_team_name: Some(home.into()),
            away_team_name: Some(away.into()),
            home_score: Some(goals),
            match_date: Some(Utc.with_ymd_and_hms(2024, 10, day, 19, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn player(name: &str, team: &str, goals: i32) -> ScrapedPlayer {
        ScrapedPlayer {
            name: Some(name.into()),
            team_name: Some(team.into()),
            goals: Some(goals),
            ..Default::default()
        }
    }

    fn standing(team: &str, season: &str, points: i32) -> ScrapedStanding {
        ScrapedStanding {
            team_name: Some(team.into()),
            season: Some(season.into()),
            points: Some(points),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failing_sources_contribute_nothing() {
        let a = ScrapedData {
            matches: vec![fixture("América", "Chivas", 1, 2)],
            standings: vec![standing("América", "2024-25", 30)],
            players: vec![player("Henry Martín", "América", 14)],
        };
        let b = ScrapedData {
            matches: vec![fixture("Tigres", "Monterrey", 2, 1)],
            standings: vec![],
            players: vec![player("Gignac", "Tigres", 18)],
        };
        let sources: Vec<Arc<dyn DataSource>> = vec![
            Arc::new(Failing),
            Arc::new(Fixed("a", a.clone())),
            Arc::new(Panicking),
            Arc::new(Fixed("b", b.clone())),
        ];

        let merged = scrape_all(&sources).await;

        let mut expected = a;
        expected.extend(b);
        assert_eq!(merged, expected);
    }

    #[tokio::test]
    async fn test_fetch_all_reports_each_source_in_order() {
        let sources: Vec<Arc<dyn DataSource>> = vec![
            Arc::new(Panicking),
            Arc::new(Fixed("ok", ScrapedData::default())),
            Arc::new(Failing),
        ];
        let results = fetch_all(&sources).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty() {
        let sources: Vec<Arc<dyn DataSource>> = vec![Arc::new(Failing), Arc::new(Panicking)];
        assert!(scrape_all(&sources).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_across_sources_first_seen_wins() {
        let first = ScrapedData {
            matches: vec![fixture("América", "Chivas", 1, 2)],
            ..Default::default()
        };
        let second = ScrapedData {
            matches: vec![
                fixture("América", "Chivas", 1, 5),
                fixture("América", "Chivas", 8, 0),
            ],
            ..Default::default()
        };
        let sources: Vec<Arc<dyn DataSource>> = vec![
            Arc::new(Fixed("first", first)),
            Arc::new(Fixed("second", second)),
        ];

        let merged = scrape_all(&sources).await;
        assert_eq!(merged.matches.len(), 2);
        assert_eq!(merged.matches[0].home_score, Some(2));
        assert_eq!(merged.matches[1].match_date.unwrap().day(), 8);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let data = ScrapedData {
            matches: vec![
                fixture("América", "Chivas", 1, 2),
                fixture("Chivas", "América", 1, 2),
                fixture("América", "Chivas", 1, 3),
            ],
            standings: vec![
                standing("Toluca", "2024-25", 39),
                standing("Toluca", "2023-24", 30),
                standing("Toluca", "2024-25", 1),
            ],
            players: vec![
                player("Gignac", "Tigres", 18),
                player("Gignac", "Tigres", 2),
                player("Gignac", "Monterrey", 1),
            ],
        };

        let once = dedupe(data);
        assert_eq!(once.matches.len(), 2);
        assert_eq!(once.standings.len(), 2);
        assert_eq!(once.standings[0].points, Some(39));
        assert_eq!(once.players.len(), 2);
        assert_eq!(once.players[0].goals, Some(18));

        let twice = dedupe(once.clone());
        assert_eq!(twice, once);
    }
}
