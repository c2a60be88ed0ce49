//! Search-results page scraper: the primary source for background refreshes.
//!
//! Fetches three result pages (fixtures, league table, top scorers) and pulls
//! records out of the rendered markup. A page that fails to download only
//! costs its own section; the scrape errors out when every page failed.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::Fetcher;
use super::models::{ScrapedData, ScrapedMatch, ScrapedPlayer, ScrapedStanding};
use super::provider::DataSource;
use crate::store::models::MatchStatus;

const FIXTURES_QUERY: &str = "liga mx fixtures";
const TABLE_QUERY: &str = "liga mx table standings";
const SCORERS_QUERY: &str = "liga mx top scorers";

const MAX_MATCHES: usize = 20;
const MAX_TABLE_ROWS: usize = 18;
const MAX_PLAYERS: usize = 20;

pub struct SearchPageSource {
    fetcher: Fetcher,
    base_url: Url,
    season: String,
    competition: String,
    selectors: PageSelectors,
}

impl SearchPageSource {
    pub fn new(fetcher: Fetcher, base_url: &str, season: &str, competition: &str) -> Result<Self> {
        Ok(SearchPageSource {
            fetcher,
            base_url: Url::parse(base_url)?,
            season: season.to_string(),
            competition: competition.to_string(),
            selectors: PageSelectors::new()?,
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("q", query);
        url
    }

    async fn fetch_page(&self, query: &str) -> Option<String> {
        let url = self.search_url(query);
        match self.fetcher.get_text(url.as_str()).await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("{}: page '{}' unavailable: {}", self.name(), query, e);
                None
            }
        }
    }
}

#[async_trait]
impl DataSource for SearchPageSource {
    fn name(&self) -> &str {
        "google-sports"
    }

    async fn scrape(&self) -> Result<ScrapedData> {
        let now = Utc::now();
        let fixtures = self.fetch_page(FIXTURES_QUERY).await;
        let table = self.fetch_page(TABLE_QUERY).await;
        let scorers = self.fetch_page(SCORERS_QUERY).await;

        if fixtures.is_none() && table.is_none() && scorers.is_none() {
            bail!("{}: no result page could be fetched", self.name());
        }

        let data = ScrapedData {
            matches: fixtures
                .map(|html| self.selectors.matches(&html, now, &self.competition))
                .unwrap_or_default(),
            standings: table
                .map(|html| self.selectors.standings(&html, &self.season))
                .unwrap_or_default(),
            players: scorers
                .map(|html| self.selectors.players(&html))
                .unwrap_or_default(),
        };
        info!(
            "{}: {} matches, {} table rows, {} players",
            self.name(),
            data.matches.len(),
            data.standings.len(),
            data.players.len()
        );
        Ok(data)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{}': {}", css, e))
}

/// Compiled CSS selectors for the three result pages.
pub struct PageSelectors {
    match_card: Selector,
    home_name: Selector,
    away_name: Selector,
    score: Selector,
    match_state: Selector,
    kickoff: Selector,
    table_row: Selector,
    table_cell: Selector,
    player_row: Selector,
    player_name: Selector,
    player_team: Selector,
    player_goals: Selector,
}

impl PageSelectors {
    pub fn new() -> Result<Self> {
        Ok(PageSelectors {
            match_card: selector(".imso_mh__lv-m, .match")?,
            home_name: selector(".imso_mh__first-tn-ed")?,
            away_name: selector(".imso_mh__second-tn-ed")?,
            score: selector(".imso_mh__score")?,
            match_state: selector(".imso_mh__ms")?,
            kickoff: selector(".imso_mh__dt")?,
            table_row: selector("table tr, [role=\"row\"]")?,
            table_cell: selector("td, [role=\"cell\"]")?,
            player_row: selector(".player-row, [data-player]")?,
            player_name: selector(".player-name")?,
            player_team: selector(".team-name")?,
            player_goals: selector(".goals")?,
        })
    }

    pub fn matches(&self, html: &str, now: DateTime<Utc>, competition: &str) -> Vec<ScrapedMatch> {
        let doc = Html::parse_document(html);
        doc.select(&self.match_card)
            .take(MAX_MATCHES)
            .filter_map(|card| {
                let home = first_text(card, &self.home_name)?;
                let away = first_text(card, &self.away_name)?;

                let mut status = MatchStatus::Upcoming;
                let mut home_score = None;
                let mut away_score = None;
                let mut minute = None;

                if let Some(score) = first_text(card, &self.score) {
                    let goals = integers(&score);
                    if goals.len() >= 2 {
                        home_score = Some(goals[0]);
                        away_score = Some(goals[1]);
                        status = MatchStatus::Finished;
                    }
                }

                if let Some(state) = first_text(card, &self.match_state) {
                    if state.contains("LIVE") || state.contains('\'') {
                        status = MatchStatus::Live;
                        minute = live_minute(&state);
                    } else if let Some(labelled) = MatchStatus::from_label(&state) {
                        status = labelled;
                    }
                }

                let match_date = first_text(card, &self.kickoff)
                    .map(|t| parse_kickoff(&t, now))
                    .unwrap_or(now);

                Some(ScrapedMatch {
                    home_team_name: Some(home),
                    away_team_name: Some(away),
                    home_score,
                    away_score,
                    status: Some(status),
                    match_date: Some(match_date),
                    venue: None,
                    minute,
                    competition: Some(competition.to_string()),
                })
            })
            .collect()
    }

    pub fn standings(&self, html: &str, season: &str) -> Vec<ScrapedStanding> {
        let doc = Html::parse_document(html);
        let rows: Vec<ScrapedStanding> = doc
            .select(&self.table_row)
            .filter_map(|row| {
                let cells: Vec<String> = row
                    .select(&self.table_cell)
                    .map(|c| c.text().collect::<String>().trim().to_string())
                    .collect();
                if cells.len() < 5 || cells[0].is_empty() {
                    return None;
                }
                let number = |i: usize| cells.get(i).and_then(|c| c.parse::<i32>().ok());
                Some(ScrapedStanding {
                    team_name: Some(cells[0].clone()),
                    position: None,
                    matches_played: number(1),
                    wins: number(2),
                    draws: number(3),
                    losses: number(4),
                    goals_for: None,
                    goals_against: None,
                    goal_difference: None,
                    points: cells.last().and_then(|c| c.parse().ok()),
                    season: Some(season.to_string()),
                })
            })
            .take(MAX_TABLE_ROWS)
            .collect();

        debug!("Parsed {} table rows", rows.len());
        rows.into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                row.position = Some(i as i32 + 1);
                row
            })
            .collect()
    }

    pub fn players(&self, html: &str) -> Vec<ScrapedPlayer> {
        let doc = Html::parse_document(html);
        doc.select(&self.player_row)
            .take(MAX_PLAYERS)
            .filter_map(|row| {
                let name = first_text(row, &self.player_name)?;
                let goals = first_text(row, &self.player_goals)
                    .and_then(|g| integers(&g).first().copied())
                    .unwrap_or(0);
                Some(ScrapedPlayer {
                    name: Some(name),
                    team_name: first_text(row, &self.player_team),
                    position: Some("Forward".to_string()),
                    goals: Some(goals),
                    assists: Some(0),
                    appearances: Some(0),
                })
            })
            .collect()
    }
}

fn first_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    let text = el.select(sel).next()?.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Every run of ASCII digits in `s`, in order.
fn integers(s: &str) -> Vec<i32> {
    s.split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// "67'" or "LIVE 45+2'" → minute before the apostrophe, stoppage time dropped.
fn live_minute(state: &str) -> Option<i32> {
    let head = &state[..state.find('\'')?];
    let token = head.split_whitespace().last()?;
    token.split('+').next()?.parse().ok()
}

/// "Today 19:00" / "Tomorrow 21:05" relative to `now`; anything else is `now`.
fn parse_kickoff(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let day = if text.contains("Today") {
        now
    } else if text.contains("Tomorrow") {
        now + Duration::days(1)
    } else {
        return now;
    };
    text.split_whitespace()
        .find_map(|tok| NaiveTime::parse_from_str(tok, "%H:%M").ok())
        .map(|time| day.date_naive().and_time(time).and_utc())
        .unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::fetch::RetryPolicy;
    use crate::test_support::spawn_server;
    use axum::{extract::Query, routing::get, Router};
    use chrono::{TimeZone, Timelike};
    use std::collections::HashMap;

    const FIXTURES_HTML: &str = r#"<html><body>
      <div class="imso_mh__lv-m">
        <span class="imso_mh__first-tn-ed">América</span>
        <span class="imso_mh__second-tn-ed">Chivas</span>
        <span class="imso_mh__score">2 - 1</span>
        <span class="imso_mh__ms">Final</span>
      </div>
      <div class="imso_mh__lv-m">
        <span class="imso_mh__first-tn-ed">Tigres</span>
        <span class="imso_mh__second-tn-ed">Monterrey</span>
        <span class="imso_mh__score">0 - 0</span>
        <span class="imso_mh__ms">LIVE 67'</span>
      </div>
      <div class="imso_mh__lv-m">
        <span class="imso_mh__first-tn-ed">Pumas</span>
        <span class="imso_mh__second-tn-ed">Toluca</span>
        <span class="imso_mh__dt">Tomorrow 21:05</span>
      </div>
      <div class="imso_mh__lv-m">
        <span class="imso_mh__first-tn-ed">Orphan</span>
      </div>
    </body></html>"#;

    const TABLE_HTML: &str = r#"<html><body><table>
      <tr><th>Club</th><th>MP</th><th>W</th><th>D</th><th>L</th><th>Pts</th></tr>
      <tr><td>Toluca</td><td>17</td><td>12</td><td>3</td><td>2</td><td>39</td></tr>
      <tr><td>Tigres</td><td>17</td><td>10</td><td>5</td><td>2</td><td>35</td></tr>
      <tr><td></td><td>17</td><td>1</td><td>1</td><td>15</td><td>4</td></tr>
      <tr><td>Short</td><td>1</td></tr>
    </table></body></html>"#;

    const SCORERS_HTML: &str = r#"<html><body>
      <div class="player-row"><span class="player-name">Paulinho</span>
        <span class="team-name">Toluca</span><span class="goals">14 goals</span></div>
      <div data-player="1"><span class="player-name">Gignac</span>
        <span class="team-name">Tigres</span></div>
      <div class="player-row"><span class="team-name">Nobody</span></div>
    </body></html>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_fixtures() {
        let sel = PageSelectors::new().unwrap();
        let matches = sel.matches(FIXTURES_HTML, now(), "Liga MX");
        assert_eq!(matches.len(), 3);

        assert_eq!(matches[0].status, Some(MatchStatus::Finished));
        assert_eq!((matches[0].home_score, matches[0].away_score), (Some(2), Some(1)));

        assert_eq!(matches[1].status, Some(MatchStatus::Live));
        assert_eq!(matches[1].minute, Some(67));

        assert_eq!(matches[2].status, Some(MatchStatus::Upcoming));
        let kickoff = matches[2].match_date.unwrap();
        assert_eq!(kickoff.date_naive(), (now() + Duration::days(1)).date_naive());
        assert_eq!((kickoff.hour(), kickoff.minute()), (21, 5));
    }

    #[test]
    fn test_parse_table_skips_header_and_blank_rows() {
        let sel = PageSelectors::new().unwrap();
        let table = sel.standings(TABLE_HTML, "2024-25");
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].team_name.as_deref(), Some("Toluca"));
        assert_eq!(table[0].position, Some(1));
        assert_eq!(table[0].points, Some(39));
        assert_eq!(table[1].wins, Some(10));
        assert_eq!(table[1].position, Some(2));
    }

    #[test]
    fn test_parse_scorers() {
        let sel = PageSelectors::new().unwrap();
        let players = sel.players(SCORERS_HTML);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].goals, Some(14));
        assert_eq!(players[1].goals, Some(0));
        assert_eq!(players[1].team_name.as_deref(), Some("Tigres"));
    }

    #[test]
    fn test_live_minute() {
        assert_eq!(live_minute("67'"), Some(67));
        assert_eq!(live_minute("LIVE 45+2'"), Some(45));
        assert_eq!(live_minute("LIVE"), None);
    }

    #[test]
    fn test_unrecognised_kickoff_falls_back_to_now() {
        assert_eq!(parse_kickoff("Sat 5 Oct", now()), now());
    }

    #[tokio::test]
    async fn test_scrape_against_local_pages() {
        let app = Router::new().route(
            "/search",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                match q.get("q").map(String::as_str) {
                    Some(FIXTURES_QUERY) => FIXTURES_HTML,
                    Some(TABLE_QUERY) => TABLE_HTML,
                    _ => SCORERS_HTML,
                }
            }),
        );
        let addr = spawn_server(app).await;
        let fetcher = Fetcher::new(RetryPolicy::default(), std::time::Duration::from_secs(5)).unwrap();
        let source = SearchPageSource::new(
            fetcher,
            &format!("http://{}/search", addr),
            "2024-25",
            "Liga MX",
        )
        .unwrap();

        let data = source.scrape().await.unwrap();
        assert_eq!(data.matches.len(), 3);
        assert_eq!(data.standings.len(), 2);
        assert_eq!(data.players.len(), 2);
    }

    #[tokio::test]
    async fn test_scrape_fails_when_every_page_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = Fetcher::new(
            RetryPolicy {
                max_attempts: 1,
                base_delay: std::time::Duration::from_millis(1),
            },
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        let source =
            SearchPageSource::new(fetcher, &format!("http://{}/search", addr), "2024-25", "Liga MX")
                .unwrap();
        assert!(source.scrape().await.is_err());
    }
}
