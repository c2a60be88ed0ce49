//! Fetch → aggregate → reconcile → persist.
//!
//! Two entry points share one run guard so that runs never interleave:
//! [`Pipeline::run_full`] (all sources, used by `POST /api/scrape`) waits for
//! any in-flight run, while [`Pipeline::refresh_primary`] (single primary
//! source, used by the timer) gives up if a run is already going.

use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::reconcile::{RecordCounts, RecordDefaults, Reconciler, TeamRegistry};
use crate::sources::{aggregate, fetch_all, DataSource, ScrapedData};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Aggregating,
    Reconciling,
    Persisting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Fetching => "fetching",
            Phase::Aggregating => "aggregating",
            Phase::Reconciling => "reconciling",
            Phase::Persisting => "persisting",
        };
        f.write_str(label)
    }
}

/// Result of one full run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrapeSummary {
    /// Records left after cross-source dedup
    pub scraped: RecordCounts,
    /// Records that resolved, validated and were stored
    pub persisted: RecordCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another run held the guard
    Skipped,
    /// Primary source returned nothing; stored data left untouched
    Empty,
    Refreshed(RecordCounts),
}

pub struct Pipeline {
    sources: Vec<Arc<dyn DataSource>>,
    primary: Arc<dyn DataSource>,
    store: Store,
    defaults: RecordDefaults,
    run_guard: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        sources: Vec<Arc<dyn DataSource>>,
        primary: Arc<dyn DataSource>,
        store: Store,
        defaults: RecordDefaults,
    ) -> Self {
        Pipeline {
            sources,
            primary,
            store,
            defaults,
            run_guard: Mutex::new(()),
        }
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    fn registry(&self) -> Result<TeamRegistry> {
        let registry = TeamRegistry::new(self.store.teams());
        if registry.is_empty() {
            bail!("canonical team registry is empty");
        }
        Ok(registry)
    }

    fn enter(&self, phase: Phase) {
        debug!("Pipeline → {}", phase);
    }

    /// Run every configured source and replace the stored data with the result.
    pub async fn run_full(&self) -> Result<ScrapeSummary> {
        let _guard = self.run_guard.lock().await;
        let registry = self.registry()?;

        self.enter(Phase::Fetching);
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        info!("Scraping {} source(s): {}", names.len(), names.join(", "));
        let results = fetch_all(&self.sources).await;

        self.enter(Phase::Aggregating);
        let data = aggregate(&self.sources, results);
        let scraped = RecordCounts::of(&data);
        info!(
            "Aggregated {} matches, {} standings, {} players",
            scraped.matches, scraped.standings, scraped.players
        );

        self.store.clear_all_data();
        let persisted = self.reconcile_and_persist(&registry, &data);

        self.enter(Phase::Idle);
        Ok(ScrapeSummary { scraped, persisted })
    }

    /// Re-scrape the primary source only. An empty result keeps existing data.
    pub async fn refresh_primary(&self) -> Result<RefreshOutcome> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            return Ok(RefreshOutcome::Skipped);
        };
        let registry = self.registry()?;

        self.enter(Phase::Fetching);
        let primary = std::slice::from_ref(&self.primary);
        let results = fetch_all(primary).await;

        self.enter(Phase::Aggregating);
        let data = aggregate(primary, results);
        if data.is_empty() {
            self.enter(Phase::Idle);
            return Ok(RefreshOutcome::Empty);
        }

        self.store.clear_all_data();
        let persisted = self.reconcile_and_persist(&registry, &data);

        self.enter(Phase::Idle);
        Ok(RefreshOutcome::Refreshed(persisted))
    }

    fn reconcile_and_persist(&self, registry: &TeamRegistry, data: &ScrapedData) -> RecordCounts {
        self.enter(Phase::Reconciling);
        debug!("Matching against {} canonical teams", registry.len());
        let reconciler = Reconciler::new(registry, &self.defaults);

        self.enter(Phase::Persisting);
        let report = reconciler.persist(data, &self.store);
        info!(
            "Persisted {} matches, {} standings, {} players ({} unresolved, {} invalid)",
            report.persisted.matches,
            report.persisted.standings,
            report.persisted.players,
            report.unresolved,
            report.invalid
        );
        let (matches, standings, players) = self.store.counts();
        debug!("Store holds {} matches, {} standings, {} players", matches, standings, players);
        report.persisted
    }

    /// Spawn the periodic primary-source refresh. First tick fires after one period.
    pub fn start_background_refresh(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match self.refresh_primary().await {
                    Ok(RefreshOutcome::Refreshed(counts)) => info!(
                        "Background refresh ({}): {} matches, {} standings, {} players",
                        self.primary_name(),
                        counts.matches,
                        counts.standings,
                        counts.players
                    ),
                    Ok(RefreshOutcome::Empty) => info!(
                        "Background refresh ({}): no data, keeping current records",
                        self.primary_name()
                    ),
                    Ok(RefreshOutcome::Skipped) => {
                        debug!("Background refresh skipped: run already in progress")
                    }
                    Err(e) => error!("Background refresh failed: {:#}", e),
                }
            }
        })
    }
}
