use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod pipeline;
mod reconcile;
mod sources;
mod store;
#[cfg(test)]
mod test_support;

use api::AppState;
use config::Config;
use pipeline::Pipeline;
use reconcile::RecordDefaults;
use sources::{DataSource, Fetcher, InertSource, SearchPageSource, SyntheticSource};
use store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let store = Store::seeded();
    info!("Canonical registry loaded: {} teams", store.teams().len());

    let fetcher = Fetcher::new(config.retry_policy(), config.fetch_timeout())?;
    info!(
        "Fetcher: {} attempt(s), {:?} base backoff, {:?} timeout",
        fetcher.policy().max_attempts,
        fetcher.policy().base_delay,
        config.fetch_timeout()
    );

    // Sources merged by /api/scrape, in precedence order for dedup.
    let sources: Vec<Arc<dyn DataSource>> = vec![
        Arc::new(InertSource::espn()),
        Arc::new(InertSource::flashscore()),
        Arc::new(InertSource::soccerway()),
        Arc::new(SyntheticSource::new(
            config.generator_seed,
            &config.season,
            &config.competition,
        )),
    ];
    let search: Arc<dyn DataSource> = Arc::new(SearchPageSource::new(
        fetcher,
        &config.search_base_url,
        &config.season,
        &config.competition,
    )?);

    let primary = sources
        .iter()
        .chain(std::iter::once(&search))
        .find(|s| s.name().eq_ignore_ascii_case(&config.primary_source))
        .cloned()
        .with_context(|| format!("primary source {:?} not configured", config.primary_source))?;
    info!(
        "Configured {} source(s); background refresh uses '{}'",
        sources.len(),
        primary.name()
    );

    let defaults = RecordDefaults {
        season: config.season.clone(),
        competition: config.competition.clone(),
    };
    let pipeline = Arc::new(Pipeline::new(sources, primary, store.clone(), defaults));

    if config.disable_background_refresh {
        info!("Background refresh disabled");
    } else {
        info!(
            "Background refresh every {}s",
            config.refresh_interval().as_secs()
        );
        pipeline.clone().start_background_refresh(config.refresh_interval());
    }

    let app = api::router(AppState { store, pipeline });
    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen_addr()))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on http://{}", addr);

    // Serve until shutdown
    axum::serve(listener, app).await?;

    Ok(())
}
