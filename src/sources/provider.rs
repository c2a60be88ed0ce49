use anyhow::Result;
use async_trait::async_trait;

use super::models::ScrapedData;

/// Trait that every external data source must implement.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Scrape the source once and return its records.
    async fn scrape(&self) -> Result<ScrapedData>;

    /// Human-readable name for logging and configuration.
    fn name(&self) -> &str;
}
