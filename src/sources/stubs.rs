use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::models::ScrapedData;
use super::provider::DataSource;

/// A source whose terms of service or bot protection rule out scraping.
///
/// It always yields an empty result. Swapping in a licensed API client means
/// writing another `DataSource`; the aggregator does not change.
pub struct InertSource {
    name: &'static str,
    reason: &'static str,
}

impl InertSource {
    pub fn espn() -> Self {
        InertSource {
            name: "ESPN",
            reason: "direct scraping not permitted, API access required",
        }
    }

    pub fn flashscore() -> Self {
        InertSource {
            name: "Flashscore",
            reason: "anti-bot protection",
        }
    }

    pub fn soccerway() -> Self {
        InertSource {
            name: "Soccerway",
            reason: "anti-bot protection",
        }
    }
}

#[async_trait]
impl DataSource for InertSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn scrape(&self) -> Result<ScrapedData> {
        debug!("{}: skipped ({})", self.name, self.reason);
        Ok(ScrapedData::default())
    }
}
