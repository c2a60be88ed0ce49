use clap::Parser;
use std::time::Duration;

use crate::sources::RetryPolicy;

/// Names accepted by `--primary-source`
pub const KNOWN_SOURCES: [&str; 5] = ["ESPN", "Flashscore", "Soccerway", "synthetic", "google-sports"];

/// Liga MX data feed: scrapes, reconciles and serves fixtures, standings and scorers
#[derive(Parser, Debug, Clone)]
#[command(name = "ligamx-feed", version, about)]
pub struct Config {
    /// HTTP listen port
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// HTTP listen host
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// Background refresh period in seconds
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "1800")]
    pub refresh_interval_secs: u64,

    /// Turn off the periodic primary-source refresh
    #[arg(long, env = "DISABLE_BACKGROUND_REFRESH", default_value = "false")]
    pub disable_background_refresh: bool,

    /// Attempts per HTTP fetch before giving up
    #[arg(long, env = "FETCH_MAX_ATTEMPTS", default_value = "3")]
    pub fetch_max_attempts: u32,

    /// Base backoff between fetch attempts (ms, grows linearly)
    #[arg(long, env = "FETCH_BACKOFF_MS", default_value = "1000")]
    pub fetch_backoff_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// Season label applied when a source omits it
    #[arg(long, env = "SEASON", default_value = "2024-25")]
    pub season: String,

    /// Competition label applied when a source omits it
    #[arg(long, env = "COMPETITION", default_value = "Liga MX")]
    pub competition: String,

    /// Fixed seed for the synthetic source (reproducible output)
    #[arg(long, env = "GENERATOR_SEED")]
    pub generator_seed: Option<u64>,

    /// Source used by the background refresh
    #[arg(long, env = "PRIMARY_SOURCE", default_value = "google-sports")]
    pub primary_source: String,

    /// Search page endpoint for the google-sports source
    #[arg(
        long,
        env = "SEARCH_BASE_URL",
        default_value = "https://www.google.com/search"
    )]
    pub search_base_url: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fetch_max_attempts == 0 {
            anyhow::bail!("fetch_max_attempts must be at least 1");
        }
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be positive");
        }
        if self.season.trim().is_empty() {
            anyhow::bail!("season must not be empty");
        }
        if self.competition.trim().is_empty() {
            anyhow::bail!("competition must not be empty");
        }
        if let Err(e) = url::Url::parse(&self.search_base_url) {
            anyhow::bail!("search_base_url {:?} is not a valid URL: {}", self.search_base_url, e);
        }
        if !KNOWN_SOURCES
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&self.primary_source))
        {
            anyhow::bail!(
                "unknown primary_source {:?} (expected one of: {})",
                self.primary_source,
                KNOWN_SOURCES.join(", ")
            );
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch_max_attempts,
            base_delay: Duration::from_millis(self.fetch_backoff_ms),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["ligamx-feed"];
        argv.extend_from_slice(args);
        Config::parse_from(argv)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = parse(&[]);
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_interval(), Duration::from_secs(1800));
        assert_eq!(config.retry_policy().max_attempts, 3);
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse(&["--fetch-max-attempts", "0"]).validate().is_err());
        assert!(parse(&["--refresh-interval-secs", "0"]).validate().is_err());
        assert!(parse(&["--season", " "]).validate().is_err());
        assert!(parse(&["--search-base-url", "not a url"]).validate().is_err());
        assert!(parse(&["--primary-source", "bbc"]).validate().is_err());
    }

    #[test]
    fn test_primary_source_is_case_insensitive() {
        assert!(parse(&["--primary-source", "Synthetic"]).validate().is_ok());
        assert!(parse(&["--primary-source", "espn"]).validate().is_ok());
    }
}
