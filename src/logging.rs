use crate::config::LoggingConfig;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over the
/// configured level. Returns false when a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

/// Timer for one query; emits the summary line on the `query_log` target.
/// Filter text can name restricted attributes, so it only goes out at debug.
pub struct QueryLog {
    start: Instant,
    enabled: bool,
    filter: Option<String>,
    start_index: usize,
    count: usize,
}

impl QueryLog {
    pub fn start(enabled: bool, filter: Option<&str>, start_index: usize, count: usize) -> Self {
        Self {
            start: Instant::now(),
            enabled,
            filter: filter.map(str::to_string),
            start_index,
            count,
        }
    }

    /// `sort` is the order actually applied, after any fallback
    pub fn finish(self, sort: &str, total: usize, returned: usize) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_millis();

        info!(target: "query_log", "{}", self.summary(sort, total, returned, elapsed_ms));
        if let Some(filter) = &self.filter {
            debug!(target: "query_log", "filter: {}", filter);
        }
    }

    fn summary(&self, sort: &str, total: usize, returned: usize, elapsed_ms: u128) -> String {
        format!(
            "{} filtered={} sort={} startIndex={} count={} total={} returned={} {}ms",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            self.filter.is_some(),
            sort,
            self.start_index,
            self.count,
            total,
            returned,
            elapsed_ms
        )
    }
}
