//! Outcome meters for operation execution.
//!
//! Operations report each terminal outcome to a [`MetricsSink`] passed in by
//! the caller. Meters are named `<prefix>.<category>.<reason>`, for example
//! `op-new-trade.invalid.sell-no-issuer` or `op-new-trade.success.apply`.
//!
//! Marking a meter is fire-and-forget: it never fails and never influences
//! the operation.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use newtrade_common::config::{MetricsConfig, DEFAULT_METRICS_PREFIX};

/// Meter category for outcomes rejected by validation or resolution.
pub const CATEGORY_INVALID: &str = "invalid";
/// Meter category for successful applications.
pub const CATEGORY_SUCCESS: &str = "success";

/// Receiver of outcome meters.
pub trait MetricsSink: Send + Sync {
    /// Mark one occurrence of `<category>.<reason>`.
    fn mark(&self, category: &str, reason: &str);
}

/// Sink that drops every meter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn mark(&self, _category: &str, _reason: &str) {}
}

/// Sink that counts meters by full name.
#[derive(Debug)]
pub struct CountingMetrics {
    prefix: String,
    counts: Mutex<BTreeMap<String, u64>>,
}

impl CountingMetrics {
    /// Create a counting sink with the given name prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counts: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a counting sink using the configured prefix.
    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.prefix.clone())
    }

    /// Full meter name for a category and reason.
    pub fn meter_name(&self, category: &str, reason: &str) -> String {
        format!("{}.{}.{}", self.prefix, category, reason)
    }

    /// Count recorded for a full meter name.
    pub fn count(&self, name: &str) -> u64 {
        self.counts.lock().get(name).copied().unwrap_or(0)
    }

    /// Sum of every recorded meter.
    pub fn total(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    /// Copy of all counts, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts.lock().clone()
    }
}

impl Default for CountingMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_PREFIX)
    }
}

impl MetricsSink for CountingMetrics {
    fn mark(&self, category: &str, reason: &str) {
        let name = self.meter_name(category, reason);
        *self.counts.lock().entry(name).or_insert(0) += 1;
    }
}

/// Build the sink described by the `[metrics]` configuration.
///
/// Disabled metrics yield a [`NoopMetrics`].
pub fn sink_from_config(config: &MetricsConfig) -> Box<dyn MetricsSink> {
    if config.enabled {
        Box::new(CountingMetrics::from_config(config))
    } else {
        Box::new(NoopMetrics)
    }
}
