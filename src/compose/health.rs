//! Reachability checks across a fixed set of components.

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Aggregator;
use crate::adapter::ProtocolAdapter;

/// Reachability of each component plus the fraction that answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Component name to reachability.
    pub components: BTreeMap<String, bool>,
    /// Reachable count over component count, in `[0, 1]`. `0.0` when empty.
    pub overall: f64,
    /// When the report was assembled.
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Builds a report from per-component reachability.
    pub fn new(components: BTreeMap<String, bool>) -> Self {
        let overall = if components.is_empty() {
            0.0
        } else {
            let up = components.values().filter(|up| **up).count();
            up as f64 / components.len() as f64
        };
        Self {
            components,
            overall,
            timestamp: Utc::now(),
        }
    }

    /// Whether every component answered. False for an empty report.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        !self.components.is_empty() && self.components.values().all(|up| *up)
    }

    /// Names of unreachable components.
    pub fn unreachable(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .filter(|(_, up)| !**up)
            .map(|(name, _)| name.as_str())
    }
}

/// Probes adapters and downgrades every failure to `false`.
#[derive(Debug, Clone, Copy)]
pub struct HealthProber {
    aggregator: Aggregator,
}

impl HealthProber {
    /// Creates a prober whose probes are each bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            aggregator: Aggregator::new(timeout),
        }
    }

    /// Probes one component. Errors, panics and timeouts all yield `false`.
    pub async fn probe(&self, component: &dyn ProtocolAdapter) -> bool {
        self.aggregator
            .settle(component.name(), component.probe())
            .await
            .is_success()
    }

    /// Probes every component concurrently.
    pub async fn check(&self, components: &[&dyn ProtocolAdapter]) -> HealthReport {
        let report = self
            .aggregator
            .aggregate(components.iter().map(|c| (c.name(), c.probe())))
            .await;
        HealthReport::new(
            report
                .results
                .into_iter()
                .map(|(name, result)| (name, result.is_success()))
                .collect(),
        )
    }
}
