//! Combining independent upstream calls into one logical result.
//!
//! The [`Aggregator`] runs a fixed set of branches concurrently and waits for
//! all of them to settle. A branch that fails, panics or times out becomes a
//! [`ProtocolResult::Failure`]; it never cancels or blocks its siblings, and the
//! caller always receives one entry per requested name.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use futures::FutureExt;
//! use solsdk::{Error, compose::Aggregator};
//!
//! # async fn example() {
//! let aggregator = Aggregator::new(Duration::from_secs(5));
//! let report = aggregator
//!     .aggregate([
//!         ("jupiter", async { Err(Error::not_found("jupiter.price", "no price")) }.boxed()),
//!         ("pyth", async { Ok(145) }.boxed()),
//!     ])
//!     .await;
//!
//! assert_eq!(report.len(), 2);
//! assert!(report.get("jupiter").unwrap().is_failure());
//! assert_eq!(report.get("pyth").unwrap().data(), Some(&145));
//! # }
//! ```

pub mod cache;
pub mod health;

use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet},
    future::Future,
    panic::AssertUnwindSafe,
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::{FutureExt, future::join_all};
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind, Result};

/// Outcome of one branch. Exactly one variant is populated.
///
/// Serializes as `{"status": "success", "data": ...}` or
/// `{"status": "failure", "kind": "not_found", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProtocolResult<T> {
    /// The branch produced a value.
    Success { data: T },
    /// The branch failed; `kind` classifies why.
    Failure { kind: ErrorKind, message: String },
}

impl<T> ProtocolResult<T> {
    /// Whether the branch succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the branch failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// The value, if the branch succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// The failure kind, if the branch failed.
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Maps the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProtocolResult<U> {
        match self {
            Self::Success { data } => ProtocolResult::Success { data: f(data) },
            Self::Failure { kind, message } => ProtocolResult::Failure { kind, message },
        }
    }
}

impl<T> From<Result<T>> for ProtocolResult<T> {
    fn from(value: Result<T>) -> Self {
        match value {
            Ok(data) => Self::Success { data },
            Err(err) => Self::Failure {
                kind: err.kind(),
                message: format!("{}: {}", err.operation(), err.message()),
            },
        }
    }
}

/// Per-branch results of one aggregate call.
///
/// The key set is exactly the set of names that were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport<T> {
    /// Branch name to outcome.
    pub results: BTreeMap<String, ProtocolResult<T>>,
    /// When the report was assembled.
    pub timestamp: DateTime<Utc>,
}

impl<T> AggregateReport<T> {
    /// Outcome of one branch.
    pub fn get(&self, name: &str) -> Option<&ProtocolResult<T>> {
        self.results.get(name)
    }

    /// Number of branches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no branch was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates over successful branches.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.results
            .iter()
            .filter_map(|(name, result)| Some((name.as_str(), result.data()?)))
    }

    /// Iterates over failed branches with their kind.
    pub fn failures(&self) -> impl Iterator<Item = (&str, ErrorKind)> {
        self.results
            .iter()
            .filter_map(|(name, result)| Some((name.as_str(), result.failure_kind()?)))
    }
}

/// Settle-all fan-out with a per-branch timeout.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    timeout: Duration,
}

impl Aggregator {
    /// Creates an aggregator whose branches are each bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the per-branch timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs a single branch to completion and captures its outcome.
    ///
    /// Errors keep their kind, panics become `Unknown` and a timeout becomes
    /// `UpstreamUnavailable`. This never panics and never returns early.
    pub async fn settle<T, F>(&self, name: &str, branch: F) -> ProtocolResult<T>
    where
        F: Future<Output = Result<T>>,
    {
        let guarded = AssertUnwindSafe(branch).catch_unwind();
        let outcome = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(Error::new(
                ErrorKind::Unknown,
                "aggregate",
                format!("{name} panicked: {}", panic_message(panic.as_ref())),
            )),
            Err(_) => Err(Error::new(
                ErrorKind::UpstreamUnavailable,
                "aggregate",
                format!("{name} timed out after {:?}", self.timeout),
            )),
        };

        match &outcome {
            Ok(_) => log::debug!("{name}: ok"),
            Err(err) => log::warn!("{name}: {err}"),
        }
        outcome.into()
    }

    /// Runs every named branch concurrently and returns once all have settled.
    ///
    /// Branches of different concrete types can be passed as
    /// [`BoxFuture`](futures::future::BoxFuture)s. A name given twice keeps only
    /// its first branch.
    pub async fn aggregate<T, N, F, I>(&self, branches: I) -> AggregateReport<T>
    where
        I: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Future<Output = Result<T>>,
    {
        let mut seen = BTreeSet::new();
        let pending: Vec<_> = branches
            .into_iter()
            .filter_map(|(name, branch)| {
                let name: String = name.into();
                if !seen.insert(name.clone()) {
                    log::warn!("{name}: duplicate branch ignored");
                    return None;
                }
                Some(async move {
                    let result = self.settle(&name, branch).await;
                    (name, result)
                })
            })
            .collect();

        AggregateReport {
            results: join_all(pending).await.into_iter().collect(),
            timestamp: Utc::now(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("opaque panic payload")
}
