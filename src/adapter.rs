//! The capability every protocol client shares, and the session state machine
//! used by clients that must be initialized before use.

use std::{future::Future, sync::Arc};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// A protocol client that can be probed for reachability.
///
/// Implemented by every client under [`protocols`](crate::protocols). The
/// [`HealthProber`](crate::compose::health::HealthProber) and the
/// [`Aggregator`](crate::compose::Aggregator) only see adapters through this trait.
pub trait ProtocolAdapter: Send + Sync {
    /// Component name used as the key in reports, e.g. `"jupiter"`.
    fn name(&self) -> &'static str;

    /// Performs the cheapest upstream call that proves the protocol is reachable.
    fn probe(&self) -> BoxFuture<'_, Result<()>>;
}

/// Two-state session: uninitialized, or initialized with a state `S`.
///
/// Reads fail fast with `InvalidState` before the first successful
/// [`initialize`](Self::initialize). Calling `initialize` again re-fetches and
/// replaces the state; a failed re-initialization keeps the previous state.
///
/// ```
/// use solsdk::adapter::Session;
///
/// # async fn example() -> solsdk::Result<()> {
/// let session: Session<u64> = Session::new("relay");
/// assert!(session.get("relay.balance").await.is_err());
///
/// session.initialize(|| async { Ok(42) }).await?;
/// assert_eq!(*session.get("relay.balance").await?, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session<S> {
    name: &'static str,
    state: RwLock<Option<Arc<S>>>,
}

impl<S> Session<S> {
    /// Creates an uninitialized session for the named protocol.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(None),
        }
    }

    /// Runs `init` and stores its output as the session state.
    pub async fn initialize<F, Fut>(&self, init: F) -> Result<Arc<S>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S>>,
    {
        let state = Arc::new(init().await?);
        let previous = self.state.write().await.replace(state.clone());
        if previous.is_some() {
            log::debug!("{}: session re-initialized", self.name);
        }
        Ok(state)
    }

    /// Returns the current state, or `InvalidState` when uninitialized.
    pub async fn get(&self, operation: &'static str) -> Result<Arc<S>> {
        self.state.read().await.clone().ok_or_else(|| {
            Error::invalid_state(operation, format!("{} is not initialized", self.name))
        })
    }

    /// Whether [`initialize`](Self::initialize) has succeeded at least once.
    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.is_some()
    }
}
