//! Fetch coordinator
//!
//! Owns the lookup retry loop. A new fetch claims a generation token,
//! waits for the previous fetch task to wind down, then alternates
//! backoff sleeps with lookup attempts until it either obtains a
//! location or discovers it has been superseded. Superseded tasks are
//! never interrupted; they simply fail the token check and exit without
//! committing.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::backoff;
use crate::generation::FetchGuard;
use crate::lookup::LocationLookup;
use crate::store::LocationStore;

/// Starts, serializes, and retires location fetches.
pub struct FetchCoordinator {
    guard: Arc<FetchGuard>,
    store: Arc<LocationStore>,
    lookup: Arc<dyn LocationLookup>,
    /// Task of the most recently started fetch
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FetchCoordinator {
    pub fn new(store: Arc<LocationStore>, lookup: Arc<dyn LocationLookup>) -> Self {
        Self {
            guard: Arc::new(FetchGuard::new()),
            store,
            lookup,
            handle: Mutex::new(None),
        }
    }

    /// Start a new fetch, superseding any fetch already in flight.
    ///
    /// `real` marks the result as a real-world lookup, to be remembered
    /// as the last known real location, rather than a relay-implied one.
    pub fn start_fetch(&self, real: bool) {
        let token = self.guard.begin();
        trace!("starting fetch {} (real: {})", token, real);

        let guard = Arc::clone(&self.guard);
        let store = Arc::clone(&self.store);
        let lookup = Arc::clone(&self.lookup);

        let mut handle = self.handle.lock();
        let previous = handle.take();
        *handle = Some(tokio::spawn(run_fetch(
            guard, store, lookup, token, real, previous,
        )));
    }

    /// Retire the in-flight fetch without stopping its task.
    ///
    /// The task keeps sleeping or waiting on its lookup, but its result
    /// can no longer be committed.
    pub fn cancel(&self) {
        self.guard.cancel();
    }

    /// Teardown path: retire the in-flight fetch and abort its task.
    pub fn abort(&self) {
        self.guard.cancel();
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

async fn run_fetch(
    guard: Arc<FetchGuard>,
    store: Arc<LocationStore>,
    lookup: Arc<dyn LocationLookup>,
    token: u64,
    real: bool,
    previous: Option<JoinHandle<()>>,
) {
    // Serialize with the previous fetch so at most one lookup loop runs
    // at a time and commits happen in start order.
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let mut retries = 0u32;
    let mut located = None;

    while located.is_none() && guard.is_current(token) {
        tokio::time::sleep(backoff::delay(retries)).await;
        retries += 1;

        located = lookup.current_location().await;
        if located.is_none() {
            trace!("fetch {} attempt {} returned no location", token, retries);
        }
    }

    let location = match located {
        Some(location) => location,
        None => {
            debug!("fetch {} superseded before obtaining a location", token);
            return;
        }
    };

    let committed = guard.commit_if_current(token, || {
        if real {
            store.set_last_known_real(location.clone());
        }
        store.set_displayed(Some(location.clone()));
    });

    if committed {
        debug!("fetch {} committed location: {}", token, location.country);
    } else {
        debug!("fetch {} superseded, result discarded", token);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use geowatch_core::GeoLocation;
    use tokio::sync::Semaphore;

    use super::*;

    /// Lookup that blocks until the test releases a permit, then yields
    /// the next scripted result.
    struct GatedLookup {
        gate: Semaphore,
        results: Mutex<VecDeque<Option<GeoLocation>>>,
        started: AtomicUsize,
    }

    impl GatedLookup {
        fn new() -> Self {
            Self {
                gate: Semaphore::new(0),
                results: Mutex::new(VecDeque::new()),
                started: AtomicUsize::new(0),
            }
        }

        fn started(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }

        /// Let one blocked lookup call resolve to `result`.
        fn release(&self, result: Option<GeoLocation>) {
            self.results.lock().push_back(result);
            self.gate.add_permits(1);
        }
    }

    #[async_trait]
    impl LocationLookup for GatedLookup {
        async fn current_location(&self) -> Option<GeoLocation> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
            self.results.lock().pop_front().flatten()
        }
    }

    /// Spin until the gated lookup has begun `n` calls.
    async fn wait_for_started(lookup: &GatedLookup, n: usize) {
        while lookup.started() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_fetch_commits() {
        let store = Arc::new(LocationStore::new());
        let lookup = Arc::new(GatedLookup::new());
        let coordinator = FetchCoordinator::new(Arc::clone(&store), lookup.clone());

        coordinator.start_fetch(true);
        wait_for_started(&lookup, 1).await;
        lookup.release(Some(GeoLocation::new("Sweden")));

        let mut rx = store.subscribe();
        rx.wait_for(|loc| loc.is_some()).await.unwrap();

        assert_eq!(store.current().unwrap().country, "Sweden");
        assert_eq!(store.last_known_real().unwrap().country, "Sweden");
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_fetch_does_not_touch_last_known_real() {
        let store = Arc::new(LocationStore::new());
        let lookup = Arc::new(GatedLookup::new());
        let coordinator = FetchCoordinator::new(Arc::clone(&store), lookup.clone());

        coordinator.start_fetch(false);
        wait_for_started(&lookup, 1).await;
        lookup.release(Some(GeoLocation::new("Sweden")));

        let mut rx = store.subscribe();
        rx.wait_for(|loc| loc.is_some()).await.unwrap();

        assert_eq!(store.current().unwrap().country, "Sweden");
        assert_eq!(store.last_known_real(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_null_results_are_retried_with_backoff() {
        let store = Arc::new(LocationStore::new());
        let lookup = Arc::new(GatedLookup::new());
        let coordinator = FetchCoordinator::new(Arc::clone(&store), lookup.clone());

        coordinator.start_fetch(true);
        wait_for_started(&lookup, 1).await;
        lookup.release(None);
        wait_for_started(&lookup, 2).await;
        lookup.release(None);
        wait_for_started(&lookup, 3).await;
        lookup.release(Some(GeoLocation::new("Norway")));

        let mut rx = store.subscribe();
        rx.wait_for(|loc| loc.is_some()).await.unwrap();
        assert_eq!(store.current().unwrap().country, "Norway");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fetch_result_is_discarded() {
        let store = Arc::new(LocationStore::new());
        let lookup = Arc::new(GatedLookup::new());
        let coordinator = FetchCoordinator::new(Arc::clone(&store), lookup.clone());

        // Fetch A blocks in its lookup call.
        coordinator.start_fetch(true);
        wait_for_started(&lookup, 1).await;

        // Fetch B supersedes A while A's lookup is unresolved.
        coordinator.start_fetch(true);

        // A resolves; its token is retired, so nothing may be committed.
        lookup.release(Some(GeoLocation::new("Stale")));
        wait_for_started(&lookup, 2).await;
        assert_eq!(store.current(), None);
        assert_eq!(store.last_known_real(), None);

        // B resolves and commits normally.
        lookup.release(Some(GeoLocation::new("Fresh")));
        let mut rx = store.subscribe();
        rx.wait_for(|loc| loc.is_some()).await.unwrap();
        assert_eq!(store.current().unwrap().country, "Fresh");
        assert_eq!(store.last_known_real().unwrap().country, "Fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_fetch_waits_for_previous_task() {
        let store = Arc::new(LocationStore::new());
        let lookup = Arc::new(GatedLookup::new());
        let coordinator = FetchCoordinator::new(Arc::clone(&store), lookup.clone());

        coordinator.start_fetch(true);
        wait_for_started(&lookup, 1).await;

        // B must not begin its first lookup while A is still running,
        // no matter how much time passes.
        coordinator.start_fetch(true);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(lookup.started(), 1);

        // Once A winds down, B proceeds.
        lookup.release(None);
        wait_for_started(&lookup, 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_retry_loop() {
        let store = Arc::new(LocationStore::new());
        let lookup = Arc::new(GatedLookup::new());
        let coordinator = FetchCoordinator::new(Arc::clone(&store), lookup.clone());

        coordinator.start_fetch(true);
        wait_for_started(&lookup, 1).await;
        coordinator.cancel();

        // The blocked attempt resolves to nothing; the retired loop must
        // not try again.
        lookup.release(None);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(lookup.started(), 1);
        assert_eq!(store.current(), None);
    }
}
