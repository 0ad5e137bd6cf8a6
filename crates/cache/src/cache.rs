//! Displayed-location cache
//!
//! State tracker over tunnel transitions. Each transition first retires
//! any in-flight fetch, then derives the new displayed location and
//! decides whether a fresh fetch should start. Connectivity regained
//! while disconnected also triggers a refresh, without touching the
//! displayed value.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use geowatch_core::{ActionAfterDisconnect, GeoLocation, SelectedRelay, TunnelState};

use crate::fetch::FetchCoordinator;
use crate::lookup::LocationLookup;
use crate::store::LocationStore;

struct Tracker {
    state: TunnelState,
    selected_relay: SelectedRelay,
}

struct Inner {
    store: Arc<LocationStore>,
    coordinator: FetchCoordinator,
    tracker: Mutex<Tracker>,
}

/// Cache of the location currently displayed for the device.
///
/// Construction subscribes to the tunnel-state and connectivity streams;
/// [`LocationCache::teardown`] (also run on drop) unsubscribes and
/// retires any in-flight fetch.
pub struct LocationCache {
    inner: Arc<Inner>,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
}

impl LocationCache {
    /// Create the cache bound to one tunnel-state stream and one
    /// connectivity stream.
    pub fn new(
        lookup: Arc<dyn LocationLookup>,
        mut tunnel_rx: mpsc::Receiver<TunnelState>,
        mut connectivity_rx: mpsc::Receiver<bool>,
    ) -> Self {
        let store = Arc::new(LocationStore::new());
        let coordinator = FetchCoordinator::new(Arc::clone(&store), lookup);
        let inner = Arc::new(Inner {
            store,
            coordinator,
            tracker: Mutex::new(Tracker {
                state: TunnelState::Disconnected,
                selected_relay: SelectedRelay::Any,
            }),
        });

        let tunnel_inner = Arc::clone(&inner);
        let tunnel_task = tokio::spawn(async move {
            while let Some(state) = tunnel_rx.recv().await {
                tunnel_inner.apply_tunnel_state(state);
            }
        });

        let connectivity_inner = Arc::clone(&inner);
        let connectivity_task = tokio::spawn(async move {
            while let Some(connected) = connectivity_rx.recv().await {
                connectivity_inner.apply_connectivity(connected);
            }
        });

        Self {
            inner,
            subscriptions: Mutex::new(vec![tunnel_task, connectivity_task]),
        }
    }

    /// Apply a tunnel-state transition.
    ///
    /// Retires any in-flight fetch, updates the displayed location per
    /// the new state (notifying subscribers even when unchanged), and
    /// starts a refresh where the state calls for one.
    pub fn set_tunnel_state(&self, state: TunnelState) {
        self.inner.apply_tunnel_state(state);
    }

    /// Change the selected relay.
    ///
    /// Recomputes the relay-implied location on structural change;
    /// independent of tunnel state and never touches the displayed value
    /// directly.
    pub fn set_selected_relay(&self, relay: SelectedRelay) {
        self.inner.apply_selected_relay(relay);
    }

    /// The location currently displayed
    pub fn current_location(&self) -> Option<GeoLocation> {
        self.inner.store.current()
    }

    /// Result of the most recent successful real-location lookup
    pub fn last_known_real_location(&self) -> Option<GeoLocation> {
        self.inner.store.last_known_real()
    }

    /// Subscribe to displayed-location changes.
    ///
    /// The receiver observes the current value immediately; every
    /// subsequent write is delivered, with no deduplication.
    pub fn subscribe(&self) -> watch::Receiver<Option<GeoLocation>> {
        self.inner.store.subscribe()
    }

    /// Unsubscribe from both upstream streams and retire any in-flight
    /// fetch. Idempotent.
    pub fn teardown(&self) {
        let handles: Vec<_> = self.subscriptions.lock().drain(..).collect();
        if handles.is_empty() {
            return;
        }
        for handle in handles {
            handle.abort();
        }
        self.inner.coordinator.abort();
        debug!("location cache torn down");
    }
}

impl Drop for LocationCache {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Inner {
    // Each apply_* method holds the tracker lock for its whole body, the
    // start_fetch call included. Tunnel events, connectivity events, and
    // the public setters run on different tasks; without this a
    // connectivity check could observe Disconnected, lose the CPU to a
    // full Connected transition, and then start a real fetch against the
    // connected state.

    fn apply_tunnel_state(&self, state: TunnelState) {
        let mut tracker = self.tracker.lock();

        // A fetch started for the previous state may no longer commit.
        self.coordinator.cancel();

        debug!("tunnel state: {:?}", state);

        let displayed = match &state {
            TunnelState::Disconnected => self.store.last_known_real(),
            TunnelState::Connecting { location } => location.clone(),
            TunnelState::Connected { location } => Some(location.clone()),
            TunnelState::Disconnecting { after } => match after {
                ActionAfterDisconnect::Nothing => self.store.last_known_real(),
                ActionAfterDisconnect::Block => None,
                ActionAfterDisconnect::Reconnect => self.store.selected_relay_location(),
            },
            TunnelState::Error => None,
        };

        tracker.state = state.clone();
        self.store.set_displayed(displayed);

        match state {
            TunnelState::Disconnected => self.coordinator.start_fetch(true),
            TunnelState::Connected { .. } => self.coordinator.start_fetch(false),
            _ => {}
        }
    }

    fn apply_selected_relay(&self, relay: SelectedRelay) {
        let mut tracker = self.tracker.lock();
        if tracker.selected_relay == relay {
            return;
        }
        tracker.selected_relay = relay.clone();

        debug!("selected relay: {:?}", relay);
        self.store.set_selected_relay_location(relay.location());
    }

    fn apply_connectivity(&self, connected: bool) {
        if !connected {
            return;
        }
        let tracker = self.tracker.lock();
        if tracker.state.is_disconnected() {
            debug!("connectivity regained while disconnected, refreshing location");
            self.coordinator.start_fetch(true);
        }
    }
}
