//! Displayed-location store with change notifications
//!
//! Wraps a watch channel so every write notifies subscribers, including
//! writes that leave the value unchanged, and so a new subscriber sees
//! the current value immediately. Also remembers the last real lookup
//! result and the location implied by the selected relay, which feed the
//! displayed value on certain tunnel transitions.

use geowatch_core::GeoLocation;
use parking_lot::Mutex;
use tokio::sync::watch;

/// Holds the displayed location and the two remembered locations that
/// feed it.
pub struct LocationStore {
    displayed: watch::Sender<Option<GeoLocation>>,
    last_known_real: Mutex<Option<GeoLocation>>,
    selected_relay: Mutex<Option<GeoLocation>>,
}

impl LocationStore {
    pub fn new() -> Self {
        let (displayed, _) = watch::channel(None);
        Self {
            displayed,
            last_known_real: Mutex::new(None),
            selected_relay: Mutex::new(None),
        }
    }

    /// Replace the displayed location.
    ///
    /// Every subscriber is notified, even when the new value equals the
    /// old one.
    pub fn set_displayed(&self, location: Option<GeoLocation>) {
        self.displayed.send_replace(location);
    }

    /// The location currently displayed
    pub fn current(&self) -> Option<GeoLocation> {
        self.displayed.borrow().clone()
    }

    /// Subscribe to displayed-location changes.
    ///
    /// The receiver observes the current value immediately via
    /// [`watch::Receiver::borrow`].
    pub fn subscribe(&self) -> watch::Receiver<Option<GeoLocation>> {
        self.displayed.subscribe()
    }

    /// Result of the most recent successful real-location lookup.
    ///
    /// Never cleared, only overwritten.
    pub fn last_known_real(&self) -> Option<GeoLocation> {
        self.last_known_real.lock().clone()
    }

    pub fn set_last_known_real(&self, location: GeoLocation) {
        *self.last_known_real.lock() = Some(location);
    }

    /// Synthetic location implied by the currently selected relay
    pub fn selected_relay_location(&self) -> Option<GeoLocation> {
        self.selected_relay.lock().clone()
    }

    pub fn set_selected_relay_location(&self, location: Option<GeoLocation>) {
        *self.selected_relay.lock() = location;
    }
}
