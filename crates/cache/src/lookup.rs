//! External geolocation lookup boundary

use async_trait::async_trait;
use geowatch_core::GeoLocation;

/// Asynchronous geolocation lookup of the device's current address.
///
/// The call may take arbitrarily long. `None` uniformly means "no
/// location this time, try again" — the cache does not distinguish a
/// miss from a transient failure.
#[async_trait]
pub trait LocationLookup: Send + Sync {
    async fn current_location(&self) -> Option<GeoLocation>;
}
