//! GeoWatch Location Cache
//!
//! Tracks the location currently displayed for a device behind a VPN
//! tunnel, refreshing it from a slow external lookup without ever letting
//! a stale refresh overwrite newer state.
//!
//! ## Components
//!
//! - **backoff**: deterministic retry schedule for failed lookups
//! - **FetchGuard**: generation tokens that retire in-flight fetches
//! - **LocationStore**: displayed location with change notifications
//! - **FetchCoordinator**: owns the lookup retry loop and its task
//! - **LocationCache**: state tracker driven by tunnel and connectivity
//!   events
//!
//! Cancellation is cooperative throughout: superseding a fetch never
//! interrupts its sleep or its lookup call, it only prevents the eventual
//! result from being committed.

pub mod backoff;
mod cache;
mod fetch;
mod generation;
mod lookup;
mod store;

pub use cache::LocationCache;
pub use fetch::FetchCoordinator;
pub use generation::FetchGuard;
pub use lookup::LocationLookup;
pub use store::LocationStore;
