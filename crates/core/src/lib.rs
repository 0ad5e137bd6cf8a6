//! GeoWatch Core Types
//!
//! This crate defines the fundamental data structures shared by the
//! GeoWatch location cache and its embedding daemons.

mod error;
mod location;
mod relay;
mod tunnel;

pub use error::*;
pub use location::*;
pub use relay::*;
pub use tunnel::*;
