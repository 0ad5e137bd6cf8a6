//! Tunnel connection states
//!
//! The phases a VPN tunnel moves through, as reported by the daemon's
//! state machine. `Connecting` and `Connected` carry the location of the
//! relay endpoint when the daemon knows it; `Disconnecting` carries the
//! action the firewall takes once the tunnel is fully down.

use serde::{Deserialize, Serialize};

use crate::GeoLocation;

/// What happens after the tunnel finishes disconnecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionAfterDisconnect {
    /// Return to the unprotected network
    Nothing,
    /// Block all traffic until further notice
    Block,
    /// Reconnect to the selected relay
    Reconnect,
}

/// Current phase of the VPN tunnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TunnelState {
    /// No tunnel, traffic flows unprotected
    Disconnected,
    /// Tunnel is being established
    Connecting { location: Option<GeoLocation> },
    /// Tunnel is up
    Connected { location: GeoLocation },
    /// Tunnel is being torn down
    Disconnecting { after: ActionAfterDisconnect },
    /// Tunnel failed; traffic is blocked
    Error,
}

impl TunnelState {
    /// True when the tunnel is fully down with no pending action
    pub fn is_disconnected(&self) -> bool {
        matches!(self, TunnelState::Disconnected)
    }

    /// True when the tunnel is up
    pub fn is_connected(&self) -> bool {
        matches!(self, TunnelState::Connected { .. })
    }
}
