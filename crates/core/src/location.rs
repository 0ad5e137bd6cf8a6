//! Geographic location values
//!
//! A `GeoLocation` is either the result of a real network lookup of the
//! device's current address, or a synthetic value derived from a selected
//! relay (no coordinates, relay hostname set where known).

use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// A geographic location as displayed to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees (if known)
    pub latitude: Option<f64>,
    /// Longitude in degrees (if known)
    pub longitude: Option<f64>,
    /// Country name (always present)
    pub country: String,
    /// City name (if known)
    pub city: Option<String>,
    /// Relay hostname (set when the value was derived from a selected relay)
    pub hostname: Option<String>,
}

impl GeoLocation {
    /// Create a location with only the country known
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            latitude: None,
            longitude: None,
            country: country.into(),
            city: None,
            hostname: None,
        }
    }

    /// Attach coordinates
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Attach a city name
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Attach a relay hostname
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Whether coordinates are known
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Serialize to JSON for IPC transport
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from JSON, rejecting locations without a country
    pub fn from_json(json: &str) -> Result<Self> {
        let location: Self = serde_json::from_str(json)?;
        if location.country.is_empty() {
            return Err(CoreError::EmptyCountry);
        }
        Ok(location)
    }
}
