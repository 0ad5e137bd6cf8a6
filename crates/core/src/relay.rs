//! Relay selection constraints
//!
//! A hierarchical constraint on which relay the daemon may connect to:
//! anywhere, a country, a city within a country, or one specific relay.
//! The constraint implies a coarse location that can be displayed before
//! any real lookup has succeeded.

use serde::{Deserialize, Serialize};

use crate::GeoLocation;

/// The relay (or group of relays) the user has selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum SelectedRelay {
    /// Any relay anywhere
    Any,
    /// Any relay in the given country
    Country { country: String },
    /// Any relay in the given city
    City { country: String, city: String },
    /// One specific relay
    Hostname {
        country: String,
        city: String,
        hostname: String,
    },
}

impl SelectedRelay {
    /// Synthesize the location implied by this constraint.
    ///
    /// Coordinates are always absent; only a real lookup provides them.
    /// `Any` implies no location at all.
    pub fn location(&self) -> Option<GeoLocation> {
        match self {
            SelectedRelay::Any => None,
            SelectedRelay::Country { country } => Some(GeoLocation::new(country.clone())),
            SelectedRelay::City { country, city } => {
                Some(GeoLocation::new(country.clone()).with_city(city.clone()))
            }
            SelectedRelay::Hostname {
                country,
                city,
                hostname,
            } => Some(
                GeoLocation::new(country.clone())
                    .with_city(city.clone())
                    .with_hostname(hostname.clone()),
            ),
        }
    }
}

impl Default for SelectedRelay {
    fn default() -> Self {
        SelectedRelay::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_implies_no_location() {
        assert_eq!(SelectedRelay::Any.location(), None);
    }

    #[test]
    fn test_country_location() {
        let relay = SelectedRelay::Country {
            country: "Sweden".to_string(),
        };
        let loc = relay.location().unwrap();
        assert_eq!(loc.country, "Sweden");
        assert!(loc.city.is_none());
        assert!(loc.hostname.is_none());
    }

    #[test]
    fn test_city_location() {
        let relay = SelectedRelay::City {
            country: "Sweden".to_string(),
            city: "Gothenburg".to_string(),
        };
        let loc = relay.location().unwrap();
        assert_eq!(loc.country, "Sweden");
        assert_eq!(loc.city.as_deref(), Some("Gothenburg"));
        assert!(loc.hostname.is_none());
    }

    #[test]
    fn test_hostname_location() {
        let relay = SelectedRelay::Hostname {
            country: "Sweden".to_string(),
            city: "Gothenburg".to_string(),
            hostname: "se-got-001".to_string(),
        };
        let loc = relay.location().unwrap();
        assert_eq!(loc.hostname.as_deref(), Some("se-got-001"));
    }

    #[test]
    fn test_synthetic_location_has_no_coordinates() {
        let relay = SelectedRelay::Hostname {
            country: "Sweden".to_string(),
            city: "Gothenburg".to_string(),
            hostname: "se-got-001".to_string(),
        };
        assert!(!relay.location().unwrap().has_coordinates());
    }

    #[test]
    fn test_default_is_any() {
        assert_eq!(SelectedRelay::default(), SelectedRelay::Any);
    }
}
