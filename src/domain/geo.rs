//! Great-circle distance and distance formatting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Mean Earth radius used by the Haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometre to statute mile conversion factor.
pub const KM_TO_MILES: f64 = 0.621_371;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, `-90..=90`.
    pub latitude: f64,
    /// Longitude in degrees, `-180..=180`.
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] when either component is NaN,
    /// infinite, or outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ClientError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(ClientError::InvalidInput("invalid coordinates".to_string()));
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ClientError::InvalidInput(format!(
                "coordinates out of range: {latitude}, {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self, other)
    }
}

/// Haversine distance between two positions, in kilometres.
#[must_use]
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Unit used when rendering distances to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    /// Kilometres.
    Km,
    /// Statute miles.
    #[default]
    Miles,
}

impl DistanceUnit {
    /// Short suffix used in formatted output.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Km => "km",
            Self::Miles => "mi",
        }
    }

    /// Converts a kilometre value into this unit.
    #[must_use]
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Self::Km => km,
            Self::Miles => km * KM_TO_MILES,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Km => "km",
            Self::Miles => "miles",
        })
    }
}

impl FromStr for DistanceUnit {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Ok(Self::Km),
            "mi" | "miles" => Ok(Self::Miles),
            other => Err(ClientError::InvalidInput(format!(
                "unknown distance unit: {other}"
            ))),
        }
    }
}

/// Renders a distance for display, rounded to one decimal place.
///
/// Values that would round to zero are shown as `<0.1`.
#[must_use]
pub fn format_distance(distance_km: f64, unit: DistanceUnit) -> String {
    let value = unit.from_km(distance_km);
    if value < 0.05 {
        format!("<0.1 {}", unit.suffix())
    } else {
        format!("{value:.1} {}", unit.suffix())
    }
}
