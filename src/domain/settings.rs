//! Viewer preferences persisted on the device.

use serde::{Deserialize, Serialize};

use super::geo::DistanceUnit;
use crate::error::ClientError;

/// Display and refresh preferences.
///
/// Missing keys (from settings written by an older version) fall back to
/// their defaults when decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Unit for distance labels and check-in rejections.
    pub distance_unit: DistanceUnit,
    /// Whether event lists show distance labels.
    pub show_distance_labels: bool,
    /// Whether the live list refreshes itself periodically.
    pub auto_refresh: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            distance_unit: DistanceUnit::Miles,
            show_distance_labels: true,
            auto_refresh: true,
        }
    }
}

impl Settings {
    /// Updates one preference from its textual key and value.
    ///
    /// Keys accept kebab, snake, or camel case (`distance-unit`,
    /// `show_distance_labels`, `autoRefresh`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for an unknown key or a value
    /// that does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        let normalized: String = key
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "distanceunit" => {
                self.distance_unit = value.parse()?;
            }
            "showdistancelabels" => self.show_distance_labels = parse_flag(value)?,
            "autorefresh" => self.auto_refresh = parse_flag(value)?,
            _ => {
                return Err(ClientError::InvalidInput(format!(
                    "unknown setting: {key}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool, ClientError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(ClientError::InvalidInput(format!(
            "expected on/off, got {other}"
        ))),
    }
}
