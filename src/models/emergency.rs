// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emergency color and location types shared by users and alerts.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum accepted length of a free-text address.
pub const MAX_ADDRESS_LEN: usize = 512;

/// Display color of an emergency.
///
/// `Grey` marks a finished alert and `None` a user with no emergency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum AlertColor {
    Red,
    Orange,
    Yellow,
    Green,
    #[serde(alias = "gray")]
    Grey,
    #[default]
    None,
}

impl AlertColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertColor::Red => "red",
            AlertColor::Orange => "orange",
            AlertColor::Yellow => "yellow",
            AlertColor::Green => "green",
            AlertColor::Grey => "grey",
            AlertColor::None => "none",
        }
    }
}

impl fmt::Display for AlertColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an emergency is happening.
///
/// Clients send either GPS coordinates or a free-text address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum Location {
    Coordinates { lat: f64, lng: f64 },
    Address(String),
}

impl Location {
    /// Reject coordinates off the globe and empty or oversized addresses.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Location::Coordinates { lat, lng } => {
                if !(-90.0..=90.0).contains(lat) {
                    return Err(format!("Latitude {} out of range", lat));
                }
                if !(-180.0..=180.0).contains(lng) {
                    return Err(format!("Longitude {} out of range", lng));
                }
                Ok(())
            }
            Location::Address(address) => {
                let trimmed = address.trim();
                if trimmed.is_empty() {
                    return Err("Address must not be empty".to_string());
                }
                if trimmed.len() > MAX_ADDRESS_LEN {
                    return Err(format!(
                        "Address exceeds {} characters",
                        MAX_ADDRESS_LEN
                    ));
                }
                Ok(())
            }
        }
    }
}

/// The emergency fields mirrored onto a user from their latest alert.
#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyState {
    pub is_emergency: bool,
    pub color: AlertColor,
    pub location: Option<Location>,
}
