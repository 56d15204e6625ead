//! User model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::emergency::{AlertColor, EmergencyState, Location};

/// User profile stored in Firestore.
///
/// Users are registered elsewhere; this service only reads them and
/// rewrites the emergency fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Password hash written by registration. Never leaves the service.
    pub password: String,
    /// Whether the user currently has an emergency
    #[serde(default)]
    pub is_emergency: bool,
    /// Color of the current emergency
    #[serde(default)]
    pub emergency_alert_color: AlertColor,
    /// Location of the current emergency
    #[serde(default)]
    pub emergency_location: Option<Location>,
}

impl User {
    /// Overwrite all three emergency mirror fields.
    pub fn set_emergency(&mut self, state: EmergencyState) {
        self.is_emergency = state.is_emergency;
        self.emergency_alert_color = state.color;
        self.emergency_location = state.location;
    }

    /// Clear the emergency flag after an alert finishes.
    ///
    /// The last known location is kept.
    pub fn clear_emergency(&mut self) {
        self.is_emergency = false;
        self.emergency_alert_color = AlertColor::None;
    }
}
