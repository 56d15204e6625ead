// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emergency alert model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::emergency::{AlertColor, Location};

/// Stored alert record in Firestore.
///
/// An alert is open while `finished_at` is `None`. At most one alert per
/// user is open at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID (also used as document ID)
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    /// Kind of emergency ("fall", "fire", ...)
    pub emergency_type: String,
    pub alert_color: AlertColor,
    /// True while the alert is open
    pub is_emergency: bool,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Stored as an explicit null while open so it can be queried.
    #[serde(default, with = "firestore::serialize_as_null_timestamp")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Create a new open alert.
    pub fn open(
        id: String,
        user_id: String,
        emergency_type: String,
        alert_color: AlertColor,
        location: Option<Location>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            emergency_type,
            alert_color,
            is_emergency: true,
            location,
            created_at,
            finished_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.finished_at.is_none()
    }

    /// Open and still flagged as an emergency.
    pub fn is_active(&self) -> bool {
        self.is_emergency && self.finished_at.is_none()
    }

    /// Mark the alert finished at `at`.
    pub fn close(&mut self, at: DateTime<Utc>) {
        self.is_emergency = false;
        self.finished_at = Some(at);
        self.alert_color = AlertColor::Grey;
    }
}
