// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emergency status and alert lifecycle.
//!
//! An alert is open from `log_alert` until it is finished explicitly or
//! replaced by the next alert for the same user. The user's emergency
//! fields mirror their most recent alert.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::{self, Db};
use crate::error::{AppError, Result};
use crate::models::{Alert, AlertColor, EmergencyState, Location, User};

/// Per-user locks serializing emergency writes within this process.
pub type UserLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Fields of a new alert supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub emergency_type: String,
    pub alert_color: AlertColor,
    pub location: Option<Location>,
}

/// Service for user emergency status and alert records.
#[derive(Clone)]
pub struct AlertService {
    db: Db,
    user_locks: UserLocks,
}

impl AlertService {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            user_locks: Arc::new(DashMap::new()),
        }
    }

    /// Hold this while reading and writing a user's emergency state.
    ///
    /// Only call for a user already read from the store, so the map is
    /// keyed by existing users and never by ids taken from a request.
    async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    async fn find_user(&self, user_id: &str) -> Result<User> {
        if !db::is_valid_document_id(user_id) {
            return Err(user_not_found());
        }
        self.db.get_user(user_id).await?.ok_or_else(user_not_found)
    }

    async fn find_alert(&self, alert_id: &str) -> Result<Alert> {
        if !db::is_valid_document_id(alert_id) {
            return Err(alert_not_found());
        }
        self.db
            .get_alert(alert_id)
            .await?
            .ok_or_else(alert_not_found)
    }

    // ─── User Emergency Status ───────────────────────────────────

    /// Get a user for the profile projection.
    pub async fn get_profile(&self, user_id: &str) -> Result<User> {
        self.find_user(user_id).await
    }

    /// Fail with not found unless the user exists.
    pub async fn require_user(&self, user_id: &str) -> Result<()> {
        self.find_user(user_id).await.map(|_| ())
    }

    /// Lock an existing user and return a fresh copy read under the lock.
    async fn lock_existing_user(&self, user_id: &str) -> Result<(OwnedMutexGuard<()>, User)> {
        self.find_user(user_id).await?;
        let guard = self.lock_user(user_id).await;
        let user = self.find_user(user_id).await?;
        Ok((guard, user))
    }

    /// Overwrite the user's emergency fields. Alerts are left alone.
    pub async fn update_emergency_status(
        &self,
        user_id: &str,
        state: EmergencyState,
    ) -> Result<User> {
        let (_guard, mut user) = self.lock_existing_user(user_id).await?;
        user.set_emergency(state);
        self.db.upsert_user(&user).await?;

        tracing::info!(
            user_id,
            is_emergency = user.is_emergency,
            color = %user.emergency_alert_color,
            "Emergency status updated"
        );
        Ok(user)
    }

    /// Flag the user as in a red emergency without creating an alert.
    pub async fn trigger_emergency(&self, user_id: &str) -> Result<User> {
        let (_guard, mut user) = self.lock_existing_user(user_id).await?;
        user.is_emergency = true;
        user.emergency_alert_color = AlertColor::Red;
        self.db.upsert_user(&user).await?;

        tracing::info!(user_id, "Emergency triggered");
        Ok(user)
    }

    // ─── Alert Lifecycle ─────────────────────────────────────────

    /// Record a new alert for the user.
    ///
    /// Any alert still open for the user is closed in the same store write
    /// that inserts the new one, and the user's emergency fields are set
    /// from the new alert.
    pub async fn log_alert(&self, user_id: &str, new_alert: NewAlert) -> Result<Alert> {
        let (_guard, mut user) = self.lock_existing_user(user_id).await?;
        let now = Utc::now();

        let alert = Alert::open(
            db::new_document_id()?,
            user.id.clone(),
            new_alert.emergency_type,
            new_alert.alert_color,
            new_alert.location,
            now,
        );

        user.set_emergency(EmergencyState {
            is_emergency: true,
            color: alert.alert_color,
            location: alert.location.clone(),
        });

        let closed_count = self.db.replace_open_alert(&alert, &user, now).await?;

        tracing::info!(
            user_id,
            alert_id = %alert.id,
            emergency_type = %alert.emergency_type,
            color = %alert.alert_color,
            closed_count,
            "Alert logged"
        );
        Ok(alert)
    }

    /// Close an alert and clear the owner's emergency flag.
    ///
    /// The owner update is best effort: if the user is gone or the write
    /// fails, the alert stays finished and the failure is only logged.
    pub async fn finish_alert(&self, alert_id: &str) -> Result<Alert> {
        let alert = self.find_alert(alert_id).await?;
        let _guard = self.lock_user(&alert.user_id).await;

        // Re-read under the lock; a concurrent finish may have won.
        let mut alert = self.find_alert(alert_id).await?;
        alert.close(Utc::now());
        self.db.upsert_alert(&alert).await?;

        tracing::info!(
            alert_id,
            user_id = %alert.user_id,
            "Alert finished"
        );

        if let Err(e) = self.clear_user_emergency(&alert.user_id).await {
            tracing::warn!(
                alert_id,
                user_id = %alert.user_id,
                error = %e,
                "Failed to clear user emergency after finishing alert"
            );
        }

        Ok(alert)
    }

    async fn clear_user_emergency(&self, user_id: &str) -> Result<()> {
        let Some(mut user) = self.db.get_user(user_id).await? else {
            tracing::warn!(user_id, "Alert owner not found; nothing to clear");
            return Ok(());
        };
        user.clear_emergency();
        self.db.upsert_user(&user).await
    }

    /// All alerts of a user, newest first.
    pub async fn alerts_for_user(&self, user_id: &str) -> Result<Vec<Alert>> {
        if !db::is_valid_document_id(user_id) {
            return Ok(Vec::new());
        }
        self.db.list_alerts_for_user(user_id).await
    }

    /// All open emergency alerts, newest first. May be empty.
    pub async fn active_alerts(&self) -> Result<Vec<Alert>> {
        self.db.list_active_alerts().await
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

fn alert_not_found() -> AppError {
    AppError::NotFound("Alert not found".to_string())
}
