// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and emergency mirror fields)
//! - Alerts (emergency events, open until finished)

use chrono::{DateTime, Utc};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Alert, User};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any token, so skip credential discovery entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Alert Operations ────────────────────────────────────────

    /// Get an alert by ID.
    pub async fn get_alert(&self, alert_id: &str) -> Result<Option<Alert>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::ALERTS)
            .obj()
            .one(alert_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace an alert.
    pub async fn upsert_alert(&self, alert: &Alert) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::ALERTS)
            .document_id(&alert.id)
            .object(alert)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All alerts for a user, newest first.
    pub async fn list_alerts_for_user(&self, user_id: &str) -> Result<Vec<Alert>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::ALERTS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All open emergency alerts across users, newest first.
    pub async fn list_active_alerts(&self) -> Result<Vec<Alert>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::ALERTS)
            .filter(|q| {
                q.for_all([
                    q.field("is_emergency").eq(true),
                    q.field("finished_at").is_null(),
                ])
            })
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Open alerts (finished_at == null) for a user.
    async fn open_alerts_for_user(&self, user_id: &str) -> Result<Vec<Alert>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::ALERTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("finished_at").is_null(),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Alert Logging ────────────────────────────────────

    /// Atomically close the user's open alerts, store the new alert and
    /// write the user's mirror fields.
    ///
    /// All writes go into one Firestore transaction. The open alerts are
    /// queried before the transaction begins, so Firestore does not see a
    /// conflict when two instances log alerts for the same user at once.
    /// Within one process callers serialize on the per-user lock.
    ///
    /// Returns the number of alerts that were closed.
    pub async fn replace_open_alert(
        &self,
        alert: &Alert,
        user: &User,
        closed_at: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let open_alerts = self.open_alerts_for_user(&alert.user_id).await?;
        let closed_count = open_alerts.len();

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Close every alert that is still open
        for mut previous in open_alerts {
            previous.close(closed_at);
            self.client
                .fluent()
                .update()
                .in_col(collections::ALERTS)
                .document_id(&previous.id)
                .object(&previous)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add closed alert to transaction: {}",
                        e
                    ))
                })?;
        }

        // 2. Insert the new alert
        self.client
            .fluent()
            .update()
            .in_col(collections::ALERTS)
            .document_id(&alert.id)
            .object(alert)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add alert to transaction: {}", e))
            })?;

        // 3. Mirror the emergency onto the user
        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        // 4. Commit the transaction atomically
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            user_id = %alert.user_id,
            alert_id = %alert.id,
            closed_count,
            "Alert replaced atomically"
        );

        Ok(closed_count)
    }
}
