//! Database layer.
//!
//! `Db` is the store handle passed to services. It is constructed once at
//! startup from the configuration and dropped when the server shuts down.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::models::{Alert, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ALERTS: &str = "alerts";
}

/// Number of random bytes in a generated document ID.
const DOCUMENT_ID_BYTES: usize = 12;
/// Longest ID accepted from a request path.
const MAX_DOCUMENT_ID_LEN: usize = 128;

/// Generate a new random document ID (24 lowercase hex characters).
pub fn new_document_id() -> Result<String, AppError> {
    let mut bytes = [0u8; DOCUMENT_ID_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate document ID")))?;
    Ok(hex::encode(bytes))
}

/// Whether `id` can name a stored document.
///
/// Anything else cannot exist, so callers treat it as not found instead of
/// sending it to the store.
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_DOCUMENT_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
    /// No store at all; every call fails.
    Offline,
}

/// Store handle shared by all request handlers.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
}

impl Db {
    /// Connect to the backend selected in the configuration.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        match config.storage_backend {
            StorageBackend::Firestore => {
                let db = FirestoreDb::new(&config.gcp_project_id).await?;
                Ok(Self {
                    backend: Backend::Firestore(db),
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Connect to Firestore.
    pub async fn firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreDb::new(project_id).await?),
        })
    }

    /// Create an empty in-memory store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryDb::new()),
        }
    }

    /// Create a mock store for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Short backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Firestore(_) => "firestore",
            Backend::Memory(_) => "memory",
            Backend::Offline => "offline",
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_user(user_id).await,
            Backend::Memory(db) => Ok(db.get_user(user_id).await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create or replace a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.upsert_user(user).await,
            Backend::Memory(db) => {
                db.upsert_user(user).await;
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── Alert Operations ────────────────────────────────────────

    /// Get an alert by ID.
    pub async fn get_alert(&self, alert_id: &str) -> Result<Option<Alert>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_alert(alert_id).await,
            Backend::Memory(db) => Ok(db.get_alert(alert_id).await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create or replace an alert.
    pub async fn upsert_alert(&self, alert: &Alert) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.upsert_alert(alert).await,
            Backend::Memory(db) => {
                db.upsert_alert(alert).await;
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// All alerts for a user, newest first.
    pub async fn list_alerts_for_user(&self, user_id: &str) -> Result<Vec<Alert>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.list_alerts_for_user(user_id).await,
            Backend::Memory(db) => Ok(db.list_alerts_for_user(user_id).await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// All open emergency alerts, newest first.
    pub async fn list_active_alerts(&self) -> Result<Vec<Alert>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.list_active_alerts().await,
            Backend::Memory(db) => Ok(db.list_active_alerts().await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Atomically close the user's open alerts at `closed_at`, store `alert`
    /// and write `user`. Returns the number of alerts closed.
    pub async fn replace_open_alert(
        &self,
        alert: &Alert,
        user: &User,
        closed_at: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.replace_open_alert(alert, user, closed_at).await,
            Backend::Memory(db) => Ok(db.replace_open_alert(alert, user, closed_at).await),
            Backend::Offline => Err(Self::offline()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_id_shape() {
        let a = new_document_id().unwrap();
        let b = new_document_id().unwrap();
        assert_eq!(a.len(), DOCUMENT_ID_BYTES * 2);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert!(is_valid_document_id(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn test_document_id_validation() {
        assert!(is_valid_document_id("65f1c2a9e4b0a1b2c3d4e5f6"));
        assert!(is_valid_document_id("user_1-a"));
        assert!(!is_valid_document_id(""));
        assert!(!is_valid_document_id("../users"));
        assert!(!is_valid_document_id("a b"));
        assert!(!is_valid_document_id(&"a".repeat(MAX_DOCUMENT_ID_LEN + 1)));
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let db = Db::new_mock();
        assert_eq!(db.backend_name(), "offline");
        assert!(matches!(
            db.get_user("u1").await,
            Err(AppError::Database(_))
        ));
        assert!(matches!(
            db.list_active_alerts().await,
            Err(AppError::Database(_))
        ));
    }
}
