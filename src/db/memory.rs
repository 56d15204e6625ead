// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore operations for local development and tests.
//! Every multi-document write runs under a single write lock, so it is
//! atomic with respect to all other operations.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Alert, User};

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    /// Kept in insertion order so equal timestamps sort newest-inserted first.
    alerts: Vec<Alert>,
}

/// In-memory store handle. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Option<User> {
        self.inner.read().await.users.get(user_id).cloned()
    }

    pub async fn upsert_user(&self, user: &User) {
        self.inner
            .write()
            .await
            .users
            .insert(user.id.clone(), user.clone());
    }

    // ─── Alert Operations ────────────────────────────────────────

    pub async fn get_alert(&self, alert_id: &str) -> Option<Alert> {
        self.inner
            .read()
            .await
            .alerts
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
    }

    pub async fn upsert_alert(&self, alert: &Alert) {
        let mut inner = self.inner.write().await;
        match inner.alerts.iter().position(|a| a.id == alert.id) {
            Some(pos) => inner.alerts[pos] = alert.clone(),
            None => inner.alerts.push(alert.clone()),
        }
    }

    pub async fn list_alerts_for_user(&self, user_id: &str) -> Vec<Alert> {
        self.select_newest_first(|a| a.user_id == user_id).await
    }

    pub async fn list_active_alerts(&self) -> Vec<Alert> {
        self.select_newest_first(Alert::is_active).await
    }

    /// Close the user's open alerts, insert the new one and store the user,
    /// all under one write lock. Returns the number of alerts closed.
    pub async fn replace_open_alert(
        &self,
        alert: &Alert,
        user: &User,
        closed_at: DateTime<Utc>,
    ) -> usize {
        let mut inner = self.inner.write().await;

        let mut closed_count = 0;
        for previous in inner
            .alerts
            .iter_mut()
            .filter(|a| a.user_id == alert.user_id && a.is_open())
        {
            previous.close(closed_at);
            closed_count += 1;
        }

        inner.alerts.push(alert.clone());
        inner.users.insert(user.id.clone(), user.clone());

        closed_count
    }

    async fn select_newest_first<F>(&self, predicate: F) -> Vec<Alert>
    where
        F: Fn(&Alert) -> bool,
    {
        let inner = self.inner.read().await;
        let mut alerts: Vec<Alert> = inner
            .alerts
            .iter()
            .rev()
            .filter(|a| predicate(*a))
            .cloned()
            .collect();
        // Stable sort keeps later inserts ahead on timestamp ties.
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertColor, User};

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            phone: None,
            country: None,
            password: "hash".to_string(),
            is_emergency: false,
            emergency_alert_color: AlertColor::None,
            emergency_location: None,
        }
    }

    fn alert(id: &str, user_id: &str, created_at: DateTime<Utc>) -> Alert {
        Alert::open(
            id.to_string(),
            user_id.to_string(),
            "fall".to_string(),
            AlertColor::Red,
            None,
            created_at,
        )
    }

    #[tokio::test]
    async fn test_upsert_alert_replaces_existing() {
        let db = MemoryDb::new();
        let now = Utc::now();
        let mut a = alert("a1", "u1", now);
        db.upsert_alert(&a).await;

        a.close(now);
        db.upsert_alert(&a).await;

        let all = db.list_alerts_for_user("u1").await;
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_open());
    }

    #[tokio::test]
    async fn test_replace_open_alert_only_touches_that_user() {
        let db = MemoryDb::new();
        let t0 = Utc::now();
        db.upsert_alert(&alert("a1", "u1", t0)).await;
        db.upsert_alert(&alert("b1", "u2", t0)).await;

        let t1 = t0 + chrono::Duration::seconds(1);
        let closed = db
            .replace_open_alert(&alert("a2", "u1", t1), &user("u1"), t1)
            .await;
        assert_eq!(closed, 1);

        let old = db.get_alert("a1").await.unwrap();
        assert_eq!(old.finished_at, Some(t1));
        assert_eq!(old.alert_color, AlertColor::Grey);

        let other = db.get_alert("b1").await.unwrap();
        assert!(other.is_open());

        assert!(db.get_user("u1").await.is_some());
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_with_ties_by_insertion() {
        let db = MemoryDb::new();
        let t0 = Utc::now();
        db.upsert_alert(&alert("old", "u1", t0)).await;
        db.upsert_alert(&alert("tie_first", "u1", t0 + chrono::Duration::seconds(5)))
            .await;
        db.upsert_alert(&alert("tie_second", "u1", t0 + chrono::Duration::seconds(5)))
            .await;

        let ids: Vec<String> = db
            .list_alerts_for_user("u1")
            .await
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["tie_second", "tie_first", "old"]);
    }
}
