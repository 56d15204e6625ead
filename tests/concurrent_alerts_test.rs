// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrent alert logging must never leave two open alerts for a user.

use futures_util::future::join_all;
use hercules_alerts::db::Db;
use hercules_alerts::models::{AlertColor, Location};
use hercules_alerts::services::{AlertService, NewAlert};

mod common;

const CONCURRENT_LOGS: usize = 32;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_log_alerts_leave_one_open() {
    let db = Db::in_memory();
    db.upsert_user(&common::test_user("u1")).await.unwrap();
    let service = AlertService::new(db.clone());

    let handles = (0..CONCURRENT_LOGS).map(|i| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .log_alert(
                    "u1",
                    NewAlert {
                        emergency_type: format!("event-{}", i),
                        alert_color: AlertColor::Red,
                        location: Some(Location::Coordinates {
                            lat: 10.0,
                            lng: 20.0,
                        }),
                    },
                )
                .await
        })
    });

    for result in join_all(handles).await {
        result.expect("task panicked").expect("log_alert failed");
    }

    let alerts = db.list_alerts_for_user("u1").await.unwrap();
    assert_eq!(alerts.len(), CONCURRENT_LOGS);

    let open: Vec<_> = alerts.iter().filter(|a| a.is_open()).collect();
    assert_eq!(open.len(), 1, "expected exactly one open alert");
    assert_eq!(open[0].id, alerts[0].id, "open alert should be the newest");

    for closed in alerts.iter().filter(|a| !a.is_open()) {
        assert_eq!(closed.alert_color, AlertColor::Grey);
        assert!(!closed.is_emergency);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finish_and_log_keep_one_open() {
    let db = Db::in_memory();
    db.upsert_user(&common::test_user("u1")).await.unwrap();
    let service = AlertService::new(db.clone());

    let first = service
        .log_alert(
            "u1",
            NewAlert {
                emergency_type: "fall".to_string(),
                alert_color: AlertColor::Red,
                location: None,
            },
        )
        .await
        .unwrap();

    let finisher = {
        let service = service.clone();
        let id = first.id.clone();
        tokio::spawn(async move { service.finish_alert(&id).await })
    };
    let logger = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .log_alert(
                    "u1",
                    NewAlert {
                        emergency_type: "fire".to_string(),
                        alert_color: AlertColor::Orange,
                        location: None,
                    },
                )
                .await
        })
    };

    finisher.await.unwrap().unwrap();
    let second = logger.await.unwrap().unwrap();

    // Whatever the order, the first alert is closed and only the second is open.
    let alerts = db.list_alerts_for_user("u1").await.unwrap();
    let open: Vec<_> = alerts.iter().filter(|a| a.is_open()).collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, second.id);

    let first = db.get_alert(&first.id).await.unwrap().unwrap();
    assert!(!first.is_open());
    assert_eq!(first.alert_color, AlertColor::Grey);
}
