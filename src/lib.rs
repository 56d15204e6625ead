// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Hercules: emergency alert tracking
//!
//! This crate provides the backend API for flagging users in an emergency,
//! logging and finishing their alerts, and listing open alerts.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::AlertService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub alert_service: AlertService,
}

impl AppState {
    /// Wire the services around an already constructed store.
    pub fn new(config: Config, db: Db) -> Self {
        let alert_service = AlertService::new(db.clone());
        Self {
            config,
            db,
            alert_service,
        }
    }
}
