// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and emergency status routes.

use crate::error::Result;
use crate::models::{AlertColor, EmergencyState, Location, User};
use crate::routes::json_body;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/auth/updateEmergencyStatus/{user_id}",
            put(update_emergency_status),
        )
        .route("/api/auth/profile/{user_id}", get(get_profile))
        .route(
            "/api/auth/trigger-emergency/{user_id}",
            post(trigger_emergency),
        )
}

/// User as returned by the API. The password never appears here.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub is_emergency: bool,
    pub emergency_alert_color: AlertColor,
    pub emergency_location: Option<Location>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            country: user.country,
            is_emergency: user.is_emergency,
            emergency_alert_color: user.emergency_alert_color,
            emergency_location: user.emergency_location,
        }
    }
}

// ─── Profile ─────────────────────────────────────────────────

/// Fixed profile projection.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub is_emergency: bool,
    pub emergency_alert_color: AlertColor,
    pub emergency_location: Option<Location>,
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>> {
    tracing::debug!(user_id = %user_id, "Fetching profile");

    let user = state.alert_service.get_profile(&user_id).await?;

    Ok(Json(ProfileResponse {
        name: user.name,
        email: user.email,
        phone: user.phone,
        country: user.country,
        is_emergency: user.is_emergency,
        emergency_alert_color: user.emergency_alert_color,
        emergency_location: user.emergency_location,
    }))
}

// ─── Emergency Status ────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmergencyStatusRequest {
    pub is_emergency: bool,
    pub emergency_alert_color: AlertColor,
    #[serde(default)]
    pub emergency_location: Option<Location>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct UpdateEmergencyStatusResponse {
    pub message: String,
    pub user: UserResponse,
}

async fn update_emergency_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<UpdateEmergencyStatusRequest>, JsonRejection>,
) -> Result<Json<UpdateEmergencyStatusResponse>> {
    let request = json_body(payload)?;
    if let Some(location) = &request.emergency_location {
        location
            .check()
            .map_err(crate::error::AppError::BadRequest)?;
    }

    let user = state
        .alert_service
        .update_emergency_status(
            &user_id,
            EmergencyState {
                is_emergency: request.is_emergency,
                color: request.emergency_alert_color,
                location: request.emergency_location,
            },
        )
        .await
        .map_err(|e| e.not_found_as_bad_request())?;

    Ok(Json(UpdateEmergencyStatusResponse {
        message: "Emergency status updated successfully".to_string(),
        user: user.into(),
    }))
}

// ─── Trigger ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct TriggerEmergencyResponse {
    pub msg: String,
    pub user: UserResponse,
}

/// Flag the user as in a red emergency. No alert record is created.
async fn trigger_emergency(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<TriggerEmergencyResponse>> {
    let user = state.alert_service.trigger_emergency(&user_id).await?;

    Ok(Json(TriggerEmergencyResponse {
        msg: "Emergency triggered".to_string(),
        user: user.into(),
    }))
}
