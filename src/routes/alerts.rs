// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Alert logging, finishing and listing routes.

use crate::error::{AppError, Result};
use crate::models::{Alert, AlertColor, Location};
use crate::routes::json_body;
use crate::services::NewAlert;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/alert/finish/{alert_id}", put(finish_alert))
        .route("/api/auth/log-alert/{user_id}", post(log_alert))
        .route("/api/auth/alerts/{user_id}", get(get_alerts_for_user))
        .route("/api/auth/active-alerts", get(get_active_alerts))
}

/// Alert as returned by the API.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct AlertResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub emergency_type: String,
    pub alert_color: AlertColor,
    pub is_emergency: bool,
    pub location: Option<Location>,
    /// RFC3339
    pub created_at: String,
    /// RFC3339, null while the alert is open
    pub finished_at: Option<String>,
}

impl From<Alert> for AlertResponse {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id,
            user_id: alert.user_id,
            emergency_type: alert.emergency_type,
            alert_color: alert.alert_color,
            is_emergency: alert.is_emergency,
            location: alert.location,
            created_at: format_utc_rfc3339(alert.created_at),
            finished_at: alert.finished_at.map(format_utc_rfc3339),
        }
    }
}

fn to_responses(alerts: Vec<Alert>) -> Vec<AlertResponse> {
    alerts.into_iter().map(AlertResponse::from).collect()
}

// ─── Log Alert ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogAlertRequest {
    #[validate(length(min = 1, max = 64))]
    pub emergency_type: String,
    pub alert_color: AlertColor,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct LogAlertResponse {
    pub msg: String,
    pub alert: AlertResponse,
    pub user_updated: bool,
}

/// Log a new alert, closing whatever alert the user still had open.
async fn log_alert(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<LogAlertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogAlertResponse>)> {
    state.alert_service.require_user(&user_id).await?;

    let request = json_body(payload)?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let emergency_type = request.emergency_type.trim();
    if emergency_type.is_empty() {
        return Err(AppError::BadRequest(
            "emergencyType must not be blank".to_string(),
        ));
    }
    if let Some(location) = &request.location {
        location.check().map_err(AppError::BadRequest)?;
    }

    let alert = state
        .alert_service
        .log_alert(
            &user_id,
            NewAlert {
                emergency_type: emergency_type.to_string(),
                alert_color: request.alert_color,
                location: request.location,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LogAlertResponse {
            msg: "Alert logged successfully".to_string(),
            alert: alert.into(),
            user_updated: true,
        }),
    ))
}

// ─── Finish Alert ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct FinishAlertResponse {
    pub msg: String,
    pub alert: AlertResponse,
}

async fn finish_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> Result<Json<FinishAlertResponse>> {
    let alert = state.alert_service.finish_alert(&alert_id).await?;

    Ok(Json(FinishAlertResponse {
        msg: "Emergency marked as finished".to_string(),
        alert: alert.into(),
    }))
}

// ─── Listings ────────────────────────────────────────────────

/// All alerts of a user, newest first. Unknown users get an empty list.
async fn get_alerts_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AlertResponse>>> {
    let alerts = state.alert_service.alerts_for_user(&user_id).await?;
    tracing::debug!(user_id = %user_id, count = alerts.len(), "Fetched alerts");
    Ok(Json(to_responses(alerts)))
}

/// Open emergency alerts across all users, newest first.
async fn get_active_alerts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AlertResponse>>> {
    let alerts = state.alert_service.active_alerts().await?;

    if alerts.is_empty() && state.config.active_alerts_empty_is_error {
        return Err(AppError::NotFound("No active alerts found".to_string()));
    }

    Ok(Json(to_responses(alerts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_alert_response_shape() {
        let created = chrono::Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let alert = Alert::open(
            "a1".to_string(),
            "u1".to_string(),
            "fall".to_string(),
            AlertColor::Red,
            Some(Location::Coordinates { lat: 1.5, lng: 2.5 }),
            created,
        );

        let json = serde_json::to_value(AlertResponse::from(alert)).unwrap();
        assert_eq!(json["_id"], "a1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["emergencyType"], "fall");
        assert_eq!(json["alertColor"], "red");
        assert_eq!(json["isEmergency"], true);
        assert_eq!(json["location"]["lat"], 1.5);
        assert_eq!(json["createdAt"], "2025-01-02T03:04:05.000Z");
        assert!(json["finishedAt"].is_null());
    }

    #[test]
    fn test_log_alert_request_validation() {
        let request: LogAlertRequest = serde_json::from_str(
            r#"{"emergencyType": "", "alertColor": "red", "location": "Main St"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: LogAlertRequest =
            serde_json::from_str(r#"{"emergencyType": "fall", "alertColor": "orange"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.location.is_none());
    }
}
