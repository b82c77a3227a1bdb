//! Ledger API endpoints
//!
//! Handles HTTP requests against the occupancy ledger:
//! - POST /api/v1/park-in - Record a vehicle entering
//! - POST /api/v1/park-out - Record a vehicle exiting
//! - GET /api/v1/categories - Occupancy summary for all categories
//! - GET /api/v1/categories/{category}/active - Currently parked vehicles
//! - GET /api/v1/alerts?hours=N - Over-duration sessions
//! - GET /api/v1/history - Full ledger, most recent entry first

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{LotCategory, ParkingSession};
use crate::services::{CategoryOccupancy, OverdueSession};

/// Request body for park-in
#[derive(Debug, Deserialize)]
pub struct ParkInRequest {
    pub plate: String,
    /// Category name; parsed leniently ("orange" or "Orange (Residents)")
    pub category: String,
}

/// Request body for park-out
#[derive(Debug, Deserialize)]
pub struct ParkOutRequest {
    pub plate: String,
}

/// Query parameters for the alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub hours: Option<f64>,
}

/// One ledger session as returned to clients
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub plate: String,
    pub category: String,
    pub entry_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<String>,
    pub active: bool,
}

impl From<ParkingSession> for SessionResponse {
    fn from(session: ParkingSession) -> Self {
        Self {
            id: session.id,
            plate: session.plate.clone(),
            category: session.category.label().to_string(),
            entry_time: session.entry_time.to_rfc3339(),
            exit_time: session.exit_time().map(|dt| dt.to_rfc3339()),
            active: session.is_active(),
        }
    }
}

/// An active session with its elapsed duration
#[derive(Debug, Serialize)]
pub struct ActiveSessionResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub hours_parked: f64,
}

/// Occupancy summary for one category.
///
/// `free` is clamped at zero for display; `free_raw` carries the signed
/// value so corrupted stores stay diagnosable.
#[derive(Debug, Serialize)]
pub struct CategorySummaryResponse {
    pub category: String,
    pub lots: Vec<String>,
    pub capacity: i64,
    pub used: i64,
    pub free: i64,
    pub free_raw: i64,
}

impl From<CategoryOccupancy> for CategorySummaryResponse {
    fn from(occupancy: CategoryOccupancy) -> Self {
        Self {
            category: occupancy.category.label().to_string(),
            lots: occupancy
                .category
                .lots()
                .iter()
                .map(|l| l.to_string())
                .collect(),
            capacity: occupancy.capacity,
            used: occupancy.used,
            free: occupancy.free.max(0),
            free_raw: occupancy.free,
        }
    }
}

/// Response for the active list of one category
#[derive(Debug, Serialize)]
pub struct ActiveListResponse {
    pub category: String,
    pub capacity: i64,
    pub sessions: Vec<ActiveSessionResponse>,
}

/// Response for the alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub threshold_hours: f64,
    pub sessions: Vec<OverdueAlertResponse>,
}

/// One over-duration alert entry
#[derive(Debug, Serialize)]
pub struct OverdueAlertResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub hours_parked: f64,
}

impl From<OverdueSession> for OverdueAlertResponse {
    fn from(overdue: OverdueSession) -> Self {
        Self {
            session: overdue.session.into(),
            // one decimal, matching what the kiosk displays
            hours_parked: (overdue.hours_parked * 10.0).round() / 10.0,
        }
    }
}

/// Response for the history endpoint
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub sessions: Vec<SessionResponse>,
}

fn parse_category(raw: &str) -> Result<LotCategory, ApiError> {
    raw.parse::<LotCategory>()
        .map_err(|e| ApiError::invalid_input(e.to_string()))
}

/// POST /api/v1/park-in - Record a vehicle entering
pub async fn park_in(
    State(state): State<AppState>,
    Json(request): Json<ParkInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let category = parse_category(&request.category)?;
    let session = state.ledger.park_in(&request.plate, category).await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/park-out - Record a vehicle exiting
pub async fn park_out(
    State(state): State<AppState>,
    Json(request): Json<ParkOutRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.ledger.park_out(&request.plate).await?;
    Ok(Json(session.into()))
}

/// GET /api/v1/categories - Occupancy summary for all categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategorySummaryResponse>>, ApiError> {
    let summary = state.ledger.occupancy_summary().await?;
    Ok(Json(summary.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/categories/{category}/active - Currently parked vehicles
pub async fn list_active(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ActiveListResponse>, ApiError> {
    let category = parse_category(&category)?;
    let now = Utc::now();
    let sessions = state
        .ledger
        .active_sessions(category)
        .await?
        .into_iter()
        .map(|session| ActiveSessionResponse {
            hours_parked: session.hours_parked(now),
            session: session.into(),
        })
        .collect();

    Ok(Json(ActiveListResponse {
        category: category.label().to_string(),
        capacity: category.capacity(),
        sessions,
    }))
}

/// GET /api/v1/alerts?hours=N - Over-duration sessions
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let threshold_hours = query.hours.unwrap_or(state.alerts.default_hours);
    if !threshold_hours.is_finite() || threshold_hours < 0.0 {
        return Err(ApiError::invalid_input(
            "hours must be a non-negative number",
        ));
    }

    let sessions = state
        .ledger
        .over_duration(threshold_hours)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(AlertsResponse {
        threshold_hours,
        sessions,
    }))
}

/// GET /api/v1/history - Full ledger, most recent entry first
pub async fn history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, ApiError> {
    let sessions = state
        .ledger
        .history()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(HistoryResponse { sessions }))
}
