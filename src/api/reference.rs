//! Reference API endpoints
//!
//! Read-only lookups over the immutable campus data:
//! - GET /api/v1/zones - All signage zones
//! - GET /api/v1/zones/{name} - One zone, case-insensitive
//! - GET /api/v1/lots/{lot} - Zones and visitor flag for a lot code
//! - GET /api/v1/walking-times[?from=X&to=Y] - Table or one literal pair
//! - GET /api/v1/after-hours - Lots open after hours
//! - GET /api/v1/recommendations[?destination=D&category=C] - Destination
//!   list, or a suggested lot for one destination and category

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{LotCategory, WalkingTime, Zone};
use crate::services::LotInfo;

/// Response for the zones listing
#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    pub zones: Vec<Zone>,
}

/// Query parameters for walking times
#[derive(Debug, Deserialize)]
pub struct WalkingTimeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Response for a single walking-time pair
#[derive(Debug, Serialize)]
pub struct WalkingTimeResponse {
    pub from: String,
    pub to: String,
    pub minutes: u32,
}

/// Response for the full walking-time table
#[derive(Debug, Serialize)]
pub struct WalkingTimesResponse {
    pub walking_times: Vec<WalkingTime>,
}

/// Either the full table or one pair, depending on the query
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WalkingTimesReply {
    Pair(WalkingTimeResponse),
    Table(WalkingTimesResponse),
}

/// Response for the after-hours lot set
#[derive(Debug, Serialize)]
pub struct AfterHoursResponse {
    pub lots: Vec<String>,
}

/// Query parameters for lot recommendations
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub destination: Option<String>,
    pub category: Option<String>,
}

/// Response listing the destinations recommendations are available for
#[derive(Debug, Serialize)]
pub struct DestinationsResponse {
    pub destinations: Vec<&'static str>,
}

/// Response for a lot recommendation, with current category availability
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub destination: String,
    pub category: String,
    pub lot: String,
    pub capacity: i64,
    pub free: i64,
}

/// Either one recommendation or the destination list, depending on the query
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecommendationReply {
    Lot(RecommendationResponse),
    Destinations(DestinationsResponse),
}

/// GET /api/v1/zones - All signage zones
pub async fn list_zones(State(state): State<AppState>) -> Json<ZonesResponse> {
    Json(ZonesResponse {
        zones: state.reference.zones().to_vec(),
    })
}

/// GET /api/v1/zones/{name} - One zone, case-insensitive
pub async fn get_zone(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Zone>, ApiError> {
    let zone = state.reference.zone_by_name(&name)?;
    Ok(Json(zone.clone()))
}

/// GET /api/v1/lots/{lot} - Zones and visitor flag for a lot code
pub async fn get_lot(
    State(state): State<AppState>,
    Path(lot): Path<String>,
) -> Result<Json<LotInfo>, ApiError> {
    let info = state.reference.lot_info(&lot)?;
    Ok(Json(info))
}

/// GET /api/v1/walking-times - Full table, or one pair with ?from=&to=
pub async fn walking_times(
    State(state): State<AppState>,
    Query(query): Query<WalkingTimeQuery>,
) -> Result<Json<WalkingTimesReply>, ApiError> {
    match (query.from, query.to) {
        (Some(from), Some(to)) => {
            let minutes = state.reference.walking_time(&from, &to)?;
            Ok(Json(WalkingTimesReply::Pair(WalkingTimeResponse {
                from,
                to,
                minutes,
            })))
        }
        (None, None) => Ok(Json(WalkingTimesReply::Table(WalkingTimesResponse {
            walking_times: state.reference.walking_times().to_vec(),
        }))),
        _ => Err(ApiError::invalid_input(
            "walking-time lookups need both 'from' and 'to'",
        )),
    }
}

/// GET /api/v1/after-hours - Lots open after hours
pub async fn after_hours(State(state): State<AppState>) -> Json<AfterHoursResponse> {
    Json(AfterHoursResponse {
        lots: state
            .reference
            .after_hours_allowed_lots()
            .iter()
            .cloned()
            .collect(),
    })
}

/// GET /api/v1/recommendations - Known destinations, or one suggested lot
/// with ?destination=D&category=C
pub async fn recommend(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationReply>, ApiError> {
    let (destination, category) = match (query.destination, query.category) {
        (Some(destination), Some(category)) => (destination, category),
        (None, None) => {
            return Ok(Json(RecommendationReply::Destinations(
                DestinationsResponse {
                    destinations: state.reference.destinations(),
                },
            )))
        }
        _ => {
            return Err(ApiError::invalid_input(
                "recommendations need both 'destination' and 'category'",
            ))
        }
    };

    let category = category
        .parse::<LotCategory>()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;
    let lot = state.reference.recommend_lot(&destination, category)?;
    let occupancy = state.ledger.occupancy(category).await?;

    Ok(Json(RecommendationReply::Lot(RecommendationResponse {
        destination,
        category: category.label().to_string(),
        lot: lot.to_string(),
        capacity: occupancy.capacity,
        free: occupancy.free.max(0),
    })))
}
