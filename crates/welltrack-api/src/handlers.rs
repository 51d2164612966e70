//! REST API handlers for wells and channels.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use welltrack_state::*;

use crate::ApiState;
use crate::response::{ApiResponse, error_response, state_error};

/// Largest page the well and channel listings serve.
pub const MAX_LIST_LIMIT: usize = 1000;

/// `skip`/`limit` query parameters.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    100
}

/// Reject a limit outside `1..=max`.
pub(crate) fn check_limit(limit: usize, max: usize) -> Result<(), Response> {
    if (1..=max).contains(&limit) {
        Ok(())
    } else {
        Err(error_response(
            &format!("limit must be between 1 and {max}"),
            StatusCode::BAD_REQUEST,
        ))
    }
}

/// Resolve a channel addressed through its well.
///
/// A channel that exists but belongs to another well is reported as missing.
pub(crate) fn owned_channel(
    store: &StateStore,
    well_id: WellId,
    channel_id: ChannelId,
) -> Result<(Well, Channel), Response> {
    let not_found = || {
        error_response(
            &format!("Channel with id {channel_id} not found for well {well_id}"),
            StatusCode::NOT_FOUND,
        )
    };
    let channel = match store.get_channel(channel_id) {
        Ok(Some(channel)) if channel.well_id == well_id => channel,
        Ok(_) => return Err(not_found()),
        Err(e) => return Err(state_error(&e)),
    };
    match store.get_well(well_id) {
        Ok(Some(well)) => Ok((well, channel)),
        Ok(None) => Err(not_found()),
        Err(e) => Err(state_error(&e)),
    }
}

/// GET /
pub async fn root() -> impl IntoResponse {
    ApiResponse::ok(serde_json::json!({ "message": "Welcome to the API" }))
}

// ── Wells ──────────────────────────────────────────────────────

/// GET /wells
pub async fn list_wells(
    State(state): State<ApiState>,
    Query(page): Query<Pagination>,
) -> Response {
    if let Err(resp) = check_limit(page.limit, MAX_LIST_LIMIT) {
        return resp;
    }
    match state.store.list_wells(page.skip, page.limit) {
        Ok(wells) => ApiResponse::ok(wells).into_response(),
        Err(e) => state_error(&e),
    }
}

/// POST /wells
pub async fn create_well(State(state): State<ApiState>, Json(new): Json<NewWell>) -> Response {
    match state.store.create_well(new) {
        Ok(well) => (StatusCode::CREATED, ApiResponse::ok(well)).into_response(),
        Err(e) => state_error(&e),
    }
}

/// GET /wells/{well_id}
pub async fn get_well(State(state): State<ApiState>, Path(id): Path<WellId>) -> Response {
    match state.store.get_well(id) {
        Ok(Some(well)) => ApiResponse::ok(well).into_response(),
        Ok(None) => error_response(&format!("Well with id {id} not found"), StatusCode::NOT_FOUND),
        Err(e) => state_error(&e),
    }
}

/// PUT /wells/{well_id}
pub async fn update_well(
    State(state): State<ApiState>,
    Path(id): Path<WellId>,
    Json(update): Json<WellUpdate>,
) -> Response {
    match state.store.update_well(id, update) {
        Ok(Some(well)) => ApiResponse::ok(well).into_response(),
        Ok(None) => error_response(&format!("Well with id {id} not found"), StatusCode::NOT_FOUND),
        Err(e) => state_error(&e),
    }
}

/// DELETE /wells/{well_id}
pub async fn delete_well(State(state): State<ApiState>, Path(id): Path<WellId>) -> Response {
    match state.store.delete_well(id) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response(&format!("Well with id {id} not found"), StatusCode::NOT_FOUND),
        Err(e) => state_error(&e),
    }
}

/// GET /wells/region/{region}
pub async fn wells_by_region(
    State(state): State<ApiState>,
    Path(region): Path<String>,
) -> Response {
    match state.store.wells_by_region(&region) {
        Ok(wells) if wells.is_empty() => error_response(
            &format!("No wells found in region {region}"),
            StatusCode::NOT_FOUND,
        ),
        Ok(wells) => ApiResponse::ok(wells).into_response(),
        Err(e) => state_error(&e),
    }
}

/// GET /wells/depth/{depth}
pub async fn wells_deeper_than(
    State(state): State<ApiState>,
    Path(depth): Path<f64>,
) -> Response {
    match state.store.well_names_deeper_than(depth) {
        Ok(names) if names.is_empty() => error_response(
            &format!("No wells found deeper than {depth}"),
            StatusCode::NOT_FOUND,
        ),
        Ok(names) => ApiResponse::ok(names).into_response(),
        Err(e) => state_error(&e),
    }
}

// ── Channels ───────────────────────────────────────────────────

/// Channel creation body; the well comes from the path.
#[derive(Debug, Deserialize)]
pub struct ChannelCreate {
    pub name: String,
    #[serde(default)]
    pub data_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data_to: Option<DateTime<Utc>>,
}

/// GET /channels
pub async fn list_channels(
    State(state): State<ApiState>,
    Query(page): Query<Pagination>,
) -> Response {
    if let Err(resp) = check_limit(page.limit, MAX_LIST_LIMIT) {
        return resp;
    }
    match state.store.list_channels(page.skip, page.limit) {
        Ok(channels) => ApiResponse::ok(channels).into_response(),
        Err(e) => state_error(&e),
    }
}

/// GET /wells/{well_id}/channels
pub async fn list_well_channels(
    State(state): State<ApiState>,
    Path(well_id): Path<WellId>,
) -> Response {
    match state.store.list_channels_for_well(well_id) {
        Ok(channels) => ApiResponse::ok(channels).into_response(),
        Err(e) => state_error(&e),
    }
}

/// POST /wells/{well_id}/channels
pub async fn create_channel(
    State(state): State<ApiState>,
    Path(well_id): Path<WellId>,
    Json(body): Json<ChannelCreate>,
) -> Response {
    let new = NewChannel {
        well_id,
        name: body.name,
        data_from: body.data_from,
        data_to: body.data_to,
    };
    match state.store.create_channel(new) {
        Ok(channel) => (StatusCode::CREATED, ApiResponse::ok(channel)).into_response(),
        Err(e) => state_error(&e),
    }
}

/// GET /wells/{well_id}/channels/{channel_id}
pub async fn get_channel(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
) -> Response {
    match owned_channel(&state.store, well_id, channel_id) {
        Ok((well, channel)) => ApiResponse::ok(ChannelDetails::new(channel, &well.name)).into_response(),
        Err(resp) => resp,
    }
}

/// PUT /wells/{well_id}/channels/{channel_id}
pub async fn update_channel(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
    Json(update): Json<ChannelUpdate>,
) -> Response {
    if let Err(resp) = owned_channel(&state.store, well_id, channel_id) {
        return resp;
    }
    match state.store.update_channel(channel_id, update) {
        Ok(Some(channel)) => ApiResponse::ok(channel).into_response(),
        Ok(None) => error_response(
            &format!("Channel with id {channel_id} not found for well {well_id}"),
            StatusCode::NOT_FOUND,
        ),
        Err(e) => state_error(&e),
    }
}

/// DELETE /wells/{well_id}/channels/{channel_id}
pub async fn delete_channel(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
) -> Response {
    if let Err(resp) = owned_channel(&state.store, well_id, channel_id) {
        return resp;
    }
    match state.store.delete_channel(channel_id) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response(
            &format!("Channel with id {channel_id} not found for well {well_id}"),
            StatusCode::NOT_FOUND,
        ),
        Err(e) => state_error(&e),
    }
}
