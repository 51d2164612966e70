//! REST API handlers for channel time-series data.
//!
//! Routes address a channel by `(well_id, channel_id)`; the handlers turn
//! that into the well and channel names the bucket operations key on.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use welltrack_generator::{PatternParams, PopulateRequest};
use welltrack_state::*;

use crate::ApiState;
use crate::handlers::{check_limit, owned_channel};
use crate::response::{ApiResponse, error_response, generator_error, state_error};

/// Largest page of data points served at once.
pub const MAX_DATA_LIMIT: usize = 10_000;

/// Time filter and pagination for data reads.
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_data_limit")]
    pub limit: usize,
}

fn default_data_limit() -> usize {
    1000
}

/// Time filter for statistics.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Batch insert body.
#[derive(Debug, Deserialize)]
pub struct DataPointBatch {
    pub data_points: Vec<NewDataPoint>,
}

/// Query parameters of the populate endpoint.
#[derive(Debug, Deserialize)]
pub struct PopulateQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_interval")]
    pub interval_seconds: i64,
}

/// Body of the pattern endpoint. Every field is optional.
#[derive(Debug, Deserialize)]
pub struct PatternRequest {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_interval")]
    pub interval_seconds: i64,
    #[serde(flatten)]
    pub params: PatternParams,
}

fn default_interval() -> i64 {
    3600
}

/// GET /wells/{well_id}/channels/{channel_id}/data
pub async fn get_data_points(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
    Query(query): Query<DataQuery>,
) -> Response {
    if let Err(resp) = check_limit(query.limit, MAX_DATA_LIMIT) {
        return resp;
    }
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    let range = TimeRange::new(query.start_date, query.end_date);
    match state
        .store
        .get_points(&well.name, &channel.name, range, query.skip, query.limit)
    {
        Ok(points) => ApiResponse::ok(points).into_response(),
        Err(e) => state_error(&e),
    }
}

/// POST /wells/{well_id}/channels/{channel_id}/data
pub async fn create_data_point(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
    Json(point): Json<NewDataPoint>,
) -> Response {
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    match state.store.create_point(&well.name, &channel.name, point) {
        Ok(point) => (StatusCode::CREATED, ApiResponse::ok(point)).into_response(),
        Err(e) => state_error(&e),
    }
}

/// POST /wells/{well_id}/channels/{channel_id}/data/batch
pub async fn create_data_points_batch(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
    Json(batch): Json<DataPointBatch>,
) -> Response {
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    match state
        .store
        .create_points_batch(&well.name, &channel.name, &batch.data_points)
    {
        Ok(points) => (StatusCode::CREATED, ApiResponse::ok(points)).into_response(),
        Err(e) => state_error(&e),
    }
}

/// DELETE /wells/{well_id}/channels/{channel_id}/data/{point_id}
pub async fn delete_data_point(
    State(state): State<ApiState>,
    Path((well_id, channel_id, point_id)): Path<(WellId, ChannelId, PointId)>,
) -> Response {
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    match state.store.delete_point(&well.name, &channel.name, point_id) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response(
            &format!("Data point with id {point_id} not found"),
            StatusCode::NOT_FOUND,
        ),
        Err(e) => state_error(&e),
    }
}

/// DELETE /wells/{well_id}/channels/{channel_id}/data
pub async fn delete_all_data(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
) -> Response {
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    match state.store.delete_all_points(&well.name, &channel.name) {
        Ok(deleted) => ApiResponse::ok(serde_json::json!({ "deleted": deleted })).into_response(),
        Err(e) => state_error(&e),
    }
}

/// GET /wells/{well_id}/channels/{channel_id}/data/statistics
///
/// An empty range is reported as 404.
pub async fn get_statistics(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    let range = TimeRange::new(query.start_date, query.end_date);
    match state.store.get_statistics(&well.name, &channel.name, range) {
        Ok(stats) if stats.is_empty() => error_response(
            "No data found for the specified range",
            StatusCode::NOT_FOUND,
        ),
        Ok(stats) => ApiResponse::ok(stats).into_response(),
        Err(e) => state_error(&e),
    }
}

/// POST /wells/{well_id}/channels/{channel_id}/data/populate
pub async fn populate(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
    Query(query): Query<PopulateQuery>,
) -> Response {
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    let request = PopulateRequest {
        start: query.start_date,
        end: query.end_date,
        interval_seconds: query.interval_seconds,
        update_channel_dates: true,
    };
    match state
        .generator
        .populate(&well.name, &channel.name, &request, None)
    {
        Ok(summary) => ApiResponse::ok(summary).into_response(),
        Err(e) => generator_error(&e),
    }
}

/// POST /wells/{well_id}/channels/{channel_id}/data/pattern
pub async fn generate_pattern(
    State(state): State<ApiState>,
    Path((well_id, channel_id)): Path<(WellId, ChannelId)>,
    Json(body): Json<PatternRequest>,
) -> Response {
    let (well, channel) = match owned_channel(&state.store, well_id, channel_id) {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    let request = PopulateRequest {
        start: body.start_date,
        end: body.end_date,
        interval_seconds: body.interval_seconds,
        update_channel_dates: true,
    };
    match state
        .generator
        .generate_pattern(&well.name, &channel.name, &request, &body.params)
    {
        Ok(summary) => ApiResponse::ok(summary).into_response(),
        Err(e) => generator_error(&e),
    }
}

/// GET /buckets
pub async fn list_buckets(State(state): State<ApiState>) -> Response {
    match state.store.buckets().list_all_bucket_tables() {
        Ok(tables) => ApiResponse::ok(tables).into_response(),
        Err(e) => state_error(&e),
    }
}
