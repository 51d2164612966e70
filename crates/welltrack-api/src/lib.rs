//! welltrack-api — REST API for welltrack.
//!
//! Provides axum route handlers for managing wells and channels, reading and
//! writing channel time-series data, and generating synthetic data.
//!
//! # API Routes
//!
//! Mounted under the configured prefix (default `/api`); `{ch}` stands for
//! `/wells/{well_id}/channels/{channel_id}`.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Welcome message (not prefixed) |
//! | GET/POST | `/wells` | List / create wells |
//! | GET/PUT/DELETE | `/wells/{well_id}` | Get / update / delete a well |
//! | GET | `/wells/region/{region}` | Wells in a region |
//! | GET | `/wells/depth/{depth}` | Names of wells deeper than `depth` |
//! | GET | `/channels` | List channels |
//! | GET/POST | `/wells/{well_id}/channels` | List / create channels of a well |
//! | GET/PUT/DELETE | `{ch}` | Get / update / delete a channel |
//! | GET/POST/DELETE | `{ch}/data` | Read / add / clear data points |
//! | POST | `{ch}/data/batch` | Add a batch of data points |
//! | DELETE | `{ch}/data/{point_id}` | Delete a data point |
//! | GET | `{ch}/data/statistics` | min / max / avg / count |
//! | POST | `{ch}/data/populate` | Generate the default series |
//! | POST | `{ch}/data/pattern` | Generate a pattern series |
//! | GET | `/buckets` | List bucket tables |

pub mod data_handlers;
pub mod handlers;
mod response;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use welltrack_core::ServiceConfig;
use welltrack_generator::Generator;
use welltrack_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub generator: Arc<Generator>,
}

impl ApiState {
    pub fn new(store: StateStore) -> Self {
        Self {
            generator: Arc::new(Generator::new(store.clone())),
            store,
        }
    }

    /// State whose generator noise is reproducible.
    pub fn with_generator_seed(store: StateStore, seed: u64) -> Self {
        Self {
            generator: Arc::new(Generator::with_seed(store.clone(), seed)),
            store,
        }
    }
}

/// Build the complete API router.
pub fn build_router(store: StateStore, config: &ServiceConfig) -> Router {
    router(ApiState::new(store), config)
}

/// Build the router over an existing [`ApiState`].
pub fn router(state: ApiState, config: &ServiceConfig) -> Router {
    let channel = "/wells/{well_id}/channels/{channel_id}";
    let api_routes = Router::new()
        .route("/wells", get(handlers::list_wells).post(handlers::create_well))
        .route(
            "/wells/{well_id}",
            get(handlers::get_well)
                .put(handlers::update_well)
                .delete(handlers::delete_well),
        )
        .route("/wells/region/{region}", get(handlers::wells_by_region))
        .route("/wells/depth/{depth}", get(handlers::wells_deeper_than))
        .route("/channels", get(handlers::list_channels))
        .route(
            "/wells/{well_id}/channels",
            get(handlers::list_well_channels).post(handlers::create_channel),
        )
        .route(
            channel,
            get(handlers::get_channel)
                .put(handlers::update_channel)
                .delete(handlers::delete_channel),
        )
        .route(
            &format!("{channel}/data"),
            get(data_handlers::get_data_points)
                .post(data_handlers::create_data_point)
                .delete(data_handlers::delete_all_data),
        )
        .route(
            &format!("{channel}/data/batch"),
            post(data_handlers::create_data_points_batch),
        )
        .route(
            &format!("{channel}/data/statistics"),
            get(data_handlers::get_statistics),
        )
        .route(
            &format!("{channel}/data/populate"),
            post(data_handlers::populate),
        )
        .route(
            &format!("{channel}/data/pattern"),
            post(data_handlers::generate_pattern),
        )
        .route(
            &format!("{channel}/data/{{point_id}}"),
            delete(data_handlers::delete_data_point),
        )
        .route("/buckets", get(data_handlers::list_buckets))
        .with_state(state);

    let prefix = config.server.api_prefix.trim_end_matches('/');
    let app = Router::new().route("/", get(handlers::root));
    let app = if prefix.is_empty() {
        app.merge(api_routes)
    } else {
        app.nest(prefix, api_routes)
    };

    app.layer(cors_layer(&config.cors.origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
