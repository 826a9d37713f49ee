//! Router assembly: route groups plus CORS, body limit and request tracing.

mod common;
mod content;

pub use common::{common_routes, HEALTH_MESSAGE};
pub use content::content_routes;

use crate::error::{AppError, ConfigError};
use crate::state::AppState;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Single allowed origin with credentials. Methods and headers are mirrored from the
/// preflight, since wildcards are not allowed together with credentials.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, AppError> {
    let origin = HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
        key: "ALLOWED_ORIGIN",
        message: e.to_string(),
    })?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Full application router.
pub fn app(state: AppState) -> Result<Router, AppError> {
    let cors = cors_layer(&state.config.allowed_origin)?;
    let body_limit = state.config.body_limit_bytes;
    Ok(Router::new()
        .merge(common_routes(state.clone()))
        .merge(content_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
