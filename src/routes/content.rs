//! Generation and scheduling routes.

use crate::handlers::{generate_carousel, generate_ideas, schedule_posts};
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn content_routes(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate_carousel))
        .route("/generate-ideas", post(generate_ideas))
        .route("/schedule", post(schedule_posts))
        .with_state(state)
}
