//! Generator-backed handlers: carousel drafts and idea lists.

use crate::error::AppError;
use crate::extractors::{ApiJson, ApiKey};
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_DAYS: i64 = 5;

fn default_days() -> i64 {
    DEFAULT_DAYS
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    /// Forwarded as given; zero or negative values are not rejected here.
    #[serde(default = "default_days")]
    pub days: i64,
}

#[derive(Debug, Deserialize)]
pub struct IdeasRequest {
    pub topic: String,
}

fn require_topic(topic: &str) -> Result<&str, AppError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("topic must not be empty".into()));
    }
    Ok(topic)
}

/// POST /generate: draft a carousel for `topic` over `days` days.
pub async fn generate_carousel(
    State(state): State<AppState>,
    api_key: ApiKey,
    ApiJson(body): ApiJson<GenerateRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let topic = require_topic(&body.topic)?;
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, topic, days = body.days, "generating carousel");

    let session = state.store.session().await?;
    let mut generator = state.generators.bind(session, api_key.as_deref());
    let drafts = generator.generate_posts(topic, body.days).await?;

    tracing::info!(%request_id, drafts = drafts.len(), "carousel generated");
    Ok(success_one_ok(drafts))
}

/// POST /generate-ideas: idea-level suggestions for `topic`.
pub async fn generate_ideas(
    State(state): State<AppState>,
    api_key: ApiKey,
    ApiJson(body): ApiJson<IdeasRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let topic = require_topic(&body.topic)?;
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, topic, "generating ideas");

    let session = state.store.session().await?;
    let mut generator = state.generators.bind(session, api_key.as_deref());
    let ideas = generator.generate_ideas(topic).await?;

    tracing::info!(%request_id, ideas = ideas.len(), "ideas generated");
    Ok(success_one_ok(ideas))
}
