//! Scheduling endpoint. Accepts any list of post records but does not persist them yet.

use crate::extractors::ApiJson;
use crate::post::{NewPost, PostDraft};
use crate::response::status_ok;
use serde::Deserialize;

/// One submitted record. Recognised shapes are kept typed; anything else is carried as raw JSON.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ScheduleEntry {
    Draft(PostDraft),
    Post(NewPost),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub posts: Vec<ScheduleEntry>,
}

impl ScheduleRequest {
    /// (drafts, post-shaped records, unrecognised records)
    pub fn shape_counts(&self) -> (usize, usize, usize) {
        self.posts.iter().fold((0, 0, 0), |(d, p, o), entry| match entry {
            ScheduleEntry::Draft(_) => (d + 1, p, o),
            ScheduleEntry::Post(_) => (d, p + 1, o),
            ScheduleEntry::Other(_) => (d, p, o + 1),
        })
    }
}

/// POST /schedule: returns a fixed status; no store session is opened.
// TODO: validate entries into `NewPost` rows and insert them via `StoreSession::insert_posts`.
pub async fn schedule_posts(
    ApiJson(body): ApiJson<ScheduleRequest>,
) -> impl axum::response::IntoResponse {
    let (drafts, records, other) = body.shape_counts();
    tracing::info!(drafts, records, other, "schedule requested; persistence not wired");
    status_ok("implemented soon", None)
}
