//! Content generator seam: an external API that turns a topic into drafts or ideas.

mod gemini;
pub mod prompt;

pub use gemini::{GeminiClient, GeminiGenerator, GeminiGeneratorFactory};

use crate::error::GeneratorError;
use crate::post::{Idea, PostDraft};
use crate::store::StoreSession;
use async_trait::async_trait;

/// A generator bound to one request: it owns that request's store session and credential.
/// Dropping the generator releases the session.
#[async_trait]
pub trait ContentGenerator: Send {
    /// Draft a carousel of posts for `topic` spread over `days`. `days` is passed through as given.
    async fn generate_posts(
        &mut self,
        topic: &str,
        days: i64,
    ) -> Result<Vec<PostDraft>, GeneratorError>;

    async fn generate_ideas(&mut self, topic: &str) -> Result<Vec<Idea>, GeneratorError>;
}

/// Builds request-scoped generators. Shared across requests via [`crate::AppState`].
pub trait GeneratorFactory: Send + Sync {
    fn bind(&self, session: StoreSession, api_key: Option<&str>) -> Box<dyn ContentGenerator>;
}
