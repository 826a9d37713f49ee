//! Carousel API: drafts social-media carousels with a generative API and stores scheduled posts.

pub mod config;
pub mod error;
pub mod extractors;
pub mod generator;
pub mod handlers;
pub mod post;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{resolve_api_key, AppConfig, GeminiConfig};
pub use error::{AppError, ConfigError, GeneratorError};
pub use generator::{ContentGenerator, GeminiGeneratorFactory, GeneratorFactory};
pub use post::{Idea, NewPost, Post, PostDraft, PostStatus};
pub use routes::{app, common_routes, content_routes};
pub use state::AppState;
pub use store::{PostStore, SessionStats, StoreSession};
