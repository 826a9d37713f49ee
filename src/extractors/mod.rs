//! Request extractors.

pub mod api_key;
pub mod json;

pub use api_key::{ApiKey, GEMINI_API_KEY_HEADER};
pub use json::ApiJson;
