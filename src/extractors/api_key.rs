//! Extract the per-request generator credential from the `X-Gemini-Api-Key` header.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const GEMINI_API_KEY_HEADER: &str = "X-Gemini-Api-Key";

/// Optional API key supplied by the caller. Blank or non-UTF-8 values count as absent.
#[derive(Clone, Debug, Default)]
pub struct ApiKey(pub Option<String>);

impl ApiKey {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(GEMINI_API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(ApiKey(value))
    }
}
