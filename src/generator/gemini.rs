//! Gemini `generateContent` backend.

use super::prompt::{carousel_prompt, ideas_prompt, parse_drafts, parse_ideas};
use super::{ContentGenerator, GeneratorFactory};
use crate::config::{resolve_api_key, GeminiConfig};
use crate::error::GeneratorError;
use crate::post::{Idea, PostDraft};
use crate::store::StoreSession;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Number of already-scheduled posts shown to the model so it does not repeat them.
const RECENT_CONTEXT_LIMIT: u32 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for one model. Cheap to clone; shares the connection pool.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, GeneratorError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(GeminiClient {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one prompt and return the concatenated text of the first candidate.
    pub async fn generate_text(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> Result<String, GeneratorError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.9,
            },
        };
        let response = self
            .http
            .post(self.generate_url())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| raw.trim().to_string());
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Shared factory holding the HTTP client and the configured default key.
pub struct GeminiGeneratorFactory {
    client: GeminiClient,
    default_api_key: Option<String>,
}

impl GeminiGeneratorFactory {
    pub fn new(config: &GeminiConfig) -> Result<Self, GeneratorError> {
        Ok(GeminiGeneratorFactory {
            client: GeminiClient::new(config)?,
            default_api_key: config.api_key.clone(),
        })
    }
}

impl GeneratorFactory for GeminiGeneratorFactory {
    fn bind(&self, session: StoreSession, api_key: Option<&str>) -> Box<dyn ContentGenerator> {
        Box::new(GeminiGenerator {
            client: self.client.clone(),
            api_key: resolve_api_key(api_key, self.default_api_key.as_deref()),
            session,
        })
    }
}

pub struct GeminiGenerator {
    client: GeminiClient,
    api_key: Option<String>,
    session: StoreSession,
}

impl GeminiGenerator {
    fn api_key(&self) -> Result<&str, GeneratorError> {
        self.api_key.as_deref().ok_or(GeneratorError::MissingApiKey)
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate_posts(
        &mut self,
        topic: &str,
        days: i64,
    ) -> Result<Vec<PostDraft>, GeneratorError> {
        self.api_key()?;
        let recent = self
            .session
            .recent_content(RECENT_CONTEXT_LIMIT)
            .await
            .map_err(|e| GeneratorError::Store(e.to_string()))?;
        let prompt = carousel_prompt(topic, days, &recent);
        tracing::debug!(model = self.client.model(), avoid = recent.len(), "requesting carousel");
        let text = self.client.generate_text(self.api_key()?, &prompt).await?;
        parse_drafts(&text)
    }

    async fn generate_ideas(&mut self, topic: &str) -> Result<Vec<Idea>, GeneratorError> {
        let prompt = ideas_prompt(topic);
        tracing::debug!(model = self.client.model(), "requesting ideas");
        let text = self.client.generate_text(self.api_key()?, &prompt).await?;
        parse_ideas(&text)
    }
}
