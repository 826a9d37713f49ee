//! Post entity, its status, and the draft shapes produced by the generator.

use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Publishing status of a post. Stored as lowercase text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Pending,
    Posted,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Posted => "posted",
            PostStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PostStatus::Pending),
            "posted" => Ok(PostStatus::Posted),
            "failed" => Ok(PostStatus::Failed),
            _ => Err(AppError::Validation(format!(
                "invalid post status: {} (expected pending, posted or failed)",
                s
            ))),
        }
    }
}

/// A scheduled social-media post as persisted in the `posts` table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub scheduled_date: DateTime<Utc>,
    pub content_text: String,
    pub image_path: Option<String>,
    pub image_prompt: Option<String>,
    pub status: PostStatus,
    pub linkedin_post_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Checks that a platform post id is present exactly when the post is marked posted.
    /// Rows written before transitions were validated may violate this; callers check it.
    pub fn invariant_violation(&self) -> Option<String> {
        let has_external_id = self
            .linkedin_post_id
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        match (self.status, has_external_id) {
            (PostStatus::Posted, false) => Some(format!(
                "post {} is posted but has no linkedin_post_id",
                self.id
            )),
            (PostStatus::Pending | PostStatus::Failed, true) => Some(format!(
                "post {} is {} but carries linkedin_post_id",
                self.id, self.status
            )),
            _ => None,
        }
    }
}

/// Insert shape. New posts always start as pending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub scheduled_date: DateTime<Utc>,
    pub content_text: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideLayout {
    Classic,
    Visual,
    Split,
    Infographic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

/// One generated slide: text, an image prompt and presentation hints.
///
/// Presentation hints are read leniently: an unknown layout is dropped, `day_offset` may be
/// an integral float, and data points with a non-numeric value (after stripping `%` and
/// thousands separators) are skipped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    #[serde(default, deserialize_with = "lenient::day_offset")]
    pub day_offset: i64,
    pub content: String,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::layout",
        skip_serializing_if = "Option::is_none"
    )]
    pub layout: Option<SlideLayout>,
    #[serde(
        default,
        deserialize_with = "lenient::data_points",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub data_points: Vec<DataPoint>,
}

mod lenient {
    use super::{DataPoint, SlideLayout};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn day_offset<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
        match Option::<Value>::deserialize(de)? {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(i),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(D::Error::custom(format!("day_offset must be an integer, got {}", n))),
            },
            Some(other) => Err(D::Error::custom(format!(
                "day_offset must be an integer, got {}",
                other
            ))),
        }
    }

    pub fn layout<'de, D: Deserializer<'de>>(de: D) -> Result<Option<SlideLayout>, D::Error> {
        let raw = Option::<Value>::deserialize(de)?;
        Ok(raw.and_then(|v| match v {
            Value::String(s) => serde_json::from_value(Value::String(s.trim().to_lowercase())).ok(),
            _ => None,
        }))
    }

    pub fn data_points<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<DataPoint>, D::Error> {
        let raw = Option::<Vec<Value>>::deserialize(de)?.unwrap_or_default();
        Ok(raw.into_iter().filter_map(data_point).collect())
    }

    fn data_point(v: Value) -> Option<DataPoint> {
        let label = v.get("label")?.as_str()?.trim().to_string();
        let value = match v.get("value")? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s
                .trim()
                .trim_end_matches('%')
                .replace(',', "")
                .trim()
                .parse::<f64>()
                .ok()?,
            _ => return None,
        };
        Some(DataPoint { label, value })
    }
}

impl PostDraft {
    /// Schedule this draft `day_offset` days after `start`.
    pub fn to_new_post(&self, start: DateTime<Utc>) -> NewPost {
        NewPost {
            scheduled_date: start + Duration::days(self.day_offset),
            content_text: self.content.clone(),
            image_path: None,
            image_prompt: self.image_prompt.clone().filter(|p| !p.trim().is_empty()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub title: String,
    #[serde(default)]
    pub description: String,
}
