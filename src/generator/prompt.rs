//! Prompt text for the generator and parsing of its JSON replies.

use crate::error::GeneratorError;
use crate::post::{Idea, PostDraft};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Models often wrap JSON in a Markdown fence even when asked not to.
const FENCE_PATTERN: &str = r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$";

pub fn carousel_prompt(topic: &str, days: i64, avoid: &[String]) -> String {
    let mut prompt = format!(
        "You are a LinkedIn content strategist. Write a carousel of {days} posts about \"{topic}\", \
         one per day.\n\
         Return only a JSON array. Each element must be an object with:\n\
         - \"day_offset\": integer day index starting at 0\n\
         - \"content\": the slide text, under 3000 characters\n\
         - \"image_prompt\": a short prompt for an illustrative image\n\
         - \"layout\": one of \"classic\", \"visual\", \"split\", \"infographic\"\n\
         - \"data_points\": for infographic slides, an array of \
         {{\"label\": string, \"value\": number}}, otherwise []\n",
    );
    if !avoid.is_empty() {
        prompt.push_str("\nThese posts are already scheduled; do not repeat them:\n");
        for text in avoid {
            prompt.push_str("- ");
            prompt.push_str(&excerpt(text, 200));
            prompt.push('\n');
        }
    }
    prompt
}

pub fn ideas_prompt(topic: &str) -> String {
    format!(
        "You are a LinkedIn content strategist. Suggest post ideas about \"{topic}\".\n\
         Return only a JSON array of objects with \"title\" (a hook, under 100 characters) \
         and \"description\" (one or two sentences on the angle)."
    )
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn strip_fence(text: &str) -> Result<String, GeneratorError> {
    let re = Regex::new(FENCE_PATTERN).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
    Ok(match re.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().to_string(),
        None => text.trim().to_string(),
    })
}

/// Object form of a listing reply, e.g. `{"slides": [...]}`.
#[derive(Deserialize)]
struct Wrapped<T> {
    #[serde(alias = "posts", alias = "slides", alias = "ideas")]
    items: Vec<T>,
}

fn parse_listing<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, GeneratorError> {
    let body = strip_fence(text)?;
    let malformed = |e: serde_json::Error| GeneratorError::Malformed(e.to_string());
    match body.chars().next() {
        None => Err(GeneratorError::EmptyResponse),
        Some('[') => serde_json::from_str::<Vec<T>>(&body).map_err(malformed),
        Some('{') => serde_json::from_str::<Wrapped<T>>(&body)
            .map(|w| w.items)
            .map_err(malformed),
        Some(_) => Err(GeneratorError::Malformed(format!(
            "expected a JSON array or object, got: {}",
            excerpt(&body, 80)
        ))),
    }
}

pub fn parse_drafts(text: &str) -> Result<Vec<PostDraft>, GeneratorError> {
    parse_listing(text)
}

pub fn parse_ideas(text: &str) -> Result<Vec<Idea>, GeneratorError> {
    parse_listing(text)
}
