use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::StoryError;
use crate::model::{ModelError, TextModel};
use crate::prompt::{continuation_prompt, story_prompt};
use crate::request::SanitizedRequest;
use crate::retry::RetryPolicy;

/// Narration rate tuned for slow bedtime pacing, well under average
/// speech rate.
const NARRATION_WPM: f64 = 120.0;
/// No story is ever estimated shorter than this.
const MIN_DURATION_SEC: u32 = 30;
/// A correction pass never asks for more than this many paragraphs.
const MAX_EXTEND_PARAGRAPHS: usize = 10;

/// Final story document. `duration_sec` is an estimate derived from
/// the word count at a fixed narration rate, not a measured audio
/// duration.
#[derive(Debug, Clone)]
pub struct StoryText {
    pub title: String,
    pub text: String,
    pub word_count: usize,
    pub duration_sec: u32,
}

/// Drives the model call, JSON recovery, length-correction loop and
/// trimming until the tier contract is satisfied.
pub struct StoryGenerator {
    model: Arc<dyn TextModel>,
    retry: RetryPolicy,
}

impl StoryGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(model: Arc<dyn TextModel>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    /// One model call with rate-limit retry, returning the recovered
    /// JSON object.
    async fn gen_once(&self, prompt: &str) -> Result<Value, StoryError> {
        let raw = self
            .retry
            .run(
                |e| matches!(e, ModelError::RateLimited),
                || self.model.generate(prompt),
            )
            .await
            .map_err(|e| match e {
                ModelError::RateLimited => StoryError::RateLimited,
                ModelError::Upstream(msg) => StoryError::Generation(msg),
            })?;

        if raw.trim().is_empty() {
            return Err(StoryError::Generation(
                "no content generated from model".into(),
            ));
        }
        extract_json_object(&raw)
    }

    pub async fn generate(&self, request: &SanitizedRequest) -> Result<StoryText, StoryError> {
        let cfg = request.story_length.contract();

        let data = self.gen_once(&story_prompt(request)).await?;
        let (title, mut paragraphs) = validate_story_json(&data)?;

        let mut word_count = count_words(&paragraphs);

        // Length correction: one best-effort continuation request when
        // the story comes back under the tier floor.
        if word_count < cfg.min_words || paragraphs.len() < cfg.min_paragraphs {
            let remaining = cfg.max_paragraphs.saturating_sub(paragraphs.len());
            let add_count = remaining.min(MAX_EXTEND_PARAGRAPHS);
            if add_count > 0 {
                info!(
                    words = word_count,
                    paragraphs = paragraphs.len(),
                    add_count,
                    "story under tier floor, requesting continuation"
                );
                match self.gen_once(&continuation_prompt(add_count)).await {
                    Ok(extra) => {
                        if let Some(more) = extra.get("paragraphs").and_then(Value::as_array) {
                            let mut merged = Value::Object(serde_json::Map::new());
                            merged["title"] = Value::from(title.clone());
                            let mut all: Vec<Value> =
                                paragraphs.iter().map(|p| Value::from(p.as_str())).collect();
                            all.extend(more.iter().cloned());
                            all.truncate(cfg.max_paragraphs);
                            merged["paragraphs"] = Value::Array(all);

                            let (_, revalidated) = validate_story_json(&merged)?;
                            paragraphs = revalidated;
                            word_count = count_words(&paragraphs);
                        }
                    }
                    Err(err) => {
                        // Best effort only: keep the original content.
                        warn!("failed to extend story, using original: {err}");
                    }
                }
            }
        }

        // Enforce the word ceiling by dropping the shortest paragraph,
        // never the final one: it carries the wind-down.
        while word_count > cfg.max_words && paragraphs.len() > cfg.min_paragraphs {
            let last = paragraphs.len() - 1;
            let shortest = paragraphs[..last]
                .iter()
                .enumerate()
                .min_by_key(|(_, p)| p.len())
                .map(|(i, _)| i);
            match shortest {
                Some(i) => {
                    paragraphs.remove(i);
                }
                None => break,
            }
            word_count = count_words(&paragraphs);
        }

        let mut text = paragraphs.join("\n\n");

        // The goodnight message rides outside the length contract but
        // counts toward the narration estimate.
        if !request.good_night_message.is_empty() {
            text.push_str("\n\n");
            text.push_str(&request.good_night_message);
            word_count += request.good_night_message.split_whitespace().count();
        }

        Ok(StoryText {
            title,
            text,
            word_count,
            duration_sec: estimate_duration_sec(word_count),
        })
    }
}

fn count_words(paragraphs: &[String]) -> usize {
    paragraphs
        .iter()
        .map(|p| p.split_whitespace().count())
        .sum()
}

fn estimate_duration_sec(words: usize) -> u32 {
    let sec = (words as f64 / NARRATION_WPM * 60.0).round() as u32;
    sec.max(MIN_DURATION_SEC)
}

fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    for prefix in ["```json", "```JSON", "```"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }
    s
}

/// Recover a JSON object from raw model output: direct parse first,
/// then the first `{...}` block when the model wrapped it in prose.
fn extract_json_object(raw: &str) -> Result<Value, StoryError> {
    let cleaned = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                if value.is_object() {
                    return Ok(value);
                }
            }
        }
    }

    Err(StoryError::Generation(
        "no JSON object found in model response".into(),
    ))
}

/// Structural validation of the story document: non-empty title,
/// non-empty single-line paragraphs.
fn validate_story_json(data: &Value) -> Result<(String, Vec<String>), StoryError> {
    let obj = data
        .as_object()
        .ok_or_else(|| StoryError::Validation("story JSON is not an object".into()))?;

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if title.is_empty() {
        return Err(StoryError::Validation("story JSON missing 'title'".into()));
    }

    let paragraphs = obj
        .get("paragraphs")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| StoryError::Validation("story JSON missing 'paragraphs'".into()))?;

    let clean: Vec<String> = paragraphs
        .iter()
        .filter_map(Value::as_str)
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();

    if clean.is_empty() {
        return Err(StoryError::Validation("story paragraphs empty".into()));
    }

    Ok((title.to_string(), clean))
}
