use sha2::{Digest, Sha256};

use crate::request::SanitizedRequest;

/// Deterministic content hash used as the idempotency key: at most one
/// billable generation per (user, hash).
///
/// Keys are sorted and each value is JSON-serialized, so the digest is
/// independent of field ordering and stable across process restarts.
pub fn input_hash(request: &SanitizedRequest, voice_key: &str) -> String {
    let mut fields: Vec<(&str, String)> = vec![
        (
            "goodNightMessage",
            serde_json::Value::from(request.good_night_message.as_str()).to_string(),
        ),
        (
            "mood",
            serde_json::Value::from(request.mood.as_str()).to_string(),
        ),
        (
            "protagonist1",
            serde_json::Value::from(request.protagonist1.as_str()).to_string(),
        ),
        (
            "protagonist2",
            serde_json::Value::from(request.protagonist2.as_str()).to_string(),
        ),
        (
            "storyLength",
            serde_json::Value::from(request.story_length.as_str()).to_string(),
        ),
        (
            "tags",
            serde_json::Value::from(request.tags.clone()).to_string(),
        ),
        ("voiceKey", serde_json::Value::from(voice_key).to_string()),
    ];
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let canonical = fields
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("|");

    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{sanitize, StoryRequest};

    fn base_request() -> StoryRequest {
        StoryRequest {
            protagonist1: "Alex".into(),
            protagonist2: "Jamie".into(),
            mood: "Calm".into(),
            tags: vec!["rain".into(), "stars".into()],
            story_length: Some("short".into()),
            ..Default::default()
        }
    }

    #[test]
    fn identical_content_hashes_identically() {
        let a = input_hash(&sanitize(&base_request()), "gb_wavenet_d");
        let b = input_hash(&sanitize(&base_request()), "gb_wavenet_d");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn whitespace_variants_hash_identically() {
        let mut noisy = base_request();
        noisy.protagonist1 = "  Alex ".into();
        noisy.mood = "Calm   ".into();
        assert_eq!(
            input_hash(&sanitize(&noisy), "gb_wavenet_d"),
            input_hash(&sanitize(&base_request()), "gb_wavenet_d"),
        );
    }

    #[test]
    fn different_voice_changes_hash() {
        let s = sanitize(&base_request());
        assert_ne!(
            input_hash(&s, "gb_wavenet_d"),
            input_hash(&s, "us_wavenet_f")
        );
    }

    #[test]
    fn different_tags_change_hash() {
        let mut other = base_request();
        other.tags = vec!["sea".into()];
        assert_ne!(
            input_hash(&sanitize(&base_request()), "gb_wavenet_d"),
            input_hash(&sanitize(&other), "gb_wavenet_d"),
        );
    }
}
