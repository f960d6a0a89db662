use serde::{Deserialize, Serialize};

const MAX_NAME_LEN: usize = 60;
const MAX_MOOD_LEN: usize = 30;
const MAX_TAG_LEN: usize = 30;
const MAX_TAGS: usize = 6;

/// Raw story request as submitted by the client. Free-text fields are
/// untrusted until passed through [`sanitize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRequest {
    pub protagonist1: String,
    pub protagonist2: String,
    pub mood: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub story_length: Option<String>,
    #[serde(default)]
    pub voice_key: Option<String>,
    #[serde(default)]
    pub good_night_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryLength {
    Short,
    Standard,
    Long,
}

impl StoryLength {
    /// Unrecognized values fall back to `Standard`.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("short") => StoryLength::Short,
            Some("long") => StoryLength::Long,
            _ => StoryLength::Standard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoryLength::Short => "short",
            StoryLength::Standard => "standard",
            StoryLength::Long => "long",
        }
    }

    pub fn contract(self) -> LengthContract {
        match self {
            StoryLength::Short => LengthContract {
                min_words: 200,
                max_words: 320,
                min_paragraphs: 8,
                max_paragraphs: 12,
                description: "brief and focused",
            },
            StoryLength::Standard => LengthContract {
                min_words: 320,
                max_words: 520,
                min_paragraphs: 12,
                max_paragraphs: 18,
                description: "moderate length",
            },
            StoryLength::Long => LengthContract {
                min_words: 650,
                max_words: 1100,
                min_paragraphs: 22,
                max_paragraphs: 32,
                description: "extended and detailed",
            },
        }
    }
}

/// Word and paragraph bounds for one length tier.
#[derive(Debug, Clone, Copy)]
pub struct LengthContract {
    pub min_words: usize,
    pub max_words: usize,
    pub min_paragraphs: usize,
    pub max_paragraphs: usize,
    pub description: &'static str,
}

/// Whitespace-collapsed, length-bounded request fields. The voice key
/// is resolved separately against the speech catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedRequest {
    pub protagonist1: String,
    pub protagonist2: String,
    pub mood: String,
    pub tags: Vec<String>,
    pub story_length: StoryLength,
    pub good_night_message: String,
}

/// Collapse runs of whitespace to single spaces, trim, and truncate
/// to `max_len` characters.
fn safe_string(input: &str, max_len: usize) -> String {
    let collapsed: String = input.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_len).collect()
}

/// Normalize and bound all free-text fields of a request.
pub fn sanitize(request: &StoryRequest) -> SanitizedRequest {
    let mood = safe_string(&request.mood, MAX_MOOD_LEN);
    let mood = if mood.is_empty() { "Calm".to_string() } else { mood };

    let mut tags: Vec<String> = request
        .tags
        .iter()
        .map(|t| safe_string(t, MAX_TAG_LEN))
        .filter(|t| !t.is_empty())
        .collect();
    // Order-preserving dedup: repeats anywhere in the list collapse
    // onto their first occurrence.
    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    tags.truncate(MAX_TAGS);

    SanitizedRequest {
        protagonist1: safe_string(&request.protagonist1, MAX_NAME_LEN),
        protagonist2: safe_string(&request.protagonist2, MAX_NAME_LEN),
        mood,
        tags,
        story_length: StoryLength::parse(request.story_length.as_deref()),
        good_night_message: request
            .good_night_message
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_truncates() {
        let req = StoryRequest {
            protagonist1: "  Alex   the \t Brave  ".into(),
            protagonist2: "J".repeat(120),
            mood: "  Calm  and  soft ".into(),
            ..Default::default()
        };
        let s = sanitize(&req);
        assert_eq!(s.protagonist1, "Alex the Brave");
        assert_eq!(s.protagonist2.chars().count(), 60);
        assert_eq!(s.mood, "Calm and soft");
    }

    #[test]
    fn empty_mood_defaults_to_calm() {
        let req = StoryRequest {
            protagonist1: "Alex".into(),
            protagonist2: "Jamie".into(),
            mood: "   ".into(),
            ..Default::default()
        };
        assert_eq!(sanitize(&req).mood, "Calm");
    }

    #[test]
    fn tags_filtered_deduped_and_capped() {
        let req = StoryRequest {
            protagonist1: "A".into(),
            protagonist2: "B".into(),
            mood: "Calm".into(),
            tags: vec![
                "rain".into(),
                "rain".into(),
                "  ".into(),
                "stars".into(),
                "sea".into(),
                "moss".into(),
                "fog".into(),
                "wind".into(),
                "extra".into(),
            ],
            ..Default::default()
        };
        let s = sanitize(&req);
        assert_eq!(s.tags.len(), 6);
        assert_eq!(s.tags[0], "rain");
        assert_eq!(s.tags[1], "stars");
    }

    #[test]
    fn non_adjacent_duplicate_tags_are_removed() {
        let req = StoryRequest {
            protagonist1: "A".into(),
            protagonist2: "B".into(),
            mood: "Calm".into(),
            tags: vec!["rain".into(), "stars".into(), "rain".into()],
            ..Default::default()
        };
        assert_eq!(sanitize(&req).tags, vec!["rain", "stars"]);
    }

    #[test]
    fn unknown_length_defaults_to_standard() {
        assert_eq!(StoryLength::parse(Some("epic")), StoryLength::Standard);
        assert_eq!(StoryLength::parse(None), StoryLength::Standard);
        assert_eq!(StoryLength::parse(Some("short")), StoryLength::Short);
        assert_eq!(StoryLength::parse(Some("long")), StoryLength::Long);
    }
}
