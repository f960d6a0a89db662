use thiserror::Error;

/// Story generation error taxonomy.
#[derive(Debug, Error)]
pub enum StoryError {
    /// Malformed model output (missing title, empty paragraphs, ...).
    #[error("invalid story content: {0}")]
    Validation(String),

    /// The model produced nothing usable or the call failed outright.
    #[error("story generation failed: {0}")]
    Generation(String),

    /// Upstream rate limit persisted through the retry budget.
    #[error("text model rate limited")]
    RateLimited,
}
