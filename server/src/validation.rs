use story_core::StoryRequest;

use crate::error::ApiError;

/// Maximum length for a protagonist name or mood label
const MAX_FIELD_LENGTH: usize = 120;
/// Maximum length for the good-night message
const MAX_MESSAGE_LENGTH: usize = 300;

/// Validate a create-story request before any billing happens
pub fn validate_create_story(req: &StoryRequest) -> Result<(), ApiError> {
    if req.protagonist1.trim().is_empty()
        || req.protagonist2.trim().is_empty()
        || req.mood.trim().is_empty()
    {
        return Err(ApiError::InvalidArgument(
            "Missing required fields.".to_string(),
        ));
    }
    for field in [&req.protagonist1, &req.protagonist2, &req.mood] {
        if field.chars().count() > MAX_FIELD_LENGTH {
            return Err(ApiError::InvalidArgument(format!(
                "Field too long (max {} characters)",
                MAX_FIELD_LENGTH
            )));
        }
    }
    if let Some(msg) = &req.good_night_message {
        if msg.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ApiError::InvalidArgument(format!(
                "Good-night message too long (max {} characters)",
                MAX_MESSAGE_LENGTH
            )));
        }
    }
    Ok(())
}

/// Validate a playback progress value (fraction of the story listened)
pub fn validate_progress(progress: f64) -> Result<(), ApiError> {
    if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
        return Err(ApiError::InvalidArgument(
            "Progress must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

/// Validate a story document id from the request path
pub fn validate_story_id(id: &str) -> Result<(), ApiError> {
    if id.is_empty() || id.len() > 64 {
        return Err(ApiError::InvalidArgument("Invalid story id".to_string()));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ApiError::InvalidArgument("Invalid story id".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> StoryRequest {
        StoryRequest {
            protagonist1: "Luna".to_string(),
            protagonist2: "Milo".to_string(),
            mood: "Calm".to_string(),
            ..StoryRequest::default()
        }
    }

    #[test]
    fn test_validate_create_story_valid() {
        assert!(validate_create_story(&request()).is_ok());
    }

    #[test]
    fn test_validate_create_story_missing_fields() {
        let mut req = request();
        req.protagonist2 = "   ".to_string();
        let result = validate_create_story(&req);
        assert!(result.is_err());
        if let Err(ApiError::InvalidArgument(msg)) = result {
            assert!(msg.contains("required"));
        }
    }

    #[test]
    fn test_validate_create_story_too_long() {
        let mut req = request();
        req.mood = "c".repeat(200);
        assert!(validate_create_story(&req).is_err());
    }

    #[test]
    fn test_validate_progress_bounds() {
        assert!(validate_progress(0.0).is_ok());
        assert!(validate_progress(0.5).is_ok());
        assert!(validate_progress(1.0).is_ok());
        assert!(validate_progress(-0.1).is_err());
        assert!(validate_progress(1.1).is_err());
        assert!(validate_progress(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_story_id() {
        assert!(validate_story_id("0a1b2c3d-4e5f-6789-abcd-ef0123456789").is_ok());
        assert!(validate_story_id("").is_err());
        assert!(validate_story_id("../escape").is_err());
        assert!(validate_story_id(&"x".repeat(100)).is_err());
    }
}
