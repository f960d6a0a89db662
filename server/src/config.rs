// Configuration constants for the server

use std::time::Duration;

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub text_model_endpoint: String,
    pub text_model_name: String,
    pub speech_endpoint: String,
    pub data_dir: String,
    pub starter_credits: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8085,
            rate_limit_per_minute: 60,
            request_timeout_secs: 120,
            cors_allowed_origins: None,
            text_model_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            text_model_name: "gpt-4o-mini".to_string(),
            speech_endpoint: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            data_dir: "data".to_string(),
            starter_credits: 3,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let rate_limit_per_minute = std::env::var("RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_per_minute);

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        let text_model_endpoint = std::env::var("TEXT_MODEL_ENDPOINT")
            .unwrap_or(defaults.text_model_endpoint);
        let text_model_name =
            std::env::var("TEXT_MODEL_NAME").unwrap_or(defaults.text_model_name);
        let speech_endpoint =
            std::env::var("SPEECH_ENDPOINT").unwrap_or(defaults.speech_endpoint);
        let data_dir = std::env::var("DATA_DIR").unwrap_or(defaults.data_dir);

        let starter_credits = std::env::var("STARTER_CREDITS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.starter_credits);

        Self {
            port,
            rate_limit_per_minute,
            request_timeout_secs,
            cors_allowed_origins,
            text_model_endpoint,
            text_model_name,
            speech_endpoint,
            data_dir,
            starter_credits,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
