use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;
use crate::voices::VoiceProfile;

/// Seam for the speech synthesis endpoint: SSML + voice in, raw
/// LINEAR16 PCM out at the requested sample rate.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceProfile,
        sample_rate: u32,
    ) -> Result<Vec<u8>, SynthesisError>;
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelector<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    ssml: &'a str,
}

#[derive(Serialize)]
struct VoiceSelector<'a> {
    #[serde(rename = "languageCode")]
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: &'static str,
    #[serde(rename = "speakingRate")]
    speaking_rate: f32,
    pitch: f32,
    #[serde(rename = "sampleRateHertz")]
    sample_rate_hertz: u32,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent", default)]
    audio_content: String,
}

/// HTTP client for a text-to-speech REST endpoint that returns
/// base64-encoded audio content.
pub struct HttpSpeechClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl HttpSpeechClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechModel for HttpSpeechClient {
    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceProfile,
        sample_rate: u32,
    ) -> Result<Vec<u8>, SynthesisError> {
        let body = SynthesizeRequest {
            input: SynthesisInput { ssml },
            voice: VoiceSelector {
                language_code: voice.language_code,
                name: voice.voice_name,
            },
            audio_config: AudioConfig {
                audio_encoding: "LINEAR16",
                speaking_rate: voice.speaking_rate,
                pitch: voice.pitch,
                sample_rate_hertz: sample_rate,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Upstream(format!(
                "status {status}: {detail}"
            )));
        }

        let parsed = response
            .json::<SynthesizeResponse>()
            .await
            .map_err(|e| SynthesisError::Upstream(e.to_string()))?;

        if parsed.audio_content.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        base64::engine::general_purpose::STANDARD
            .decode(&parsed.audio_content)
            .map_err(|e| SynthesisError::Upstream(format!("audio content not base64: {e}")))
    }
}
