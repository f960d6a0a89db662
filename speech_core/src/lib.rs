//! Speech synthesis for the Moonstone bedtime story service.
//!
//! Converts final story text into a single WAV buffer for a catalog
//! voice: paragraph-only SSML shaping, paragraph-grouped chunking for
//! long texts, sequential chunk synthesis, one container wrap.

mod chunk;
mod error;
mod model;
mod ssml;
mod voices;
pub mod wav;

use std::sync::Arc;

use tracing::debug;

pub use chunk::chunk_by_paragraphs;
pub use error::SynthesisError;
pub use model::{HttpSpeechClient, SpeechModel};
pub use ssml::text_to_ssml;
pub use voices::{VoiceKey, VoiceProfile};

/// Fixed synthesis rate. The WAV header is written with this same
/// value; the two drifting apart is the historical garbled-playback
/// failure mode.
pub const SAMPLE_RATE_HZ: u32 = 24_000;

/// Character budget for a single synthesis call.
pub const MAX_CHUNK_CHARS: usize = 1_400;

/// Orchestrates chunking, per-chunk synthesis and container wrapping.
pub struct Synthesizer {
    model: Arc<dyn SpeechModel>,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn SpeechModel>) -> Self {
        Self { model }
    }

    /// Synthesize story text with the given voice and return one WAV
    /// buffer.
    ///
    /// Chunks are synthesized sequentially, not fanned out: sample
    /// order in the concatenation must match paragraph order.
    pub async fn generate_speech(
        &self,
        text: &str,
        voice: VoiceKey,
    ) -> Result<Vec<u8>, SynthesisError> {
        let profile = voice.profile();
        let chunks = chunk_by_paragraphs(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        debug!(
            voice = voice.as_str(),
            chunks = chunks.len(),
            "synthesizing story audio"
        );

        let mut pcm = Vec::new();
        for chunk in &chunks {
            let ssml = text_to_ssml(chunk);
            let samples = self
                .model
                .synthesize(&ssml, profile, SAMPLE_RATE_HZ)
                .await?;
            if samples.is_empty() {
                return Err(SynthesisError::EmptyAudio);
            }
            pcm.extend_from_slice(&samples);
        }

        Ok(wav::pcm_to_wav(&pcm, SAMPLE_RATE_HZ, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingModel {
        calls: AtomicUsize,
        requested_rates: Mutex<Vec<u32>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingModel {
        fn new(fail_on_call: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requested_rates: Mutex::new(Vec::new()),
                fail_on_call,
            })
        }
    }

    #[async_trait]
    impl SpeechModel for RecordingModel {
        async fn synthesize(
            &self,
            ssml: &str,
            _voice: &VoiceProfile,
            sample_rate: u32,
        ) -> Result<Vec<u8>, SynthesisError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(n) {
                return Err(SynthesisError::EmptyAudio);
            }
            self.requested_rates.lock().unwrap().push(sample_rate);
            // Two PCM bytes per paragraph so concatenation is visible.
            let paras = ssml.matches("<p>").count();
            Ok(vec![0u8; paras * 2])
        }
    }

    #[tokio::test]
    async fn short_text_is_one_call_wrapped_once() {
        let model = RecordingModel::new(None);
        let synth = Synthesizer::new(model.clone());
        let out = synth
            .generate_speech("First.\n\nSecond.", VoiceKey::GbWavenetD)
            .await
            .unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(wav::wav_sample_rate(&out), Some(SAMPLE_RATE_HZ));
        // 2 paragraphs -> 4 PCM bytes + 44 header bytes.
        assert_eq!(out.len(), 48);
    }

    #[tokio::test]
    async fn long_text_chunks_sequentially_and_concatenates() {
        let para = "z".repeat(600);
        let text = format!("{para}\n\n{para}\n\n{para}\n\n{para}");
        let model = RecordingModel::new(None);
        let synth = Synthesizer::new(model.clone());
        let out = synth.generate_speech(&text, VoiceKey::UsWavenetF).await.unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        // 4 paragraphs total across chunks -> 8 PCM bytes, one header.
        assert_eq!(out.len(), 52);
        let rates = model.requested_rates.lock().unwrap();
        assert!(rates.iter().all(|&r| r == SAMPLE_RATE_HZ));
    }

    #[tokio::test]
    async fn header_rate_equals_synthesis_rate() {
        let model = RecordingModel::new(None);
        let synth = Synthesizer::new(model.clone());
        let out = synth
            .generate_speech("Close your eyes.", VoiceKey::GbWavenetC)
            .await
            .unwrap();
        let requested = model.requested_rates.lock().unwrap()[0];
        assert_eq!(wav::wav_sample_rate(&out), Some(requested));
    }

    #[tokio::test]
    async fn failed_chunk_aborts_whole_synthesis() {
        let para = "z".repeat(600);
        let text = format!("{para}\n\n{para}\n\n{para}\n\n{para}");
        let model = RecordingModel::new(Some(1));
        let synth = Synthesizer::new(model);
        let err = synth
            .generate_speech(&text, VoiceKey::GbWavenetD)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyAudio));
    }

    #[tokio::test]
    async fn blank_text_is_an_error() {
        let model = RecordingModel::new(None);
        let synth = Synthesizer::new(model);
        let err = synth
            .generate_speech("   ", VoiceKey::GbWavenetD)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyAudio));
    }
}
