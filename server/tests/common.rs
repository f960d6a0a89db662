//! Shared harness for integration tests: the full router wired to
//! scripted upstream models and in-memory storage, so requests run
//! end to end without the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use serde_json::json;

use server::app::{build_router, AppState};
use server::auth::StaticTokenVerifier;
use server::orchestrator::StoryService;
use server::storage::MemoryStorage;
use server::store::DocumentStore;
use speech_core::{SpeechModel, SynthesisError, Synthesizer, VoiceProfile};
use story_core::{ModelError, RetryPolicy, StoryGenerator, TextModel};

/// Scripted text model. Returns a fixed standard-tier story, or a
/// rate-limit error on every call, and counts invocations either way.
pub struct StubTextModel {
    calls: AtomicUsize,
    rate_limited: bool,
}

impl StubTextModel {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            rate_limited: false,
        })
    }

    pub fn rate_limited() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            rate_limited: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextModel for StubTextModel {
    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited {
            return Err(ModelError::RateLimited);
        }
        Ok(standard_story_json())
    }
}

/// 14 paragraphs of 30 words: inside the standard tier on both axes,
/// so generation never triggers a continuation call.
pub fn standard_story_json() -> String {
    let para = vec!["sleepy"; 30].join(" ");
    let paras: Vec<String> = (0..14).map(|_| format!("\"{para}\"")).collect();
    format!(
        "{{\"title\": \"The Quiet Meadow\", \"paragraphs\": [{}]}}",
        paras.join(", ")
    )
}

/// Scripted speech model: fixed PCM per call, or an upstream failure.
pub struct StubSpeechModel {
    calls: AtomicUsize,
    fail: bool,
}

impl StubSpeechModel {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechModel for StubSpeechModel {
    async fn synthesize(
        &self,
        _ssml: &str,
        _voice: &VoiceProfile,
        _sample_rate: u32,
    ) -> Result<Vec<u8>, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SynthesisError::Upstream("synthesis unavailable".into()));
        }
        Ok(vec![0u8; 4800])
    }
}

pub struct TestHarness {
    pub app: Router,
    pub text: Arc<StubTextModel>,
    pub speech: Arc<StubSpeechModel>,
    pub store: Arc<DocumentStore>,
    pub storage: Arc<MemoryStorage>,
}

pub fn harness_with(text: Arc<StubTextModel>, speech: Arc<StubSpeechModel>) -> TestHarness {
    let store = Arc::new(DocumentStore::new());
    let storage = Arc::new(MemoryStorage::new());

    // Millisecond backoff keeps the rate-limit retry path fast.
    let generator = StoryGenerator::with_retry(
        text.clone(),
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            backoff_multiplier: 2,
        },
    );
    let synthesizer = Synthesizer::new(speech.clone());
    let service = Arc::new(StoryService::new(
        store.clone(),
        storage.clone(),
        generator,
        synthesizer,
        3,
    ));
    let state = AppState {
        service,
        verifier: Arc::new(StaticTokenVerifier),
    };

    TestHarness {
        app: build_router(state),
        text,
        speech,
        store,
        storage,
    }
}

pub fn harness() -> TestHarness {
    harness_with(StubTextModel::ok(), StubSpeechModel::ok())
}

pub fn story_body(protagonist1: &str) -> serde_json::Value {
    json!({
        "protagonist1": protagonist1,
        "protagonist2": "Milo",
        "mood": "Calm",
        "tags": ["rain", "forest"],
        "storyLength": "standard"
    })
}

pub fn post_json(uri: &str, token: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}
