//! The story-creation workflow: sanitize, hash, cache check, debit,
//! generate, synthesize, upload, persist. The debit is the commit
//! point: every failure past it is paired with exactly one refund
//! attempt before the error propagates.
//!
//! Known gap carried from the source system: the cache check and the
//! debit are two transactions, not one, so two identical in-flight
//! requests can both miss the cache and both bill.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use speech_core::{Synthesizer, VoiceKey};
use story_core::{input_hash, sanitize, StoryGenerator, StoryRequest};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::ledger::CreditLedger;
use crate::storage::AudioStorage;
use crate::store::{DocumentStore, LibraryEntry, StoryArtifact};

pub struct StoryService {
    store: Arc<DocumentStore>,
    storage: Arc<dyn AudioStorage>,
    generator: StoryGenerator,
    synthesizer: Synthesizer,
    ledger: CreditLedger,
}

/// Result of one create-story call: the artifact plus whether it came
/// from the idempotency cache.
#[derive(Debug, Clone)]
pub struct CreatedStory {
    pub artifact: StoryArtifact,
    pub cached: bool,
}

impl StoryService {
    pub fn new(
        store: Arc<DocumentStore>,
        storage: Arc<dyn AudioStorage>,
        generator: StoryGenerator,
        synthesizer: Synthesizer,
        starter_credits: i64,
    ) -> Self {
        let ledger = CreditLedger::new(store.clone(), starter_credits);
        Self {
            store,
            storage,
            generator,
            synthesizer,
            ledger,
        }
    }

    /// Voice resolution: explicit request override, else the user's
    /// stored default, else the catalog fallback.
    async fn resolve_voice(&self, uid: &str, requested: Option<&str>) -> VoiceKey {
        match requested.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => VoiceKey::normalize(Some(raw)),
            None => match self.store.get_user(uid).await {
                Some(user) => {
                    VoiceKey::parse(&user.default_voice_key).unwrap_or_default()
                }
                None => VoiceKey::default(),
            },
        }
    }

    pub async fn create_story(
        &self,
        identity: &Identity,
        request: &StoryRequest,
    ) -> Result<CreatedStory, ApiError> {
        crate::validation::validate_create_story(request)?;

        let uid = identity.uid.as_str();
        let sanitized = sanitize(request);
        let voice = self.resolve_voice(uid, request.voice_key.as_deref()).await;
        let hash = input_hash(&sanitized, voice.as_str());

        // Idempotency: the same content for the same user returns the
        // prior artifact without billing again.
        if let Some(artifact) = self.store.find_story_by_hash(uid, &hash).await {
            info!(uid, story_id = %artifact.id, "cache hit, returning prior artifact");
            return Ok(CreatedStory {
                artifact,
                cached: true,
            });
        }

        // Commit point. Everything below must refund on failure.
        self.ledger
            .debit_one(uid, identity.email.as_deref())
            .await?;

        let story = match self.generator.generate(&sanitized).await {
            Ok(story) => story,
            Err(err) => return Err(self.refund_after_failure(uid, err.into()).await),
        };

        let audio = match self.synthesizer.generate_speech(&story.text, voice).await {
            Ok(audio) => audio,
            Err(err) => return Err(self.refund_after_failure(uid, err.into()).await),
        };

        let story_id = Uuid::new_v4().to_string();
        let audio_path = format!("audio/{uid}/{story_id}.wav");
        if let Err(err) = self.storage.put(&audio_path, &audio).await {
            return Err(self.refund_after_failure(uid, err.into()).await);
        }

        let now = Utc::now();
        let artifact = StoryArtifact {
            id: story_id.clone(),
            owner_uid: uid.to_string(),
            inputs: sanitized.clone(),
            input_hash: hash,
            voice_key: voice.as_str().to_string(),
            title: story.title.clone(),
            text: story.text,
            audio_path,
            word_count: story.word_count,
            duration_sec: story.duration_sec,
            status: "completed".to_string(),
            created_at: now,
        };
        let entry = LibraryEntry {
            story_id,
            title: story.title,
            mood: sanitized.mood,
            voice_key: voice.as_str().to_string(),
            duration_sec: artifact.duration_sec,
            is_favorite: false,
            progress: 0.0,
            created_at: now,
            last_played_at: None,
        };
        self.store
            .insert_story_with_library(artifact.clone(), entry)
            .await;

        info!(
            uid,
            story_id = %artifact.id,
            words = artifact.word_count,
            "story created"
        );
        Ok(CreatedStory {
            artifact,
            cached: false,
        })
    }

    /// Pair the failed attempt with one refund. A refund failure is an
    /// operational concern; it never masks the original error.
    async fn refund_after_failure(&self, uid: &str, original: ApiError) -> ApiError {
        if let Err(refund_err) = self.ledger.refund_one(uid).await {
            error!(uid, "credit refund failed: {refund_err}");
        }
        original
    }

    pub async fn toggle_favorite(
        &self,
        uid: &str,
        story_id: &str,
        is_favorite: bool,
    ) -> Result<(), ApiError> {
        let uid = uid.to_string();
        let story_id = story_id.to_string();
        self.store
            .transaction(move |c| {
                let entry = c
                    .libraries
                    .get_mut(&uid)
                    .and_then(|lib| lib.get_mut(&story_id))
                    .ok_or_else(|| ApiError::NotFound("story not in library".into()))?;
                entry.is_favorite = is_favorite;
                Ok(())
            })
            .await
    }

    pub async fn update_progress(
        &self,
        uid: &str,
        story_id: &str,
        progress: f64,
    ) -> Result<(), ApiError> {
        let uid = uid.to_string();
        let story_id = story_id.to_string();
        self.store
            .transaction(move |c| {
                let entry = c
                    .libraries
                    .get_mut(&uid)
                    .and_then(|lib| lib.get_mut(&story_id))
                    .ok_or_else(|| ApiError::NotFound("story not in library".into()))?;
                entry.progress = progress;
                entry.last_played_at = Some(Utc::now());
                Ok(())
            })
            .await
    }

    /// Remove the library pointer; owners also lose the artifact and
    /// its audio object. Deleting an already-removed story succeeds.
    pub async fn delete_story(&self, uid: &str, story_id: &str) -> Result<(), ApiError> {
        let uid_owned = uid.to_string();
        let story_id_owned = story_id.to_string();
        let owned_audio_path = self
            .store
            .transaction(move |c| {
                if let Some(lib) = c.libraries.get_mut(&uid_owned) {
                    lib.remove(&story_id_owned);
                }
                let owned = c
                    .stories
                    .get(&story_id_owned)
                    .map(|s| s.owner_uid == uid_owned)
                    .unwrap_or(false);
                if owned {
                    c.stories.remove(&story_id_owned).map(|s| s.audio_path)
                } else {
                    None
                }
            })
            .await;

        if let Some(path) = owned_audio_path {
            // A missing audio object must not fail the delete.
            if let Err(err) = self.storage.delete(&path).await {
                warn!(uid, story_id, "failed to delete audio {path}: {err}");
            }
        }
        Ok(())
    }
}
