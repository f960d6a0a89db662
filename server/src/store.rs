//! In-memory transactional document store for users, story artifacts
//! and per-user library entries.
//!
//! All collections live behind one async mutex; a closure passed to
//! [`DocumentStore::transaction`] runs while the lock is held, so
//! every read-then-conditional-write inside it is serializable. This
//! is the atomicity the credit ledger and the artifact+library batch
//! write depend on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use story_core::SanitizedRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub credits: i64,
    pub default_voice_key: String,
    pub created_at: DateTime<Utc>,
}

/// The persisted result of one successful generation. Immutable after
/// creation except for the user-editable title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryArtifact {
    pub id: String,
    pub owner_uid: String,
    pub inputs: SanitizedRequest,
    pub input_hash: String,
    pub voice_key: String,
    pub title: String,
    pub text: String,
    pub audio_path: String,
    pub word_count: usize,
    /// Estimated from word count at a fixed narration rate; not a
    /// measured audio duration.
    pub duration_sec: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Denormalized per-user pointer to an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub story_id: String,
    pub title: String,
    pub mood: String,
    pub voice_key: String,
    pub duration_sec: u32,
    pub is_favorite: bool,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub last_played_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct Collections {
    pub users: HashMap<String, UserRecord>,
    pub stories: HashMap<String, StoryArtifact>,
    /// uid -> story id -> entry
    pub libraries: HashMap<String, HashMap<String, LibraryEntry>>,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: Mutex<Collections>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to all collections.
    pub async fn transaction<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut Collections) -> T,
    {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    pub async fn get_user(&self, uid: &str) -> Option<UserRecord> {
        self.transaction(|c| c.users.get(uid).cloned()).await
    }

    /// Idempotency lookup: an artifact owned by `uid` with the same
    /// content hash.
    pub async fn find_story_by_hash(&self, uid: &str, input_hash: &str) -> Option<StoryArtifact> {
        self.transaction(|c| {
            c.stories
                .values()
                .find(|s| s.owner_uid == uid && s.input_hash == input_hash)
                .cloned()
        })
        .await
    }

    pub async fn get_story(&self, story_id: &str) -> Option<StoryArtifact> {
        self.transaction(|c| c.stories.get(story_id).cloned()).await
    }

    /// Atomic batch write: the artifact and its library pointer land
    /// together or not at all.
    pub async fn insert_story_with_library(&self, story: StoryArtifact, entry: LibraryEntry) {
        self.transaction(|c| {
            let uid = story.owner_uid.clone();
            c.stories.insert(story.id.clone(), story);
            c.libraries.entry(uid).or_default().insert(entry.story_id.clone(), entry);
        })
        .await
    }

    pub async fn credit_balance(&self, uid: &str) -> Option<i64> {
        self.transaction(|c| c.users.get(uid).map(|u| u.credits)).await
    }
}
