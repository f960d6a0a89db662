use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use speech_core::VoiceKey;
use story_core::StoryRequest;

use crate::auth::{authenticate, TokenVerifier};
use crate::error::ApiError;
use crate::orchestrator::StoryService;
use crate::validation::{validate_progress, validate_story_id};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StoryService>,
    pub verifier: Arc<dyn TokenVerifier>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    story_id: String,
    title: String,
    text: String,
    audio_path: String,
    voice_key: String,
    word_count: usize,
    duration_sec: u32,
    cached: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    is_favorite: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    progress: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    key: String,
    display_name: String,
    accent: String,
    gender: String,
}

#[derive(Serialize)]
pub struct Ack {
    ok: bool,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/voices", get(list_voices))
        .route("/stories", post(create_story))
        .route("/stories/{id}/favorite", post(set_favorite))
        .route("/stories/{id}/progress", post(set_progress))
        .route("/stories/{id}", delete(delete_story))
        .with_state(state)
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_voices() -> Json<Vec<VoiceInfo>> {
    let voices = VoiceKey::ALL
        .iter()
        .map(|v| {
            let profile = v.profile();
            VoiceInfo {
                key: v.as_str().to_string(),
                display_name: profile.display_name.to_string(),
                accent: profile.accent.to_string(),
                gender: profile.gender.to_string(),
            }
        })
        .collect();
    Json(voices)
}

pub async fn create_story(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StoryRequest>,
) -> Result<Json<StoryResponse>, ApiError> {
    let identity = authenticate(state.verifier.as_ref(), &headers)?;
    let created = state.service.create_story(&identity, &req).await?;
    let artifact = created.artifact;
    Ok(Json(StoryResponse {
        story_id: artifact.id,
        title: artifact.title,
        text: artifact.text,
        audio_path: artifact.audio_path,
        voice_key: artifact.voice_key,
        word_count: artifact.word_count,
        duration_sec: artifact.duration_sec,
        cached: created.cached,
    }))
}

pub async fn set_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<Ack>, ApiError> {
    let identity = authenticate(state.verifier.as_ref(), &headers)?;
    validate_story_id(&id)?;
    state
        .service
        .toggle_favorite(&identity.uid, &id, req.is_favorite)
        .await?;
    Ok(Json(Ack { ok: true }))
}

pub async fn set_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<Ack>, ApiError> {
    let identity = authenticate(state.verifier.as_ref(), &headers)?;
    validate_story_id(&id)?;
    validate_progress(req.progress)?;
    state
        .service
        .update_progress(&identity.uid, &id, req.progress)
        .await?;
    Ok(Json(Ack { ok: true }))
}

pub async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Ack>, ApiError> {
    let identity = authenticate(state.verifier.as_ref(), &headers)?;
    validate_story_id(&id)?;
    state.service.delete_story(&identity.uid, &id).await?;
    Ok(Json(Ack { ok: true }))
}
