// src/handlers/voiceover.rs
use crate::handlers::ApiError;
use crate::storage;
use crate::utils;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct VoiceoverQuery {
    /// Optional ElevenLabs voice ID; defaults to the configured narrator
    #[serde(default)]
    pub voice_id: Option<String>,
    /// Website URL used to scope assets
    #[serde(default)]
    pub website: Option<String>,
}

pub fn voiceover_routes() -> Router {
    Router::new()
        .route("/generate-voiceovers", post(generate_voiceovers))
        .route("/voices", get(list_voices))
}

/// Voices available to the configured ElevenLabs account, for voice pickers
async fn list_voices(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let elevenlabs = state
        .elevenlabs_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("ELEVENLABS_API_KEY is not configured"))?;

    let voices = elevenlabs
        .list_voices()
        .await
        .map_err(|e| ApiError::bad_gateway(e.to_string()))?;

    Ok(Json(json!({
        "default_voice_id": elevenlabs.default_voice_id(),
        "voices": voices,
    })))
}

/// Generate a voiceover MP3 for every storyboard scene with voice-over text.
/// If a scene video already exists, the audio is clipped to its duration.
async fn generate_voiceovers(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<VoiceoverQuery>,
) -> Result<Json<Value>, ApiError> {
    let elevenlabs = state
        .elevenlabs_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("ELEVENLABS_API_KEY is not configured"))?;

    let slug = storage::website_to_slug(params.website.as_deref());
    let scenes = storage::load_storyboard(&slug).map_err(|_| {
        ApiError::not_found("Storyboard file not found. Please generate storyboard first.")
    })?;

    let voice_id = params
        .voice_id
        .as_deref()
        .unwrap_or_else(|| elevenlabs.default_voice_id());

    let mut results: Vec<Value> = Vec::new();
    for (index, scene) in scenes.iter().enumerate() {
        let scene_number = index + 1;
        let text = scene.voice_over_text.trim();
        if text.is_empty() {
            continue;
        }

        let max_duration = utils::media_duration(&storage::scene_video_path(&slug, scene_number));

        match synthesize_voiceover(elevenlabs, &slug, scene_number, text, voice_id, max_duration)
            .await
        {
            Ok(result) => results.push(result),
            Err(error) => {
                tracing::error!("Voiceover failed for scene {}: {}", scene_number, error);
                results.push(json!({
                    "success": false,
                    "scene_index": scene_number,
                    "error": error,
                }));
            }
        }
    }

    let successful = results
        .iter()
        .filter(|r| r["success"] == json!(true))
        .count();
    let failed = results.len() - successful;
    tracing::info!("🔊 Voiceovers complete: {} ok, {} failed", successful, failed);

    Ok(Json(json!({
        "success": true,
        "total_scenes": results.len(),
        "successful": successful,
        "failed": failed,
        "details": results,
    })))
}

async fn synthesize_voiceover(
    elevenlabs: &crate::elevenlabs_client::ElevenLabsClient,
    slug: &str,
    scene_number: usize,
    text: &str,
    voice_id: &str,
    max_duration: Option<f64>,
) -> Result<Value, String> {
    let audio = elevenlabs
        .text_to_speech(text, voice_id, None)
        .await
        .map_err(|e| e.to_string())?;

    let output_path = storage::voiceover_path(slug, scene_number);
    utils::ensure_parent_dir(&output_path)?;
    std::fs::write(&output_path, &audio)
        .map_err(|e| format!("Failed to write {}: {}", output_path.display(), e))?;

    let mut duration = utils::media_duration(&output_path);
    let mut clipped = false;
    if let (Some(max), Some(actual)) = (max_duration, duration) {
        if actual > max {
            utils::clip_audio_to_duration(&output_path, max)?;
            duration = utils::media_duration(&output_path).or(Some(max));
            clipped = true;
        }
    }

    Ok(json!({
        "success": true,
        "scene_index": scene_number,
        "audio_path": output_path.to_string_lossy(),
        "public_url": storage::public_url(&output_path),
        "voice_id": voice_id,
        "text_length": text.len(),
        "duration_seconds": duration,
        "clipped_to_video": clipped,
        "max_duration_seconds": max_duration,
    }))
}
