// src/handlers/scenes.rs
// Scene image generation endpoints. Both run the character analysis first so
// recurring characters keep a consistent look across scenes.

use crate::handlers::ApiError;
use crate::models::storyboard::{GenerateScenesRequest, RegenerateSceneRequest, StoryboardScene};
use crate::services::character::{self, CharacterAnalysis};
use crate::services::scene_images;
use crate::storage;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SceneQuery {
    /// Website URL used to scope assets
    #[serde(default)]
    pub website: Option<String>,
}

pub fn scene_routes() -> Router {
    Router::new()
        .route("/generate-scenes", post(generate_scenes))
        .route("/regenerate-scene", post(regenerate_scene))
}

/// Generate an image for every storyboard scene
async fn generate_scenes(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SceneQuery>,
    Json(payload): Json<GenerateScenesRequest>,
) -> Result<Json<Value>, ApiError> {
    let (openai, gemini) = require_clients(&state)?;
    let slug = storage::website_to_slug(params.website.as_deref());

    // A storyboard in the request body becomes the persisted one for the slug
    let scenes = match payload.storyboard {
        Some(scenes) => {
            storage::save_storyboard(&slug, &scenes).map_err(ApiError::internal)?;
            scenes
        }
        None => storage::load_storyboard(&slug).map_err(ApiError::not_found)?,
    };

    tracing::info!("🔍 Analyzing character consistency across {} scenes", scenes.len());
    let analysis = character::analyze_character_usage(openai, &scenes)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Character analysis unavailable, continuing without: {}", e);
            CharacterAnalysis::default()
        });

    let mut results = Vec::with_capacity(scenes.len());
    for (index, scene) in scenes.iter().enumerate() {
        let scene_number = index + 1;
        if scene.scene_description.trim().is_empty() {
            results.push(json!({
                "scene": scene_number,
                "status": "error",
                "message": "Missing scene_description",
            }));
            continue;
        }

        let prompt = scene_images::scene_image_prompt(&scene.scene_description);
        let references = scene_images::gather_references(&slug, &analysis, index);

        match scene_images::generate_scene_image(
            gemini,
            &slug,
            scene_number,
            &prompt,
            &references,
        )
        .await
        {
            Ok(path) => results.push(json!({
                "scene": scene_number,
                "status": "success",
                "output_path": path.to_string_lossy(),
                "public_url": storage::public_url(&path),
            })),
            Err(message) => results.push(json!({
                "scene": scene_number,
                "status": "error",
                "message": message,
            })),
        }
    }

    let generated = results
        .iter()
        .filter(|r| r["status"] == "success")
        .count();

    Ok(Json(json!({
        "success": true,
        "scenes_generated": generated,
        "details": results,
    })))
}

/// Regenerate a single scene image with a custom prompt
async fn regenerate_scene(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SceneQuery>,
    Json(payload): Json<RegenerateSceneRequest>,
) -> Result<Json<Value>, ApiError> {
    let (openai, gemini) = require_clients(&state)?;

    if payload.scene_index < 1 {
        return Err(ApiError::bad_request("scene_index must be >= 1"));
    }
    let prompt_text = payload.prompt.trim();
    if prompt_text.is_empty() {
        return Err(ApiError::bad_request("prompt is required"));
    }

    let slug = storage::website_to_slug(params.website.as_deref());
    let scene_number = payload.scene_index as usize;

    // Without a stored storyboard the scene is generated from the prompt alone
    let analysis = match storage::load_storyboard(&slug) {
        Ok(scenes) => rebuild_analysis(openai, &scenes, scene_number, prompt_text).await,
        Err(_) => {
            tracing::warn!("Storyboard not found for '{}', regenerating without character tracking", slug);
            CharacterAnalysis::default()
        }
    };

    let prompt = scene_images::scene_image_prompt(prompt_text);
    let references = scene_images::gather_references(&slug, &analysis, scene_number - 1);

    let path = scene_images::generate_scene_image(
        gemini,
        &slug,
        scene_number,
        &prompt,
        &references,
    )
    .await
    .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "success": true,
        "detail": {
            "scene": scene_number,
            "output_path": path.to_string_lossy(),
            "public_url": storage::public_url(&path),
        },
    })))
}

// The custom prompt replaces the stored description for the analyzed scene
async fn rebuild_analysis(
    openai: &crate::openai_client::OpenAiClient,
    scenes: &[StoryboardScene],
    scene_number: usize,
    prompt_text: &str,
) -> CharacterAnalysis {
    let mut scenes = scenes.to_vec();
    if let Some(scene) = scenes.get_mut(scene_number - 1) {
        scene.scene_description = prompt_text.to_string();
    }
    character::analyze_character_usage(openai, &scenes)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Character analysis unavailable, continuing without: {}", e);
            CharacterAnalysis::default()
        })
}

fn require_clients(
    state: &AppState,
) -> Result<(&crate::openai_client::OpenAiClient, &crate::gemini_client::GeminiClient), ApiError> {
    let openai = state
        .openai_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("OPENAI_API_KEY is not configured"))?;
    let gemini = state
        .gemini_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("GOOGLE_API_KEY is not configured"))?;
    Ok((openai, gemini))
}
