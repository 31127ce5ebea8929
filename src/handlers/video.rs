// src/handlers/video.rs
// Veo video generation for storyboard scenes, final-cut assembly, and the
// stitched-video download route.

use crate::gemini_client::{GeminiClient, ReferenceImage};
use crate::handlers::ApiError;
use crate::services::final_video;
use crate::storage;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;

const POLL_INTERVAL: Duration = Duration::from_secs(10);
// Veo renders take minutes; give up after an hour of polling
const MAX_POLL_ATTEMPTS: usize = 360;

#[derive(Deserialize)]
pub struct VideoQuery {
    /// Website URL used to scope assets
    #[serde(default)]
    pub website: Option<String>,
}

pub fn video_routes() -> Router {
    Router::new()
        .route("/generate-videos", post(generate_videos))
        .route("/generate_final_video", post(generate_final_video))
        .route("/final_video.mp4", get(serve_final_video))
}

/// Generate a Veo video for every storyboard scene with an existing image
async fn generate_videos(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<VideoQuery>,
) -> Result<Json<Value>, ApiError> {
    let gemini = state
        .gemini_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("GOOGLE_API_KEY is not configured"))?;

    let slug = storage::website_to_slug(params.website.as_deref());
    let scenes = storage::load_storyboard(&slug).map_err(ApiError::not_found)?;

    let mut results = Vec::with_capacity(scenes.len());
    for (index, scene) in scenes.iter().enumerate() {
        let scene_number = index + 1;
        tracing::info!("🎥 Processing scene {}/{}", scene_number, scenes.len());

        if scene.scene_description.trim().is_empty() {
            results.push(json!({
                "scene": scene_number,
                "status": "error",
                "message": "Missing scene_description",
            }));
            continue;
        }

        let image_path = storage::scene_image_path(&slug, scene_number);
        if !image_path.exists() {
            results.push(json!({
                "scene": scene_number,
                "status": "error",
                "message": format!("Missing image: {}", image_path.display()),
            }));
            continue;
        }

        match generate_scene_video(gemini, &slug, scene_number, &scene.scene_description, &image_path)
            .await
        {
            Ok(output_path) => results.push(json!({
                "scene": scene_number,
                "status": "success",
                "output_path": output_path.to_string_lossy(),
                "public_url": storage::public_url(&output_path),
                "voice_over": scene.voice_over_text,
            })),
            Err(message) => {
                tracing::error!("Scene {} video generation failed: {}", scene_number, message);
                results.push(json!({
                    "scene": scene_number,
                    "status": "error",
                    "message": message,
                }));
            }
        }
    }

    // When nothing rendered, previously generated videos still count
    let successful = results.iter().filter(|r| r["status"] == "success").count();
    let mut existing = 0usize;
    if successful == 0 {
        let fallback = final_video::existing_scene_videos(&slug);
        if !fallback.is_empty() {
            existing = fallback.len();
            results = fallback
                .iter()
                .enumerate()
                .map(|(i, url)| {
                    json!({
                        "scene": final_video::scene_index_from_video_name(
                            url.rsplit('/').next().unwrap_or_default()
                        ).unwrap_or(i + 1),
                        "status": "existing",
                        "public_url": url,
                    })
                })
                .collect();
        }
    }

    let failed = results.iter().filter(|r| r["status"] == "error").count();
    Ok(Json(json!({
        "total_scenes": scenes.len(),
        "successful": successful + existing,
        "existing": existing,
        "failed": failed,
        "results": results,
    })))
}

async fn generate_scene_video(
    gemini: &GeminiClient,
    slug: &str,
    scene_number: usize,
    description: &str,
    image_path: &Path,
) -> Result<std::path::PathBuf, String> {
    let image_bytes =
        std::fs::read(image_path).map_err(|e| format!("Failed to read scene image: {}", e))?;
    let reference = ReferenceImage {
        bytes: image_bytes,
        mime_type: crate::utils::content_type_for(image_path).to_string(),
    };

    let prompt = format!(
        "generate a video from the reference image following the prompt: {}",
        description
    );

    let operation_name = gemini
        .start_video_generation(&prompt, &reference)
        .await
        .map_err(|e| e.to_string())?;

    let video_uri = poll_video_operation(gemini, &operation_name).await?;
    let video_bytes = gemini
        .download_video(&video_uri)
        .await
        .map_err(|e| e.to_string())?;

    let output_path = storage::scene_video_path(slug, scene_number);
    crate::utils::ensure_parent_dir(&output_path)?;
    std::fs::write(&output_path, &video_bytes)
        .map_err(|e| format!("Failed to write {}: {}", output_path.display(), e))?;

    tracing::info!("✅ Scene {} video saved to {}", scene_number, output_path.display());
    Ok(output_path)
}

async fn poll_video_operation(
    gemini: &GeminiClient,
    operation_name: &str,
) -> Result<String, String> {
    for _ in 0..MAX_POLL_ATTEMPTS {
        let operation = gemini
            .get_video_operation(operation_name)
            .await
            .map_err(|e| e.to_string())?;

        if operation.done {
            if let Some(error) = operation.error {
                return Err(format!("Video generation failed: {}", error));
            }
            return operation
                .video_uri
                .ok_or_else(|| "Operation finished without a video URI".to_string());
        }

        tracing::debug!("Still processing operation {}", operation_name);
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Err("Video generation timed out".to_string())
}

/// Combine scene videos with any available voiceovers into a single file
async fn generate_final_video(
    Query(params): Query<VideoQuery>,
) -> Result<Json<Value>, ApiError> {
    let slug = storage::website_to_slug(params.website.as_deref());

    // Fall back to default-slug assets only when the draft has no videos
    let source_slug = if final_video::collect_scene_pairs(&slug).is_empty() {
        if slug != "default" && !final_video::collect_scene_pairs("default").is_empty() {
            "default".to_string()
        } else {
            return Err(ApiError::not_found(format!(
                "No generated videos found for slug '{}'",
                slug
            )));
        }
    } else {
        slug.clone()
    };

    let output_path = storage::final_video_path(&slug);
    let (source, output) = (source_slug.clone(), output_path.clone());
    tokio::task::spawn_blocking(move || final_video::stitch_final_video(&source, &output))
        .await
        .map_err(|e| ApiError::internal(format!("Stitch task failed: {}", e)))?
        .map_err(|e| {
            ApiError::internal(format!("Failed to combine scenes into final video: {}", e))
        })?;

    if !output_path.exists() {
        return Err(ApiError::internal(
            "Final video was not created. Check server logs for details.",
        ));
    }

    Ok(Json(json!({
        "success": true,
        "final_video": storage::public_url(&output_path),
        "source_slug": source_slug,
        "slug": slug,
    })))
}

/// Stream the root-level stitched video
async fn serve_final_video() -> Result<Response, ApiError> {
    let path = Path::new("final_video.mp4");
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|_| ApiError::not_found("final_video.mp4 not found"))?;

    let stream = ReaderStream::new(file);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            "inline; filename=\"final_video.mp4\"",
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))?;

    Ok(response.into_response())
}
