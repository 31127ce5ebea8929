// src/handlers/drafts.rs
// Draft inspection and persistence. A draft is just the slug directory tree;
// summaries are computed from whatever files exist on disk.

use crate::handlers::ApiError;
use crate::models::draft::{DraftDetail, DraftSummary, SaveDraftRequest};
use crate::storage;
use axum::{
    extract::Path as AxumPath,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::path::Path;

pub fn draft_routes() -> Router {
    Router::new()
        .route("/drafts", get(list_drafts))
        .route("/drafts/save", post(save_draft))
        .route("/drafts/:slug", get(get_draft))
}

/// Summaries for every slug directory under generated_scenes
async fn list_drafts() -> Json<Value> {
    let base = Path::new(storage::GENERATED_SCENES_BASE);
    let mut slugs: Vec<String> = match std::fs::read_dir(base) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
            .collect(),
        Err(_) => Vec::new(),
    };
    slugs.sort();

    let drafts: Vec<DraftSummary> = slugs.iter().map(|slug| summarize_draft(slug)).collect();
    Json(json!({ "drafts": drafts }))
}

/// Storyboard, scenes, videos, and voiceovers for a specific draft slug
async fn get_draft(AxumPath(slug): AxumPath<String>) -> Result<Json<DraftDetail>, ApiError> {
    let safe = storage::safe_slug(&slug)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid draft slug '{}'", slug)))?;
    if !storage::draft_root(&safe).exists() {
        return Err(ApiError::not_found(format!("Draft '{}' not found", safe)));
    }
    Ok(Json(load_draft(&safe)))
}

/// Ensure a draft directory exists for the provided slug or website
async fn save_draft(Json(payload): Json<SaveDraftRequest>) -> Result<Json<Value>, ApiError> {
    let slug = resolve_save_slug(payload.slug.as_deref(), payload.website.as_deref())?;
    let root = storage::draft_root(&slug);
    std::fs::create_dir_all(&root)
        .map_err(|e| ApiError::internal(format!("Failed to create draft directory: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "slug": slug,
        "path": root.to_string_lossy(),
    })))
}

// An explicit slug must sanitize cleanly; a blank one falls through to the
// website-derived slug, which is safe by construction
fn resolve_save_slug(slug: Option<&str>, website: Option<&str>) -> Result<String, ApiError> {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => storage::safe_slug(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid draft slug '{}'", raw))),
        None => Ok(storage::website_to_slug(website)),
    }
}

fn summarize_draft(slug: &str) -> DraftSummary {
    let (scene_images, voiceover_files, video_files) = draft_assets(slug);
    let final_path = storage::final_video_path(slug);
    let updated_at = std::fs::metadata(storage::draft_root(slug))
        .and_then(|m| m.modified())
        .ok()
        .map(format_system_time);

    DraftSummary {
        slug: slug.to_string(),
        has_storyboard: storage::storyboard_path(slug).exists(),
        scenes: scene_images.len(),
        voiceovers: voiceover_files.len(),
        videos: video_files.len(),
        final_video: final_path
            .exists()
            .then(|| storage::public_url(&final_path)),
        updated_at,
    }
}

fn format_system_time(time: std::time::SystemTime) -> String {
    match time.duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => {
            let datetime = chrono::DateTime::from_timestamp(duration.as_secs() as i64, 0)
                .unwrap_or_else(chrono::Utc::now);
            datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        }
        Err(_) => chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}

fn load_draft(slug: &str) -> DraftDetail {
    let summary = summarize_draft(slug);
    let (scene_images, voiceover_files, video_files) = draft_assets(slug);

    DraftDetail {
        summary,
        storyboard: storage::load_storyboard(slug).ok(),
        scene_images,
        voiceover_files,
        video_files,
    }
}

fn draft_assets(slug: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let scene_images = storage::public_urls_matching(&storage::scene_images_dir(slug), |name| {
        name.starts_with("scene") && name.ends_with(".png")
    });
    let voiceover_files =
        storage::public_urls_matching(&storage::audio_dir(slug), |name| name.ends_with(".mp3"));
    let video_files = storage::public_urls_matching(&storage::video_dir(slug), |name| {
        storage::SCENE_VIDEO_RE.is_match(name)
    });
    (scene_images, voiceover_files, video_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_resolve_save_slug_prefers_explicit_slug() {
        assert_eq!(
            resolve_save_slug(Some("acme.io"), Some("https://other.com")).unwrap(),
            "acme.io"
        );
        assert_eq!(
            resolve_save_slug(None, Some("https://acme.io")).unwrap(),
            "acme.io"
        );
        assert_eq!(resolve_save_slug(Some("  "), None).unwrap(), "default");
    }

    #[test]
    fn test_resolve_save_slug_rejects_traversal() {
        for bad in ["..", "../../tmp/evil", "a/b"] {
            let error = resolve_save_slug(Some(bad), None).unwrap_err();
            assert_eq!(error.status, StatusCode::BAD_REQUEST);
        }
    }
}
