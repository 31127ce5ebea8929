// src/handlers/assets.rs
// Character asset uploads. Files land in the shared images directory as
// char_asset{N}.png with N incrementing past the highest existing index.

use crate::handlers::ApiError;
use crate::storage;
use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit},
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::io::Cursor;
use std::path::Path;

const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const ALLOWED_FORMATS: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

pub fn asset_routes() -> Router {
    Router::new()
        .route("/upload-char-asset", post(upload_char_asset))
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024))
}

/// Upload an image and store it as the next char_asset{N}.png
async fn upload_char_asset(mut multipart: Multipart) -> Result<Json<Value>, ApiError> {
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !ALLOWED_FORMATS.contains(&content_type) {
                return Err(ApiError::bad_request(format!(
                    "Invalid file format '{}'. Allowed: {:?}",
                    content_type, ALLOWED_FORMATS
                )));
            }
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        if data.len() > MAX_FILE_SIZE {
            return Err(ApiError::bad_request(format!(
                "File size exceeds {}MB limit",
                MAX_FILE_SIZE / (1024 * 1024)
            )));
        }
        image_data = Some(data.to_vec());
    }

    let data = image_data
        .ok_or_else(|| ApiError::bad_request("Multipart field 'image' is required"))?;

    // Decode and re-encode as PNG so downstream consumers see one format
    let decoded = image::load_from_memory(&data)
        .map_err(|e| ApiError::bad_request(format!("Failed to load image: {}", e)))?;

    let images_dir = Path::new(storage::IMAGES_BASE);
    std::fs::create_dir_all(images_dir)
        .map_err(|e| ApiError::internal(format!("Failed to create images directory: {}", e)))?;

    let next_index = next_char_asset_index(images_dir);
    let filename = format!("char_asset{}.png", next_index);
    let file_path = images_dir.join(&filename);

    let mut png_bytes = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png_bytes), image::ImageOutputFormat::Png)
        .map_err(|e| ApiError::internal(format!("Failed to encode image: {}", e)))?;
    std::fs::write(&file_path, &png_bytes)
        .map_err(|e| ApiError::internal(format!("Failed to save image: {}", e)))?;

    tracing::info!("📤 Saved character asset {}", file_path.display());

    Ok(Json(json!({
        "success": true,
        "filename": filename,
        "path": format!("images/{}", filename),
    })))
}

fn next_char_asset_index(images_dir: &Path) -> u64 {
    let max_index = std::fs::read_dir(images_dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_file())
                .filter_map(|e| {
                    let name = e.file_name();
                    storage::CHAR_ASSET_RE
                        .captures(name.to_str()?)
                        .and_then(|c| c.get(1))
                        .and_then(|m| m.as_str().parse::<u64>().ok())
                })
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    max_index + 1
}
