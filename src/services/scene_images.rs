// Scene image rendering. References come from uploaded character assets and
// from the frame where a recurring character first appeared. Gemini rejects
// some reference combinations, so generation retries with progressively fewer
// references before falling back to a text-only prompt.

use crate::gemini_client::{GeminiClient, ReferenceImage};
use crate::services::character::{CharacterAnalysis, MAX_REFERENCE_IMAGES};
use crate::storage;
use std::path::{Path, PathBuf};

const SCENE_ASPECT_RATIO: &str = "16:9";

pub fn scene_image_prompt(scene_description: &str) -> String {
    format!(
        "Cinematic still frame for a video advertisement, 16:9, photorealistic, \
         high production value. Scene: {}",
        scene_description
    )
}

/// Uploaded character assets, in upload order. Assets live at the top of the
/// images directory and are shared across drafts.
pub fn char_asset_references() -> Vec<ReferenceImage> {
    let dir = Path::new(storage::IMAGES_BASE);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
        .filter(|name| storage::CHAR_ASSET_RE.is_match(name))
        .collect();
    sort_char_asset_names(&mut names);

    names
        .iter()
        .filter_map(|name| {
            let path = dir.join(name);
            let bytes = std::fs::read(&path).ok()?;
            Some(ReferenceImage {
                bytes,
                mime_type: crate::utils::content_type_for(&path).to_string(),
            })
        })
        .collect()
}

pub fn sort_char_asset_names(names: &mut [String]) {
    names.sort_by_key(|name| {
        storage::CHAR_ASSET_RE
            .captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(u64::MAX)
    });
}

/// Assemble references for one scene: character assets first, then the image
/// from the character's first appearance, capped at MAX_REFERENCE_IMAGES
pub fn gather_references(
    slug: &str,
    analysis: &CharacterAnalysis,
    scene_index: usize,
) -> Vec<ReferenceImage> {
    let mut references = if analysis.has_characters(scene_index) {
        char_asset_references()
    } else {
        Vec::new()
    };

    if let Some(first_scene) = analysis.first_appearance(scene_index) {
        let path = storage::scene_image_path(slug, first_scene + 1);
        if let Ok(bytes) = std::fs::read(&path) {
            references.push(ReferenceImage::png(bytes));
        }
    }

    references.truncate(MAX_REFERENCE_IMAGES);
    references
}

/// Render one scene image to its canonical path, shedding references on failure
pub async fn generate_scene_image(
    gemini: &GeminiClient,
    slug: &str,
    scene_index: usize,
    prompt: &str,
    references: &[ReferenceImage],
) -> Result<PathBuf, String> {
    let output_path = storage::scene_image_path(slug, scene_index);
    crate::utils::ensure_parent_dir(&output_path)?;

    let mut last_error = String::new();
    for count in (0..=references.len()).rev() {
        match gemini
            .generate_image(prompt, &references[..count], Some(SCENE_ASPECT_RATIO))
            .await
        {
            Ok(bytes) => {
                std::fs::write(&output_path, &bytes).map_err(|e| {
                    format!("Failed to write {}: {}", output_path.display(), e)
                })?;
                tracing::info!(
                    "🖼️ Scene {} image saved ({} reference images)",
                    scene_index,
                    count
                );
                return Ok(output_path);
            }
            Err(e) => {
                last_error = e.to_string();
                if count > 0 {
                    tracing::warn!(
                        "Scene {} generation failed with {} references, retrying: {}",
                        scene_index,
                        count,
                        last_error
                    );
                }
            }
        }
    }

    Err(format!(
        "Image generation failed for scene {}: {}",
        scene_index, last_error
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::character::parse_character_analysis;

    #[test]
    fn test_sort_char_asset_names_numerically() {
        let mut names = vec![
            "char_asset10.png".to_string(),
            "char_asset2.jpg".to_string(),
            "char_asset1.png".to_string(),
        ];
        sort_char_asset_names(&mut names);
        assert_eq!(names[0], "char_asset1.png");
        assert_eq!(names[2], "char_asset10.png");
    }

    #[test]
    fn test_gather_references_empty_for_characterless_scene() {
        let analysis = parse_character_analysis(
            r#"{"scenes": [{"scene_index": 0, "characters": []}]}"#,
        )
        .unwrap();
        assert!(gather_references("nonexistent-slug", &analysis, 0).is_empty());
    }

    #[test]
    fn test_scene_image_prompt_embeds_description() {
        let prompt = scene_image_prompt("a runner at dawn");
        assert!(prompt.contains("a runner at dawn"));
        assert!(prompt.contains("16:9"));
    }
}
