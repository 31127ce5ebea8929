// src/storage.rs
// Slug derivation plus the on-disk draft layout. Every generated asset for a
// website lives under a single slug-scoped directory tree:
//
//   images/{slug}/generated_storyboard.json
//   generated_scenes/{slug}/images/scene{N}.png
//   generated_scenes/{slug}/audio/scene{N}_voiceover.mp3
//   generated_scenes/{slug}/video/scene{N}.mp4
//   generated_scenes/{slug}/final_video.mp4

use crate::models::storyboard::StoryboardScene;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

pub const IMAGES_BASE: &str = "images";
pub const GENERATED_SCENES_BASE: &str = "generated_scenes";

lazy_static! {
    static ref SCHEME_RE: Regex = Regex::new(r"^https?://").unwrap();
    static ref UNSAFE_CHAR_RE: Regex = Regex::new(r"[^a-z0-9._-]").unwrap();
    pub static ref CHAR_ASSET_RE: Regex =
        Regex::new(r"(?i)^char_asset(\d+)\.(?:png|jpg|jpeg|webp)$").unwrap();
    pub static ref SCENE_VIDEO_RE: Regex = Regex::new(r"^scene(\d+)\.mp4$").unwrap();
}

/// Normalize a website URL into a filesystem-safe slug
pub fn website_to_slug(website: Option<&str>) -> String {
    let raw = match website {
        Some(w) if !w.trim().is_empty() => w.trim().to_lowercase(),
        _ => return "default".to_string(),
    };

    let cleaned = SCHEME_RE.replace(&raw, "").replace('/', "-");
    let cleaned = UNSAFE_CHAR_RE.replace_all(&cleaned, "-");
    let cleaned = cleaned.trim_matches(|c| matches!(c, '-' | '.' | '_'));

    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Sanitize slug inputs. Returns None for anything that could leave the
/// drafts root: empty slugs, path separators, or `..` sequences.
pub fn safe_slug(slug: &str) -> Option<String> {
    let trimmed = slug.trim().trim_matches(|c| c == '/' || c == '\\');
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains("..")
    {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn draft_root(slug: &str) -> PathBuf {
    Path::new(GENERATED_SCENES_BASE).join(slug)
}

pub fn storyboard_path(slug: &str) -> PathBuf {
    Path::new(IMAGES_BASE).join(slug).join("generated_storyboard.json")
}

pub fn scene_images_dir(slug: &str) -> PathBuf {
    draft_root(slug).join("images")
}

pub fn audio_dir(slug: &str) -> PathBuf {
    draft_root(slug).join("audio")
}

pub fn video_dir(slug: &str) -> PathBuf {
    draft_root(slug).join("video")
}

pub fn scene_image_path(slug: &str, scene_index: usize) -> PathBuf {
    scene_images_dir(slug).join(format!("scene{}.png", scene_index))
}

pub fn scene_video_path(slug: &str, scene_index: usize) -> PathBuf {
    video_dir(slug).join(format!("scene{}.mp4", scene_index))
}

pub fn voiceover_path(slug: &str, scene_index: usize) -> PathBuf {
    audio_dir(slug).join(format!("scene{}_voiceover.mp3", scene_index))
}

pub fn final_video_path(slug: &str) -> PathBuf {
    draft_root(slug).join("final_video.mp4")
}

/// Convert an asset path (relative to the working directory) into the URL it
/// is served under by the static mounts
pub fn public_url(path: &Path) -> String {
    let joined = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined)
}

pub fn load_storyboard(slug: &str) -> Result<Vec<StoryboardScene>, String> {
    let path = storyboard_path(slug);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| format!("Storyboard JSON not found at {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Invalid storyboard JSON: {}", e))
}

pub fn save_storyboard(slug: &str, scenes: &[StoryboardScene]) -> Result<PathBuf, String> {
    let path = storyboard_path(slug);
    crate::utils::ensure_parent_dir(&path)?;
    let pretty = serde_json::to_string_pretty(scenes)
        .map_err(|e| format!("Failed to serialize storyboard: {}", e))?;
    std::fs::write(&path, pretty)
        .map_err(|e| format!("Failed to write storyboard to {}: {}", path.display(), e))?;
    Ok(path)
}

/// Sorted public URLs for files in `dir` whose names match `matcher`
pub fn public_urls_matching(dir: &Path, matcher: impl Fn(&str) -> bool) -> Vec<String> {
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .map(&matcher)
                        .unwrap_or(false)
            })
            .collect(),
        Err(_) => return Vec::new(),
    };
    paths.sort_by_key(scene_sort_key);
    paths.iter().map(|p| public_url(p)).collect()
}

// Numeric ordering for sceneN assets so scene10 sorts after scene2
fn scene_sort_key(path: &PathBuf) -> (u64, String) {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let index = name
        .strip_prefix("scene")
        .and_then(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok()
        })
        .unwrap_or(u64::MAX);
    (index, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_website_to_slug_strips_scheme_and_unsafe_chars() {
        assert_eq!(website_to_slug(Some("https://TechEurope.io")), "techeurope.io");
        assert_eq!(
            website_to_slug(Some("http://example.com/about us")),
            "example.com-about-us"
        );
        assert_eq!(website_to_slug(Some("  https://a.b/  ")), "a.b");
    }

    #[test]
    fn test_website_to_slug_defaults() {
        assert_eq!(website_to_slug(None), "default");
        assert_eq!(website_to_slug(Some("")), "default");
        assert_eq!(website_to_slug(Some("---")), "default");
    }

    #[test]
    fn test_safe_slug_accepts_plain_slugs() {
        assert_eq!(safe_slug("  acme.io  ").as_deref(), Some("acme.io"));
        assert_eq!(safe_slug("/acme.io/").as_deref(), Some("acme.io"));
        assert_eq!(safe_slug("\\\\share").as_deref(), Some("share"));
    }

    #[test]
    fn test_safe_slug_rejects_traversal() {
        assert_eq!(safe_slug(".."), None);
        assert_eq!(safe_slug("../../tmp/evil"), None);
        assert_eq!(safe_slug("a/../b"), None);
        assert_eq!(safe_slug("etc/passwd"), None);
        assert_eq!(safe_slug("a..b"), None);
        assert_eq!(safe_slug(""), None);
        assert_eq!(safe_slug("   "), None);
    }

    #[test]
    fn test_draft_layout() {
        assert_eq!(
            scene_image_path("acme.io", 3),
            PathBuf::from("generated_scenes/acme.io/images/scene3.png")
        );
        assert_eq!(
            voiceover_path("acme.io", 3),
            PathBuf::from("generated_scenes/acme.io/audio/scene3_voiceover.mp3")
        );
        assert_eq!(
            storyboard_path("acme.io"),
            PathBuf::from("images/acme.io/generated_storyboard.json")
        );
    }

    #[test]
    fn test_public_url_uses_forward_slashes() {
        assert_eq!(
            public_url(&scene_video_path("acme.io", 1)),
            "/generated_scenes/acme.io/video/scene1.mp4"
        );
    }

    #[test]
    fn test_scene_sort_key_orders_numerically() {
        let mut files = vec![
            PathBuf::from("scene10.png"),
            PathBuf::from("scene2.png"),
            PathBuf::from("scene1.png"),
        ];
        files.sort_by_key(scene_sort_key);
        assert_eq!(
            files,
            vec![
                PathBuf::from("scene1.png"),
                PathBuf::from("scene2.png"),
                PathBuf::from("scene10.png"),
            ]
        );
    }

    #[test]
    fn test_char_asset_regex() {
        assert!(CHAR_ASSET_RE.is_match("char_asset1.png"));
        assert!(CHAR_ASSET_RE.is_match("CHAR_ASSET12.JPG"));
        assert!(!CHAR_ASSET_RE.is_match("char_asset.png"));
        assert!(!CHAR_ASSET_RE.is_match("scene1.png"));
    }
}
