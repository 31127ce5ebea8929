use crate::models::storyboard::StoryboardScene;
use serde::{Deserialize, Serialize};

/// Counts-only view of one slug's generated assets
#[derive(Debug, Serialize)]
pub struct DraftSummary {
    pub slug: String,
    pub has_storyboard: bool,
    pub scenes: usize,
    pub voiceovers: usize,
    pub videos: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_video: Option<String>,
    /// Last modification time of the draft directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Full draft payload: summary plus storyboard and public asset URLs
#[derive(Debug, Serialize)]
pub struct DraftDetail {
    #[serde(flatten)]
    pub summary: DraftSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storyboard: Option<Vec<StoryboardScene>>,
    pub scene_images: Vec<String>,
    pub voiceover_files: Vec<String>,
    pub video_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}
