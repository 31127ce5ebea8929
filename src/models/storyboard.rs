use serde::{Deserialize, Serialize};

/// A single storyboard entry. List order is scene order; filenames are
/// 1-indexed (`scene1.png`, `scene1_voiceover.mp3`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryboardScene {
    #[serde(default)]
    pub scene_description: String,
    #[serde(default)]
    pub voice_over_text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateScenesRequest {
    #[serde(default)]
    pub storyboard: Option<Vec<StoryboardScene>>,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateSceneRequest {
    pub scene_index: i64,
    #[serde(default)]
    pub prompt: String,
}
