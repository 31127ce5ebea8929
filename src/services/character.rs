// Character continuity across scenes. The storyboard is analyzed once with
// OpenAI to find recurring characters; scene image generation then reuses the
// frame where each character first appeared as a visual reference.

use crate::models::storyboard::StoryboardScene;
use crate::openai_client::OpenAiClient;
use serde::Deserialize;

/// Per-request cap on reference images handed to the image model
pub const MAX_REFERENCE_IMAGES: usize = 2;

#[derive(Debug, Default, Deserialize)]
pub struct CharacterAnalysis {
    #[serde(default)]
    pub scenes: Vec<SceneCharacters>,
}

#[derive(Debug, Deserialize)]
pub struct SceneCharacters {
    pub scene_index: usize,
    #[serde(default)]
    pub characters: Vec<String>,
}

impl CharacterAnalysis {
    fn characters_in(&self, scene_index: usize) -> &[String] {
        self.scenes
            .iter()
            .find(|s| s.scene_index == scene_index)
            .map(|s| s.characters.as_slice())
            .unwrap_or(&[])
    }

    /// True when the scene features any character, so uploaded character
    /// assets should be attached as references
    pub fn has_characters(&self, scene_index: usize) -> bool {
        !self.characters_in(scene_index).is_empty()
    }

    /// Earliest earlier scene sharing a character with `scene_index`
    pub fn first_appearance(&self, scene_index: usize) -> Option<usize> {
        let current = self.characters_in(scene_index);
        if current.is_empty() {
            return None;
        }
        (0..scene_index).find(|&earlier| {
            self.characters_in(earlier)
                .iter()
                .any(|name| current.iter().any(|c| c.eq_ignore_ascii_case(name)))
        })
    }
}

pub async fn analyze_character_usage(
    openai: &OpenAiClient,
    scenes: &[StoryboardScene],
) -> Result<CharacterAnalysis, String> {
    let prompt = build_analysis_prompt(scenes);
    let raw = openai
        .chat_json(&prompt, None)
        .await
        .map_err(|e| format!("Character analysis failed: {}", e))?;
    parse_character_analysis(&raw)
}

fn build_analysis_prompt(scenes: &[StoryboardScene]) -> String {
    let mut prompt = String::from(
        "Identify the named or described characters appearing in each scene of this \
         video ad storyboard. Count only people and mascots, not products or places. \
         Use a consistent name for the same character across scenes.\n\n",
    );
    for (index, scene) in scenes.iter().enumerate() {
        prompt.push_str(&format!("Scene {}: {}\n", index, scene.scene_description));
    }
    prompt.push_str(
        "\nRespond with a JSON object of the form \
         {\"scenes\": [{\"scene_index\": 0, \"characters\": [\"name\"]}]} \
         covering every scene. Use an empty characters list for scenes with no characters.",
    );
    prompt
}

pub fn parse_character_analysis(raw: &str) -> Result<CharacterAnalysis, String> {
    let cleaned = super::ad_ideas::strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|e| format!("Invalid character analysis JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(raw: &str) -> CharacterAnalysis {
        parse_character_analysis(raw).unwrap()
    }

    #[test]
    fn test_parse_character_analysis() {
        let parsed = analysis(
            r#"{"scenes": [
                {"scene_index": 0, "characters": ["Maya"]},
                {"scene_index": 1, "characters": []},
                {"scene_index": 2, "characters": ["maya", "Barista"]}
            ]}"#,
        );
        assert_eq!(parsed.scenes.len(), 3);
        assert_eq!(parsed.scenes[0].characters, vec!["Maya"]);
    }

    #[test]
    fn test_parse_tolerates_code_fence_and_rejects_garbage() {
        assert!(parse_character_analysis("```json\n{\"scenes\": []}\n```").is_ok());
        assert!(parse_character_analysis("nope").is_err());
    }

    #[test]
    fn test_first_appearance_is_case_insensitive() {
        let parsed = analysis(
            r#"{"scenes": [
                {"scene_index": 0, "characters": ["Maya"]},
                {"scene_index": 1, "characters": []},
                {"scene_index": 2, "characters": ["maya"]}
            ]}"#,
        );
        assert_eq!(parsed.first_appearance(2), Some(0));
    }

    #[test]
    fn test_no_reference_without_recurring_character() {
        let parsed = analysis(
            r#"{"scenes": [
                {"scene_index": 0, "characters": ["Maya"]},
                {"scene_index": 1, "characters": ["Noor"]}
            ]}"#,
        );
        assert_eq!(parsed.first_appearance(0), None);
        assert_eq!(parsed.first_appearance(1), None);
    }
}
