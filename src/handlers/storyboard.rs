// src/handlers/storyboard.rs
use crate::handlers::ApiError;
use crate::models::storyboard::StoryboardScene;
use crate::services::ad_ideas::strip_code_fence;
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

const STORYBOARD_PROMPT: &str = include_str!("../../prompts/generate_story_board.txt");
const SUMMARY_PLACEHOLDER: &str = "{insert story summary here}";

#[derive(Deserialize)]
pub struct StoryboardQuery {
    /// Story summary or idea to inject into the prompt
    pub selected_idea: String,
    /// Website URL used to scope assets
    #[serde(default)]
    pub website: Option<String>,
}

pub fn storyboard_routes() -> Router {
    Router::new().route("/generate-story-board", post(generate_storyboard))
}

/// Turn a selected ad idea into a scene-by-scene storyboard and persist it
async fn generate_storyboard(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<StoryboardQuery>,
) -> Result<Json<Value>, ApiError> {
    let openai = state
        .openai_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("OPENAI_API_KEY is not configured"))?;

    if params.selected_idea.trim().is_empty() {
        return Err(ApiError::bad_request("selected_idea is required"));
    }

    let prompt = STORYBOARD_PROMPT.replace(SUMMARY_PLACEHOLDER, &params.selected_idea);

    let generated_text = openai
        .chat(&prompt, None, None)
        .await
        .map_err(|e| ApiError::bad_gateway(format!("Text generation failed: {}", e)))?;

    let scenes = parse_storyboard(&generated_text)
        .map_err(|e| ApiError::internal(format!("Model output is not valid JSON: {}", e)))?;

    let slug = storage::website_to_slug(params.website.as_deref());
    let path = storage::save_storyboard(&slug, &scenes).map_err(ApiError::internal)?;

    tracing::info!("📋 Saved {}-scene storyboard to {}", scenes.len(), path.display());

    Ok(Json(storyboard_response(
        &slug,
        scenes.len(),
        &prompt,
        &generated_text,
    )))
}

// Callers get the fully substituted prompt back alongside the raw model text
fn storyboard_response(slug: &str, scene_count: usize, prompt: &str, generated_text: &str) -> Value {
    json!({
        "success": true,
        "slug": slug,
        "scenes": scene_count,
        "prompt": prompt,
        "generated_text": generated_text,
    })
}

fn parse_storyboard(generated_text: &str) -> Result<Vec<StoryboardScene>, String> {
    let cleaned = strip_code_fence(generated_text);
    serde_json::from_str(cleaned).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_file_has_placeholder() {
        assert!(STORYBOARD_PROMPT.contains(SUMMARY_PLACEHOLDER));
    }

    #[test]
    fn test_parse_storyboard() {
        let raw = r#"[
            {"scene_description": "City at dawn", "voice_over_text": "Every day starts somewhere."}
        ]"#;
        let scenes = parse_storyboard(raw).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].scene_description, "City at dawn");
    }

    #[test]
    fn test_storyboard_response_echoes_prompt() {
        let response = storyboard_response("acme.io", 4, "full prompt text", "[{}]");
        assert_eq!(response["success"], json!(true));
        assert_eq!(response["prompt"], "full prompt text");
        assert_eq!(response["generated_text"], "[{}]");
        assert_eq!(response["scenes"], 4);
    }

    #[test]
    fn test_parse_storyboard_rejects_non_array() {
        assert!(parse_storyboard("{\"scenes\": []}").is_err());
        assert!(parse_storyboard("plain prose").is_err());
    }
}
