use serde::{Deserialize, Serialize};

/// Request payload for ad concept generation
#[derive(Debug, Deserialize)]
pub struct AdGenerationRequest {
    /// Public company website to scrape for marketing context
    pub company_url: String,
    /// Extra notes about goals, audience, offers, or constraints
    #[serde(default)]
    pub additional_context: Option<String>,
}

/// One generated ad concept; `image` is a base64-encoded PNG
#[derive(Debug, Serialize)]
pub struct AdIdea {
    pub title: String,
    pub description: String,
    pub image: String,
}

/// Shape the LLM is asked to produce before images are attached
#[derive(Debug, Deserialize)]
pub struct IdeaDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct IdeaResponse {
    #[serde(default)]
    pub ideas: Vec<IdeaDraft>,
}
