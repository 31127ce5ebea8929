// Ad idea generation: scrape the company website for context, ask OpenAI for
// campaign concepts, then render a preview image for each concept with Gemini.

use crate::gemini_client::GeminiClient;
use crate::models::idea::{AdIdea, IdeaDraft, IdeaResponse};
use crate::openai_client::OpenAiClient;
use crate::scraper::{LightpandaScraper, ScrapeError, ScrapedSite};
use base64::prelude::*;
use thiserror::Error;

pub const DEFAULT_AD_IDEA_COUNT: usize = 3;

// Scraped pages can run to hundreds of KB; the model only needs the gist
const MAX_CONTEXT_CHARS: usize = 6000;

#[derive(Error, Debug)]
pub enum IdeaError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error("OpenAI idea generation failed: {0}")]
    Chat(String),
    #[error("Could not parse ideas from model output: {0}")]
    BadIdeas(String),
}

pub async fn generate_ad_ideas(
    scraper: &LightpandaScraper,
    openai: &OpenAiClient,
    gemini: Option<&GeminiClient>,
    company_url: &str,
    additional_context: Option<&str>,
) -> Result<Vec<AdIdea>, IdeaError> {
    let site = scraper.scrape(company_url).await?;

    let prompt = build_ideas_prompt(&site, company_url, additional_context);
    let raw = openai
        .chat_json(&prompt, None)
        .await
        .map_err(|e| IdeaError::Chat(e.to_string()))?;
    let drafts = parse_ideas_response(&raw)?;

    tracing::info!("💡 Generated {} ad ideas for {}", drafts.len(), company_url);

    let mut ideas = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let image = match gemini {
            Some(client) => render_idea_image(client, &draft).await,
            None => None,
        };
        ideas.push(AdIdea {
            title: draft.title,
            description: draft.description,
            image: image.unwrap_or_default(),
        });
    }

    Ok(ideas)
}

// Image failures do not sink the whole request; the idea just ships without art
async fn render_idea_image(gemini: &GeminiClient, draft: &IdeaDraft) -> Option<String> {
    let prompt = if draft.image_prompt.trim().is_empty() {
        format!("Advertising key visual: {}", draft.description)
    } else {
        draft.image_prompt.clone()
    };

    match gemini.generate_image(&prompt, &[], Some("1:1")).await {
        Ok(bytes) => Some(format!(
            "data:image/png;base64,{}",
            BASE64_STANDARD.encode(&bytes)
        )),
        Err(e) => {
            tracing::warn!("Idea image generation failed for '{}': {}", draft.title, e);
            None
        }
    }
}

fn build_ideas_prompt(
    site: &ScrapedSite,
    company_url: &str,
    additional_context: Option<&str>,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are a creative director. Propose {} distinct video ad concepts for the company below.\n\n",
        DEFAULT_AD_IDEA_COUNT
    ));
    prompt.push_str(&format!("Company website: {}\n", company_url));
    if let Some(title) = site.title.as_deref().filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!("Page title: {}\n", title));
    }
    if let Some(text) = site.text_content.as_deref() {
        prompt.push_str(&format!(
            "Website content:\n{}\n",
            truncate_text(text, MAX_CONTEXT_CHARS)
        ));
    }
    if let Some(extra) = additional_context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nAdditional direction from the user: {}\n", extra));
    }
    prompt.push_str(
        "\nRespond with a JSON object of the form \
         {\"ideas\": [{\"title\": ..., \"description\": ..., \"image_prompt\": ...}]}. \
         Each description is 2-3 sentences pitching the ad. Each image_prompt describes a \
         single striking key visual for the concept.",
    );
    prompt
}

pub fn parse_ideas_response(raw: &str) -> Result<Vec<IdeaDraft>, IdeaError> {
    let cleaned = strip_code_fence(raw);

    let ideas = if let Ok(response) = serde_json::from_str::<IdeaResponse>(cleaned) {
        response.ideas
    } else if let Ok(ideas) = serde_json::from_str::<Vec<IdeaDraft>>(cleaned) {
        // Some models return the array directly despite the requested shape
        ideas
    } else {
        return Err(IdeaError::BadIdeas(format!(
            "unexpected model output: {}",
            truncate_text(cleaned, 200)
        )));
    };

    validate_ideas(ideas)
}

// The model must deliver the full set; extras beyond the requested count are
// dropped, and an idea with a blank field is unusable downstream
fn validate_ideas(mut ideas: Vec<IdeaDraft>) -> Result<Vec<IdeaDraft>, IdeaError> {
    if ideas.len() < DEFAULT_AD_IDEA_COUNT {
        return Err(IdeaError::BadIdeas(format!(
            "expected {} ideas, got {}",
            DEFAULT_AD_IDEA_COUNT,
            ideas.len()
        )));
    }
    ideas.truncate(DEFAULT_AD_IDEA_COUNT);

    for (index, idea) in ideas.iter().enumerate() {
        if idea.title.trim().is_empty()
            || idea.description.trim().is_empty()
            || idea.image_prompt.trim().is_empty()
        {
            return Err(IdeaError::BadIdeas(format!(
                "idea {} is missing a title, description, or image_prompt",
                index + 1
            )));
        }
    }

    Ok(ideas)
}

/// Truncate on a char boundary, appending an ellipsis if anything was cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated.trim_end())
}

/// Strip a surrounding ```json ... ``` fence if the model added one
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea_json(n: usize) -> String {
        let ideas: Vec<String> = (1..=n)
            .map(|i| {
                format!(
                    r#"{{"title": "Idea {i}", "description": "Pitch {i}.", "image_prompt": "Visual {i}"}}"#
                )
            })
            .collect();
        format!(r#"{{"ideas": [{}]}}"#, ideas.join(","))
    }

    #[test]
    fn test_parse_ideas_response_object_shape() {
        let ideas = parse_ideas_response(&idea_json(3)).unwrap();
        assert_eq!(ideas.len(), 3);
        assert_eq!(ideas[0].title, "Idea 1");
    }

    #[test]
    fn test_parse_ideas_response_bare_array_and_fence() {
        let raw = format!(
            "```json\n[{0},{0},{0}]\n```",
            r#"{"title": "A", "description": "B", "image_prompt": "C"}"#
        );
        let ideas = parse_ideas_response(&raw).unwrap();
        assert_eq!(ideas[0].image_prompt, "C");
    }

    #[test]
    fn test_parse_ideas_response_rejects_garbage() {
        assert!(parse_ideas_response("not json at all").is_err());
        assert!(parse_ideas_response("{\"ideas\": []}").is_err());
    }

    #[test]
    fn test_parse_ideas_response_rejects_short_lists() {
        assert!(parse_ideas_response(&idea_json(1)).is_err());
        assert!(parse_ideas_response(&idea_json(2)).is_err());
    }

    #[test]
    fn test_parse_ideas_response_rejects_blank_fields() {
        let raw = r#"{"ideas": [
            {"title": "only one"},
            {"title": "B", "description": "b", "image_prompt": "b"},
            {"title": "C", "description": "c", "image_prompt": "c"}
        ]}"#;
        assert!(parse_ideas_response(raw).is_err());

        let raw = r#"{"ideas": [
            {"title": "A", "description": "  ", "image_prompt": "a"},
            {"title": "B", "description": "b", "image_prompt": "b"},
            {"title": "C", "description": "c", "image_prompt": "c"}
        ]}"#;
        assert!(parse_ideas_response(raw).is_err());
    }

    #[test]
    fn test_parse_ideas_response_truncates_extras() {
        let ideas = parse_ideas_response(&idea_json(5)).unwrap();
        assert_eq!(ideas.len(), DEFAULT_AD_IDEA_COUNT);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 100), "short");
        let long = "a".repeat(50);
        let cut = truncate_text(&long, 10);
        assert_eq!(cut, format!("{}...", "a".repeat(10)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {} "), "{}");
    }
}
