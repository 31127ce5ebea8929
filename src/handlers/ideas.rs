// src/handlers/ideas.rs
use crate::handlers::ApiError;
use crate::models::idea::{AdGenerationRequest, AdIdea};
use crate::scraper::ScrapeError;
use crate::services::ad_ideas::{self, IdeaError};
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct AdIdeasResponse {
    pub ideas: Vec<AdIdea>,
}

pub fn idea_routes() -> Router {
    Router::new().route("/generate-ad-ideas", post(generate_ad_ideas))
}

/// Scrape the company website and generate creative ad concepts
async fn generate_ad_ideas(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<AdGenerationRequest>,
) -> Result<Json<AdIdeasResponse>, ApiError> {
    let openai = state
        .openai_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("OPENAI_API_KEY is not configured"))?;

    if payload.company_url.trim().is_empty() {
        return Err(ApiError::bad_request("company_url is required"));
    }

    let ideas = ad_ideas::generate_ad_ideas(
        &state.scraper,
        openai,
        state.gemini_client.as_ref(),
        &payload.company_url,
        payload.additional_context.as_deref(),
    )
    .await
    .map_err(idea_error_to_api)?;

    Ok(Json(AdIdeasResponse { ideas }))
}

fn idea_error_to_api(error: IdeaError) -> ApiError {
    match error {
        IdeaError::Scrape(ScrapeError::ScriptMissing) => {
            ApiError::service_unavailable(ScrapeError::ScriptMissing.to_string())
        }
        IdeaError::Scrape(ScrapeError::Timeout) => {
            ApiError::new(StatusCode::GATEWAY_TIMEOUT, ScrapeError::Timeout.to_string())
        }
        IdeaError::Scrape(e) => ApiError::bad_gateway(e.to_string()),
        IdeaError::Chat(e) => ApiError::bad_gateway(e),
        IdeaError::BadIdeas(e) => ApiError::bad_gateway(e),
    }
}
