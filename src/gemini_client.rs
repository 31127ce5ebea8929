// Gemini API client
// Image generation (scene stills and ad hero images) plus Veo video generation
// through the long-running operations endpoint.

use base64::prelude::*;
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_model: String,
    video_model: String,
}

/// An image handed to the model as visual reference material
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/png".to_string(),
        }
    }
}

/// Snapshot of a Veo long-running operation
#[derive(Debug)]
pub struct VideoOperation {
    pub done: bool,
    pub video_uri: Option<String>,
    pub error: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let image_model = std::env::var("GEMINI_IMAGE_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string());
        let video_model = std::env::var("GEMINI_VIDEO_MODEL")
            .unwrap_or_else(|_| "veo-3.1-generate-preview".to_string());
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model,
            video_model,
        }
    }

    /// Generate an image from a text prompt and optional reference images.
    /// Returns raw PNG bytes.
    pub async fn generate_image(
        &self,
        prompt: &str,
        references: &[ReferenceImage],
        aspect_ratio: Option<&str>,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let mut parts: Vec<Value> = references
            .iter()
            .map(|r| {
                json!({
                    "inlineData": {
                        "mimeType": r.mime_type,
                        "data": BASE64_STANDARD.encode(&r.bytes),
                    }
                })
            })
            .collect();
        parts.push(json!({ "text": prompt }));

        let mut generation_config = serde_json::Map::new();
        generation_config.insert(
            "response_modalities".to_string(),
            json!(["IMAGE"]),
        );
        if let Some(aspect_ratio) = aspect_ratio {
            generation_config.insert(
                "image_config".to_string(),
                json!({ "aspect_ratio": aspect_ratio }),
            );
        }

        let request = json!({
            "contents": [{
                "parts": parts,
                "role": "user"
            }],
            "generationConfig": generation_config
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.image_model, self.api_key
        );

        tracing::debug!(
            "Gemini image request: model={}, references={}",
            self.image_model,
            references.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Gemini image API error: {}", error_text).into());
        }

        let response_json: Value = response.json().await?;
        Self::check_finish_reason(&response_json)?;
        Self::extract_inline_image(&response_json)
            .ok_or_else(|| "No image data found in Gemini response".into())
    }

    // Surfaces non-STOP finish reasons (e.g. IMAGE_OTHER) so callers can drop
    // reference images and retry
    fn check_finish_reason(
        response: &Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(reason) = response["candidates"][0]["finishReason"].as_str() {
            if reason != "STOP" {
                return Err(format!("Image generation stopped with reason: {}", reason).into());
            }
        }
        Ok(())
    }

    fn extract_inline_image(response: &Value) -> Option<Vec<u8>> {
        let parts = response["candidates"][0]["content"]["parts"].as_array()?;
        for part in parts {
            if let Some(data) = part["inlineData"]["data"].as_str() {
                if let Ok(bytes) = BASE64_STANDARD.decode(data) {
                    return Some(bytes);
                }
            }
        }
        None
    }

    /// Kick off a Veo video generation. Returns the operation name to poll.
    pub async fn start_video_generation(
        &self,
        prompt: &str,
        reference: &ReferenceImage,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!(
            "{}/models/{}:predictLongRunning?key={}",
            self.base_url, self.video_model, self.api_key
        );

        let request = json!({
            "instances": [{
                "prompt": prompt,
                "referenceImages": [{
                    "image": {
                        "bytesBase64Encoded": BASE64_STANDARD.encode(&reference.bytes),
                        "mimeType": reference.mime_type,
                    },
                    "referenceType": "asset"
                }]
            }],
            "parameters": {
                "aspectRatio": "16:9"
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Veo API error: {}", error_text).into());
        }

        let response_json: Value = response.json().await?;
        response_json["name"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| "Veo response missing operation name".into())
    }

    /// Poll a Veo long-running operation
    pub async fn get_video_operation(
        &self,
        operation_name: &str,
    ) -> Result<VideoOperation, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/{}?key={}", self.base_url, operation_name, self.api_key);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Veo operation poll error: {}", error_text).into());
        }

        let response_json: Value = response.json().await?;
        let done = response_json["done"].as_bool().unwrap_or(false);
        let error = response_json["error"]["message"]
            .as_str()
            .map(|s| s.to_string());
        let video_uri = response_json["response"]["generateVideoResponse"]["generatedSamples"][0]
            ["video"]["uri"]
            .as_str()
            .map(|s| s.to_string());

        Ok(VideoOperation {
            done,
            video_uri,
            error,
        })
    }

    /// Download a generated video file
    pub async fn download_video(
        &self,
        video_uri: &str,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .client
            .get(video_uri)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(format!("Failed to download generated video ({})", status).into());
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
