// OpenAI Chat Completions client
// Used for ad copy, storyboard generation, and character-consistency analysis

use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: Client,
    base_url: String,
    default_model: String,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize, Debug)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        let default_model =
            std::env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        Self {
            api_key,
            client: Client::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            default_model,
        }
    }

    /// Send a prompt to the Chat Completions endpoint and return plain text
    pub async fn chat(
        &self,
        prompt: &str,
        system: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.chat_inner(prompt, system, model, None, false).await
    }

    /// Like `chat`, but with temperature 0 and JSON-object response enforcement.
    /// Used by the character-consistency analysis, which must parse the output.
    pub async fn chat_json(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.chat_inner(prompt, None, model, Some(0.0), true).await
    }

    async fn chat_inner(
        &self,
        prompt: &str,
        system: Option<&str>,
        model: Option<&str>,
        temperature: Option<f32>,
        json_mode: bool,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let request_body = ChatCompletionRequest {
            model: model.unwrap_or(&self.default_model).to_string(),
            messages,
            temperature,
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("OpenAI API error ({}): {}", status, error_text).into());
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string();

        if content.is_empty() {
            return Err("OpenAI returned an empty completion".into());
        }

        Ok(content)
    }
}
