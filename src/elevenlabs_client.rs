// Eleven Labs API client: Text-to-Speech for storyboard voiceovers

use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct ElevenLabsClient {
    api_key: String,
    client: Client,
    base_url: String,
    default_voice_id: String,
}

#[derive(Serialize, Debug)]
pub struct TextToSpeechRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_settings: Option<VoiceSettings>,
}

#[derive(Serialize, Debug)]
pub struct VoiceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize, Debug)]
struct VoicesResponse {
    voices: Vec<Voice>,
}

impl ElevenLabsClient {
    pub fn new(api_key: String) -> Self {
        let default_voice_id = std::env::var("ELEVENLABS_VOICE_ID")
            .unwrap_or_else(|_| DefaultVoices::NARRATOR.to_string());
        Self {
            api_key,
            client: Client::new(),
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            default_voice_id,
        }
    }

    pub fn default_voice_id(&self) -> &str {
        &self.default_voice_id
    }

    /// Generate speech from text. Returns raw MP3 bytes.
    pub async fn text_to_speech(
        &self,
        text: &str,
        voice_id: &str,
        model_id: Option<&str>,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/text-to-speech/{}", self.base_url, voice_id);

        let request_body = TextToSpeechRequest {
            text: text.to_string(),
            model_id: Some(
                model_id
                    .unwrap_or(ElevenLabsModels::MULTILINGUAL_V2)
                    .to_string(),
            ),
            voice_settings: None,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
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
            return Err(format!("Eleven Labs TTS API error ({}): {}", status, error_text).into());
        }

        let audio_bytes = response.bytes().await?;
        Ok(audio_bytes.to_vec())
    }

    /// List all voices available to the account
    pub async fn list_voices(
        &self,
    ) -> Result<Vec<Voice>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/voices", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(
                format!("Eleven Labs Voices API error ({}): {}", status, error_text).into(),
            );
        }

        let voices_data: VoicesResponse = response.json().await?;
        Ok(voices_data.voices)
    }
}

/// Well-known voice IDs
pub struct DefaultVoices;

impl DefaultVoices {
    /// House default used for ad voiceovers
    pub const NARRATOR: &'static str = "L1aJrPa7pLJEyYlh3Ilq";
    pub const RACHEL: &'static str = "21m00Tcm4TlvDq8ikWAM"; // Female, calm
    pub const DREW: &'static str = "29vD33N1CtxCmqQRPOHJ"; // Male, middle-aged
    pub const ADAM: &'static str = "pNInz6obpgDQGcFmaJgB"; // Male, deep
    pub const BELLA: &'static str = "EXAVITQu4vr4xnSDxMaL"; // Female, soft
}

pub struct ElevenLabsModels;

impl ElevenLabsModels {
    pub const MULTILINGUAL_V2: &'static str = "eleven_multilingual_v2"; // Highest quality
    pub const FLASH_V2_5: &'static str = "eleven_flash_v2_5"; // Ultra-fast
}
