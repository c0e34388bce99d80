use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::error::ApiError;
use super::prompts;
use super::AssistantClient;
use crate::audio::{VoiceClip, SPEECH_SAMPLE_RATE};
use crate::config::Config;
use crate::geo::Coordinate;
use crate::locale::Locale;

const PROVIDER: &str = "google";
const API_KEY_HEADER: &str = "x-goog-api-key";
const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_modalities: Vec<String>,
    speech_config: GeminiSpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSpeechConfig {
    voice_config: GeminiVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiVoiceConfig {
    prebuilt_voice_config: GeminiPrebuiltVoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPrebuiltVoice {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    text: Option<String>,
    inline_data: Option<GeminiBlob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: Option<String>,
    data: String,
}

fn user_content(text: &str) -> GeminiContent {
    GeminiContent {
        role: Some("user".to_string()),
        parts: vec![GeminiRequestPart {
            text: text.to_string(),
        }],
    }
}

fn text_request(system: Option<&str>, prompt: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![user_content(prompt)],
        system_instruction: system.map(|s| GeminiContent {
            role: None,
            parts: vec![GeminiRequestPart { text: s.to_string() }],
        }),
        generation_config: None,
    }
}

fn speech_request(prompt: &str, voice: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![user_content(prompt)],
        system_instruction: None,
        generation_config: Some(GeminiGenerationConfig {
            response_modalities: vec!["AUDIO".to_string()],
            speech_config: GeminiSpeechConfig {
                voice_config: GeminiVoiceConfig {
                    prebuilt_voice_config: GeminiPrebuiltVoice {
                        voice_name: voice.to_string(),
                    },
                },
            },
        }),
    }
}

fn first_parts(response: GeminiResponse) -> Result<Vec<GeminiResponsePart>, ApiError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ApiError::RequestBlocked {
            provider: PROVIDER.to_string(),
            details: reason,
        });
    }
    response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.map(|content| content.parts).unwrap_or_default())
        .ok_or_else(|| ApiError::NoCandidates {
            provider: PROVIDER.to_string(),
        })
}

/// Concatenated text of the first candidate. May be empty.
fn extract_text(response: GeminiResponse) -> Result<String, ApiError> {
    Ok(first_parts(response)?
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join(""))
}

fn extract_audio(response: GeminiResponse) -> Result<VoiceClip, ApiError> {
    let blob = first_parts(response)?
        .into_iter()
        .find_map(|p| p.inline_data)
        .ok_or_else(|| ApiError::ResponseParsingError {
            provider: PROVIDER.to_string(),
            details: "no inline audio in response".to_string(),
        })?;

    let rate = blob
        .mime_type
        .as_deref()
        .and_then(sample_rate_from_mime)
        .unwrap_or(SPEECH_SAMPLE_RATE);

    VoiceClip::from_base64_pcm(&blob.data, rate).map_err(|e| ApiError::ResponseParsingError {
        provider: PROVIDER.to_string(),
        details: e.to_string(),
    })
}

/// `audio/L16;codec=pcm;rate=24000` -> 24000
fn sample_rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    speech_model: String,
    voice_name: String,
    locale: Locale,
    max_retries: u32,
}

impl GeminiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            api_key: config.api_key(),
            base_url: config.api_base_url().trim_end_matches('/').to_string(),
            text_model: config.text_model().to_string(),
            speech_model: config.speech_model().to_string(),
            voice_name: config.voice_name().to_string(),
            locale: config.locale(),
            max_retries: config.max_retries(),
        })
    }

    pub async fn generate_text(&self, system: Option<&str>, prompt: &str) -> Result<String, ApiError> {
        let request = text_request(system, prompt);
        let response = self.generate(&self.text_model, &request).await?;
        extract_text(response)
    }

    pub async fn generate_speech(&self, prompt: &str) -> Result<VoiceClip, ApiError> {
        let request = speech_request(prompt, &self.voice_name);
        let response = self.generate(&self.speech_model, &request).await?;
        extract_audio(response)
    }

    async fn generate(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse, ApiError> {
        let mut attempt = 0;
        loop {
            match self.send_once(model, request).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(target: "gemini::generate", model, attempt, "Retrying after error: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse, ApiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(target: "gemini::generate", model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout {
                        provider: PROVIDER.to_string(),
                    }
                } else {
                    ApiError::Network(e.without_url())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            error!(target: "gemini::generate", model, "Status: {}, Body: {}", status, text);
            return Err(ApiError::from_status(PROVIDER, status.as_u16(), text));
        }

        let body = response.text().await.map_err(|e| ApiError::Network(e.without_url()))?;
        serde_json::from_str::<GeminiResponse>(&body).map_err(|e| {
            error!(target: "gemini::generate", model, "Failed to parse JSON: {}", e);
            ApiError::ResponseParsingError {
                provider: PROVIDER.to_string(),
                details: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl AssistantClient for GeminiClient {
    async fn area_insight(&self, at: Coordinate) -> String {
        let system = prompts::insight_system(self.locale);
        let prompt = prompts::insight_prompt(at, self.locale);
        match self.generate_text(Some(&system), &prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => self.locale.insight_empty().to_string(),
            Err(e) => {
                error!(target: "gemini::insight", "Gemini Error: {}", e);
                self.locale.insight_failed().to_string()
            }
        }
    }

    async fn chat(&self, at: Coordinate, message: &str) -> String {
        let system = prompts::chat_system(at, self.locale);
        match self.generate_text(Some(&system), message).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => self.locale.chat_empty().to_string(),
            Err(e) => {
                error!(target: "gemini::chat", "Chat Error: {}", e);
                self.locale.chat_failed().to_string()
            }
        }
    }

    async fn voice_guidance(&self, user: Coordinate, friend: Coordinate, distance_km: f64) -> Option<VoiceClip> {
        debug!(target: "gemini::tts", %user, %friend, distance_km, "Requesting voice guidance");
        let prompt = prompts::voice_guidance_prompt(distance_km);
        match self.generate_speech(&prompt).await {
            Ok(clip) => Some(clip),
            Err(e) => {
                error!(target: "gemini::tts", "TTS Error: {}", e);
                None
            }
        }
    }
}
