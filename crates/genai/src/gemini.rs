//! REST client for the Gemini-family generation endpoints.
//!
//! Implements the three generator contracts against the hosted service:
//! scripts and ideation via `generateContent` with JSON responses, still
//! images via the Imagen `predict` endpoint, video via the Veo
//! long-running operation endpoint (polled here, awaited by callers), and
//! voiceovers via the TTS `generateContent` variant.
//!
//! Every public call runs under the bounded linear-backoff retry policy;
//! callers see one eventual success or one terminal failure.

use base64::Engine as _;
use serde::Deserialize;

use artie_core::brief::{AdBrief, VisualType};
use artie_core::scene::VisualHandle;

use crate::contract::{
    Concept, GeneratedAudio, GeneratedImage, GeneratedVideo, IdeaSeed, SpeechGenerator,
    TextGenerator, VisualGenerator,
};
use crate::error::GenAiError;
use crate::retry::{with_retry, RetryPolicy};

// ---------------------------------------------------------------------------
// Models and endpoints
// ---------------------------------------------------------------------------

/// Default API base URL; override with `ARTIE_API_BASE_URL`.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Script and brainstorm model.
pub const SCRIPT_MODEL: &str = "gemini-2.5-pro";
/// Quick ideation model.
pub const IDEA_MODEL: &str = "gemini-2.5-flash";
/// Still-image model.
pub const IMAGE_MODEL: &str = "imagen-4.0-generate-001";
/// Video model used when starting a new story.
pub const VIDEO_MODEL_FAST: &str = "veo-3.1-fast-generate-preview";
/// Video model used when extending an existing clip.
pub const VIDEO_MODEL_EXTEND: &str = "veo-3.1-generate-preview";
/// Voiceover model.
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Delay between polls of a long-running video operation.
const VIDEO_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ARTIE_API_KEY";
/// Environment variable overriding the API base URL.
pub const API_BASE_URL_VAR: &str = "ARTIE_API_BASE_URL";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the hosted generation service.
pub struct GeminiStudioClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl GeminiStudioClient {
    /// Create a client with the default base URL and retry policy.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the base URL (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a client from the environment (`.env` is honored).
    pub fn from_env() -> Result<Self, GenAiError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| GenAiError::Config(format!("{API_KEY_VAR} is not set")))?;
        let mut client = Self::new(api_key);
        if let Ok(base_url) = std::env::var(API_BASE_URL_VAR) {
            client.base_url = base_url;
        }
        Ok(client)
    }

    // ---- request plumbing ----

    fn model_url(&self, model: &str, verb: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:{verb}?key={}",
            self.base_url, self.api_key
        )
    }

    /// Ensure the response has a success status code, or surface the status
    /// and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenAiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GenAiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// `generateContent` call that expects a JSON document in the first
    /// candidate's text part.
    async fn generate_json<T: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<T, GenAiError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .http
            .post(self.model_url(model, "generateContent"))
            .json(&body)
            .send()
            .await?;

        let parsed: GenerateContentResponse = Self::parse_response(response).await?;
        let text = parsed
            .first_text()
            .ok_or_else(|| GenAiError::Decode("response carried no text part".to_string()))?;
        serde_json::from_str(text.trim())
            .map_err(|e| GenAiError::Decode(format!("response was not the expected JSON: {e}")))
    }

    // ---- single-attempt operations (wrapped in retry by the trait impls) ----

    async fn generate_script_once(
        &self,
        brief: &AdBrief,
        prior_script: Option<&[String]>,
    ) -> Result<Vec<String>, GenAiError> {
        let prompt = script_prompt(brief, prior_script);
        let lines: Vec<String> = self.generate_json(SCRIPT_MODEL, &prompt).await?;
        tracing::debug!(lines = lines.len(), product = %brief.product, "Script generated");
        Ok(lines)
    }

    async fn brainstorm_once(
        &self,
        product: &str,
        notes: Option<&str>,
    ) -> Result<Vec<Concept>, GenAiError> {
        let prompt = brainstorm_prompt(product, notes);
        self.generate_json(SCRIPT_MODEL, &prompt).await
    }

    async fn random_idea_once(&self) -> Result<IdeaSeed, GenAiError> {
        let prompt = "Generate a single, fun, and slightly absurd product name and a \
                      one-sentence visual idea for a fictional ad.\n\
                      Return the result as a JSON object with keys \"product\" and \"visualIdea\".";
        self.generate_json(IDEA_MODEL, prompt).await
    }

    async fn generate_image_once(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<GeneratedImage, GenAiError> {
        let body = serde_json::json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": aspect_ratio,
                "outputMimeType": "image/jpeg",
            },
        });

        let response = self
            .http
            .post(self.model_url(IMAGE_MODEL, "predict"))
            .json(&body)
            .send()
            .await?;

        let parsed: PredictResponse = Self::parse_response(response).await?;
        let prediction = parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| GenAiError::Empty("Image generation failed.".to_string()))?;
        let encoded = prediction
            .bytes_base64_encoded
            .ok_or_else(|| GenAiError::Empty("Image generation failed.".to_string()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| GenAiError::Decode(format!("image payload was not base64: {e}")))?;

        Ok(GeneratedImage {
            bytes,
            mime: prediction.mime_type.unwrap_or_else(|| "image/jpeg".to_string()),
        })
    }

    async fn generate_video_once(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        continuation: Option<&VisualHandle>,
    ) -> Result<GeneratedVideo, GenAiError> {
        let (model, instance) = match continuation {
            Some(handle) => (
                VIDEO_MODEL_EXTEND,
                serde_json::json!({
                    "prompt": prompt,
                    "video": { "uri": handle.uri, "aspectRatio": handle.aspect_ratio },
                }),
            ),
            None => (VIDEO_MODEL_FAST, serde_json::json!({ "prompt": prompt })),
        };
        let body = serde_json::json!({
            "instances": [instance],
            "parameters": {
                "sampleCount": 1,
                "resolution": "720p",
                "aspectRatio": aspect_ratio,
            },
        });

        let response = self
            .http
            .post(self.model_url(model, "predictLongRunning"))
            .json(&body)
            .send()
            .await?;
        let handle: OperationHandle = Self::parse_response(response).await?;

        tracing::info!(operation = %handle.name, model, "Video operation started");
        let operation = self.await_video_operation(&handle.name).await?;

        let video = operation
            .response
            .and_then(|r| r.generated_videos.into_iter().next())
            .and_then(|v| v.video)
            .ok_or_else(|| {
                GenAiError::Empty("Video generation failed or returned no URI.".to_string())
            })?;
        let uri = video
            .uri
            .ok_or_else(|| {
                GenAiError::Empty("Video generation failed or returned no URI.".to_string())
            })?;

        let bytes = self.download_video(&uri).await?;
        tracing::info!(bytes = bytes.len(), "Video downloaded");

        Ok(GeneratedVideo {
            bytes,
            mime: "video/mp4".to_string(),
            handle: VisualHandle {
                uri,
                aspect_ratio: video
                    .aspect_ratio
                    .unwrap_or_else(|| aspect_ratio.to_string()),
            },
        })
    }

    /// Poll a long-running operation until it completes or reports an error.
    async fn await_video_operation(&self, name: &str) -> Result<Operation, GenAiError> {
        loop {
            let response = self
                .http
                .get(format!("{}/v1beta/{name}?key={}", self.base_url, self.api_key))
                .send()
                .await?;
            let operation: Operation = Self::parse_response(response).await?;

            if let Some(error) = operation.error {
                return Err(GenAiError::Empty(
                    error
                        .message
                        .unwrap_or_else(|| "Video generation failed.".to_string()),
                ));
            }
            if operation.done {
                return Ok(operation);
            }
            tokio::time::sleep(VIDEO_POLL_INTERVAL).await;
        }
    }

    /// Download the finished clip from the service-issued URI.
    async fn download_video(&self, uri: &str) -> Result<Vec<u8>, GenAiError> {
        let separator = if uri.contains('?') { '&' } else { '?' };
        let response = self
            .http
            .get(format!("{uri}{separator}key={}", self.api_key))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn generate_audio_once(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<GeneratedAudio, GenAiError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } },
                },
            },
        });

        let response = self
            .http
            .post(self.model_url(TTS_MODEL, "generateContent"))
            .json(&body)
            .send()
            .await?;

        let parsed: GenerateContentResponse = Self::parse_response(response).await?;
        let inline = parsed
            .first_inline_data()
            .ok_or_else(|| GenAiError::Empty("Audio generation failed.".to_string()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(|e| GenAiError::Decode(format!("audio payload was not base64: {e}")))?;

        Ok(GeneratedAudio {
            bytes,
            mime: inline
                .mime_type
                .clone()
                .unwrap_or_else(|| "audio/wav".to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Trait impls (retry applied here)
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl TextGenerator for GeminiStudioClient {
    async fn generate_script(
        &self,
        brief: &AdBrief,
        prior_script: Option<&[String]>,
    ) -> Result<Vec<String>, GenAiError> {
        with_retry(&self.retry, || self.generate_script_once(brief, prior_script)).await
    }

    async fn brainstorm(
        &self,
        product: &str,
        notes: Option<&str>,
    ) -> Result<Vec<Concept>, GenAiError> {
        with_retry(&self.retry, || self.brainstorm_once(product, notes)).await
    }

    async fn random_idea(&self) -> Result<IdeaSeed, GenAiError> {
        with_retry(&self.retry, || self.random_idea_once()).await
    }
}

#[async_trait::async_trait]
impl VisualGenerator for GeminiStudioClient {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<GeneratedImage, GenAiError> {
        with_retry(&self.retry, || self.generate_image_once(prompt, aspect_ratio)).await
    }

    async fn generate_video(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        continuation: Option<&VisualHandle>,
    ) -> Result<GeneratedVideo, GenAiError> {
        with_retry(&self.retry, || {
            self.generate_video_once(prompt, aspect_ratio, continuation)
        })
        .await
    }
}

#[async_trait::async_trait]
impl SpeechGenerator for GeminiStudioClient {
    async fn generate_audio(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<GeneratedAudio, GenAiError> {
        with_retry(&self.retry, || self.generate_audio_once(text, voice)).await
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn script_prompt(brief: &AdBrief, prior_script: Option<&[String]>) -> String {
    let context = match prior_script {
        Some(lines) if !lines.is_empty() => format!(
            "This is a multi-part ad. The script for the previous scene(s) was: \"{}\". \
             Continue the story seamlessly.\n",
            lines.join(" ")
        ),
        _ => String::new(),
    };
    let visual_idea = brief.visual_idea.as_deref().unwrap_or_default();
    let notes = match brief.notes.as_deref() {
        Some(notes) if !notes.is_empty() => {
            format!("Additional notes for this scene: \"{notes}\"\n")
        }
        _ => String::new(),
    };
    let visual_type = match brief.visual_type {
        VisualType::Image => "image",
        VisualType::Video => "video",
    };

    format!(
        "Write a short, punchy ad script for a {visual_type} ad for a product called \
         \"{product}\".\n\
         The ad should evoke the style of the {era}.\n\
         The tone should be {tone}.\n\
         {context}\
         The core visual idea for THIS SCENE is: \"{visual_idea}\".\n\
         {notes}\
         The script should be concise, ideally 1-2 lines for this specific scene. \
         Return the script as a JSON array of strings.",
        product = brief.product,
        era = brief.era,
        tone = brief.tone,
    )
}

fn brainstorm_prompt(product: &str, notes: Option<&str>) -> String {
    let notes_line = match notes {
        Some(notes) if !notes.is_empty() => format!("Keep these notes in mind: \"{notes}\"\n"),
        _ => String::new(),
    };
    format!(
        "Brainstorm 3 distinct, creative ad concepts for a product called \"{product}\".\n\
         For each concept, provide a catchy headline, a short tagline, a suggested tone \
         (choose from this list: Wholesome, Edgy, Nostalgic, Sophisticated, Humorous, \
         Dramatic, Minimalist, Surreal), and a compelling visual idea.\n\
         {notes_line}\
         Return the concepts as a JSON array of objects with keys \"headline\", \
         \"tagline\", \"tone\", and \"visualIdea\"."
    )
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }

    fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentBody>,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    #[serde(default)]
    generated_videos: Vec<GeneratedVideoEntry>,
}

#[derive(Debug, Deserialize)]
struct GeneratedVideoEntry {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRef {
    uri: Option<String>,
    aspect_ratio: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
