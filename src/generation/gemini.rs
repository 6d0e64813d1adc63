//! Gemini `generateContent` client

use super::{prompts, DesignService};
use crate::booking::{Complexity, TattooStyle};
use crate::config::GenerationConfig;
use crate::error::{Result, StudioError};
use crate::types::ImageAsset;
use async_trait::async_trait;
use instant::Instant;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest slice of an unparseable error body echoed back in errors
const MAX_ERROR_BODY_CHARS: usize = 200;

/// [`DesignService`] backed by the Gemini REST API
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    image_model: String,
    text_model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client reading the API key from the environment variable named
    /// in `config`
    ///
    /// # Errors
    /// - `InvalidConfig` when the variable is unset or empty, or the HTTP
    ///   client cannot be built
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                StudioError::invalid_config(format!(
                    "API key not found: set the {} environment variable",
                    config.api_key_env
                ))
            })?;
        Self::with_api_key(config, api_key)
    }

    /// Build a client with an explicit API key
    ///
    /// # Errors
    /// - `InvalidConfig` when the HTTP client cannot be built
    pub fn with_api_key<S: Into<String>>(config: &GenerationConfig, api_key: S) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                StudioError::invalid_config(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn send_json(&self, operation: &str, model: &str, body: &impl Serialize) -> Result<String> {
        let started = Instant::now();
        let response = self
            .http
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(operation, model, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(operation, model, &e))?;
        debug!(
            operation,
            model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Service responded"
        );

        if !status.is_success() {
            return Err(StudioError::generation_error_with_operation(
                operation,
                model,
                &format!("HTTP {}: {}", status.as_u16(), api_error_message(&text)),
            ));
        }
        Ok(text)
    }

    async fn request_image(&self, operation: &str, parts: Vec<RequestPart<'_>>) -> Result<ImageAsset> {
        let request = GenerateRequest::single(parts);
        let body = self.send_json(operation, &self.image_model, &request).await?;
        let asset = parse_image_response(&body).map_err(|reason| {
            StudioError::generation_error_with_operation(operation, &self.image_model, &reason)
        })?;
        info!(
            operation,
            mime_type = asset.mime_type(),
            bytes = asset.len(),
            "Received generated image"
        );
        Ok(asset)
    }
}

#[async_trait]
impl DesignService for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.image_model))]
    async fn generate_design(
        &self,
        prompt: &str,
        style: TattooStyle,
        complexity: Complexity,
    ) -> Result<ImageAsset> {
        let text = prompts::design_prompt(prompt, style, complexity);
        self.request_image("Design generation", vec![RequestPart::text(&text)])
            .await
    }

    #[instrument(skip(self, reference, description), fields(model = %self.image_model))]
    async fn enhance_design(
        &self,
        reference: &ImageAsset,
        description: &str,
        style: TattooStyle,
    ) -> Result<ImageAsset> {
        reference.ensure_encoded_image()?;
        let text = prompts::enhance_prompt(description, style);
        self.request_image(
            "Design enhancement",
            vec![RequestPart::image(reference), RequestPart::text(&text)],
        )
        .await
    }

    #[instrument(skip(self, composite, design_prompt), fields(model = %self.image_model))]
    async fn simulate_on_body(
        &self,
        composite: &ImageAsset,
        design_prompt: &str,
    ) -> Result<ImageAsset> {
        let text = prompts::simulation_prompt(design_prompt);
        self.request_image(
            "Body simulation",
            vec![RequestPart::image(composite), RequestPart::text(&text)],
        )
        .await
    }

    #[instrument(skip(self, raw), fields(model = %self.text_model))]
    async fn refine_text(&self, raw: &str) -> String {
        let text = prompts::refine_prompt(raw);
        let request = GenerateRequest::single(vec![RequestPart::text(&text)]);
        match self.send_json("Text refinement", &self.text_model, &request).await {
            Ok(body) => match parse_text_response(&body) {
                Some(refined) => {
                    debug!(chars = refined.len(), "Refined description");
                    refined
                },
                None => {
                    warn!("Text refinement returned no text, keeping raw description");
                    raw.to_string()
                },
            },
            Err(e) => {
                warn!(error = %e, "Text refinement failed, keeping raw description");
                raw.to_string()
            },
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateRequest<'a> {
    fn single(parts: Vec<RequestPart<'a>>) -> Self {
        Self {
            contents: vec![RequestContent { parts }],
        }
    }
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: RequestBlob<'a>,
    },
}

impl<'a> RequestPart<'a> {
    fn text(text: &'a str) -> Self {
        Self::Text { text }
    }

    fn image(asset: &'a ImageAsset) -> Self {
        Self::InlineData {
            inline_data: RequestBlob {
                mime_type: asset.mime_type(),
                data: asset.base64_payload(),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBlob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<ResponseBlob>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBlob {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn first_candidate_parts(body: &str) -> std::result::Result<Vec<ResponsePart>, String> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid response JSON: {}", e))?;
    Ok(response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default())
}

/// Connection, timeout and body-read failures are service failures too
fn transport_error(operation: &str, model: &str, error: &reqwest::Error) -> StudioError {
    let kind = if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "could not connect"
    } else {
        "request failed"
    };
    StudioError::generation_error_with_operation(operation, model, &format!("{}: {}", kind, error))
}

/// Extract the first inline image of the first candidate
fn parse_image_response(body: &str) -> std::result::Result<ImageAsset, String> {
    let blob = first_candidate_parts(body)?
        .into_iter()
        .find_map(|part| part.inline_data)
        .ok_or_else(|| "No image generated".to_string())?;

    ImageAsset::from_data_uri(&format!("data:{};base64,{}", blob.mime_type, blob.data))
        .map_err(|e| e.to_string())
}

/// Extract the first non-empty text part of the first candidate
fn parse_text_response(body: &str) -> Option<String> {
    first_candidate_parts(body)
        .ok()?
        .into_iter()
        .filter_map(|part| part.text)
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}
