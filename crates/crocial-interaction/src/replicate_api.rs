//! Replicate-style inference API client.
//!
//! Two operations: prompt-to-image (`flux-schnell`) and image-to-video
//! (`i2vgen-xl`). Predictions are issued in blocking mode (`Prefer: wait`)
//! so one request maps to one completed generation.

use async_trait::async_trait;
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::{
    ImageGenerationParams, InferenceGateway, MediaRef, VideoGenerationParams,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use crate::config;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";
const IMAGE_MODEL: &str = "black-forest-labs/flux-schnell";
const VIDEO_MODEL: &str = "ali-vilab/i2vgen-xl";

/// Inference gateway backed by the Replicate HTTP API.
#[derive(Clone)]
pub struct ReplicateApi {
    client: Client,
    base_url: String,
    api_token: String,
}

impl ReplicateApi {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: api_token.into(),
        }
    }

    /// Loads configuration from secret.json or `REPLICATE_API_TOKEN`.
    pub fn try_from_env() -> Result<Self> {
        if let Some(secret) = config::secret_config() {
            if let Some(replicate) = &secret.replicate {
                let mut api = Self::new(replicate.api_token.clone());
                if let Some(base_url) = &replicate.base_url {
                    api.base_url = base_url.clone();
                }
                return Ok(api);
            }
        }

        let api_token = env::var("REPLICATE_API_TOKEN").map_err(|_| {
            CrocialError::auth(
                "REPLICATE_API_TOKEN not found in ~/.config/crocial/secret.json or environment",
            )
        })?;
        Ok(Self::new(api_token))
    }

    /// Overrides the base URL after construction.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn run_prediction<I: Serialize>(
        &self,
        context: &str,
        model: &str,
        input: &I,
    ) -> Result<Vec<MediaRef>> {
        let response = self
            .client
            .post(format!("{}/models/{}/predictions", self.base_url, model))
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&PredictionRequest { input })
            .send()
            .await;

        let response = http::ensure_success(context, response).await?;
        let parsed: PredictionResponse = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("{context} response: {err}"))
        })?;

        if parsed.status == "failed" || parsed.status == "canceled" {
            return Err(CrocialError::Remote {
                status: None,
                message: format!(
                    "{context}: prediction {}: {}",
                    parsed.status,
                    parsed.error.unwrap_or_else(|| "no error detail".to_string())
                ),
            });
        }

        let outputs = outputs_from_value(parsed.output);
        if outputs.is_empty() {
            return Err(CrocialError::empty_result(format!(
                "{context}: no output produced"
            )));
        }
        Ok(outputs)
    }
}

#[derive(Serialize)]
struct PredictionRequest<'a, I: Serialize> {
    input: &'a I,
}

#[derive(Deserialize)]
struct PredictionResponse {
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Replicate models return either a single URL or a list of URLs.
fn outputs_from_value(output: Option<serde_json::Value>) -> Vec<MediaRef> {
    match output {
        Some(serde_json::Value::String(url)) => vec![MediaRef(url)],
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(url) => Some(MediaRef(url)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Serialize)]
struct ImageInput<'a> {
    prompt: &'a str,
    go_fast: bool,
    megapixels: &'a str,
    num_outputs: u32,
    aspect_ratio: &'a str,
    output_format: &'a str,
}

#[derive(Serialize)]
struct VideoInput<'a> {
    image: &'a str,
    prompt: &'a str,
    max_frames: u32,
    guidance_scale: u32,
    num_inference_steps: u32,
}

#[async_trait]
impl InferenceGateway for ReplicateApi {
    async fn generate_image(
        &self,
        prompt: &str,
        params: &ImageGenerationParams,
    ) -> Result<Vec<MediaRef>> {
        let input = ImageInput {
            prompt,
            go_fast: params.go_fast,
            megapixels: &params.megapixels,
            num_outputs: params.num_outputs,
            aspect_ratio: &params.aspect_ratio,
            output_format: &params.output_format,
        };
        self.run_prediction("image generation", IMAGE_MODEL, &input)
            .await
    }

    async fn generate_video(
        &self,
        image: &MediaRef,
        params: &VideoGenerationParams,
    ) -> Result<MediaRef> {
        let input = VideoInput {
            image: &image.0,
            prompt: &params.prompt,
            max_frames: params.max_frames,
            guidance_scale: params.guidance_scale,
            num_inference_steps: params.num_inference_steps,
        };
        let mut outputs = self
            .run_prediction("video generation", VIDEO_MODEL, &input)
            .await?;
        Ok(outputs.swap_remove(0))
    }
}
