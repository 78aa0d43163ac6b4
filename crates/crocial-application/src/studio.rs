//! AI studio screen use case.
//!
//! Drives the generation job: prompt to image, then optionally image to
//! video. The job's ticket guard makes a restart discard any late result
//! from the superseded generation.

use std::sync::Arc;

use crocial_core::error::Result;
use crocial_core::gateway::{ImageGenerationParams, InferenceGateway, VideoGenerationParams};
use crocial_core::generation::{GenerationJob, GenerationView};
use tokio::sync::RwLock;

pub struct StudioScreen {
    inference: Arc<dyn InferenceGateway>,
    job: RwLock<GenerationJob>,
    image_params: ImageGenerationParams,
    video_params: VideoGenerationParams,
}

impl StudioScreen {
    pub fn new(inference: Arc<dyn InferenceGateway>) -> Self {
        Self {
            inference,
            job: RwLock::new(GenerationJob::new()),
            image_params: ImageGenerationParams::default(),
            video_params: VideoGenerationParams::default(),
        }
    }

    /// Overrides the image generation parameters.
    pub fn with_image_params(mut self, params: ImageGenerationParams) -> Self {
        self.image_params = params;
        self
    }

    /// What the studio view renders right now.
    pub async fn view(&self) -> GenerationView {
        self.job.read().await.view()
    }

    /// Starts a new generation, superseding anything in progress.
    ///
    /// # Errors
    ///
    /// An empty prompt fails validation locally and never reaches the
    /// inference collaborator.
    pub async fn generate(&self, prompt: &str) -> Result<()> {
        let ticket = self.job.write().await.start(prompt)?;
        tracing::info!(target: "studio", "image generation started");

        let outcome = self.inference.generate_image(prompt, &self.image_params).await;

        let applied = self.job.write().await.complete_image(&ticket, outcome);
        if !applied.is_applied() {
            tracing::debug!(target: "studio", "discarded superseded image result");
        }
        Ok(())
    }

    /// Converts the generated image into a video.
    ///
    /// # Errors
    ///
    /// Only legal once an image is ready; a video failure leaves the image
    /// displayed and marks only the video portion failed.
    pub async fn animate(&self) -> Result<()> {
        let (ticket, image) = self.job.write().await.start_video()?;
        tracing::info!(target: "studio", "video conversion started");

        let outcome = self.inference.generate_video(&image, &self.video_params).await;

        let applied = self.job.write().await.complete_video(&ticket, outcome);
        if !applied.is_applied() {
            tracing::debug!(target: "studio", "discarded superseded video result");
        }
        Ok(())
    }
}
