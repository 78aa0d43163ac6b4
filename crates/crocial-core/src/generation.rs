//! Generation job state machine for the AI studio.
//!
//! One job per view. A new generation request restarts the machine at the
//! image stage and discards every downstream result, including an in-flight
//! video conversion; completions carry tickets so superseded responses are
//! dropped instead of corrupting the new job.

use serde::{Deserialize, Serialize};

pub use crate::controller::Applied;
use crate::error::{CrocialError, Result};
use crate::gateway::MediaRef;

/// Ticket binding an async completion to the job generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    seq: u64,
}

/// The video sub-stage, valid only once the image stage succeeded.
///
/// A video failure never invalidates the image result; the image stays
/// displayed and only this portion reports failure.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoPhase {
    NotRequested,
    Generating,
    Ready(MediaRef),
    Failed(CrocialError),
}

/// Job phases: `Idle -> GeneratingImage -> ImageReady {video} | Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPhase {
    Idle,
    GeneratingImage { prompt: String },
    ImageReady { image: MediaRef, video: VideoPhase },
    Failed(CrocialError),
}

/// Prompt-to-image (and optional image-to-video) job for one studio view.
#[derive(Debug)]
pub struct GenerationJob {
    phase: GenerationPhase,
    seq: u64,
}

impl Default for GenerationJob {
    fn default() -> Self {
        Self {
            phase: GenerationPhase::Idle,
            seq: 0,
        }
    }
}

impl GenerationJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &GenerationPhase {
        &self.phase
    }

    /// Starts a new generation, superseding whatever was in progress.
    ///
    /// # Errors
    ///
    /// An empty or whitespace prompt is a local validation failure and never
    /// reaches the inference collaborator.
    pub fn start(&mut self, prompt: &str) -> Result<GenerationTicket> {
        if prompt.trim().is_empty() {
            return Err(CrocialError::validation("prompt must not be empty"));
        }
        self.seq += 1;
        self.phase = GenerationPhase::GeneratingImage {
            prompt: prompt.to_string(),
        };
        Ok(GenerationTicket { seq: self.seq })
    }

    /// Applies the image-stage result.
    ///
    /// A successful call with zero output references is treated as a
    /// failure ("no output produced"), not as `ImageReady`.
    pub fn complete_image(
        &mut self,
        ticket: &GenerationTicket,
        outcome: Result<Vec<MediaRef>>,
    ) -> Applied {
        if ticket.seq != self.seq {
            return Applied::Stale;
        }
        self.phase = match outcome {
            Ok(mut refs) => {
                if refs.is_empty() {
                    GenerationPhase::Failed(CrocialError::empty_result("no output produced"))
                } else {
                    GenerationPhase::ImageReady {
                        image: refs.swap_remove(0),
                        video: VideoPhase::NotRequested,
                    }
                }
            }
            Err(err) => GenerationPhase::Failed(err),
        };
        Applied::Applied
    }

    /// Enters the video stage, returning the image to convert.
    ///
    /// # Errors
    ///
    /// Only legal from `ImageReady` when no conversion is in flight.
    pub fn start_video(&mut self) -> Result<(GenerationTicket, MediaRef)> {
        match &mut self.phase {
            GenerationPhase::ImageReady { image, video } => match video {
                VideoPhase::Generating => Err(CrocialError::validation(
                    "video conversion already in progress",
                )),
                _ => {
                    let image = image.clone();
                    *video = VideoPhase::Generating;
                    Ok((GenerationTicket { seq: self.seq }, image))
                }
            },
            _ => Err(CrocialError::validation(
                "video conversion requires a generated image",
            )),
        }
    }

    /// Applies the video-stage result. The image result is left intact on
    /// failure.
    pub fn complete_video(
        &mut self,
        ticket: &GenerationTicket,
        outcome: Result<MediaRef>,
    ) -> Applied {
        if ticket.seq != self.seq {
            return Applied::Stale;
        }
        if let GenerationPhase::ImageReady { video, .. } = &mut self.phase {
            *video = match outcome {
                Ok(media) => VideoPhase::Ready(media),
                Err(err) => VideoPhase::Failed(err),
            };
            Applied::Applied
        } else {
            // The job moved on (e.g. a failed restart); nothing to update.
            Applied::Stale
        }
    }
}

/// Serializable snapshot of the job for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum GenerationView {
    Idle,
    Generating,
    ImageReady {
        image_url: String,
        video_url: Option<String>,
        video_error: Option<String>,
        video_generating: bool,
    },
    Failed {
        reason: String,
    },
}

impl GenerationJob {
    /// Flattens the phase machine into what a view actually renders.
    pub fn view(&self) -> GenerationView {
        match &self.phase {
            GenerationPhase::Idle => GenerationView::Idle,
            GenerationPhase::GeneratingImage { .. } => GenerationView::Generating,
            GenerationPhase::ImageReady { image, video } => GenerationView::ImageReady {
                image_url: image.0.clone(),
                video_url: match video {
                    VideoPhase::Ready(v) => Some(v.0.clone()),
                    _ => None,
                },
                video_error: match video {
                    VideoPhase::Failed(e) => Some(e.to_string()),
                    _ => None,
                },
                video_generating: matches!(video, VideoPhase::Generating),
            },
            GenerationPhase::Failed(err) => GenerationView::Failed {
                reason: err.to_string(),
            },
        }
    }
}
