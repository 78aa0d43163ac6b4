//! Content post model for the social feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CrocialError, Result};

/// Identifier assigned by the content service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A post persisted by the content service.
///
/// `upvotes` is non-decreasing under normal use; the feed displays posts
/// ordered by `created_at` descending with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPost {
    pub id: PostId,
    pub author: String,
    pub body: String,
    pub image_url: Option<String>,
    pub upvotes: u64,
    pub created_at: DateTime<Utc>,
}

/// Locally-composed post content, validated before it leaves the composer.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub body: String,
    /// Raw image bytes to upload alongside the post, if any
    pub image: Option<ImageAttachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl PostDraft {
    /// Builds a text-only draft, rejecting empty/whitespace bodies.
    pub fn text(body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(CrocialError::validation("post body must not be empty"));
        }
        Ok(Self { body, image: None })
    }

    /// Attaches an image to the draft.
    pub fn with_image(mut self, bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CrocialError::validation("image attachment must not be empty"));
        }
        self.image = Some(ImageAttachment {
            bytes,
            mime_type: mime_type.into(),
        });
        Ok(self)
    }
}
