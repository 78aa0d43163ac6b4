//! Supabase-style content service client.
//!
//! Posts live in a `posts` table behind the PostgREST API; images are
//! uploaded to the storage API first and referenced by public URL. Upvotes
//! go through an `increment_upvotes` RPC so the increment happens
//! server-side, never from a client-computed count.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::ContentGateway;
use crocial_core::post::{ContentPost, ImageAttachment, PostDraft, PostId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

use crate::config;
use crate::http;

const POSTS_BUCKET: &str = "post-images";

/// Content gateway backed by a Supabase project.
#[derive(Clone)]
pub struct SupabaseContentApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseContentApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Loads configuration from secret.json or `SUPABASE_URL`/`SUPABASE_KEY`.
    pub fn try_from_env() -> Result<Self> {
        if let Some(secret) = config::secret_config() {
            if let Some(supabase) = &secret.supabase {
                return Ok(Self::new(supabase.url.clone(), supabase.key.clone()));
            }
        }

        let base_url = env::var("SUPABASE_URL").map_err(|_| {
            CrocialError::internal(
                "SUPABASE_URL not found in ~/.config/crocial/secret.json or environment",
            )
        })?;
        let api_key = env::var("SUPABASE_KEY").map_err(|_| {
            CrocialError::auth(
                "SUPABASE_KEY not found in ~/.config/crocial/secret.json or environment",
            )
        })?;
        Ok(Self::new(base_url, api_key))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Uploads an image to the storage bucket, returning its public URL.
    async fn upload_image(&self, image: &ImageAttachment) -> Result<String> {
        let extension = image
            .mime_type
            .rsplit('/')
            .next()
            .unwrap_or("bin");
        let object = format!("{}.{}", Uuid::new_v4(), extension);

        let response = self
            .authed(self.client.post(format!(
                "{}/storage/v1/object/{}/{}",
                self.base_url, POSTS_BUCKET, object
            )))
            .header("Content-Type", image.mime_type.clone())
            .body(image.bytes.clone())
            .send()
            .await;

        http::ensure_success("image upload", response).await?;
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, POSTS_BUCKET, object
        ))
    }
}

#[derive(Serialize)]
struct InsertPostRow<'a> {
    author: &'a str,
    body: &'a str,
    image_url: Option<&'a str>,
}

#[derive(Deserialize)]
struct PostRow {
    id: serde_json::Value,
    author: String,
    body: String,
    image_url: Option<String>,
    upvotes: u64,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct IncrementUpvotesRpc<'a> {
    post_id: &'a str,
}

fn post_from_row(row: PostRow) -> Result<ContentPost> {
    let id = match row.id {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(CrocialError::bad_shape(format!(
                "post id is neither string nor number: {other}"
            )));
        }
    };
    Ok(ContentPost {
        id: PostId(id),
        author: row.author,
        body: row.body,
        image_url: row.image_url,
        upvotes: row.upvotes,
        created_at: row.created_at,
    })
}

#[async_trait]
impl ContentGateway for SupabaseContentApi {
    async fn list_posts(&self) -> Result<Vec<ContentPost>> {
        let response = self
            .authed(self.client.get(format!(
                "{}/rest/v1/posts?select=*&order=created_at.desc",
                self.base_url
            )))
            .send()
            .await;

        let response = http::ensure_success("post listing", response).await?;
        let rows: Vec<PostRow> = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("post listing response: {err}"))
        })?;
        rows.into_iter().map(post_from_row).collect()
    }

    async fn create_post(&self, author: &str, draft: &PostDraft) -> Result<ContentPost> {
        let image_url = match &draft.image {
            Some(image) => Some(self.upload_image(image).await?),
            None => None,
        };

        let row = InsertPostRow {
            author,
            body: &draft.body,
            image_url: image_url.as_deref(),
        };

        let response = self
            .authed(self.client.post(format!("{}/rest/v1/posts", self.base_url)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await;

        let response = http::ensure_success("post creation", response).await?;
        let mut rows: Vec<PostRow> = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("post creation response: {err}"))
        })?;
        if rows.is_empty() {
            return Err(CrocialError::bad_shape(
                "post creation returned no representation",
            ));
        }
        post_from_row(rows.swap_remove(0))
    }

    async fn increment_upvote(&self, id: &PostId) -> Result<u64> {
        let response = self
            .authed(self.client.post(format!(
                "{}/rest/v1/rpc/increment_upvotes",
                self.base_url
            )))
            .json(&IncrementUpvotesRpc {
                post_id: id.as_str(),
            })
            .send()
            .await;

        let response = http::ensure_success("upvote", response).await?;
        let count: u64 = response.json().await.map_err(|err| {
            CrocialError::bad_shape(format!("upvote response: {err}"))
        })?;
        Ok(count)
    }
}
