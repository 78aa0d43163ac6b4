//! Social feed screen use case.
//!
//! Wraps the feed store with the screen's load and composer lifecycles.
//! The store owns the sequence; this screen only drives its operations and
//! tracks loading/error state around them.

use std::sync::Arc;

use crocial_core::controller::{ViewSnapshot, ViewState};
use crocial_core::error::Result;
use crocial_core::feed::{FeedEntry, FeedStore};
use crocial_core::gateway::ContentGateway;
use crocial_core::post::{ContentPost, PostDraft, PostId};
use crocial_core::session::Session;
use tokio::sync::RwLock;

pub struct SocialScreen {
    store: Arc<FeedStore>,
    /// Lifecycle of the full-feed fetch; the sequence itself lives in the
    /// store so a failed reload cannot clear it
    feed: RwLock<ViewState<usize>>,
    composer: RwLock<ViewState<ContentPost>>,
}

impl SocialScreen {
    pub fn new(content: Arc<dyn ContentGateway>) -> Self {
        Self {
            store: Arc::new(FeedStore::new(content)),
            feed: RwLock::new(ViewState::new()),
            composer: RwLock::new(ViewState::new()),
        }
    }

    /// Current display sequence, newest first.
    pub async fn posts(&self) -> Vec<FeedEntry> {
        self.store.entries().await
    }

    pub async fn feed_state(&self) -> ViewSnapshot<usize> {
        self.feed.read().await.snapshot()
    }

    pub async fn composer_state(&self) -> ViewSnapshot<ContentPost> {
        self.composer.read().await.snapshot()
    }

    /// Reloads the feed. On failure the previously displayed posts remain
    /// and the error is set on the screen.
    pub async fn load(&self) {
        let Some(token) = self.feed.write().await.begin() else {
            return;
        };

        let outcome = self.store.load().await;

        let mut feed = self.feed.write().await;
        match outcome {
            Ok(count) => {
                feed.succeed(&token, count);
            }
            Err(err) => {
                tracing::warn!(target: "social", "feed load failed: {err}");
                feed.fail(&token, err);
            }
        }
    }

    /// Publishes a new post through the store's optimistic insert.
    ///
    /// # Errors
    ///
    /// Draft validation errors surface at the composer and are never
    /// dispatched; remote failures roll the optimistic entry back and are
    /// also reflected in the composer state.
    pub async fn publish(&self, session: &Session, draft: PostDraft) -> Result<ContentPost> {
        let Some(token) = self.composer.write().await.begin() else {
            return Err(crocial_core::CrocialError::validation(
                "a post is already being published",
            ));
        };

        let outcome = self.store.publish(session.author_label(), draft).await;

        let mut composer = self.composer.write().await;
        match outcome {
            Ok(post) => {
                composer.succeed(&token, post.clone());
                Ok(post)
            }
            Err(err) => {
                tracing::warn!(target: "social", "publish failed: {err}");
                composer.fail(&token, err.clone());
                Err(err)
            }
        }
    }

    /// Upvotes a post. Optimistic bookkeeping and rollback live in the
    /// store; the screen stays interactive while the call is in flight.
    pub async fn upvote(&self, id: &PostId) -> Result<u64> {
        self.store.increment_upvote(id).await
    }
}
