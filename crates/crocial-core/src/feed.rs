//! Ordered, optimistically-updated cache of the remote post feed.
//!
//! The store is the single source of truth for content ordering: screens
//! read snapshots from it and every mutation goes through its operations,
//! so optimistic bookkeeping cannot diverge across screens.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{CrocialError, Result};
use crate::gateway::ContentGateway;
use crate::post::{ContentPost, PostDraft, PostId};

/// One feed slot: a confirmed post, or an optimistic insert awaiting its
/// authoritative identity from the content service.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub post: ContentPost,
    /// Local key while the insert is unconfirmed; `None` once authoritative
    pub pending: Option<Uuid>,
}

#[derive(Default)]
struct FeedInner {
    entries: Vec<FeedEntry>,
    /// Optimistic upvote increments not yet reconciled, per post
    pending_upvotes: HashMap<PostId, u64>,
    /// Per-post locks serializing remote upvote calls
    upvote_locks: HashMap<PostId, Arc<Mutex<()>>>,
}

/// The content feed with optimistic insert and upvote reconciliation.
pub struct FeedStore {
    gateway: Arc<dyn ContentGateway>,
    inner: RwLock<FeedInner>,
}

impl FeedStore {
    pub fn new(gateway: Arc<dyn ContentGateway>) -> Self {
        Self {
            gateway,
            inner: RwLock::new(FeedInner::default()),
        }
    }

    /// A display snapshot of the feed, newest first.
    pub async fn entries(&self) -> Vec<FeedEntry> {
        self.inner.read().await.entries.clone()
    }

    /// Replaces the whole sequence with a fresh fetch, newest first.
    ///
    /// On failure the previous sequence is left displayed untouched.
    pub async fn load(&self) -> Result<usize> {
        let mut posts = self.gateway.list_posts().await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut inner = self.inner.write().await;
        inner.entries = posts
            .into_iter()
            .map(|post| FeedEntry { post, pending: None })
            .collect();
        Ok(inner.entries.len())
    }

    /// Publishes a draft with an optimistic prepend.
    ///
    /// The pending entry is visible immediately; on confirmation it is
    /// replaced in place by the authoritative post, on failure it is removed
    /// and the sequence returns to its pre-insert state.
    pub async fn publish(&self, author: &str, draft: PostDraft) -> Result<ContentPost> {
        let key = Uuid::new_v4();
        let placeholder = ContentPost {
            id: PostId(format!("pending-{key}")),
            author: author.to_string(),
            body: draft.body.clone(),
            image_url: None,
            upvotes: 0,
            created_at: chrono::Utc::now(),
        };

        {
            let mut inner = self.inner.write().await;
            inner.entries.insert(
                0,
                FeedEntry {
                    post: placeholder,
                    pending: Some(key),
                },
            );
        }

        match self.gateway.create_post(author, &draft).await {
            Ok(post) => {
                let mut inner = self.inner.write().await;
                if let Some(entry) = inner
                    .entries
                    .iter_mut()
                    .find(|e| e.pending == Some(key))
                {
                    entry.post = post.clone();
                    entry.pending = None;
                }
                Ok(post)
            }
            Err(err) => {
                let mut inner = self.inner.write().await;
                inner.entries.retain(|e| e.pending != Some(key));
                Err(err)
            }
        }
    }

    /// Upvotes a post with optimistic local increment.
    ///
    /// Remote calls for the same post are serialized behind a per-post lock,
    /// so a second click while the first is pending queues after it and the
    /// remote side sees exactly one increment per click. On failure exactly
    /// this call's increment is rolled back.
    pub async fn increment_upvote(&self, id: &PostId) -> Result<u64> {
        let lock = {
            let mut inner = self.inner.write().await;
            let entry = inner
                .entries
                .iter_mut()
                .find(|e| &e.post.id == id)
                .ok_or_else(|| CrocialError::validation(format!("post not in feed: {}", id.0)))?;
            if entry.pending.is_some() {
                return Err(CrocialError::validation(
                    "post is still pending confirmation",
                ));
            }
            // Optimistic increment, reflected before the remote round-trip
            entry.post.upvotes += 1;
            *inner.pending_upvotes.entry(id.clone()).or_insert(0) += 1;
            inner
                .upvote_locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let _serialized = lock.lock().await;
        match self.gateway.increment_upvote(id).await {
            Ok(server_count) => {
                let mut inner = self.inner.write().await;
                let remaining = {
                    let pending = inner.pending_upvotes.get_mut(id);
                    match pending {
                        Some(n) => {
                            *n -= 1;
                            *n
                        }
                        None => 0,
                    }
                };
                let result = if let Some(entry) =
                    inner.entries.iter_mut().find(|e| &e.post.id == id)
                {
                    // Reconcile to the authoritative count plus whatever is
                    // still optimistically in flight.
                    entry.post.upvotes = server_count + remaining;
                    Ok(entry.post.upvotes)
                } else {
                    Ok(server_count)
                };
                prune_upvote_bookkeeping(&mut inner, id, &lock);
                result
            }
            Err(err) => {
                let mut inner = self.inner.write().await;
                if let Some(n) = inner.pending_upvotes.get_mut(id) {
                    *n = n.saturating_sub(1);
                }
                if let Some(entry) = inner.entries.iter_mut().find(|e| &e.post.id == id) {
                    entry.post.upvotes = entry.post.upvotes.saturating_sub(1);
                }
                prune_upvote_bookkeeping(&mut inner, id, &lock);
                Err(err)
            }
        }
    }

    #[cfg(test)]
    async fn upvote_bookkeeping_size(&self) -> (usize, usize) {
        let inner = self.inner.read().await;
        (inner.pending_upvotes.len(), inner.upvote_locks.len())
    }
}

/// Drops per-post upvote state once no caller is queued behind this one.
///
/// Two strong references mean the map's clone plus the current call's; any
/// queued caller would hold a third, in which case the entry stays.
fn prune_upvote_bookkeeping(inner: &mut FeedInner, id: &PostId, lock: &Arc<Mutex<()>>) {
    if Arc::strong_count(lock) > 2 {
        return;
    }
    inner.upvote_locks.remove(id);
    if inner.pending_upvotes.get(id).is_some_and(|n| *n == 0) {
        inner.pending_upvotes.remove(id);
    }
}
