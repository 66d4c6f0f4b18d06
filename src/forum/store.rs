//! Storage for users and posts.
//!
//! The traits are the seam the [`ForumService`](super::service::ForumService)
//! is generic over; the in-memory stores are the only backend. Concurrent
//! updates to one post are last-writer-wins, but an update never recreates a
//! post that was removed.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tokio::sync::RwLock;

use super::models::{ForumPost, User};

/// Users keyed by email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, email: &str) -> Result<Option<User>>;

    /// Stores a new user.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the user was stored
    /// - `Ok(false)` if the email is already taken
    async fn insert(&self, user: User) -> Result<bool>;
}

/// Posts keyed by post id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, in no particular order.
    async fn list(&self) -> Result<Vec<ForumPost>>;

    async fn find(&self, post_id: &str) -> Result<Option<ForumPost>>;

    /// Inserts or replaces a post.
    async fn save(&self, post: ForumPost) -> Result<()>;

    /// Replaces a post that is still stored.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the post was replaced
    /// - `Ok(false)` if no post with that id exists any more
    async fn update(&self, post: ForumPost) -> Result<bool>;

    /// Removes a post, returning it if it existed.
    async fn remove(&self, post_id: &str) -> Result<Option<ForumPost>>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn find(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert(&self, user: User) -> Result<bool> {
        match self.users.write().await.entry(user.email.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(true)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    posts: RwLock<HashMap<String, ForumPost>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostStore {
    async fn list(&self) -> Result<Vec<ForumPost>> {
        Ok(self.posts.read().await.values().cloned().collect())
    }

    async fn find(&self, post_id: &str) -> Result<Option<ForumPost>> {
        Ok(self.posts.read().await.get(post_id).cloned())
    }

    async fn save(&self, post: ForumPost) -> Result<()> {
        self.posts.write().await.insert(post.post_id.clone(), post);
        Ok(())
    }

    async fn update(&self, post: ForumPost) -> Result<bool> {
        match self.posts.write().await.get_mut(&post.post_id) {
            Some(stored) => {
                *stored = post;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, post_id: &str) -> Result<Option<ForumPost>> {
        Ok(self.posts.write().await.remove(post_id))
    }
}
