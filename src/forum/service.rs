//! Forum business logic.

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

use super::models::{ForumPost, User};
use super::store::{PostRepository, UserRepository};
use crate::auth::{PasswordHasher, TokenService, generate_id};
use crate::routing::HandlerError;

/// Registration, login, and post management.
///
/// Errors are [`HandlerError`]s so handlers can return them unchanged:
/// expected failures carry the message shown to the caller, store failures
/// become internal errors.
pub struct ForumService<U: UserRepository, P: PostRepository> {
    users: Arc<U>,
    posts: Arc<P>,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl<U: UserRepository, P: PostRepository> ForumService<U, P> {
    pub fn new(users: Arc<U>, posts: Arc<P>, tokens: TokenService, hasher: PasswordHasher) -> Self {
        Self {
            users,
            posts,
            tokens,
            hasher,
        }
    }

    /// Stores a new user with a hashed password and returns an access token.
    ///
    /// # Errors
    ///
    /// Returns a business error if the email is already registered.
    pub async fn register(&self, mut user: User) -> Result<String, HandlerError> {
        user.password = self.hasher.hash(&user.password);
        let email = user.email.clone();

        if !self.users.insert(user).await? {
            return Err(HandlerError::business("Email already registered"));
        }

        tracing::info!(email = %email, "User registered");
        self.issue(&email)
    }

    /// Checks credentials and returns an access token.
    ///
    /// # Errors
    ///
    /// Returns a business error if the email is unknown or the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, HandlerError> {
        let user = self
            .users
            .find(email)
            .await?
            .ok_or_else(|| HandlerError::business("Email not registered"))?;

        if !self.hasher.verify(password, &user.password) {
            tracing::debug!(email = %email, "Password mismatch");
            return Err(HandlerError::business("Password does not match"));
        }

        self.issue(email)
    }

    fn issue(&self, email: &str) -> Result<String, HandlerError> {
        Ok(self
            .tokens
            .issue(email)
            .context("Failed to issue access token")?)
    }

    /// # Errors
    ///
    /// Returns a 404 business error if no user has this email.
    pub async fn user(&self, email: &str) -> Result<User, HandlerError> {
        self.users
            .find(email)
            .await?
            .ok_or_else(|| HandlerError::not_found("User not found"))
    }

    /// All posts, most recently updated first, ties broken by most recently
    /// created.
    pub async fn posts(&self) -> Result<Vec<ForumPost>, HandlerError> {
        let mut posts = self.posts.list().await?;

        posts.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(posts)
    }

    pub async fn create_post(&self, author: User, content: String) -> Result<ForumPost, HandlerError> {
        let now = Utc::now();
        let post = ForumPost {
            post_id: generate_id(),
            author,
            content,
            created_at: now,
            updated_at: now,
        };

        self.posts.save(post.clone()).await?;
        tracing::info!(post_id = %post.post_id, author = %post.author.email, "Post created");

        Ok(post)
    }

    /// Replaces the content of a post and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// - 404 if the post does not exist, or was deleted before the write landed
    /// - 403 if `caller` is not the author
    pub async fn update_post(
        &self,
        caller: &str,
        post_id: &str,
        content: String,
    ) -> Result<ForumPost, HandlerError> {
        let mut post = self.owned_post(caller, post_id, "Only author can update post").await?;

        post.content = content;
        post.updated_at = Utc::now();
        if !self.posts.update(post.clone()).await? {
            return Err(HandlerError::not_found("Post not found"));
        }

        Ok(post)
    }

    /// # Errors
    ///
    /// - 404 if the post does not exist
    /// - 403 if `caller` is not the author
    pub async fn delete_post(&self, caller: &str, post_id: &str) -> Result<ForumPost, HandlerError> {
        let post = self.owned_post(caller, post_id, "Only author can delete post").await?;

        self.posts
            .remove(post_id)
            .await?
            .ok_or_else(|| HandlerError::not_found("Post not found"))?;
        tracing::info!(post_id = %post_id, "Post deleted");

        Ok(post)
    }

    async fn owned_post(
        &self,
        caller: &str,
        post_id: &str,
        denied: &str,
    ) -> Result<ForumPost, HandlerError> {
        let post = self
            .posts
            .find(post_id)
            .await?
            .ok_or_else(|| HandlerError::not_found("Post not found"))?;

        if post.author.email != caller {
            return Err(HandlerError::forbidden(denied));
        }

        Ok(post)
    }
}
