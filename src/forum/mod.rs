//! A small forum built on the routing framework: registration, token login,
//! user profiles and author-owned posts.

pub mod identity;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

pub use identity::TokenIdentityResolver;
pub use models::{ForumPost, User, register_models};
pub use service::ForumService;
pub use store::{InMemoryPostStore, InMemoryUserStore, PostRepository, UserRepository};

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::routing::Router;
use crate::schema::SchemaRegistry;

/// Assembles the forum dispatch table over fresh in-memory stores.
///
/// # Errors
///
/// Returns an error if a model fails to register or a route references an
/// unknown model.
pub fn dispatcher(tokens: TokenService, hasher: PasswordHasher) -> Result<Router> {
    let registry = SchemaRegistry::new();
    register_models(&registry).context("Failed to register forum models")?;

    let users = Arc::new(InMemoryUserStore::new());
    let posts = Arc::new(InMemoryPostStore::new());

    let resolver = Arc::new(TokenIdentityResolver::new(tokens.clone(), users.clone()));
    let service = Arc::new(ForumService::new(users, posts, tokens, hasher));

    let router = Router::new(Arc::new(registry), resolver, routes::routes(service))
        .context("Failed to build forum routes")?;

    for (method, path) in router.routes() {
        tracing::debug!(%method, path, "Route registered");
    }

    Ok(router)
}
