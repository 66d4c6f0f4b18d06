//! Bearer token to forum user.

use async_trait::async_trait;
use std::sync::Arc;

use super::store::UserRepository;
use crate::auth::{TokenError, TokenService};
use crate::routing::{Identity, IdentityResolver, Unauthenticated};

/// Verifies an access token and loads the user named by its subject.
///
/// The attached [`Identity::profile`] is the stored user record, so a token
/// for a user that no longer exists does not authenticate.
pub struct TokenIdentityResolver<U: UserRepository> {
    tokens: TokenService,
    users: Arc<U>,
}

impl<U: UserRepository> TokenIdentityResolver<U> {
    pub fn new(tokens: TokenService, users: Arc<U>) -> Self {
        Self { tokens, users }
    }
}

#[async_trait]
impl<U: UserRepository> IdentityResolver for TokenIdentityResolver<U> {
    async fn resolve(&self, credential: &str) -> Result<Identity, Unauthenticated> {
        let claims = self.tokens.verify(credential).map_err(|e| match e {
            TokenError::Expired => Unauthenticated("Token has expired".to_string()),
            other => {
                tracing::debug!(error = %other, "Token verification failed");
                Unauthenticated("Invalid token".to_string())
            }
        })?;

        let user = match self.users.find(&claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(Unauthenticated("Unknown user".to_string())),
            Err(e) => {
                tracing::error!(error = ?e, "User lookup failed during authentication");
                return Err(Unauthenticated("Unable to verify credentials".to_string()));
            }
        };

        let profile = serde_json::to_value(&user).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode user profile");
            Unauthenticated("Unable to verify credentials".to_string())
        })?;

        Ok(Identity::new(claims.sub, profile))
    }
}
