//! # Forum Gate
//!
//! Schema-driven request handling for a small forum backend, built with Axum.
//!
//! ## Architecture
//!
//! - **Schema** ([`schema`]) - Field declarations and the model registry
//! - **Validation** ([`validation`]) - Untrusted input to validated, coerced instances
//! - **Serialization** ([`serialization`]) - Visibility-filtered output views
//! - **Routing** ([`routing`]) - Route table, auth gate and the dispatch state machine
//! - **Transport** ([`transport`]) - Axum adapter and request tracing
//! - **Auth** ([`auth`]) - Access tokens and password hashes
//! - **Forum** ([`forum`]) - The application: users, login and posts
//!
//! ## Quick Start
//!
//! ```bash
//! export JWT_SECRET="a-long-random-signing-secret"
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod auth;
pub mod config;
pub mod error;
pub mod forum;
pub mod routing;
pub mod schema;
pub mod serialization;
pub mod server;
pub mod transport;
pub mod validation;

pub use error::{DispatchError, SchemaError};

/// Commonly used types for external consumers.
///
/// Re-exports the types needed to declare models and routes and to dispatch
/// requests.
pub mod prelude {
    pub use crate::error::{DispatchError, RequestPart, SchemaError};
    pub use crate::routing::{
        HandlerError, HandlerResult, Identity, IdentityResolver, Reply, RequestContext, Route,
        RouteRequest, RouteResponse, Router, require,
    };
    pub use crate::schema::{FieldDecl, ModelId, NumberSign, SchemaRegistry, Visibility};
    pub use crate::serialization::{Serializer, View};
    pub use crate::validation::{ModelInstance, Validator};
}
