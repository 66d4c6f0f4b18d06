//! Declarative routing with schema-validated input and an auth gate.
//!
//! Routes are declared as [`Route`] values naming their verb, path template,
//! auth requirement and body/params models. [`Router`] matches requests
//! against them, validates input through the [`Validator`](crate::validation::Validator),
//! resolves the caller through an [`IdentityResolver`], invokes the handler
//! and serializes the [`Reply`].

pub mod context;
pub mod handler;
pub mod path;
pub mod route;
pub mod router;

pub use context::{Identity, IdentityResolver, RequestContext, Unauthenticated};
#[cfg(test)]
pub use context::MockIdentityResolver;
pub use handler::{Handler, HandlerError, HandlerResult, Reply, require};
pub use path::{PathTemplate, TemplateError};
pub use route::{Route, RouteBuilder};
pub use router::{BuildError, RouteRequest, RouteResponse, Router};
