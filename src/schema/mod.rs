//! Schema registry: per-field validation and visibility metadata for data models.
//!
//! Models are declared once at startup as explicit tables of [`FieldDecl`]s and
//! registered under a [`ModelId`]. The [`SchemaRegistry`] is then shared by the
//! validator, the serializer and the router.
//!
//! ```rust,ignore
//! registry.register(ACCOUNT, vec![
//!     FieldDecl::string("email").format(&EMAIL_REGEX),
//!     FieldDecl::string("secret").internal(),
//! ])?;
//! ```

pub mod field;
pub mod registry;

pub use field::{Constraint, FieldDecl, FieldKind, ModelId, NumberSign, Visibility};
pub use registry::{ModelSchema, SchemaRegistry};
