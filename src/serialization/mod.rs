//! Visibility-filtered output views of model instances.

pub mod serializer;
pub mod view;

pub use serializer::{SerializeError, Serializer};
pub use view::View;
