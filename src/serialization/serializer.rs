//! Serializes model instances to plain output filtered by visibility tier.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use super::view::View;
use crate::error::SchemaError;
use crate::schema::{FieldKind, ModelId, SchemaRegistry};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The instance does not have the shape its model declares.
    #[error("expected {expected} for model '{model}' at '{path}'")]
    ShapeMismatch {
        model: ModelId,
        path: String,
        expected: &'static str,
    },

    #[error("failed to encode instance: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Builds output views of model instances.
///
/// For each declared field whose tier is visible at the requested level the
/// field's value is copied, recursing into nested models and lists of models
/// with the nested model's own declarations. Undeclared instance keys never
/// reach the output. Sequences keep their input order.
#[derive(Debug, Clone)]
pub struct Serializer {
    registry: Arc<SchemaRegistry>,
}

impl Serializer {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Serializes an instance or a sequence of instances of `model`.
    ///
    /// `null` serializes to `null`.
    ///
    /// # Errors
    ///
    /// - [`SerializeError::Schema`] if `model` or a nested item type is unknown
    /// - [`SerializeError::ShapeMismatch`] if an instance is not an object or a
    ///   list field does not hold an array
    pub fn serialize(
        &self,
        instance: &Value,
        model: ModelId,
        view: &View,
    ) -> Result<Value, SerializeError> {
        self.value(instance, model, view, "")
    }

    /// Serializes any `Serialize` value as an instance (or sequence) of `model`.
    ///
    /// # Errors
    ///
    /// Same as [`Serializer::serialize`], plus [`SerializeError::Encode`] if
    /// the value cannot be represented as JSON.
    pub fn serialize_as<T: Serialize + ?Sized>(
        &self,
        instance: &T,
        model: ModelId,
        view: &View,
    ) -> Result<Value, SerializeError> {
        let value = serde_json::to_value(instance)?;
        self.serialize(&value, model, view)
    }

    fn value(
        &self,
        instance: &Value,
        model: ModelId,
        view: &View,
        path: &str,
    ) -> Result<Value, SerializeError> {
        match instance {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.value(item, model, view, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(fields) => self.object(fields, model, view, path).map(Value::Object),
            _ => Err(SerializeError::ShapeMismatch {
                model,
                path: display_path(path),
                expected: "object",
            }),
        }
    }

    fn object(
        &self,
        fields: &Map<String, Value>,
        model: ModelId,
        view: &View,
        path: &str,
    ) -> Result<Map<String, Value>, SerializeError> {
        let schema = self.registry.lookup(model)?;
        let mut out = Map::new();

        for decl in schema.fields() {
            if !decl.tier().visible_at(view.level()) {
                continue;
            }

            let Some(value) = fields.get(decl.name()) else {
                continue;
            };

            let field_path = if path.is_empty() {
                decl.name().to_string()
            } else {
                format!("{path}.{}", decl.name())
            };

            let rendered = match decl.kind() {
                FieldKind::Model(item) => {
                    self.value(value, item, &view.child(decl.name()), &field_path)?
                }
                FieldKind::List(item) => {
                    if !(value.is_array() || value.is_null()) {
                        return Err(SerializeError::ShapeMismatch {
                            model,
                            path: field_path,
                            expected: "array",
                        });
                    }
                    self.value(value, item, &view.child(decl.name()), &field_path)?
                }
                _ => value.clone(),
            };

            out.insert(decl.name().to_string(), rendered);
        }

        Ok(out)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.to_string()
    }
}
