//! Checks and coerces untrusted input against registered model schemas.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

use super::failure::{FailureReason, ValidateError, ValidationFailure};
use super::instance::ModelInstance;
use crate::error::SchemaError;
use crate::schema::{FieldDecl, FieldKind, ModelId, SchemaRegistry};

/// Validates raw JSON input against a model schema.
///
/// Fields are checked in declared order. For each validated field:
///
/// 1. absent (missing or `null`) and required → `missing-required`
/// 2. absent and optional → skipped
/// 3. the value is coerced to the field kind (numeric strings to numbers,
///    `"true"`/`"false"` to booleans, timestamps to canonical RFC 3339)
/// 4. a format pattern must match the string → otherwise `format-mismatch`
/// 5. a sign constraint must hold for the number → otherwise `sign-mismatch`
/// 6. nested models and lists of models are validated recursively
///
/// A value that cannot be coerced reports the field's constraint reason when
/// it has one, `type-mismatch` otherwise. Undeclared input keys are dropped.
/// Unvalidated fields are copied verbatim.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<SchemaRegistry>,
}

impl Validator {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Validates `raw`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// - [`ValidateError::Invalid`] with the first violation found
    /// - [`ValidateError::Schema`] if `model` (or a nested item type) is unknown
    pub fn validate(&self, model: ModelId, raw: &Value) -> Result<ModelInstance, ValidateError> {
        let mut walk = Walk::new(&self.registry, Policy::FailFast);

        match walk.object(model, raw, "") {
            Ok(fields) if walk.failures.is_empty() => Ok(ModelInstance::new(model, fields)),
            Ok(_) | Err(Halt::Invalid) => Err(ValidateError::Invalid(walk.into_first())),
            Err(Halt::Schema(e)) => Err(e.into()),
        }
    }

    /// Validates `raw`, collecting every failure instead of stopping at the first.
    ///
    /// # Errors
    ///
    /// - [`ValidateError::InvalidMany`] with all violations in encounter order
    /// - [`ValidateError::Schema`] if `model` (or a nested item type) is unknown
    pub fn validate_all(
        &self,
        model: ModelId,
        raw: &Value,
    ) -> Result<ModelInstance, ValidateError> {
        let mut walk = Walk::new(&self.registry, Policy::Accumulate);

        match walk.object(model, raw, "") {
            Ok(fields) if walk.failures.is_empty() => Ok(ModelInstance::new(model, fields)),
            Ok(_) | Err(Halt::Invalid) => Err(ValidateError::InvalidMany(walk.failures)),
            Err(Halt::Schema(e)) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    FailFast,
    Accumulate,
}

enum Halt {
    Invalid,
    Schema(SchemaError),
}

impl From<SchemaError> for Halt {
    fn from(e: SchemaError) -> Self {
        Halt::Schema(e)
    }
}

struct Walk<'a> {
    registry: &'a SchemaRegistry,
    policy: Policy,
    failures: Vec<ValidationFailure>,
}

impl<'a> Walk<'a> {
    fn new(registry: &'a SchemaRegistry, policy: Policy) -> Self {
        Self {
            registry,
            policy,
            failures: Vec::new(),
        }
    }

    fn into_first(self) -> ValidationFailure {
        self.failures.into_iter().next().unwrap_or_else(|| {
            ValidationFailure::new(ValidationFailure::ROOT, FailureReason::TypeMismatch)
        })
    }

    fn reject(&mut self, path: &str, reason: FailureReason) -> Result<(), Halt> {
        let field = if path.is_empty() {
            ValidationFailure::ROOT
        } else {
            path
        };
        self.failures.push(ValidationFailure::new(field, reason));

        match self.policy {
            Policy::FailFast => Err(Halt::Invalid),
            Policy::Accumulate => Ok(()),
        }
    }

    fn object(
        &mut self,
        model: ModelId,
        raw: &Value,
        path: &str,
    ) -> Result<Map<String, Value>, Halt> {
        let schema = self.registry.lookup(model)?;

        let Some(input) = raw.as_object() else {
            self.reject(path, FailureReason::TypeMismatch)?;
            return Ok(Map::new());
        };

        let mut out = Map::new();

        for decl in schema.fields() {
            let field_path = join(path, decl.name());
            let value = input.get(decl.name()).filter(|v| !v.is_null());

            let Some(value) = value else {
                if decl.is_validated() && !decl.is_optional() {
                    self.reject(&field_path, FailureReason::MissingRequired)?;
                }
                continue;
            };

            if !decl.is_validated() {
                out.insert(decl.name().to_string(), value.clone());
                continue;
            }

            if let Some(checked) = self.field(decl, value, &field_path)? {
                out.insert(decl.name().to_string(), checked);
            }
        }

        Ok(out)
    }

    fn field(
        &mut self,
        decl: &FieldDecl,
        value: &Value,
        path: &str,
    ) -> Result<Option<Value>, Halt> {
        match decl.kind() {
            FieldKind::String => {
                let Some(s) = value.as_str() else {
                    let reason = if decl.format_pattern().is_some() {
                        FailureReason::FormatMismatch
                    } else {
                        FailureReason::TypeMismatch
                    };
                    self.reject(path, reason)?;
                    return Ok(None);
                };

                if let Some(pattern) = decl.format_pattern()
                    && !pattern.is_match(s)
                {
                    self.reject(path, FailureReason::FormatMismatch)?;
                    return Ok(None);
                }

                Ok(Some(value.clone()))
            }
            FieldKind::Number => {
                let Some(n) = coerce_number(value) else {
                    let reason = if decl.number_sign().is_some() {
                        FailureReason::SignMismatch
                    } else {
                        FailureReason::TypeMismatch
                    };
                    self.reject(path, reason)?;
                    return Ok(None);
                };

                if let Some(sign) = decl.number_sign()
                    && !n.as_f64().is_some_and(|x| sign.accepts(x))
                {
                    self.reject(path, FailureReason::SignMismatch)?;
                    return Ok(None);
                }

                Ok(Some(Value::Number(n)))
            }
            FieldKind::Boolean => match coerce_bool(value) {
                Some(b) => Ok(Some(Value::Bool(b))),
                None => {
                    self.reject(path, FailureReason::TypeMismatch)?;
                    Ok(None)
                }
            },
            FieldKind::DateTime => match coerce_datetime(value) {
                Some(ts) => Ok(Some(Value::String(ts))),
                None => {
                    self.reject(path, FailureReason::TypeMismatch)?;
                    Ok(None)
                }
            },
            FieldKind::Any => Ok(Some(value.clone())),
            FieldKind::Model(item) => {
                let nested = self.object(item, value, path)?;
                Ok(Some(Value::Object(nested)))
            }
            FieldKind::List(item) => {
                let Some(elements) = value.as_array() else {
                    self.reject(path, FailureReason::TypeMismatch)?;
                    return Ok(None);
                };

                let mut out = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    let element_path = format!("{path}.{i}");
                    out.push(Value::Object(self.object(item, element, &element_path)?));
                }
                Ok(Some(Value::Array(out)))
            }
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Accepts JSON numbers and strings holding a finite decimal number.
fn coerce_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(Number::from(i));
            }
            s.parse::<f64>().ok().and_then(Number::from_f64)
        }
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parses an RFC 3339 timestamp and re-emits it in UTC.
fn coerce_datetime(value: &Value) -> Option<String> {
    let s = value.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(s).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
    )
}
