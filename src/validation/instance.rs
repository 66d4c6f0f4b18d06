//! Validated model instances.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::schema::ModelId;

/// The result of successfully validating raw input against a model schema.
///
/// Holds only declared fields, with coercions already applied. Handlers
/// usually turn it into a typed struct with [`ModelInstance::parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    model: ModelId,
    fields: Map<String, Value>,
}

impl ModelInstance {
    pub(crate) fn new(model: ModelId, fields: Map<String, Value>) -> Self {
        Self { model, fields }
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Deserializes the instance into a typed value.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if `T` does not fit the validated fields.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        email: String,
        password: String,
    }

    fn instance(value: Value) -> ModelInstance {
        let Value::Object(fields) = value else {
            panic!("expected object");
        };
        ModelInstance::new(ModelId::new("Login"), fields)
    }

    #[test]
    fn test_accessors() {
        let inst = instance(json!({"email": "a@b.com", "password": "pw"}));

        assert_eq!(inst.model(), ModelId::new("Login"));
        assert_eq!(inst.get_str("email"), Some("a@b.com"));
        assert!(inst.get("missing").is_none());
        assert_eq!(inst.fields().len(), 2);
    }

    #[test]
    fn test_parse_typed() {
        let inst = instance(json!({"email": "a@b.com", "password": "pw"}));

        let login: Login = inst.parse().unwrap();
        assert_eq!(
            login,
            Login {
                email: "a@b.com".to_string(),
                password: "pw".to_string()
            }
        );
    }

    #[test]
    fn test_parse_mismatch_is_error() {
        let inst = instance(json!({"email": "a@b.com"}));

        assert!(inst.parse::<Login>().is_err());
    }
}
