//! Process-wide table of model schemas.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use super::field::{FieldDecl, ModelId};
use crate::error::SchemaError;

/// Ordered field declarations for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    id: ModelId,
    fields: Vec<FieldDecl>,
}

impl ModelSchema {
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Field declarations in declared order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

/// Append-only registry of model schemas.
///
/// Populated at startup, read by the validator, serializer and router for the
/// rest of the process lifetime. Registration takes a write lock so models can
/// be declared from several threads; lookups only take the read lock and hand
/// out shared [`Arc<ModelSchema>`] snapshots.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    models: RwLock<HashMap<ModelId, Arc<ModelSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the field declarations of a model.
    ///
    /// Re-registering identical declarations is a no-op and returns the
    /// existing schema.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::Conflict`] if `id` is already registered with different fields
    /// - [`SchemaError::DuplicateField`] if two declarations share a name
    /// - [`SchemaError::InvalidConstraint`] if a format pattern sits on a non-string
    ///   field, a sign constraint on a non-number field, or a field asks for both
    /// - [`SchemaError::UnknownModel`] if a nested item type is neither registered
    ///   nor the model itself
    pub fn register(
        &self,
        id: ModelId,
        fields: Vec<FieldDecl>,
    ) -> Result<Arc<ModelSchema>, SchemaError> {
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = models.get(&id) {
            if existing.fields == fields {
                return Ok(existing.clone());
            }
            return Err(SchemaError::Conflict(id));
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(SchemaError::DuplicateField {
                    model: id,
                    field: field.name().to_string(),
                });
            }

            if !field.constraint_is_valid() {
                return Err(SchemaError::InvalidConstraint {
                    model: id,
                    field: field.name().to_string(),
                });
            }

            if let Some(item) = field.item_type()
                && item != id
                && !models.contains_key(&item)
            {
                return Err(SchemaError::UnknownModel(item));
            }
        }

        let schema = Arc::new(ModelSchema { id, fields });
        models.insert(id, schema.clone());

        tracing::debug!(model = %id, fields = schema.fields.len(), "Model registered");

        Ok(schema)
    }

    /// Looks up a registered model.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownModel`] if `id` was never registered.
    pub fn lookup(&self, id: ModelId) -> Result<Arc<ModelSchema>, SchemaError> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(SchemaError::UnknownModel(id))
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.models.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, NumberSign, Visibility};
    use regex::Regex;

    const ACCOUNT: ModelId = ModelId::new("Account");
    const NODE: ModelId = ModelId::new("Node");

    fn account_fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::string("email").format(&Regex::new(r"^[^@]+@[^@]+$").unwrap()),
            FieldDecl::string("secret").internal(),
        ]
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = SchemaRegistry::new();
        registry.register(ACCOUNT, account_fields()).unwrap();

        let schema = registry.lookup(ACCOUNT).unwrap();
        assert_eq!(schema.id(), ACCOUNT);
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.fields()[0].name(), "email");
        assert_eq!(schema.field("secret").unwrap().tier(), Visibility::Internal);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_register_identical_is_idempotent() {
        let registry = SchemaRegistry::new();
        let first = registry.register(ACCOUNT, account_fields()).unwrap();
        let second = registry.register(ACCOUNT, account_fields()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_different_fields_conflicts() {
        let registry = SchemaRegistry::new();
        registry.register(ACCOUNT, account_fields()).unwrap();

        let result = registry.register(ACCOUNT, vec![FieldDecl::string("email")]);

        assert_eq!(result.unwrap_err(), SchemaError::Conflict(ACCOUNT));
        // The original declaration survives.
        assert_eq!(registry.lookup(ACCOUNT).unwrap().fields().len(), 2);
    }

    #[test]
    fn test_lookup_unknown_model() {
        let registry = SchemaRegistry::new();

        assert!(registry.is_empty());
        assert_eq!(
            registry.lookup(ACCOUNT).unwrap_err(),
            SchemaError::UnknownModel(ACCOUNT)
        );
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let registry = SchemaRegistry::new();

        let result = registry.register(
            ACCOUNT,
            vec![FieldDecl::string("email"), FieldDecl::number("email")],
        );

        assert!(matches!(result, Err(SchemaError::DuplicateField { .. })));
        assert!(!registry.contains(ACCOUNT));
    }

    #[test]
    fn test_constraint_on_wrong_kind_rejected() {
        let registry = SchemaRegistry::new();

        let result = registry.register(
            ACCOUNT,
            vec![FieldDecl::string("age").sign(NumberSign::Positive)],
        );

        assert!(matches!(result, Err(SchemaError::InvalidConstraint { .. })));
    }

    #[test]
    fn test_format_and_sign_on_one_field_rejected() {
        let registry = SchemaRegistry::new();
        let pattern = Regex::new("^[0-9]+$").unwrap();

        let result = registry.register(
            ACCOUNT,
            vec![
                FieldDecl::number("age")
                    .format(&pattern)
                    .sign(NumberSign::Positive),
            ],
        );

        assert_eq!(
            result.unwrap_err(),
            SchemaError::InvalidConstraint {
                model: ACCOUNT,
                field: "age".to_string(),
            }
        );
        assert!(!registry.contains(ACCOUNT));
    }

    #[test]
    fn test_nested_model_must_be_registered_first() {
        let registry = SchemaRegistry::new();

        let result = registry.register(NODE, vec![FieldDecl::model("owner", ACCOUNT)]);
        assert_eq!(result.unwrap_err(), SchemaError::UnknownModel(ACCOUNT));

        registry.register(ACCOUNT, account_fields()).unwrap();
        registry
            .register(NODE, vec![FieldDecl::model("owner", ACCOUNT)])
            .unwrap();
    }

    #[test]
    fn test_self_reference_allowed() {
        let registry = SchemaRegistry::new();

        let schema = registry
            .register(
                NODE,
                vec![FieldDecl::string("label"), FieldDecl::list("children", NODE)],
            )
            .unwrap();

        assert_eq!(schema.fields()[1].kind(), FieldKind::List(NODE));
    }

    #[test]
    fn test_concurrent_registration_of_same_model() {
        let registry = Arc::new(SchemaRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.register(ACCOUNT, account_fields()))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(registry.len(), 1);
    }
}
