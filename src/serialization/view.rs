//! Requested visibility level for a serialization call.

use std::collections::HashMap;

use crate::schema::Visibility;

/// Visibility level requested for a tree of model instances.
///
/// Every nesting level is filtered at the same level as the outer call unless
/// a sub-tree is given its own view with [`View::with`]. A sub-tree view can
/// only narrow: its effective level is the lower of its own and its parent's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    level: Visibility,
    nested: HashMap<String, View>,
}

impl View {
    pub fn new(level: Visibility) -> Self {
        Self {
            level,
            nested: HashMap::new(),
        }
    }

    pub fn public() -> Self {
        Self::new(Visibility::Public)
    }

    pub fn private() -> Self {
        Self::new(Visibility::Private)
    }

    pub fn internal() -> Self {
        Self::new(Visibility::Internal)
    }

    /// Requests `view` for the nested model held by `field`.
    pub fn with(mut self, field: impl Into<String>, view: View) -> Self {
        self.nested.insert(field.into(), view);
        self
    }

    pub fn level(&self) -> Visibility {
        self.level
    }

    /// The effective view for the nested value under `field`.
    pub fn child(&self, field: &str) -> View {
        match self.nested.get(field) {
            Some(requested) => View {
                level: requested.level.min(self.level),
                nested: requested.nested.clone(),
            },
            None => View::new(self.level),
        }
    }
}

impl From<Visibility> for View {
    fn from(level: Visibility) -> Self {
        View::new(level)
    }
}
