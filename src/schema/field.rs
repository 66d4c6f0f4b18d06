//! Field declarations: the per-field metadata a model schema is made of.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable key identifying one declared data shape.
///
/// Model identities are compile-time names, so they are cheap to copy and
/// compare:
///
/// ```rust,ignore
/// pub const USER: ModelId = ModelId::new("User");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(&'static str);

impl ModelId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Visibility tier of a field, totally ordered `Public < Private < Internal`.
///
/// A field tagged `T` appears in output requested at level `L` iff `T <= L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Internal,
}

impl Visibility {
    /// Returns true if a field of this tier is visible at `level`.
    pub fn visible_at(self, level: Visibility) -> bool {
        self <= level
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "internal" => Ok(Visibility::Internal),
            other => Err(format!("unknown visibility tier '{other}'")),
        }
    }
}

/// Required sign of a numeric field. `Positive` accepts `>= 0`, `Negative` accepts `<= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberSign {
    Positive,
    Negative,
}

impl NumberSign {
    pub fn accepts(self, n: f64) -> bool {
        match self {
            NumberSign::Positive => n >= 0.0,
            NumberSign::Negative => n <= 0.0,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            NumberSign::Positive => '+',
            NumberSign::Negative => '-',
        }
    }
}

/// Semantic type of a field.
///
/// `Model` and `List` carry the nested item type; they are the only kinds
/// the validator and serializer recurse into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// RFC 3339 timestamp carried as a JSON string.
    DateTime,
    Any,
    Model(ModelId),
    List(ModelId),
}

impl FieldKind {
    /// Nested model referenced by this kind, if any.
    pub fn item_type(&self) -> Option<ModelId> {
        match self {
            FieldKind::Model(id) | FieldKind::List(id) => Some(*id),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "datetime",
            FieldKind::Any => "any",
            FieldKind::Model(_) => "object",
            FieldKind::List(_) => "array",
        }
    }
}

/// A value constraint. Format patterns and sign constraints exclude each other.
#[derive(Debug, Clone)]
pub enum Constraint {
    Format(Regex),
    Sign(NumberSign),
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constraint::Format(a), Constraint::Format(b)) => a.as_str() == b.as_str(),
            (Constraint::Sign(a), Constraint::Sign(b)) => a == b,
            _ => false,
        }
    }
}

/// Declaration of one field on a model.
///
/// Built with the kind-specific constructors and refined with the chained
/// setters:
///
/// ```rust,ignore
/// FieldDecl::string("phone").format(&PHONE_REGEX).private()
/// FieldDecl::number("age").sign(NumberSign::Positive).private()
/// FieldDecl::model("author", USER)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    name: String,
    kind: FieldKind,
    validated: bool,
    optional: bool,
    constraint: Option<Constraint>,
    /// Set when both a format and a sign were requested.
    conflicting: bool,
    visibility: Visibility,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            validated: true,
            optional: false,
            constraint: None,
            conflicting: false,
            visibility: Visibility::Public,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Any)
    }

    pub fn model(name: impl Into<String>, item: ModelId) -> Self {
        Self::new(name, FieldKind::Model(item))
    }

    pub fn list(name: impl Into<String>, item: ModelId) -> Self {
        Self::new(name, FieldKind::List(item))
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Excludes the field from validation. It is still copied and serialized.
    pub fn unvalidated(mut self) -> Self {
        self.validated = false;
        self
    }

    /// Adds a format pattern. Combining it with [`FieldDecl::sign`] makes the
    /// declaration invalid at registration.
    pub fn format(mut self, pattern: &Regex) -> Self {
        self.conflicting |= matches!(self.constraint, Some(Constraint::Sign(_)));
        self.constraint = Some(Constraint::Format(pattern.clone()));
        self
    }

    pub fn sign(mut self, sign: NumberSign) -> Self {
        self.conflicting |= matches!(self.constraint, Some(Constraint::Format(_)));
        self.constraint = Some(Constraint::Sign(sign));
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    pub fn internal(self) -> Self {
        self.visibility(Visibility::Internal)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn format_pattern(&self) -> Option<&Regex> {
        match &self.constraint {
            Some(Constraint::Format(re)) => Some(re),
            _ => None,
        }
    }

    pub fn number_sign(&self) -> Option<NumberSign> {
        match self.constraint {
            Some(Constraint::Sign(sign)) => Some(sign),
            _ => None,
        }
    }

    pub fn item_type(&self) -> Option<ModelId> {
        self.kind.item_type()
    }

    pub fn tier(&self) -> Visibility {
        self.visibility
    }

    /// Returns true if at most one kind of constraint was requested and it fits
    /// the field kind.
    pub(crate) fn constraint_is_valid(&self) -> bool {
        if self.conflicting {
            return false;
        }

        match (&self.constraint, self.kind) {
            (None, _) => true,
            (Some(Constraint::Format(_)), FieldKind::String) => true,
            (Some(Constraint::Sign(_)), FieldKind::Number) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_ordering() {
        assert!(Visibility::Public < Visibility::Private);
        assert!(Visibility::Private < Visibility::Internal);

        assert!(Visibility::Public.visible_at(Visibility::Public));
        assert!(Visibility::Public.visible_at(Visibility::Internal));
        assert!(!Visibility::Internal.visible_at(Visibility::Private));
        assert!(!Visibility::Private.visible_at(Visibility::Public));
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("private".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("secret".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_number_sign_accepts_zero_both_ways() {
        assert!(NumberSign::Positive.accepts(0.0));
        assert!(NumberSign::Negative.accepts(0.0));
        assert!(!NumberSign::Positive.accepts(-1.0));
        assert!(!NumberSign::Negative.accepts(0.5));
    }

    #[test]
    fn test_builder_defaults() {
        let field = FieldDecl::string("content");

        assert_eq!(field.name(), "content");
        assert!(field.is_validated());
        assert!(!field.is_optional());
        assert_eq!(field.tier(), Visibility::Public);
        assert!(field.constraint().is_none());
        assert!(field.item_type().is_none());
    }

    #[test]
    fn test_format_and_sign_together_are_invalid() {
        let re = Regex::new("^a$").unwrap();

        assert!(!FieldDecl::number("n").format(&re).sign(NumberSign::Negative).constraint_is_valid());
        assert!(!FieldDecl::string("s").sign(NumberSign::Positive).format(&re).constraint_is_valid());
    }

    #[test]
    fn test_repeated_constraint_of_same_kind_replaces() {
        let field = FieldDecl::number("n")
            .sign(NumberSign::Positive)
            .sign(NumberSign::Negative);

        assert!(field.constraint_is_valid());
        assert_eq!(field.number_sign(), Some(NumberSign::Negative));
    }

    #[test]
    fn test_constraint_kind_fit() {
        let re = Regex::new("^a$").unwrap();

        assert!(FieldDecl::string("s").format(&re).constraint_is_valid());
        assert!(FieldDecl::number("n").sign(NumberSign::Positive).constraint_is_valid());
        assert!(!FieldDecl::number("n").format(&re).constraint_is_valid());
        assert!(!FieldDecl::string("s").sign(NumberSign::Positive).constraint_is_valid());
    }

    #[test]
    fn test_declarations_compare_patterns_by_source() {
        let a = FieldDecl::string("email").format(&Regex::new("^.+@.+$").unwrap());
        let b = FieldDecl::string("email").format(&Regex::new("^.+@.+$").unwrap());
        let c = FieldDecl::string("email").format(&Regex::new("^.+$").unwrap());

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
