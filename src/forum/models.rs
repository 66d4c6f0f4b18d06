//! Forum data models: schema declarations plus their typed counterparts.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::sync::LazyLock;

use crate::error::SchemaError;
use crate::schema::{FieldDecl, ModelId, NumberSign, SchemaRegistry};

pub const USER: ModelId = ModelId::new("User");
pub const HELLO: ModelId = ModelId::new("Hello");
pub const LOGIN_REQUEST: ModelId = ModelId::new("LoginRequest");
pub const GET_USER_REQUEST: ModelId = ModelId::new("GetUserRequest");
pub const POST_REQUEST: ModelId = ModelId::new("PostRequest");
pub const POST_CONTENT_REQUEST: ModelId = ModelId::new("PostContentRequest");
pub const FORUM_POST: ModelId = ModelId::new("ForumPost");

/// Display names: no digits and almost no punctuation.
static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"^[^0-9!"#$%&'()*,\-./:;<>?@\[\\\]^_`{|}~]*$"##).unwrap()
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*@[A-Za-z0-9_.-]+\.[A-Za-z0-9]+$").unwrap()
});

/// Digits, with dashes allowed between them.
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[0-9-]*[0-9]+$").unwrap());

/// Registers every forum model. Nested models are registered before the
/// models that reference them.
///
/// # Errors
///
/// Returns [`SchemaError`] if a model is already registered with different
/// fields.
pub fn register_models(registry: &SchemaRegistry) -> Result<(), SchemaError> {
    registry.register(
        USER,
        vec![
            FieldDecl::string("username").format(&USERNAME_REGEX),
            FieldDecl::string("email").format(&EMAIL_REGEX),
            FieldDecl::string("phone").format(&PHONE_REGEX).private(),
            FieldDecl::string("password").internal(),
            FieldDecl::number("age").sign(NumberSign::Positive).private(),
        ],
    )?;

    registry.register(HELLO, vec![FieldDecl::string("msg").optional()])?;

    registry.register(
        LOGIN_REQUEST,
        vec![FieldDecl::string("email"), FieldDecl::string("password")],
    )?;

    registry.register(GET_USER_REQUEST, vec![FieldDecl::string("userId")])?;
    registry.register(POST_REQUEST, vec![FieldDecl::string("postId")])?;
    registry.register(POST_CONTENT_REQUEST, vec![FieldDecl::string("content")])?;

    registry.register(
        FORUM_POST,
        vec![
            FieldDecl::string("postId"),
            FieldDecl::model("author", USER),
            FieldDecl::string("content"),
            FieldDecl::datetime("createdAt"),
            FieldDecl::datetime("updatedAt"),
        ],
    )?;

    Ok(())
}

/// A registered forum member. `password` holds the salted hash once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub age: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPost {
    pub post_id: String,
    pub author: User,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub post_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostContentRequest {
    pub content: String,
}
