//! The forum route table.
//!
//! | Method | Path              | Auth | Body                 | Params         |
//! |--------|-------------------|------|----------------------|----------------|
//! | GET    | `/foo`            |      |                      |                |
//! | POST   | `/hello`          |      | `Hello`              |                |
//! | POST   | `/register`       |      | `User`               |                |
//! | POST   | `/login`          |      | `LoginRequest`       |                |
//! | GET    | `/me`             | yes  |                      |                |
//! | GET    | `/users/:userId`  |      |                      | `GetUserRequest` |
//! | GET    | `/posts`          |      |                      |                |
//! | POST   | `/posts`          | yes  | `PostContentRequest` |                |
//! | PATCH  | `/posts/:postId`  | yes  | `PostContentRequest` | `PostRequest`  |
//! | DELETE | `/posts/:postId`  | yes  |                      | `PostRequest`  |

use serde_json::json;
use std::future::Future;
use std::sync::Arc;

use super::models::{
    FORUM_POST, GET_USER_REQUEST, GetUserRequest, HELLO, Hello, LOGIN_REQUEST, LoginRequest,
    POST_CONTENT_REQUEST, POST_REQUEST, PostContentRequest, PostRequest, USER, User,
};
use super::service::ForumService;
use super::store::{PostRepository, UserRepository};
use crate::error::RequestPart;
use crate::routing::{Handler, HandlerResult, Reply, RequestContext, Route, require};
use crate::schema::Visibility;
use crate::validation::ModelInstance;

type Service<U, P> = Arc<ForumService<U, P>>;

/// Builds every forum route against `service`.
pub fn routes<U, P>(service: Service<U, P>) -> Vec<Route>
where
    U: UserRepository + 'static,
    P: PostRepository + 'static,
{
    vec![
        Route::get("foo").to(foo),
        Route::post("hello").body(HELLO).to(hello),
        Route::post("register")
            .body(USER)
            .to(bind(&service, register::<U, P>)),
        Route::post("login")
            .body(LOGIN_REQUEST)
            .to(bind(&service, login::<U, P>)),
        Route::get("me").auth().to(me),
        Route::get("users")
            .path("/users/:userId")
            .params(GET_USER_REQUEST)
            .to(bind(&service, user::<U, P>)),
        Route::get("posts").to(bind(&service, posts::<U, P>)),
        Route::post("createPost")
            .path("/posts")
            .auth()
            .body(POST_CONTENT_REQUEST)
            .to(bind(&service, create_post::<U, P>)),
        Route::patch("patchPost")
            .path("/posts/:postId")
            .auth()
            .body(POST_CONTENT_REQUEST)
            .params(POST_REQUEST)
            .to(bind(&service, patch_post::<U, P>)),
        Route::delete("deletePost")
            .path("/posts/:postId")
            .auth()
            .params(POST_REQUEST)
            .to(bind(&service, delete_post::<U, P>)),
    ]
}

/// Turns a handler that also takes shared state into a plain [`Handler`].
fn bind<S, F, Fut>(state: &Arc<S>, f: F) -> impl Handler + 'static
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, RequestContext, Option<ModelInstance>, Option<ModelInstance>) -> Fut
        + Send
        + Sync
        + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let state = state.clone();
    move |ctx: RequestContext, body: Option<ModelInstance>, params: Option<ModelInstance>| {
        f(state.clone(), ctx, body, params)
    }
}

async fn foo(
    _ctx: RequestContext,
    _body: Option<ModelInstance>,
    _params: Option<ModelInstance>,
) -> HandlerResult {
    Ok(Reply::plain(json!({ "msg": "bar" })))
}

async fn hello(
    _ctx: RequestContext,
    body: Option<ModelInstance>,
    _params: Option<ModelInstance>,
) -> HandlerResult {
    let hello: Hello = require(body, RequestPart::Body)?.parse()?;

    let msg = if hello.msg.as_deref() == Some("world") {
        "ok"
    } else {
        "error"
    };

    Ok(Reply::plain(json!({ "msg": msg })))
}

async fn register<U: UserRepository, P: PostRepository>(
    service: Service<U, P>,
    _ctx: RequestContext,
    body: Option<ModelInstance>,
    _params: Option<ModelInstance>,
) -> HandlerResult {
    let user: User = require(body, RequestPart::Body)?.parse()?;
    let token = service.register(user).await?;

    Ok(Reply::plain(json!({ "accessToken": token })))
}

async fn login<U: UserRepository, P: PostRepository>(
    service: Service<U, P>,
    _ctx: RequestContext,
    body: Option<ModelInstance>,
    _params: Option<ModelInstance>,
) -> HandlerResult {
    let request: LoginRequest = require(body, RequestPart::Body)?.parse()?;
    let token = service.login(&request.email, &request.password).await?;

    Ok(Reply::plain(json!({ "accessToken": token })))
}

async fn me(
    ctx: RequestContext,
    _body: Option<ModelInstance>,
    _params: Option<ModelInstance>,
) -> HandlerResult {
    Reply::model(&ctx.caller()?.profile, USER, Visibility::Private)
}

async fn user<U: UserRepository, P: PostRepository>(
    service: Service<U, P>,
    _ctx: RequestContext,
    _body: Option<ModelInstance>,
    params: Option<ModelInstance>,
) -> HandlerResult {
    let request: GetUserRequest = require(params, RequestPart::Params)?.parse()?;
    let user = service.user(&request.user_id).await?;

    Reply::model(&user, USER, Visibility::Public)
}

async fn posts<U: UserRepository, P: PostRepository>(
    service: Service<U, P>,
    _ctx: RequestContext,
    _body: Option<ModelInstance>,
    _params: Option<ModelInstance>,
) -> HandlerResult {
    let posts = service.posts().await?;

    Reply::model(&posts, FORUM_POST, Visibility::Public)
}

async fn create_post<U: UserRepository, P: PostRepository>(
    service: Service<U, P>,
    ctx: RequestContext,
    body: Option<ModelInstance>,
    _params: Option<ModelInstance>,
) -> HandlerResult {
    let author: User = serde_json::from_value(ctx.caller()?.profile.clone())?;
    let request: PostContentRequest = require(body, RequestPart::Body)?.parse()?;
    let post = service.create_post(author, request.content).await?;

    Reply::model(&post, FORUM_POST, Visibility::Public)
}

async fn patch_post<U: UserRepository, P: PostRepository>(
    service: Service<U, P>,
    ctx: RequestContext,
    body: Option<ModelInstance>,
    params: Option<ModelInstance>,
) -> HandlerResult {
    let caller = &ctx.caller()?.subject;
    let request: PostRequest = require(params, RequestPart::Params)?.parse()?;
    let content: PostContentRequest = require(body, RequestPart::Body)?.parse()?;
    let post = service
        .update_post(caller, &request.post_id, content.content)
        .await?;

    Reply::model(&post, FORUM_POST, Visibility::Public)
}

async fn delete_post<U: UserRepository, P: PostRepository>(
    service: Service<U, P>,
    ctx: RequestContext,
    _body: Option<ModelInstance>,
    params: Option<ModelInstance>,
) -> HandlerResult {
    let caller = &ctx.caller()?.subject;
    let request: PostRequest = require(params, RequestPart::Params)?.parse()?;
    let post = service.delete_post(caller, &request.post_id).await?;

    Ok(Reply::plain(json!({
        "message": format!("Post (ID: {}) deleted", post.post_id)
    })))
}
