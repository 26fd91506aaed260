use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::services::{ServeDir, ServeFile};

use super::middleware;
use crate::{
    http::controllers::auth::LoginParams,
    models::{UserParams, UserPatch},
    state::AppState,
};

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
    pub version: &'static str,
}

/// Full application router with the global middleware chain applied.
pub fn build(state: AppState) -> Router {
    let public = state.config.public_dir();

    let router = Router::new()
        .route("/", get(welcome))
        .nest(API_PREFIX, api_routes())
        .nest_service("/assets", ServeDir::new(public.join("assets")))
        .route_service("/favicon.ico", ServeFile::new(public.join("favicon.ico")))
        .with_state(state);

    middleware::stack(router)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users_index).post(users_create))
        .route(
            "/users/:id",
            get(users_show).put(users_update).delete(users_destroy),
        )
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
}

async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to Railyard!",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn users_index(State(state): State<AppState>) -> Response {
    state.users.index().await
}

async fn users_show(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.users.show(&id).await
}

async fn users_create(
    State(state): State<AppState>,
    payload: Result<Json<UserParams>, JsonRejection>,
) -> Response {
    state.users.create(payload).await
}

async fn users_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Response {
    state.users.update(&id, payload).await
}

async fn users_destroy(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.users.destroy(&id).await
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginParams>, JsonRejection>,
) -> Response {
    state.auth.login(payload).await
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserParams>, JsonRejection>,
) -> Response {
    state.auth.register(payload).await
}

async fn logout(State(state): State<AppState>) -> Response {
    state.auth.logout().await
}
