//! File bodies emitted by the generators. Placeholders are `__UPPER__` tokens.

pub const APP_CARGO_TOML: &str = r#"[package]
name = "__APP__"
version = "0.1.0"
edition = "2021"

[dependencies]
railyard = "0.1"
axum = "0.7"
tokio = { version = "1", features = ["full"] }
serde = { version = "1", features = ["derive"] }
serde_json = "1"
sqlx = { version = "0.7", features = ["runtime-tokio-rustls", "sqlite", "time"] }
time = { version = "0.3", features = ["serde"] }
anyhow = "1"
dotenvy = "0.15"
"#;

pub const APP_MAIN_RS: &str = r#"use std::path::Path;

use railyard::{app::Application, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    railyard::logging::init("__CRATE__=debug,railyard=info,tower_http=info");

    let config = AppConfig::load(Path::new("."))?;
    Application::init(config).await?.run().await
}
"#;

pub const APP_CONFIG_YAML: &str = r#"env: development

server:
  host: localhost
  port: 3000

database:
  driver: sqlite3
  database: app.db
"#;

pub const APP_ROUTES_RS: &str = r#"use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Welcome {
    message: &'static str,
}

pub fn routes() -> Router {
    Router::new().route(
        "/",
        get(|| async {
            Json(Welcome {
                message: "Welcome to __APP__!",
            })
        }),
    )
}
"#;

pub const APP_README_MD: &str = r#"# __APP__

A Railyard application.

## Getting Started

1. Create the database:
   ```bash
   railyard db migrate
   ```

2. Run the server:
   ```bash
   railyard server
   ```

3. Visit http://localhost:3000
"#;

pub const APP_GITIGNORE: &str = r#"/target

# Database
*.db
*.sqlite

# Environment variables
.env

# IDE
.vscode/
.idea/
"#;

pub const APPLICATION_CONTROLLER_RS: &str = r#"use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Welcome {
    pub message: &'static str,
}

/// GET /
pub async fn index() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to Railyard!",
    })
}
"#;

pub const CONTROLLER_RS: &str = r#"use axum::{extract::Path, http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Message {
    pub message: String,
}

fn message(text: String) -> Json<Message> {
    Json(Message { message: text })
}

/// GET /__PLURAL__
pub async fn index() -> Json<Message> {
    message("Index __SNAKE__".into())
}

/// GET /__PLURAL__/:id
pub async fn show(Path(id): Path<String>) -> Json<Message> {
    message(format!("Show __SNAKE__ with ID: {id}"))
}

/// POST /__PLURAL__
pub async fn create() -> (StatusCode, Json<Message>) {
    (StatusCode::CREATED, message("Create __SNAKE__".into()))
}

/// PUT /__PLURAL__/:id
pub async fn update(Path(id): Path<String>) -> Json<Message> {
    message(format!("Update __SNAKE__ with ID: {id}"))
}

/// DELETE /__PLURAL__/:id
pub async fn destroy(Path(id): Path<String>) -> Json<Message> {
    message(format!("Destroy __SNAKE__ with ID: {id}"))
}
"#;

pub const MODEL_RS: &str = r#"use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct __PASCAL__ {
    pub id: i64,
__FIELDS__    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl __PASCAL__ {
    pub const TABLE: &'static str = "__TABLE__";
}
"#;

pub const MIGRATION_SQL: &str = r#"-- __SNAKE__
-- Schema change applied by `railyard db migrate`.
"#;
