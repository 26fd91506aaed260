use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;

use crate::{config::AppConfig, db::Database, http::router, state::AppState};

/// Wired application: config, database and controllers, ready to serve.
pub struct Application {
    state: AppState,
}

impl Application {
    /// Connects the database and applies pending migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = Database::connect(&config.database, &config.root).await?;

        if let Err(e) = db.migrate().await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self::from_parts(Arc::new(config), db))
    }

    pub fn from_parts(config: Arc<AppConfig>, db: Database) -> Self {
        Self {
            state: AppState::new(config, db),
        }
    }

    pub fn router(&self) -> Router {
        router::build(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.state.config.addr();
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("bind {addr}"))?;
        tracing::info!(env = %self.state.config.env, "listening on {}", listener.local_addr()?);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}
