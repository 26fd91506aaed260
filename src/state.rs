use std::sync::Arc;

use crate::{
    auth::AuthTokens,
    config::AppConfig,
    db::Database,
    http::controllers::{AuthController, BaseController, UsersController},
};

/// Everything a request handler can reach. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UsersController,
    pub auth: AuthController,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: Database) -> Self {
        let base = BaseController;
        let tokens = AuthTokens::from_config(&config.jwt);
        Self {
            users: UsersController::new(base, db.clone()),
            auth: AuthController::new(base, db, tokens),
            config,
        }
    }
}
