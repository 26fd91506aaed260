use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Response, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use super::base::BaseController;
use crate::{
    auth::AuthTokens,
    db::{is_unique_violation, Database},
    models::{
        user::{is_valid_email, null_as_empty},
        User, UserParams,
    },
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginParams {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

impl LoginParams {
    fn is_well_formed(&self) -> bool {
        is_valid_email(&self.email) && !self.password.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionPayload {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub message: &'static str,
}

/// Login, registration and logout.
#[derive(Clone)]
pub struct AuthController {
    base: BaseController,
    db: Database,
    tokens: AuthTokens,
}

impl AuthController {
    pub fn new(base: BaseController, db: Database, tokens: AuthTokens) -> Self {
        Self { base, db, tokens }
    }

    #[instrument(skip(self, payload))]
    pub async fn login(&self, payload: Result<Json<LoginParams>, JsonRejection>) -> Response {
        let params = match payload {
            Ok(Json(p)) if p.is_well_formed() => p,
            _ => return self.base.error(StatusCode::BAD_REQUEST, "Invalid login data"),
        };

        let user = match self.db.find_by::<User>("email", &params.email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(email = %params.email, "login unknown email");
                return self.base.unauthorized(Some(INVALID_CREDENTIALS));
            }
            Err(e) => {
                error!(error = %e, "find user by email failed");
                return self
                    .base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log in");
            }
        };

        if !user.check_password(&params.password) {
            warn!(user_id = user.id, "login invalid password");
            return self.base.unauthorized(Some(INVALID_CREDENTIALS));
        }

        info!(user_id = user.id, "user logged in");
        self.session(user)
    }

    #[instrument(skip(self, payload))]
    pub async fn register(&self, payload: Result<Json<UserParams>, JsonRejection>) -> Response {
        let Ok(Json(params)) = payload else {
            return self
                .base
                .error(StatusCode::BAD_REQUEST, "Invalid registration data");
        };

        let errors = params.validate();
        if !errors.is_empty() {
            return self.base.validation_error(errors);
        }

        match self.db.find_by::<User>("email", &params.email).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                warn!(email = %params.email, "email already registered");
                return self
                    .base
                    .error(StatusCode::UNPROCESSABLE_ENTITY, "Email already exists");
            }
            Err(e) => {
                error!(error = %e, "email uniqueness check failed");
                return self
                    .base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user");
            }
        }

        let user = match User::from_params(params) {
            Ok(u) => u,
            Err(e) => {
                error!(error = %e, "hash_password failed");
                return self
                    .base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password");
            }
        };

        let user = match self.db.create(&user).await {
            Ok(u) => u,
            // lost a race with a concurrent registration of the same email
            Err(e) if is_unique_violation(&e) => {
                warn!(error = %e, "email already registered");
                return self
                    .base
                    .error(StatusCode::UNPROCESSABLE_ENTITY, "Email already exists");
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                return self
                    .base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user");
            }
        };

        info!(user_id = user.id, "user registered");
        self.session(user)
    }

    /// Stateless: issued tokens stay valid until they expire.
    pub async fn logout(&self) -> Response {
        self.base.success(MessagePayload {
            message: "Successfully logged out",
        })
    }

    fn session(&self, user: User) -> Response {
        match self.tokens.issue(&user) {
            Ok(token) => self.base.success(SessionPayload { token, user }),
            Err(e) => {
                error!(error = %e, user_id = user.id, "token signing failed");
                self.base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate token")
            }
        }
    }
}
