use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Response,
    Json,
};
use tracing::{error, info, instrument, warn};

use super::base::BaseController;
use crate::{
    db::Database,
    models::{User, UserParams, UserPatch},
};

/// CRUD over `User` records.
#[derive(Clone, Debug)]
pub struct UsersController {
    base: BaseController,
    db: Database,
}

impl UsersController {
    pub fn new(base: BaseController, db: Database) -> Self {
        Self { base, db }
    }

    #[instrument(skip(self))]
    pub async fn index(&self) -> Response {
        match self.db.all::<User>().await {
            Ok(users) => self.base.success(users),
            Err(e) => {
                error!(error = %e, "list users failed");
                self.base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch users")
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn show(&self, raw_id: &str) -> Response {
        match self.resolve(raw_id).await {
            Ok(user) => self.base.success(user),
            Err(res) => res,
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: Result<Json<UserParams>, JsonRejection>) -> Response {
        let params = match payload {
            Ok(Json(p)) => p,
            Err(e) => {
                warn!(error = %e, "create user: bad body");
                return self.base.error(StatusCode::BAD_REQUEST, "Invalid request data");
            }
        };

        let errors = params.validate();
        if !errors.is_empty() {
            return self.base.validation_error(errors);
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

        match self.db.create(&user).await {
            Ok(created) => {
                info!(user_id = created.id, "user created");
                self.base.success(created)
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                self.base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
            }
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn update(
        &self,
        raw_id: &str,
        payload: Result<Json<UserPatch>, JsonRejection>,
    ) -> Response {
        let mut user = match self.resolve(raw_id).await {
            Ok(u) => u,
            Err(res) => return res,
        };

        let Ok(Json(patch)) = payload else {
            return self.base.error(StatusCode::BAD_REQUEST, "Invalid request data");
        };
        patch.apply(&mut user);

        match self.db.save(&user).await {
            Ok(saved) => self.base.success(saved),
            Err(e) => {
                error!(error = %e, user_id = user.id, "update user failed");
                self.base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update user")
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn destroy(&self, raw_id: &str) -> Response {
        let user = match self.resolve(raw_id).await {
            Ok(u) => u,
            Err(res) => return res,
        };

        match self.db.delete(&user).await {
            Ok(_) => {
                info!(user_id = user.id, "user deleted");
                self.base.no_content()
            }
            Err(e) => {
                error!(error = %e, user_id = user.id, "delete user failed");
                self.base
                    .error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete user")
            }
        }
    }

    /// Parses the path id and loads the record, or yields the 400/404 response.
    async fn resolve(&self, raw_id: &str) -> Result<User, Response> {
        let id: i64 = raw_id
            .parse()
            .map_err(|_| self.base.error(StatusCode::BAD_REQUEST, "Invalid user ID"))?;

        match self.db.find::<User>(id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(self.base.not_found(Some("User not found"))),
            Err(e) => {
                error!(error = %e, id, "find user failed");
                Err(self.base.not_found(Some("User not found")))
            }
        }
    }
}
