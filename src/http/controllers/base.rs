use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::ValidationErrors;

#[derive(Debug, Serialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorBody {
    pub success: bool,
    pub errors: ValidationErrors,
}

/// Response shaping shared by every resource controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseController;

impl BaseController {
    pub fn success<T: Serialize>(&self, data: T) -> Response {
        (StatusCode::OK, Json(SuccessBody { success: true, data })).into_response()
    }

    pub fn error(&self, status: StatusCode, message: impl Into<String>) -> Response {
        (status, Json(ErrorBody::new(message))).into_response()
    }

    pub fn validation_error(&self, errors: ValidationErrors) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationErrorBody {
                success: false,
                errors,
            }),
        )
            .into_response()
    }

    pub fn not_found(&self, message: Option<&str>) -> Response {
        self.error(StatusCode::NOT_FOUND, message.unwrap_or("Resource not found"))
    }

    pub fn unauthorized(&self, message: Option<&str>) -> Response {
        self.error(StatusCode::UNAUTHORIZED, message.unwrap_or("Unauthorized"))
    }

    pub fn forbidden(&self, message: Option<&str>) -> Response {
        self.error(StatusCode::FORBIDDEN, message.unwrap_or("Forbidden"))
    }

    pub fn no_content(&self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_json(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope() {
        let res = BaseController.success(json!({"id": 1}));
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"success": true, "data": {"id": 1}}));
    }

    #[tokio::test]
    async fn error_envelope_keeps_status() {
        let res = BaseController.error(StatusCode::BAD_REQUEST, "Invalid user ID");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res).await,
            json!({"success": false, "error": "Invalid user ID"})
        );
    }

    #[tokio::test]
    async fn validation_envelope() {
        let mut errors = ValidationErrors::new();
        errors.insert("email", "Email is required");
        let res = BaseController.validation_error(errors);
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(res).await,
            json!({"success": false, "errors": {"email": "Email is required"}})
        );
    }

    #[tokio::test]
    async fn convenience_wrappers_fill_default_messages() {
        let cases = [
            (BaseController.not_found(None), StatusCode::NOT_FOUND, "Resource not found"),
            (BaseController.unauthorized(None), StatusCode::UNAUTHORIZED, "Unauthorized"),
            (BaseController.forbidden(None), StatusCode::FORBIDDEN, "Forbidden"),
            (
                BaseController.not_found(Some("User not found")),
                StatusCode::NOT_FOUND,
                "User not found",
            ),
        ];
        for (res, status, message) in cases {
            assert_eq!(res.status(), status);
            assert_eq!(body_json(res).await["error"], message);
        }
    }

    #[tokio::test]
    async fn no_content_has_empty_body() {
        let res = BaseController.no_content();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
