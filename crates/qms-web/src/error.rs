//! HTTP错误映射

use axum::{http::StatusCode, response::IntoResponse, Json};
use qms_core::QmsError;
use serde_json::json;

/// Web层错误包装，把领域错误映射到HTTP状态码
#[derive(Debug)]
pub struct ApiError(pub QmsError);

/// Web处理器统一结果类型
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<QmsError> for ApiError {
    fn from(err: QmsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match &self.0 {
            QmsError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            QmsError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            QmsError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            QmsError::ClinicClosed(msg) => (StatusCode::CONFLICT, format!("العيادة متوقفة: {}", msg)),
            QmsError::InvalidStateTransition { .. } => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };

        let body = Json(json!({
            "error": true,
            "message": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
