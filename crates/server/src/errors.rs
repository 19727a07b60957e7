use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use golds_core::InterfaceError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

/// JSON error response for the webhook surface.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.user_message(),
            detail: self.0.message().to_owned(),
            correlation_id: self.0.correlation_id().to_owned(),
        };
        (status_code(&self.0), Json(body)).into_response()
    }
}

pub fn status_code(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
