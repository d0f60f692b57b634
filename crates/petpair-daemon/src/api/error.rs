use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::messages::ErrorResponse;
use crate::service::ServiceError;

/// Failure of one HTTP request, rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    Malformed(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(err) => match err {
                ServiceError::InvalidRequest(_)
                | ServiceError::UnknownAction(_)
                | ServiceError::UnknownSpecies(_) => StatusCode::BAD_REQUEST,
                ServiceError::CoupleNotFound(_) | ServiceError::PetNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                ServiceError::PetAlreadyExists(_) | ServiceError::ActionNotAllowed { .. } => {
                    StatusCode::CONFLICT
                }
                ServiceError::ConfigIntegrity(_) | ServiceError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Service(err) if err.is_internal() => {
                error!(?err, "Request failed");
                "internal server error".to_string()
            }
            ApiError::Service(err) => {
                warn!(%err, "Request rejected");
                err.to_string()
            }
            ApiError::Malformed(reason) => {
                warn!(%reason, "Malformed request");
                reason.clone()
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}
