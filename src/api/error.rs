use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::regulation::{CheckInError, RejectReason};
use crate::store::StoreError;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "check-in rejected: {}", _0)]
    Rejected(RejectReason),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Face recognition is temporarily unavailable")]
    BiometricUnavailable,
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn code(&self) -> &str {
        match self {
            ApiError::Rejected(reason) => reason.as_ref(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::BiometricUnavailable => "BIOMETRIC_UNAVAILABLE",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Rejected(reason) => reason.message().to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Rejected(reason) => match reason {
                RejectReason::NoAttendanceDay => StatusCode::CONFLICT,
                RejectReason::TimeSlotMissing => StatusCode::BAD_REQUEST,
                RejectReason::OutOfAttendanceTime => StatusCode::UNPROCESSABLE_ENTITY,
                RejectReason::NoEnrollmentData => StatusCode::PRECONDITION_FAILED,
                RejectReason::IdentityMismatch => StatusCode::FORBIDDEN,
                RejectReason::NoFaceDetected => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BiometricUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "message": self.message(),
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            StoreError::Conflict(detail) => ApiError::Conflict(detail),
            StoreError::Backend(detail) => {
                tracing::error!(error = %detail, "store failure");
                ApiError::Internal
            }
        }
    }
}

impl From<CheckInError> for ApiError {
    fn from(e: CheckInError) -> Self {
        match e {
            CheckInError::Rejected(reason) => ApiError::Rejected(reason),
            CheckInError::Store(e) => e.into(),
            CheckInError::Biometric(e) => {
                tracing::error!(error = %e, "face encoder failure");
                ApiError::BiometricUnavailable
            }
            other => {
                tracing::error!(error = %other, "check-in pipeline failure");
                ApiError::Internal
            }
        }
    }
}
