//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::booking::BookingError;
use crate::db::DatabaseError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Unknown provider: {0}")]
    InvalidProvider(String),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("Payment signature does not match")]
    SignatureInvalid,
    #[error("Appointment is not pending confirmation")]
    AppointmentNotPending,
    #[error("Appointment cannot be cancelled")]
    AppointmentNotCancellable,
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::InvalidProvider(provider_id) => (
                StatusCode::BAD_REQUEST,
                "INVALID_PROVIDER",
                format!("No such provider: {provider_id}"),
            ),
            ApiError::MalformedRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "MALFORMED_REQUEST",
                detail.clone(),
            ),
            ApiError::SignatureInvalid => (
                StatusCode::BAD_REQUEST,
                "SIGNATURE_INVALID",
                "Payment signature verification failed".to_string(),
            ),
            ApiError::AppointmentNotPending => (
                StatusCode::BAD_REQUEST,
                "APPOINTMENT_NOT_PENDING",
                "Appointment is not awaiting confirmation".to_string(),
            ),
            ApiError::AppointmentNotCancellable => (
                StatusCode::BAD_REQUEST,
                "APPOINTMENT_NOT_CANCELLABLE",
                "Only scheduled appointments can be cancelled".to_string(),
            ),
            ApiError::PaymentProvider(detail) => {
                tracing::error!(detail, "Payment provider failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PAYMENT_PROVIDER_ERROR",
                    "Could not create a payment order".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

/// `Json` extractor whose rejection carries the structured error body.
/// An unparseable or incomplete request body gets the same
/// `MALFORMED_REQUEST` envelope as field-level validation failures,
/// instead of axum's plain-text 422.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::MalformedRequest(rejection.body_text())
            })?;
        Ok(Self(value))
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidProvider(id) => ApiError::InvalidProvider(id),
            BookingError::MalformedRequest(detail) => ApiError::MalformedRequest(detail),
            BookingError::PaymentProvider(e) => ApiError::PaymentProvider(e.to_string()),
            BookingError::SignatureInvalid => ApiError::SignatureInvalid,
            BookingError::AppointmentNotPending => ApiError::AppointmentNotPending,
            BookingError::AppointmentNotCancellable => ApiError::AppointmentNotCancellable,
            BookingError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn invalid_provider_returns_400() {
        let response = ApiError::InvalidProvider("999".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_PROVIDER");
        assert!(json["error"]["message"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn signature_invalid_returns_400() {
        let response = ApiError::SignatureInvalid.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "SIGNATURE_INVALID");
    }

    #[tokio::test]
    async fn not_pending_returns_400() {
        let response = ApiError::AppointmentNotPending.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "APPOINTMENT_NOT_PENDING");
    }

    #[tokio::test]
    async fn payment_provider_returns_500_without_detail() {
        let response = ApiError::PaymentProvider("gateway said 502".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "PAYMENT_PROVIDER_ERROR");
        // Processor detail is logged, never leaked to the client
        assert!(!json["error"]["message"].as_str().unwrap().contains("502"));
    }

    #[tokio::test]
    async fn booking_errors_map_to_api_codes() {
        let api_err: ApiError = BookingError::SignatureInvalid.into();
        assert!(matches!(api_err, ApiError::SignatureInvalid));

        let api_err: ApiError = BookingError::AppointmentNotPending.into();
        assert!(matches!(api_err, ApiError::AppointmentNotPending));

        let api_err: ApiError = BookingError::InvalidProvider("7".into()).into();
        assert!(matches!(api_err, ApiError::InvalidProvider(_)));
    }
}
