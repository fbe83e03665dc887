// Route exports
pub mod auth;
pub mod codes;
pub mod compat;
pub mod matches;

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use std::sync::Arc;
use thiserror::Error;

use crate::core::Matcher;
use crate::models::ErrorResponse;
use crate::services::{
    AnalysisError, AnalysisGenerator, BrokerError, CodeBroker, Lifecycle, LifecycleError,
};
use self::auth::TokenVerifier;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<CodeBroker>,
    pub lifecycle: Arc<Lifecycle>,
    pub analysis: Arc<dyn AnalysisGenerator>,
    pub matcher: Matcher,
    pub tokens: Arc<TokenVerifier>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(codes::configure)
            .configure(compat::configure)
            .configure(matches::configure),
    );
}

/// Error returned by every handler
///
/// Internal causes are logged; the body only carries the user-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),
}

const STORE_UNAVAILABLE: &str = "storage is temporarily unavailable, please try again";

impl ApiError {
    /// HTTP status, machine-readable kind and user-facing message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Broker(e) => match e {
                BrokerError::NotFound => (StatusCode::NOT_FOUND, "not_found", e.to_string()),
                BrokerError::Expired => (StatusCode::GONE, "expired", e.to_string()),
                BrokerError::NotIssuer => (StatusCode::FORBIDDEN, "not_issuer", e.to_string()),
                BrokerError::Validation(v) => (StatusCode::BAD_REQUEST, "validation", v.to_string()),
                BrokerError::DurableStoreUnavailable(_) | BrokerError::CodeSpaceExhausted(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    STORE_UNAVAILABLE.to_string(),
                ),
            },
            ApiError::Lifecycle(e) => match e {
                LifecycleError::InvalidCode => (StatusCode::NOT_FOUND, "invalid_code", e.to_string()),
                LifecycleError::AlreadyUsed => (StatusCode::CONFLICT, "already_used", e.to_string()),
                LifecycleError::Expired => (StatusCode::GONE, "expired", e.to_string()),
                LifecycleError::NotFound => (StatusCode::NOT_FOUND, "not_found", e.to_string()),
                LifecycleError::NotReady => (StatusCode::CONFLICT, "not_ready", e.to_string()),
                LifecycleError::AlreadyCompleted => {
                    (StatusCode::CONFLICT, "already_completed", e.to_string())
                }
                LifecycleError::NotParticipant => {
                    (StatusCode::FORBIDDEN, "not_participant", e.to_string())
                }
                LifecycleError::Validation(v) => (StatusCode::BAD_REQUEST, "validation", v.to_string()),
                LifecycleError::DurableStoreUnavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    STORE_UNAVAILABLE.to_string(),
                ),
            },
            ApiError::Analysis(_) => (
                StatusCode::BAD_GATEWAY,
                "analysis_failed",
                "could not generate the match analysis, please try again".to_string(),
            ),
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", message.clone())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "validation", message.clone()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, kind, message) = self.parts();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", kind, self);
        } else {
            tracing::debug!("Request rejected ({}): {}", kind, self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            kind: kind.to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}
