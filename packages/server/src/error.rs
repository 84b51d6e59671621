//! Mapping of domain errors onto HTTP responses.
//!
//! Every failure is rendered as `{"error": ..., "kind": ...}`, with a
//! `fields` array added for validation errors.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use crime_dashboard_crime_models::InvalidTransitionError;
use crime_dashboard_database::DbError;
use crime_dashboard_fir::FirError;
use crime_dashboard_fir_models::ValidationError;
use crime_dashboard_patrol_models::ScoringInputError;
use crime_dashboard_server_models::ApiErrorBody;

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    /// Evidence or database storage failed. The message is safe to show;
    /// the underlying cause is logged.
    #[error("{0}")]
    Storage(String),

    #[error(transparent)]
    ScoringInput(#[from] ScoringInputError),

    /// The request body, query, or path could not be decoded.
    #[error("{0}")]
    InvalidBody(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),
}

impl ApiError {
    /// Machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::ScoringInput(_) => "scoring_input",
            Self::InvalidBody(_) => "invalid_body",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidTransition(_) => "invalid_transition",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::ScoringInput(_) | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let fields = match self {
            Self::Validation(e) => e.fields.clone(),
            _ => Vec::new(),
        };

        HttpResponse::build(self.status_code()).json(ApiErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
            fields,
        })
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        log::error!("Database error: {e}");
        Self::Storage("Database operation failed".to_string())
    }
}

impl From<FirError> for ApiError {
    fn from(e: FirError) -> Self {
        match e {
            FirError::Validation(e) => Self::Validation(e),
            FirError::NotFound { id } => Self::NotFound(format!("FIR {id} not found")),
            FirError::Storage(e) => {
                log::error!("Evidence storage error: {e}");
                Self::Storage("Failed to store evidence".to_string())
            }
            FirError::InvalidTransition(e) => Self::InvalidTransition(e),
            FirError::Database(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken | AuthError::InvalidSession | AuthError::BadCredentials => {
                Self::Unauthorized(e.to_string())
            }
            AuthError::Forbidden { .. } => Self::Forbidden(e.to_string()),
        }
    }
}
