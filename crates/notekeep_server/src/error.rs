//! HTTP error mapping.
//!
//! # Invariants
//! - Not-found and not-visible notes both map to an empty `404`.
//! - Server-side failures never echo internal details to the client.

use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::{error::BlockingError, HttpResponse, ResponseError};
use notekeep_core::NoteServiceError;
use std::fmt::{Display, Formatter};

/// Realm advertised in `WWW-Authenticate` challenges.
pub const AUTH_REALM: &str = "notes";

#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated, but without any note role.
    Forbidden,
    BadRequest(String),
    NotFound,
    Internal,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "authentication required"),
            Self::Forbidden => write!(f, "access denied"),
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::NotFound => write!(f, "not found"),
            Self::Internal => write!(f, "internal server error"),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Unauthorized => HttpResponse::Unauthorized()
                .insert_header((
                    header::WWW_AUTHENTICATE,
                    format!("Basic realm=\"{AUTH_REALM}\""),
                ))
                .finish(),
            Self::NotFound => HttpResponse::NotFound().finish(),
            other => HttpResponse::build(other.status_code()).json(serde_json::json!({
                "error": other.to_string()
            })),
        }
    }
}

impl From<NoteServiceError> for ApiError {
    fn from(value: NoteServiceError) -> Self {
        match value {
            NoteServiceError::Validation(err) => Self::BadRequest(err.to_string()),
            NoteServiceError::InvalidSort(err) => Self::BadRequest(err.to_string()),
            NoteServiceError::NotFound(_) => Self::NotFound,
            NoteServiceError::UnknownPrincipal(_) => Self::Forbidden,
            other @ (NoteServiceError::Repo(_) | NoteServiceError::InconsistentState(_)) => {
                log::error!("event=request module=http status=error error={other}");
                Self::Internal
            }
        }
    }
}

impl From<BlockingError> for ApiError {
    fn from(value: BlockingError) -> Self {
        log::error!("event=request module=http status=error error_code=blocking_pool error={value}");
        Self::Internal
    }
}
