use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("{message}")]
    Unauthenticated { code: &'static str, message: String },
    #[error("only the owner may access this trip")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("{message}")]
    Conflict { code: &'static str, message: String },
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn missing_fields(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "MISSING_FIELDS",
            message: message.into(),
        }
    }

    pub fn invalid_date_range() -> Self {
        Self::Validation {
            code: "INVALID_DATE_RANGE",
            message: "end_date must not precede start_date".into(),
        }
    }

    pub fn invalid_budget() -> Self {
        Self::Validation {
            code: "INVALID_BUDGET",
            message: "budget must not be negative".into(),
        }
    }

    pub fn invalid_day_number() -> Self {
        Self::Validation {
            code: "INVALID_DAY_NUMBER",
            message: "day_number must be 1 or greater".into(),
        }
    }

    pub fn invalid_email() -> Self {
        Self::Validation {
            code: "INVALID_EMAIL",
            message: "a valid email address is required".into(),
        }
    }

    pub fn weak_password() -> Self {
        Self::Validation {
            code: "WEAK_PASSWORD",
            message: "password must be at least 8 characters".into(),
        }
    }

    pub fn missing_token() -> Self {
        Self::Unauthenticated {
            code: "MISSING_TOKEN",
            message: "authorization bearer token is required".into(),
        }
    }

    pub fn invalid_token() -> Self {
        Self::Unauthenticated {
            code: "INVALID_TOKEN",
            message: "bearer token is invalid or expired".into(),
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::Unauthenticated {
            code: "INVALID_CREDENTIALS",
            message: "email or password is incorrect".into(),
        }
    }

    pub fn email_taken() -> Self {
        Self::Conflict {
            code: "EMAIL_TAKEN",
            message: "an account with this email already exists".into(),
        }
    }

    pub fn already_saved() -> Self {
        Self::Conflict {
            code: "ALREADY_SAVED",
            message: "destination is already saved".into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { code, .. }
            | ApiError::Unauthenticated { code, .. }
            | ApiError::Conflict { code, .. } => code,
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Config(_)
            | ApiError::Io(_)
            | ApiError::Database(_)
            | ApiError::Other(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Config(_)
            | ApiError::Io(_)
            | ApiError::Database(_)
            | ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store and provider failures are logged server-side; the caller
        // only sees a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {self:?}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let code = self.code();
        (status, Json(ErrorBody { message, code })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            code: "INVALID_JSON",
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation {
            code: "INVALID_QUERY",
            message: rejection.body_text(),
        }
    }
}
