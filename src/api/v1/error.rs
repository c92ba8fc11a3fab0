use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let rejection = if let Some(rejection) = err.find::<ApiRejection>() {
        rejection.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound.into()
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::BadRequest.into()
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed.into()
    } else {
        error!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError.into()
    };

    let status = rejection.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(rejection.code, rejection.message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Invalid request")]
    BadRequest,
    #[error("Missing refresh token")]
    MissingRefreshToken,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::UsernameTaken => StatusCode::CONFLICT,
            ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::MissingRefreshToken => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::UserExists => ApiErrorCode::EmailTaken,
            AuthError::UsernameTaken => ApiErrorCode::UsernameTaken,
            AuthError::InvalidInput(_) => ApiErrorCode::BadRequest,
            AuthError::Unauthorized => ApiErrorCode::InvalidToken,
            AuthError::StoreUnavailable(e) => {
                error!("Store unavailable: {}", e);
                ApiErrorCode::ServiceUnavailable
            }
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

/// What a handler rejects with: a code plus the message the client sees.
#[derive(Debug, Clone)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl reject::Reject for ApiRejection {}

impl From<ApiErrorCode> for ApiRejection {
    fn from(code: ApiErrorCode) -> Self {
        ApiRejection {
            code,
            message: code.to_string(),
        }
    }
}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        match error {
            // Validation reasons are meant for the client.
            AuthError::InvalidInput(reason) => ApiRejection {
                code: ApiErrorCode::BadRequest,
                message: reason,
            },
            other => ApiErrorCode::from(other).into(),
        }
    }
}
