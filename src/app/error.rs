use crate::utils::error::{ErrorCategory, PlannerError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    InternalServerError,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let (error, message) = match &self {
            Self::BadRequest(msg) => ("bad_request", msg.as_str()),
            Self::Unprocessable(msg) => ("unprocessable", msg.as_str()),
            Self::InternalServerError => ("internal", "internal server error"),
        };
        (status_code, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<PlannerError> for ApiError {
    fn from(error: PlannerError) -> Self {
        match (&error, error.category()) {
            (PlannerError::ProcessingError { .. }, _) => {
                tracing::error!("Unexpected error: {}", error);
                Self::InternalServerError
            }
            (_, ErrorCategory::Configuration | ErrorCategory::Input) => {
                Self::BadRequest(error.user_friendly_message())
            }
            (_, ErrorCategory::Solver) => Self::Unprocessable(error.user_friendly_message()),
            (_, ErrorCategory::Output | ErrorCategory::Network) => {
                tracing::error!("Unexpected error: {}", error);
                Self::InternalServerError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PlannerError::validation("dup"), StatusCode::BAD_REQUEST),
            (
                PlannerError::MissingConfigError {
                    field: "roster_csv".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (PlannerError::layout("0 columns"), StatusCode::UNPROCESSABLE_ENTITY),
            (
                PlannerError::InfeasibleError {
                    message: "too many".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PlannerError::ProcessingError {
                    message: "join".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                PlannerError::IoError(std::io::Error::other("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
