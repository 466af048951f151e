use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::blog::BlogError;
use crate::application::content::AdminContentError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const VALIDATION: &str = "validation_error";
    pub const INVALID_SLUG: &str = "invalid_slug";
    pub const INTEGRITY: &str = "integrity_error";
    pub const CATEGORY_IN_USE: &str = "category_in_use";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REQUEST_TIMEOUT: &str = "request_timeout";
    pub const UNEXPECTED: &str = "unexpected";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    pub fn unexpected(hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::UNEXPECTED,
            "Unexpected error",
            Some(hint.into()),
        )
    }

    pub fn request_timeout() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::REQUEST_TIMEOUT,
            "Request timed out",
            None,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

pub fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("Resource not found", None),
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::unexpected(message),
    }
}

pub fn blog_to_api(err: BlogError) -> ApiError {
    match err {
        BlogError::PostNotFound { slug } => ApiError::not_found("Post not found", Some(slug)),
        BlogError::AnalyticsNotFound { slug } => {
            ApiError::not_found("Post analytics not found", Some(slug))
        }
        err @ BlogError::DanglingCategory { .. } => ApiError::unexpected(err.to_string()),
        BlogError::Repo(err) => repo_to_api(err),
    }
}

pub fn content_to_api(err: AdminContentError) -> ApiError {
    match err {
        AdminContentError::Invalid(err) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION,
            "Validation failed",
            Some(err.to_string()),
        ),
        err @ AdminContentError::Slug { .. } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_SLUG,
            "Invalid slug",
            Some(err.to_string()),
        ),
        AdminContentError::NotFound { entity, slug } => {
            ApiError::not_found("Resource not found", Some(format!("{entity} `{slug}`")))
        }
        err @ AdminContentError::CategoryInUse { .. } => ApiError::new(
            StatusCode::CONFLICT,
            codes::CATEGORY_IN_USE,
            "Category is in use",
            Some(err.to_string()),
        ),
        AdminContentError::Repo(err) => repo_to_api(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_map_to_documented_statuses() {
        let cases = [
            (RepoError::NotFound, StatusCode::NOT_FOUND, codes::NOT_FOUND),
            (
                RepoError::duplicate("posts_slug_key"),
                StatusCode::CONFLICT,
                codes::DUPLICATE,
            ),
            (
                RepoError::InvalidInput {
                    message: "bad".into(),
                },
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
            ),
            (
                RepoError::integrity("still referenced"),
                StatusCode::CONFLICT,
                codes::INTEGRITY,
            ),
            (
                RepoError::Timeout,
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
            ),
            (
                RepoError::from_persistence("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::UNEXPECTED,
            ),
        ];

        for (err, status, code) in cases {
            let api = repo_to_api(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn category_in_use_is_a_conflict() {
        let api = content_to_api(AdminContentError::CategoryInUse {
            slug: "tech".into(),
            count: 2,
        });
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.code(), codes::CATEGORY_IN_USE);
    }

    #[test]
    fn error_response_carries_report() {
        let response = ApiError::not_found("Post not found", Some("hello".into())).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("error report attached");
        assert_eq!(report.status, StatusCode::NOT_FOUND);
        assert_eq!(report.messages, vec!["not_found: hello".to_string()]);
    }
}
