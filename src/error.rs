use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Every failure a request can end with. Each kind maps to one status code
/// and a fixed client-facing message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("Book with this ID already exists")]
    Conflict,

    #[error("Book not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    /// The wrapped detail is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// Rejects input an extractor could not parse. The parser's message is
    /// only logged; the client sees what was wrong and, when known, which field.
    pub fn invalid_input(what: &str, err: impl fmt::Display) -> Self {
        let raw = err.to_string();
        log::debug!("Reject {what}: {raw}");
        match field_name(&raw) {
            Some(field) => ApiError::Validation(format!("Invalid {what}: field `{field}`")),
            None => ApiError::Validation(format!("Invalid {what}")),
        }
    }
}

/// Pulls `name` out of serde messages such as "missing field `name`".
fn field_name(msg: &str) -> Option<&str> {
    let start = msg.find("field `")? + "field `".len();
    let len = msg[start..].find('`')?;
    Some(&msg[start..start + len])
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Conflict => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(detail) = self {
            log::error!("Internal error: {detail}");
        }

        let mut resp = HttpResponse::build(self.status_code());
        if let ApiError::Unauthorized = self {
            resp.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        resp.json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn test_status_mapping() {
        let cases = [
            (ApiError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::Conflict, StatusCode::BAD_REQUEST),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (
                ApiError::Validation("missing field `title`".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.error_response().status(), status);
        }
    }

    #[actix_web::test]
    async fn test_internal_detail_hidden() {
        let resp = ApiError::Internal("secret stack trace".to_string()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["detail"], "Internal server error");
    }

    #[test]
    fn test_invalid_input() {
        let err = ApiError::invalid_input(
            "request body",
            "Json deserialize error: missing field `description` at line 1 column 60",
        );
        assert_eq!(err.to_string(), "Invalid request body: field `description`");

        let err = ApiError::invalid_input(
            "request body",
            "Json deserialize error: invalid type: string \"x\", expected i64 at line 1 column 9",
        );
        assert_eq!(err.to_string(), "Invalid request body");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unauthorized_challenge() {
        let resp = ApiError::Unauthorized.error_response();
        let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
        assert_eq!(challenge, "Bearer");
    }
}
