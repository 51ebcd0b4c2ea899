use crate::core::error::CredentialError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Request body for the credential endpoints
///
/// Accepts `application/x-www-form-urlencoded` forms and JSON. Any other
/// content type, or none, is parsed as JSON. Every rejection becomes a
/// `CredentialError::Validation` so clients always get a JSON `{message}`.
#[derive(Debug)]
pub struct CredentialBody<T>(pub T);

const INVALID_BODY: &str = "Invalid request body";

fn rejected(detail: String) -> CredentialError {
    debug!(detail = %detail, "Request body rejected");
    CredentialError::Validation(INVALID_BODY.to_string())
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<S, T> FromRequest<S> for CredentialBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = CredentialError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| rejected(e.body_text()))?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| rejected(e.body_text()))?;
        let Json(value) = Json::<T>::from_bytes(&bytes).map_err(|e| rejected(e.body_text()))?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::RegisterRequest;
    use axum::body::Body;

    fn request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/register");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn extract(req: Request) -> Result<RegisterRequest, CredentialError> {
        CredentialBody::<RegisterRequest>::from_request(req, &())
            .await
            .map(|CredentialBody(body)| body)
    }

    #[tokio::test]
    async fn test_json_body() {
        let body = extract(request(
            Some("application/json"),
            r#"{"username":"alice","email":"a@b.com","password":"pw"}"#,
        ))
        .await
        .unwrap();
        assert_eq!(body.username, "alice");
    }

    #[tokio::test]
    async fn test_form_body() {
        let body = extract(request(
            Some("application/x-www-form-urlencoded"),
            "username=alice&email=a%40b.com&password=p+w",
        ))
        .await
        .unwrap();
        assert_eq!(body.email, "a@b.com");
        assert_eq!(body.password, "p w");
    }

    #[tokio::test]
    async fn test_missing_content_type_parsed_as_json() {
        let body = extract(request(None, r#"{"username":"alice"}"#)).await.unwrap();
        assert_eq!(body.username, "alice");
        assert_eq!(body.email, "");
    }

    #[tokio::test]
    async fn test_garbage_body_is_validation_error() {
        for (ct, body) in [
            (Some("application/json"), "not json"),
            (Some("text/plain"), "username=alice"),
            (None, ""),
            (Some("application/json"), r#"{"username": 42}"#),
        ] {
            match extract(request(ct, body)).await {
                Err(CredentialError::Validation(msg)) => assert_eq!(msg, "Invalid request body"),
                other => panic!("Expected validation error for {:?}, got {:?}", body, other),
            }
        }
    }
}
