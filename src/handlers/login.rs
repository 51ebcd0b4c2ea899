use crate::core::error::CredentialError;
use crate::core::state::AppState;
use crate::handlers::extract::CredentialBody;
use crate::models::auth::{LoginRequest, LoginResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// Exchange email and password for a session token
///
/// POST /login {email, password}
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    CredentialBody(request): CredentialBody<LoginRequest>,
) -> Result<Response, CredentialError> {
    let outcome = state.credentials.login(request).await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            message: "login successful".to_string(),
            token: outcome.token,
            user: outcome.user,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::test_support::create_test_state;
    use crate::models::auth::{ErrorResponse, RegisterRequest};
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn seed(state: &AppState) {
        state
            .credentials
            .register(RegisterRequest {
                username: "alice".to_string(),
                email: "a@b.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
    }

    fn request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    async fn error_message(response: Response) -> String {
        let bytes = Body::new(response.into_body()).collect().await.unwrap().to_bytes();
        serde_json::from_slice::<ErrorResponse>(&bytes).unwrap().message
    }

    #[tokio::test]
    async fn test_login_success() {
        let (state, _dir) = create_test_state();
        seed(&state).await;

        let response = login_handler(State(state.clone()), CredentialBody(request("a@b.com", "pw")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = Body::new(response.into_body()).collect().await.unwrap().to_bytes();
        let body: LoginResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, "login successful");
        assert_eq!(body.user.name, "alice");

        let claims = state.credentials.verify_token(&body.token).unwrap();
        assert_eq!(claims.id, body.user.id);
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let (state, _dir) = create_test_state();
        seed(&state).await;

        let result = login_handler(State(state), CredentialBody(request("nobody@b.com", "pw"))).await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(response).await, "Invalid Email");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (state, _dir) = create_test_state();
        seed(&state).await;

        let result = login_handler(State(state), CredentialBody(request("a@b.com", "nope"))).await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(response).await, "Invalid Password");
    }
}
