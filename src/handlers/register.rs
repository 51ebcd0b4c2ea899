use crate::core::error::CredentialError;
use crate::core::state::AppState;
use crate::handlers::extract::CredentialBody;
use crate::models::auth::{RegisterRequest, RegisterResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// Register a new user
///
/// POST /register {username, email, password}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    CredentialBody(request): CredentialBody<RegisterRequest>,
) -> Result<Response, CredentialError> {
    let user = state.credentials.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user registered successfully".to_string(),
            user,
        }),
    )
        .into_response())
}
