use crate::core::error::{CredentialError, TokenError};
use crate::core::state::AppState;
use crate::models::auth::MeResponse;
use crate::models::user::UserProfile;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(TokenError::Missing)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(TokenError::Missing),
    }
}

/// Identity carried by the caller's bearer token
///
/// GET /me
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, CredentialError> {
    let token = bearer_token(&headers)?;

    let claims = state.credentials.verify_token(token).map_err(|e| {
        debug!(error = %e, "Bearer token rejected");
        e
    })?;

    Ok((
        StatusCode::OK,
        Json(MeResponse {
            user: UserProfile {
                id: claims.id,
                name: claims.username,
                email: claims.email,
            },
            expires_at: claims.exp,
        }),
    )
        .into_response())
}
