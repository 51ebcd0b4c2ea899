use crate::models::auth::ErrorResponse;
use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};

pub async fn fallback_handler(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: format!(
                "No route for {} {}. Valid endpoints: POST /register, POST /login, GET /me, GET /health",
                method,
                uri.path()
            ),
        }),
    )
        .into_response()
}
