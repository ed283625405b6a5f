//! Signup and token-exchange handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::{
    error::ApiResult,
    models::{SignupRequest, SignupResponse, TokenRequest, TokenResponse},
    AppState,
};

/// Register a new account (or re-issue a confirmation code)
///
/// POST /api/v1/auth/signup
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Signup recorded, confirmation code dispatched", body = SignupResponse),
        (status = 400, description = "Invalid or reserved username, or conflicting account", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .signup
        .signup(&state.db, &request.username, &request.email)
        .await?;

    Ok(Json(SignupResponse {
        username: user.username,
        email: user.email,
    }))
}

/// Exchange a confirmation code for an access token
///
/// POST /api/v1/auth/token
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Account activated, token issued", body = TokenResponse),
        (status = 400, description = "Wrong, expired, or used confirmation code", body = ApiErrorResponse),
        (status = 404, description = "Unknown username", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .signup
        .confirm(&state.db, &request.username, &request.confirmation_code)
        .await?;

    let token = state.tokens.issue(&user.id)?;
    info!("Issued access token for {}", user.username);

    Ok((StatusCode::OK, Json(TokenResponse { token })))
}
