//! Request middleware: bearer-token authentication.
//!
//! Every request passes through here before reaching a handler. A
//! missing Authorization header leaves the actor anonymous; a present
//! but invalid one is rejected outright with 401. Handlers receive the
//! resolved [`Actor`] and the full account (when authenticated) as
//! request extensions.

use authz::types::Actor;
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use user::UserStore;

use crate::{error::ApiError, AppState};

/// The authenticated account behind the actor, when there is one.
/// Handlers that stamp authorship read it from here.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<user::User>);

pub async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let (actor, current) = match header.as_deref() {
        None => (Actor::Anonymous, None),
        Some(value) => {
            let Some(token) = value.strip_prefix("Bearer ") else {
                return Err(ApiError::Unauthorized);
            };

            let claims = state
                .tokens
                .verify(token)
                .map_err(|_| ApiError::Unauthorized)?;

            let account = UserStore::new(&state.db)
                .find_by_id(&claims.sub)
                .await
                .map_err(ApiError::from)?;

            match account {
                Some(account) if account.is_active => {
                    debug!("Authenticated request from {}", account.username);
                    (Actor::Authenticated(account.identity()), Some(account))
                }
                // Deleted or never-confirmed accounts do not authenticate.
                _ => return Err(ApiError::Unauthorized),
            }
        }
    };

    request.extensions_mut().insert(actor);
    request.extensions_mut().insert(CurrentUser(current));

    Ok(next.run(request).await)
}

/// Pull the authenticated account out of the middleware extension;
/// 401 when the request is anonymous.
pub fn require_user(current: &CurrentUser) -> Result<&user::User, ApiError> {
    current.0.as_ref().ok_or(ApiError::Unauthorized)
}
