//! User management (admin) and self-profile handlers.

use authz::types::{Actor, ResourceAction};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::info;
use user::UserStore;

use crate::{
    error::ApiResult,
    middleware_hooks::{require_user, CurrentUser},
    models::{
        CreateUserRequest, PaginationParams, UpdateProfileRequest, UpdateUserRequest,
        UserListResponse, UserResponse,
    },
    policies::enforce_request,
    AppState,
};

/// List accounts (admin only)
///
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("page_size" = Option<i64>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "Accounts listed", body = UserListResponse),
        (status = 403, description = "Not an admin", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.users, &actor, ResourceAction::List)?;

    let store = UserStore::new(&state.db);
    let (limit, offset) = pagination.limit_offset();
    let users = store.list(limit, offset).await?;
    let total = store.count().await?;

    Ok(Json(UserListResponse {
        items: users.into_iter().map(UserResponse::from).collect(),
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }))
}

/// Create an account (admin only)
///
/// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid or conflicting fields", body = ApiErrorResponse),
        (status = 403, description = "Not an admin", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.users, &actor, ResourceAction::Create)?;

    // Admin-created accounts skip the confirmation flow.
    let created = UserStore::new(&state.db).create(request.into(), true).await?;
    info!("Admin created account {}", created.username);

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Retrieve an account by username (admin only)
///
/// GET /api/v1/users/{username}
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 200, description = "Account retrieved", body = UserResponse),
        (status = 404, description = "Unknown username", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.users, &actor, ResourceAction::Retrieve)?;

    let found = UserStore::new(&state.db).get_by_username(&username).await?;
    Ok(Json(UserResponse::from(found)))
}

/// Update an account, including its role (admin only)
///
/// PATCH /api/v1/users/{username}
#[utoipa::path(
    patch,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 404, description = "Unknown username", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn patch_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(username): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.users, &actor, ResourceAction::PartialUpdate)?;

    let updated = UserStore::new(&state.db).update(&username, request.into()).await?;
    Ok(Json(UserResponse::from(updated)))
}

/// Delete an account (admin only)
///
/// DELETE /api/v1/users/{username}
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "Unknown username", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.users, &actor, ResourceAction::Destroy)?;

    UserStore::new(&state.db).delete_by_username(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Retrieve the authenticated account's own profile
///
/// GET /api/v1/users/me
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Own profile", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.users, &actor, ResourceAction::Me)?;

    let account = require_user(&current)?;
    Ok(Json(UserResponse::from(account.clone())))
}

/// Update the authenticated account's own profile
///
/// PATCH /api/v1/users/me — username, email, and role stay immutable
/// through this path.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn patch_me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.users, &actor, ResourceAction::Me)?;

    let account = require_user(&current)?;
    let updated = UserStore::new(&state.db)
        .update_profile(&account.id, request.into())
        .await?;

    Ok(Json(UserResponse::from(updated)))
}
