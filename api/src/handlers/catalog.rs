//! Catalog handlers: categories, genres, and titles.
//!
//! Reads are open to everyone; every write is admin-gated through the
//! authorization policies. Categories and genres share one shape and
//! one set of rules, so their handlers delegate to common helpers.

use authz::types::{Actor, ResourceAction};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use database::storage::{NewTitle, TermStore, TitlePatch, TitleStore};

use crate::{
    error::ApiResult,
    models::{
        CreateTermRequest, CreateTitleRequest, PaginationParams, TermListResponse, TermResponse,
        TitleListResponse, TitleResponse, UpdateTitleRequest,
    },
    policies::enforce_request,
    AppState,
};

async fn list_terms<T>(
    state: &AppState,
    actor: &Actor,
    store: TermStore<'_, T>,
    pagination: &PaginationParams,
) -> ApiResult<Json<TermListResponse>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Into<TermResponse> + Send + Unpin,
{
    enforce_request(&state.policies.terms, actor, ResourceAction::List)?;

    let (limit, offset) = pagination.limit_offset();
    let items = store.list(limit, offset).await?;
    let total = store.count().await?;

    Ok(Json(TermListResponse {
        items: items.into_iter().map(Into::into).collect(),
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }))
}

async fn create_term<T>(
    state: &AppState,
    actor: &Actor,
    store: TermStore<'_, T>,
    request: CreateTermRequest,
) -> ApiResult<(StatusCode, Json<TermResponse>)>
where
    T: for<'r> FromRow<'r, SqliteRow> + Into<TermResponse> + Send + Unpin,
{
    enforce_request(&state.policies.terms, actor, ResourceAction::Create)?;

    let created = store.create(&request.name, &request.slug).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn delete_term<T>(
    state: &AppState,
    actor: &Actor,
    store: TermStore<'_, T>,
    slug: &str,
) -> ApiResult<StatusCode>
where
    T: for<'r> FromRow<'r, SqliteRow> + Into<TermResponse> + Send + Unpin,
{
    enforce_request(&state.policies.terms, actor, ResourceAction::Destroy)?;

    store.delete_by_slug(slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List categories
///
/// GET /api/v1/categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("page_size" = Option<i64>, Query, description = "Items per page (default: 20)")
    ),
    responses((status = 200, description = "Categories listed", body = TermListResponse)),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    list_terms(&state, &actor, TermStore::categories(&state.db), &pagination).await
}

/// Create a category (admin only)
///
/// POST /api/v1/categories
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateTermRequest,
    responses(
        (status = 201, description = "Category created", body = TermResponse),
        (status = 400, description = "Invalid name/slug or duplicate slug", body = ApiErrorResponse),
        (status = 403, description = "Not an admin", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateTermRequest>,
) -> ApiResult<impl IntoResponse> {
    create_term(&state, &actor, TermStore::categories(&state.db), request).await
}

/// Delete a category (admin only); its titles are detached, not removed
///
/// DELETE /api/v1/categories/{slug}
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Unknown slug", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    delete_term(&state, &actor, TermStore::categories(&state.db), &slug).await
}

/// List genres
///
/// GET /api/v1/genres
#[utoipa::path(
    get,
    path = "/api/v1/genres",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("page_size" = Option<i64>, Query, description = "Items per page (default: 20)")
    ),
    responses((status = 200, description = "Genres listed", body = TermListResponse)),
    tag = "catalog"
)]
pub async fn list_genres(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    list_terms(&state, &actor, TermStore::genres(&state.db), &pagination).await
}

/// Create a genre (admin only)
///
/// POST /api/v1/genres
#[utoipa::path(
    post,
    path = "/api/v1/genres",
    request_body = CreateTermRequest,
    responses(
        (status = 201, description = "Genre created", body = TermResponse),
        (status = 400, description = "Invalid name/slug or duplicate slug", body = ApiErrorResponse),
        (status = 403, description = "Not an admin", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_genre(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateTermRequest>,
) -> ApiResult<impl IntoResponse> {
    create_term(&state, &actor, TermStore::genres(&state.db), request).await
}

/// Delete a genre (admin only)
///
/// DELETE /api/v1/genres/{slug}
#[utoipa::path(
    delete,
    path = "/api/v1/genres/{slug}",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Unknown slug", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    delete_term(&state, &actor, TermStore::genres(&state.db), &slug).await
}

/// List titles with category, genres, and rating
///
/// GET /api/v1/titles
#[utoipa::path(
    get,
    path = "/api/v1/titles",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("page_size" = Option<i64>, Query, description = "Items per page (default: 20)")
    ),
    responses((status = 200, description = "Titles listed", body = TitleListResponse)),
    tag = "catalog"
)]
pub async fn list_titles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.titles, &actor, ResourceAction::List)?;

    let store = TitleStore::new(&state.db);
    let (limit, offset) = pagination.limit_offset();
    let records = store.list(limit, offset).await?;
    let total = store.count().await?;

    Ok(Json(TitleListResponse {
        items: records.into_iter().map(TitleResponse::from).collect(),
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }))
}

/// Create a title (admin only)
///
/// POST /api/v1/titles
#[utoipa::path(
    post,
    path = "/api/v1/titles",
    request_body = CreateTitleRequest,
    responses(
        (status = 201, description = "Title created", body = TitleResponse),
        (status = 400, description = "Invalid year or unknown category/genre slug", body = ApiErrorResponse),
        (status = 403, description = "Not an admin", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_title(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateTitleRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.titles, &actor, ResourceAction::Create)?;

    let record = TitleStore::new(&state.db)
        .create(NewTitle {
            name: request.name,
            year: request.year,
            description: request.description,
            category: request.category,
            genres: request.genre,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TitleResponse::from(record))))
}

/// Retrieve a title
///
/// GET /api/v1/titles/{title_id}
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title identifier")),
    responses(
        (status = 200, description = "Title retrieved", body = TitleResponse),
        (status = 404, description = "Unknown title", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_title(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(title_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.titles, &actor, ResourceAction::Retrieve)?;

    let record = TitleStore::new(&state.db).record(title_id).await?;
    Ok(Json(TitleResponse::from(record)))
}

/// Update a title (admin only)
///
/// PATCH /api/v1/titles/{title_id}
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title identifier")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated", body = TitleResponse),
        (status = 404, description = "Unknown title", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn patch_title(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(title_id): Path<i64>,
    Json(request): Json<UpdateTitleRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.titles, &actor, ResourceAction::PartialUpdate)?;

    let record = TitleStore::new(&state.db)
        .update(
            title_id,
            TitlePatch {
                name: request.name,
                year: request.year,
                description: request.description,
                category: request.category,
                genres: request.genre,
            },
        )
        .await?;

    Ok(Json(TitleResponse::from(record)))
}

/// Delete a title and, through it, its reviews and comments (admin only)
///
/// DELETE /api/v1/titles/{title_id}
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title identifier")),
    responses(
        (status = 204, description = "Title deleted"),
        (status = 404, description = "Unknown title", body = ApiErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_title(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(title_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.titles, &actor, ResourceAction::Destroy)?;

    TitleStore::new(&state.db).delete(title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
