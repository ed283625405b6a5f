//! Review and comment handlers.
//!
//! Every operation resolves its target through the full parent chain
//! (title -> review -> comment) before anything else; a mismatched
//! chain is a 404. Authorship is stamped from the authenticated actor,
//! never taken from the payload. Mutations run the object-level
//! owner/moderator/admin check after resolution.

use authz::types::{Actor, ResourceAction};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use user::UserStore;

use catalog::{Comment, Review};
use database::storage::{CommentStore, ReviewStore};
use database::Database;

use crate::{
    error::{ApiError, ApiResult},
    middleware_hooks::{require_user, CurrentUser},
    models::{
        CommentListResponse, CommentResponse, CreateCommentRequest, CreateReviewRequest,
        PaginationParams, ReviewListResponse, ReviewResponse, UpdateCommentRequest,
        UpdateReviewRequest,
    },
    policies::{enforce_object, enforce_request},
    AppState,
};

async fn username_for(db: &Database, author_id: &str) -> ApiResult<String> {
    let account = UserStore::new(db)
        .find_by_id(author_id)
        .await
        .map_err(ApiError::from)?;
    Ok(account
        .map(|u| u.username)
        .unwrap_or_else(|| author_id.to_string()))
}

async fn review_response(db: &Database, review: Review) -> ApiResult<ReviewResponse> {
    let author = username_for(db, &review.author_id).await?;
    Ok(ReviewResponse {
        id: review.id,
        text: review.text,
        author,
        score: review.score,
        pub_date: review.pub_date,
    })
}

async fn comment_response(db: &Database, comment: Comment) -> ApiResult<CommentResponse> {
    let author = username_for(db, &comment.author_id).await?;
    Ok(CommentResponse {
        id: comment.id,
        text: comment.text,
        author,
        pub_date: comment.pub_date,
    })
}

// ============================================================================
// Reviews
// ============================================================================

/// List reviews for a title
///
/// GET /api/v1/titles/{title_id}/reviews
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("page_size" = Option<i64>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "Reviews listed", body = ReviewListResponse),
        (status = 404, description = "Unknown title", body = ApiErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(title_id): Path<i64>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.reviews, &actor, ResourceAction::List)?;

    let store = ReviewStore::new(&state.db);
    let (limit, offset) = pagination.limit_offset();
    let reviews = store.list_for_title(title_id, limit, offset).await?;
    let total = store.count_for_title(title_id).await?;

    let mut items = Vec::with_capacity(reviews.len());
    for review in reviews {
        items.push(review_response(&state.db, review).await?);
    }

    Ok(Json(ReviewListResponse {
        items,
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }))
}

/// Create a review for a title (one per author per title)
///
/// POST /api/v1/titles/{title_id}/reviews
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews",
    params(("title_id" = i64, Path, description = "Title identifier")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Out-of-range score or duplicate review", body = ApiErrorResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 404, description = "Unknown title", body = ApiErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(current): Extension<CurrentUser>,
    Path(title_id): Path<i64>,
    Json(request): Json<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.reviews, &actor, ResourceAction::Create)?;

    // The author comes from the session, never from the payload.
    let author = require_user(&current)?;

    let review = ReviewStore::new(&state.db)
        .create(title_id, &author.id, &request.text, request.score)
        .await?;

    let response = review_response(&state.db, review).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Retrieve a review under a title
///
/// GET /api/v1/titles/{title_id}/reviews/{review_id}
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier")
    ),
    responses(
        (status = 200, description = "Review retrieved", body = ReviewResponse),
        (status = 404, description = "Unknown title or review, or mismatched chain", body = ApiErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn get_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.reviews, &actor, ResourceAction::Retrieve)?;

    let review = ReviewStore::new(&state.db).get(title_id, review_id).await?;
    let response = review_response(&state.db, review).await?;
    Ok(Json(response))
}

/// Update a review's text or score (author, moderator, or admin)
///
/// PATCH /api/v1/titles/{title_id}/reviews/{review_id}
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier")
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 403, description = "Not the author, a moderator, or an admin", body = ApiErrorResponse),
        (status = 404, description = "Unknown title or review", body = ApiErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn patch_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.reviews, &actor, ResourceAction::PartialUpdate)?;

    let store = ReviewStore::new(&state.db);
    let review = store.get(title_id, review_id).await?;
    enforce_object(
        &state.policies.reviews,
        &actor,
        ResourceAction::PartialUpdate,
        &review,
    )?;

    let updated = store
        .update(
            title_id,
            review_id,
            request.text.as_deref(),
            request.score,
        )
        .await?;

    let response = review_response(&state.db, updated).await?;
    Ok(Json(response))
}

/// Delete a review (author, moderator, or admin)
///
/// DELETE /api/v1/titles/{title_id}/reviews/{review_id}
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier")
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not the author, a moderator, or an admin", body = ApiErrorResponse),
        (status = 404, description = "Unknown title or review", body = ApiErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.reviews, &actor, ResourceAction::Destroy)?;

    let store = ReviewStore::new(&state.db);
    let review = store.get(title_id, review_id).await?;
    enforce_object(&state.policies.reviews, &actor, ResourceAction::Destroy, &review)?;

    store.delete(title_id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Comments
// ============================================================================

/// List comments on a review
///
/// GET /api/v1/titles/{title_id}/reviews/{review_id}/comments
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("page_size" = Option<i64>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "Comments listed", body = CommentListResponse),
        (status = 404, description = "Unknown title or review, or mismatched chain", body = ApiErrorResponse)
    ),
    tag = "comments"
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.comments, &actor, ResourceAction::List)?;

    let store = CommentStore::new(&state.db);
    let (limit, offset) = pagination.limit_offset();
    let comments = store
        .list_for_review(title_id, review_id, limit, offset)
        .await?;
    let total = store.count_for_review(review_id).await?;

    let mut items = Vec::with_capacity(comments.len());
    for comment in comments {
        items.push(comment_response(&state.db, comment).await?);
    }

    Ok(Json(CommentListResponse {
        items,
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }))
}

/// Comment on a review
///
/// POST /api/v1/titles/{title_id}/reviews/{review_id}/comments
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 404, description = "Unknown title or review, or mismatched chain", body = ApiErrorResponse)
    ),
    tag = "comments"
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(current): Extension<CurrentUser>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.comments, &actor, ResourceAction::Create)?;

    let author = require_user(&current)?;

    let comment = CommentStore::new(&state.db)
        .create(title_id, review_id, &author.id, &request.text)
        .await?;

    let response = comment_response(&state.db, comment).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Retrieve a comment through its full parent chain
///
/// GET /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier"),
        ("comment_id" = i64, Path, description = "Comment identifier")
    ),
    responses(
        (status = 200, description = "Comment retrieved", body = CommentResponse),
        (status = 404, description = "Any link of the chain missing or mismatched", body = ApiErrorResponse)
    ),
    tag = "comments"
)]
pub async fn get_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.comments, &actor, ResourceAction::Retrieve)?;

    let comment = CommentStore::new(&state.db)
        .get(title_id, review_id, comment_id)
        .await?;
    let response = comment_response(&state.db, comment).await?;
    Ok(Json(response))
}

/// Update a comment (author, moderator, or admin)
///
/// PATCH /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier"),
        ("comment_id" = i64, Path, description = "Comment identifier")
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the author, a moderator, or an admin", body = ApiErrorResponse),
        (status = 404, description = "Any link of the chain missing or mismatched", body = ApiErrorResponse)
    ),
    tag = "comments"
)]
pub async fn patch_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    Json(request): Json<UpdateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.comments, &actor, ResourceAction::PartialUpdate)?;

    let store = CommentStore::new(&state.db);
    let comment = store.get(title_id, review_id, comment_id).await?;
    enforce_object(
        &state.policies.comments,
        &actor,
        ResourceAction::PartialUpdate,
        &comment,
    )?;

    let text = request.text.unwrap_or_else(|| comment.text.clone());
    let updated = store
        .update(title_id, review_id, comment_id, &text)
        .await?;

    let response = comment_response(&state.db, updated).await?;
    Ok(Json(response))
}

/// Delete a comment (author, moderator, or admin)
///
/// DELETE /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title identifier"),
        ("review_id" = i64, Path, description = "Review identifier"),
        ("comment_id" = i64, Path, description = "Comment identifier")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the author, a moderator, or an admin", body = ApiErrorResponse),
        (status = 404, description = "Any link of the chain missing or mismatched", body = ApiErrorResponse)
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    enforce_request(&state.policies.comments, &actor, ResourceAction::Destroy)?;

    let store = CommentStore::new(&state.db);
    let comment = store.get(title_id, review_id, comment_id).await?;
    enforce_object(
        &state.policies.comments,
        &actor,
        ResourceAction::Destroy,
        &comment,
    )?;

    store.delete(title_id, review_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
