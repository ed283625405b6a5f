use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod policies;
pub mod server;

// Re-export server functions for convenience
pub use server::{spawn_server, start_server, ApiConfig};

use policies::Policies;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<database::Database>,
    pub tokens: Arc<user::TokenManager>,
    pub signup: Arc<user::SignupManager>,
    pub policies: Arc<Policies>,
}

impl AppState {
    pub fn new(
        db: Arc<database::Database>,
        tokens: user::TokenManager,
        signup: user::SignupManager,
    ) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
            signup: Arc::new(signup),
            policies: Arc::new(Policies::new()),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::token,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::patch_user,
        handlers::users::delete_user,
        handlers::users::me,
        handlers::users::patch_me,
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_genres,
        handlers::catalog::create_genre,
        handlers::catalog::delete_genre,
        handlers::catalog::list_titles,
        handlers::catalog::create_title,
        handlers::catalog::get_title,
        handlers::catalog::patch_title,
        handlers::catalog::delete_title,
        handlers::reviews::list_reviews,
        handlers::reviews::create_review,
        handlers::reviews::get_review,
        handlers::reviews::patch_review,
        handlers::reviews::delete_review,
        handlers::reviews::list_comments,
        handlers::reviews::create_comment,
        handlers::reviews::get_comment,
        handlers::reviews::patch_comment,
        handlers::reviews::delete_comment,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::SignupRequest,
            models::SignupResponse,
            models::TokenRequest,
            models::TokenResponse,
            models::UserResponse,
            models::UserListResponse,
            models::CreateUserRequest,
            models::UpdateUserRequest,
            models::UpdateProfileRequest,
            models::TermResponse,
            models::TermListResponse,
            models::CreateTermRequest,
            models::TitleResponse,
            models::TitleListResponse,
            models::CreateTitleRequest,
            models::UpdateTitleRequest,
            models::ReviewResponse,
            models::ReviewListResponse,
            models::CreateReviewRequest,
            models::UpdateReviewRequest,
            models::CommentResponse,
            models::CommentListResponse,
            models::CreateCommentRequest,
            models::UpdateCommentRequest,
            models::HealthResponse,
            models::DatabaseHealth,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    tags(
        (name = "auth", description = "Signup and token exchange"),
        (name = "users", description = "Account management and self-profile"),
        (name = "catalog", description = "Categories, genres, and titles"),
        (name = "reviews", description = "Reviews nested under titles"),
        (name = "comments", description = "Comments nested under reviews"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Marginalia API",
        version = "1.0.0",
        description = "RESTful API for the Marginalia review platform",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // API v1 routes
    let api_v1 = Router::new()
        // Signup & token exchange
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/token", post(handlers::auth::token))
        // Self-profile; the static segment wins over /users/:username
        .route(
            "/users/me",
            get(handlers::users::me).patch(handlers::users::patch_me),
        )
        // Admin user management
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:username",
            get(handlers::users::get_user)
                .patch(handlers::users::patch_user)
                .delete(handlers::users::delete_user),
        )
        // Catalog
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route("/categories/:slug", delete(handlers::catalog::delete_category))
        .route(
            "/genres",
            get(handlers::catalog::list_genres).post(handlers::catalog::create_genre),
        )
        .route("/genres/:slug", delete(handlers::catalog::delete_genre))
        .route(
            "/titles",
            get(handlers::catalog::list_titles).post(handlers::catalog::create_title),
        )
        .route(
            "/titles/:title_id",
            get(handlers::catalog::get_title)
                .patch(handlers::catalog::patch_title)
                .delete(handlers::catalog::delete_title),
        )
        // Reviews nested under titles
        .route(
            "/titles/:title_id/reviews",
            get(handlers::reviews::list_reviews).post(handlers::reviews::create_review),
        )
        .route(
            "/titles/:title_id/reviews/:review_id",
            get(handlers::reviews::get_review)
                .patch(handlers::reviews::patch_review)
                .delete(handlers::reviews::delete_review),
        )
        // Comments nested under reviews
        .route(
            "/titles/:title_id/reviews/:review_id/comments",
            get(handlers::reviews::list_comments).post(handlers::reviews::create_comment),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/comments/:comment_id",
            get(handlers::reviews::get_comment)
                .patch(handlers::reviews::patch_comment)
                .delete(handlers::reviews::delete_comment),
        )
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Resolve the actor before any handler runs
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::authentication_middleware,
        ));

    // Main router
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
