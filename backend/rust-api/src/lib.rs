use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Everything under /api/v1 requires a verified OIDC bearer token
        .nest(
            "/api/v1",
            api_routes().layer(cors).layer(middleware::from_fn_with_state(
                app_state.clone(),
                middlewares::auth::auth_middleware,
            )),
        )
        .with_state(app_state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<std::sync::Arc<services::AppState>> {
    course_routes()
        .merge(assignment_routes())
        .merge(progress_routes())
        .merge(path_routes())
        .merge(comment_routes())
}

fn course_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/courses",
            get(handlers::courses::list_courses).post(handlers::courses::create_course),
        )
        .route(
            "/courses/{id}",
            get(handlers::courses::get_course)
                .put(handlers::courses::update_course)
                .delete(handlers::courses::delete_course),
        )
}

fn assignment_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/assignments", post(handlers::assignments::create_assignment))
        .route(
            "/assignments/{id}",
            get(handlers::assignments::get_assignment)
                .put(handlers::assignments::update_assignment)
                .delete(handlers::assignments::delete_assignment),
        )
}

fn progress_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/courses/{id}/enroll", post(handlers::progress::enroll))
        .route(
            "/courses/{id}/resources/{resource_id}/complete",
            post(handlers::progress::mark_resource_complete),
        )
        .route(
            "/courses/{id}/complete",
            post(handlers::progress::mark_course_complete),
        )
        .route("/courses/{id}/progress", get(handlers::progress::get_progress))
        .route(
            "/assignments/{id}/submissions",
            post(handlers::progress::submit),
        )
        .route(
            "/progress/{id}/submissions/{submission_id}/grade",
            post(handlers::progress::grade_submission),
        )
}

fn path_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/paths", post(handlers::paths::create_path))
        .route("/paths/my", get(handlers::paths::list_my_paths))
        .route(
            "/paths/{id}",
            get(handlers::paths::get_path)
                .put(handlers::paths::update_path)
                .delete(handlers::paths::delete_path),
        )
        .route("/paths/{id}/start", post(handlers::paths::start_path))
        .route("/paths/{id}/progress", get(handlers::paths::path_progress))
}

fn comment_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/courses/{id}/comments",
            get(handlers::comments::list_comments).post(handlers::comments::create_comment),
        )
        .route(
            "/comments/{id}",
            axum::routing::put(handlers::comments::update_comment)
                .delete(handlers::comments::delete_comment),
        )
}
