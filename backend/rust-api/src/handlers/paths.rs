use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::errors::ApiError;
use crate::extractors::AppJson;
use crate::middlewares::auth::AuthUser;
use crate::models::path::{
    MyPathView, PathCreateRequest, PathProgressDetail, PathSummary, PathUpdateRequest,
};
use crate::services::{path_service::PathService, AppState};

use super::{ensure_coach, ensure_student};

pub async fn create_path(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<PathCreateRequest>,
) -> Result<(StatusCode, Json<PathSummary>), ApiError> {
    ensure_coach(&user)?;
    payload.validate()?;

    let path = PathService::new(state.mongo.clone())
        .create(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(path)))
}

pub async fn get_path(
    State(state): State<Arc<AppState>>,
    Path(path_id): Path<String>,
) -> Result<Json<PathSummary>, ApiError> {
    let path = PathService::new(state.mongo.clone()).get(&path_id).await?;
    Ok(Json(path))
}

pub async fn update_path(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(path_id): Path<String>,
    AppJson(payload): AppJson<PathUpdateRequest>,
) -> Result<Json<PathSummary>, ApiError> {
    ensure_coach(&user)?;
    payload.validate()?;

    let path = PathService::new(state.mongo.clone())
        .update(&user, &path_id, payload)
        .await?;
    Ok(Json(path))
}

pub async fn delete_path(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(path_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_coach(&user)?;

    PathService::new(state.mongo.clone())
        .delete(&user, &path_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start_path(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(path_id): Path<String>,
) -> Result<(StatusCode, Json<PathSummary>), ApiError> {
    ensure_student(&user)?;

    let path = PathService::new(state.mongo.clone())
        .start_path(&user, &path_id)
        .await?;
    Ok((StatusCode::CREATED, Json(path)))
}

pub async fn list_my_paths(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MyPathView>>, ApiError> {
    let paths = PathService::new(state.mongo.clone())
        .list_my_paths(&user)
        .await?;
    Ok(Json(paths))
}

pub async fn path_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(path_id): Path<String>,
) -> Result<Json<PathProgressDetail>, ApiError> {
    let detail = PathService::new(state.mongo.clone())
        .path_progress_detail(&user, &path_id)
        .await?;
    Ok(Json(detail))
}
