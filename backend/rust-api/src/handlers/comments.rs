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
use crate::models::comment::{CommentCreateRequest, CommentUpdateRequest, CommentView};
use crate::services::{comment_service::CommentService, AppState};

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let comments = CommentService::new(state.mongo.clone())
        .list(&course_id)
        .await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    AppJson(payload): AppJson<CommentCreateRequest>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    payload.validate()?;

    let comment = CommentService::new(state.mongo.clone())
        .create(&user, &course_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(comment_id): Path<String>,
    AppJson(payload): AppJson<CommentUpdateRequest>,
) -> Result<Json<CommentView>, ApiError> {
    payload.validate()?;

    let comment = CommentService::new(state.mongo.clone())
        .update(&user, &comment_id, payload)
        .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    CommentService::new(state.mongo.clone())
        .delete(&user, &comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
