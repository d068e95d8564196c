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
use crate::models::course::{
    CourseCreateRequest, CourseDetail, CourseSummary, CourseUpdateRequest,
};
use crate::services::{course_service::CourseService, AppState};

use super::ensure_coach;

pub async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    let courses = CourseService::new(state.mongo.clone()).list().await?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = CourseService::new(state.mongo.clone()).get(&course_id).await?;
    Ok(Json(course))
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<CourseCreateRequest>,
) -> Result<(StatusCode, Json<CourseDetail>), ApiError> {
    ensure_coach(&user)?;
    payload.validate()?;

    let course = CourseService::new(state.mongo.clone())
        .create(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    AppJson(payload): AppJson<CourseUpdateRequest>,
) -> Result<Json<CourseDetail>, ApiError> {
    ensure_coach(&user)?;
    payload.validate()?;

    let course = CourseService::new(state.mongo.clone())
        .update(&user, &course_id, payload)
        .await?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_coach(&user)?;

    CourseService::new(state.mongo.clone())
        .delete(&user, &course_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
