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
use crate::models::progress::{
    GradeSubmissionRequest, MarkResourceCompleteRequest, ProgressView, SubmissionView,
    SubmitRequest, SubmitResponse,
};
use crate::services::{progress_service::ProgressService, AppState};

use super::{ensure_coach, ensure_student};

pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<(StatusCode, Json<ProgressView>), ApiError> {
    ensure_student(&user)?;

    let progress = ProgressService::new(state.mongo.clone())
        .enroll(&user, &course_id)
        .await?;
    Ok((StatusCode::CREATED, Json(progress)))
}

pub async fn mark_resource_complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, resource_id)): Path<(String, String)>,
    AppJson(payload): AppJson<MarkKindPayload>,
) -> Result<Json<ProgressView>, ApiError> {
    ensure_student(&user)?;

    let progress = ProgressService::new(state.mongo.clone())
        .mark_resource_complete(
            &user,
            &course_id,
            MarkResourceCompleteRequest {
                resource_id,
                kind: payload.kind,
            },
        )
        .await?;
    Ok(Json(progress))
}

#[derive(Debug, serde::Deserialize)]
pub struct MarkKindPayload {
    pub kind: crate::models::ResourceKind,
}

pub async fn mark_course_complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<Json<ProgressView>, ApiError> {
    ensure_student(&user)?;

    let progress = ProgressService::new(state.mongo.clone())
        .mark_course_complete(&user, &course_id)
        .await?;
    Ok(Json(progress))
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<Json<ProgressView>, ApiError> {
    let progress = ProgressService::new(state.mongo.clone())
        .get(&user, &course_id)
        .await?;
    Ok(Json(progress))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(assignment_id): Path<String>,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    ensure_student(&user)?;

    let response = ProgressService::new(state.mongo.clone())
        .submit(&user, &assignment_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn grade_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((progress_id, submission_id)): Path<(String, String)>,
    AppJson(payload): AppJson<GradeSubmissionRequest>,
) -> Result<Json<SubmissionView>, ApiError> {
    ensure_coach(&user)?;
    payload.validate()?;

    let submission = ProgressService::new(state.mongo.clone())
        .grade_submission(&user, &progress_id, &submission_id, payload)
        .await?;
    Ok(Json(submission))
}
