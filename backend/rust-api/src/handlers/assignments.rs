use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::errors::ApiError;
use crate::extractors::AppJson;
use crate::middlewares::auth::{AuthUser, Role};
use crate::models::assignment::{
    AssignmentCreateRequest, AssignmentDetail, AssignmentLearnerView, AssignmentUpdateRequest,
};
use crate::services::{assignment_service::AssignmentService, AppState};

use super::ensure_coach;

pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<AssignmentCreateRequest>,
) -> Result<(StatusCode, Json<AssignmentDetail>), ApiError> {
    ensure_coach(&user)?;
    payload.validate()?;

    let assignment = AssignmentService::new(state.mongo.clone())
        .create(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// The owning coach sees the full document, answer key included; everyone
/// else gets the redacted learner view.
pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(assignment_id): Path<String>,
) -> Result<Response, ApiError> {
    let (assignment, course) = AssignmentService::new(state.mongo.clone())
        .get_with_course(&assignment_id)
        .await?;

    if user.role == Role::Coach && course.coach_id == user.id {
        return Ok(Json(AssignmentDetail::from_doc(&assignment)).into_response());
    }
    Ok(Json(AssignmentLearnerView::from_doc(&assignment)).into_response())
}

pub async fn update_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(assignment_id): Path<String>,
    AppJson(payload): AppJson<AssignmentUpdateRequest>,
) -> Result<Json<AssignmentDetail>, ApiError> {
    ensure_coach(&user)?;
    payload.validate()?;

    let assignment = AssignmentService::new(state.mongo.clone())
        .update(&user, &assignment_id, payload)
        .await?;
    Ok(Json(assignment))
}

pub async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(assignment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_coach(&user)?;

    AssignmentService::new(state.mongo.clone())
        .delete(&user, &assignment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
