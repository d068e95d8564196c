use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::time::bson_to_iso;

/// An ordered, coach-curated list of courses.
#[derive(Debug, Serialize, Deserialize)]
pub struct PathDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub coach_id: String,
    #[serde(default)]
    pub course_ids: Vec<ObjectId>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: mongodb::bson::DateTime,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: mongodb::bson::DateTime,
}

/// One record per (learner, path) pair, enforced by a unique index.
/// Created only by the explicit start-path action.
#[derive(Debug, Serialize, Deserialize)]
pub struct PathEnrollmentDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub learner_id: String,
    pub path_id: ObjectId,
    pub started_at: mongodb::bson::DateTime,
    #[serde(default)]
    pub completed_at: Option<mongodb::bson::DateTime>,
}

#[derive(Debug, Serialize)]
pub struct PathSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub coach_id: String,
    pub course_ids: Vec<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl PathSummary {
    pub fn from_doc(doc: &PathDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            coach_id: doc.coach_id.clone(),
            course_ids: doc.course_ids.iter().map(|id| id.to_hex()).collect(),
            updated_at: bson_to_iso(&doc.updated_at),
        }
    }
}

/// Entry in the learner's "my paths" listing: the path plus aggregates
/// recomputed on demand from the per-course Progress records.
#[derive(Debug, Serialize)]
pub struct MyPathView {
    pub path: PathSummary,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub percent: i32,
    pub courses_completed: usize,
    pub course_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PathCourseProgress {
    pub course_id: String,
    pub title: String,
    pub percent: i32,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PathProgressDetail {
    pub path_id: String,
    pub title: String,
    pub started_at: String,
    pub percent: i32,
    pub courses_completed: usize,
    pub courses: Vec<PathCourseProgress>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PathCreateRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    pub course_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PathUpdateRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default)]
    pub course_ids: Option<Vec<String>>,
}
