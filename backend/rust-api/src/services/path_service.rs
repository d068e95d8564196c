use std::collections::HashMap;

use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};
use mongodb::{options::FindOptions, Collection, Database};

use crate::errors::{is_duplicate_key, ApiError};
use crate::middlewares::auth::AuthUser;
use crate::models::path::{
    MyPathView, PathCourseProgress, PathCreateRequest, PathDocument, PathEnrollmentDocument,
    PathProgressDetail, PathSummary, PathUpdateRequest,
};
use crate::models::{CourseDocument, ProgressDocument};
use crate::services::grader::percent;
use crate::services::progress_service::course_progress_percent;
use crate::utils::parse_object_id;
use crate::utils::time::bson_to_iso;

/// Path-level percentage from per-course (total, completed) resource
/// counts. Courses without a Progress record contribute (total, 0).
pub fn aggregate_path_percent(rows: &[(usize, usize)]) -> i32 {
    let total: usize = rows.iter().map(|(total, _)| total).sum();
    let completed: usize = rows.iter().map(|(_, completed)| completed).sum();
    percent(completed, total)
}

pub struct PathService {
    mongo: Database,
}

impl PathService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<PathDocument> {
        self.mongo.collection("paths")
    }

    fn enrollments(&self) -> Collection<PathEnrollmentDocument> {
        self.mongo.collection("path_enrollments")
    }

    fn courses(&self) -> Collection<CourseDocument> {
        self.mongo.collection("courses")
    }

    fn progress(&self) -> Collection<ProgressDocument> {
        self.mongo.collection("progress")
    }

    pub async fn create(
        &self,
        coach: &AuthUser,
        req: PathCreateRequest,
    ) -> Result<PathSummary, ApiError> {
        let course_ids = self.parse_and_verify_courses(&req.course_ids).await?;

        let now = BsonDateTime::now();
        let path = PathDocument {
            id: ObjectId::new(),
            title: req.title,
            description: req.description,
            coach_id: coach.id.clone(),
            course_ids,
            created_at: now,
            updated_at: now,
        };

        self.collection().insert_one(&path).await?;
        tracing::info!("Path {} created by coach {}", path.id.to_hex(), coach.id);

        Ok(PathSummary::from_doc(&path))
    }

    pub async fn get(&self, path_id: &str) -> Result<PathSummary, ApiError> {
        let path = self.find_path(path_id).await?;
        Ok(PathSummary::from_doc(&path))
    }

    pub async fn update(
        &self,
        coach: &AuthUser,
        path_id: &str,
        req: PathUpdateRequest,
    ) -> Result<PathSummary, ApiError> {
        let path = self.find_path(path_id).await?;
        if path.coach_id != coach.id {
            return Err(ApiError::forbidden("You do not own this path"));
        }

        let mut set = doc! { "updatedAt": BsonDateTime::now() };
        if let Some(title) = req.title {
            set.insert("title", title);
        }
        if let Some(description) = req.description {
            set.insert("description", description);
        }
        if let Some(ids) = req.course_ids {
            let course_ids = self.parse_and_verify_courses(&ids).await?;
            let ids_bson = to_bson(&course_ids)
                .map_err(|e| ApiError::internal(format!("Encode failed: {}", e)))?;
            set.insert("course_ids", ids_bson);
        }

        self.collection()
            .update_one(doc! { "_id": path.id }, doc! { "$set": set })
            .await?;

        self.get(path_id).await
    }

    pub async fn delete(&self, coach: &AuthUser, path_id: &str) -> Result<(), ApiError> {
        let path = self.find_path(path_id).await?;
        if path.coach_id != coach.id {
            return Err(ApiError::forbidden("You do not own this path"));
        }

        self.collection().delete_one(doc! { "_id": path.id }).await?;
        tracing::info!("Path {} deleted by coach {}", path.id.to_hex(), coach.id);
        Ok(())
    }

    /// Explicit start-path action. Does not enroll the learner in any of
    /// the member courses.
    pub async fn start_path(&self, learner: &AuthUser, path_id: &str) -> Result<PathSummary, ApiError> {
        let path = self.find_path(path_id).await?;

        let enrollment = PathEnrollmentDocument {
            id: ObjectId::new(),
            learner_id: learner.id.clone(),
            path_id: path.id,
            started_at: BsonDateTime::now(),
            completed_at: None,
        };

        if let Err(err) = self.enrollments().insert_one(&enrollment).await {
            if is_duplicate_key(&err) {
                return Err(ApiError::conflict("Path already started"));
            }
            return Err(err.into());
        }

        tracing::info!("Learner {} started path {}", learner.id, path.id.to_hex());
        Ok(PathSummary::from_doc(&path))
    }

    /// Every path the learner has started, most recently started first,
    /// with aggregates recomputed from current Progress state.
    pub async fn list_my_paths(&self, learner: &AuthUser) -> Result<Vec<MyPathView>, ApiError> {
        let options = FindOptions::builder().sort(doc! { "started_at": -1 }).build();
        let mut cursor = self
            .enrollments()
            .find(doc! { "learner_id": &learner.id })
            .with_options(options)
            .await?;

        let mut enrollments = Vec::new();
        while let Some(enrollment) = cursor.try_next().await? {
            enrollments.push(enrollment);
        }

        let mut views = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let Some(path) = self
                .collection()
                .find_one(doc! { "_id": enrollment.path_id })
                .await?
            else {
                // Path deleted after the learner started it; nothing to show.
                continue;
            };

            let rollup = self.rollup(learner, &path).await?;
            views.push(MyPathView {
                path: PathSummary::from_doc(&path),
                started_at: bson_to_iso(&enrollment.started_at),
                completed_at: enrollment.completed_at.as_ref().map(bson_to_iso),
                percent: rollup.percent,
                courses_completed: rollup.courses_completed,
                course_count: path.course_ids.len(),
            });
        }

        Ok(views)
    }

    /// Per-course breakdown in path order. Requires the learner to have
    /// started the path.
    pub async fn path_progress_detail(
        &self,
        learner: &AuthUser,
        path_id: &str,
    ) -> Result<PathProgressDetail, ApiError> {
        let path = self.find_path(path_id).await?;

        let enrollment = self
            .enrollments()
            .find_one(doc! { "learner_id": &learner.id, "path_id": path.id })
            .await?
            .ok_or_else(|| ApiError::not_found("Path not started"))?;

        let rollup = self.rollup(learner, &path).await?;

        Ok(PathProgressDetail {
            path_id: path.id.to_hex(),
            title: path.title.clone(),
            started_at: bson_to_iso(&enrollment.started_at),
            percent: rollup.percent,
            courses_completed: rollup.courses_completed,
            courses: rollup.courses,
        })
    }

    async fn rollup(&self, learner: &AuthUser, path: &PathDocument) -> Result<PathRollup, ApiError> {
        let courses = self.load_courses(&path.course_ids).await?;
        let progress_map = self.load_progress(learner, &path.course_ids).await?;

        let mut rows = Vec::new();
        let mut course_views = Vec::new();
        let mut courses_completed = 0;

        for course_id in &path.course_ids {
            let Some(course) = courses.get(course_id) else {
                continue;
            };
            let progress = progress_map.get(course_id);

            let total = course.total_resources();
            let completed = progress.map(|p| p.completed_resources()).unwrap_or(0);
            rows.push((total, completed));

            let completed_at = progress.and_then(|p| p.completed_at.as_ref());
            if completed_at.is_some() {
                courses_completed += 1;
            }

            course_views.push(PathCourseProgress {
                course_id: course_id.to_hex(),
                title: course.title.clone(),
                percent: progress
                    .map(|p| course_progress_percent(p, course))
                    .unwrap_or(0),
                completed_at: completed_at.map(bson_to_iso),
            });
        }

        Ok(PathRollup {
            percent: aggregate_path_percent(&rows),
            courses_completed,
            courses: course_views,
        })
    }

    async fn load_courses(
        &self,
        course_ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, CourseDocument>, ApiError> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut cursor = self
            .courses()
            .find(doc! { "_id": { "$in": course_ids.to_vec() } })
            .await?;

        let mut courses = HashMap::new();
        while let Some(course) = cursor.try_next().await? {
            courses.insert(course.id, course);
        }
        Ok(courses)
    }

    async fn load_progress(
        &self,
        learner: &AuthUser,
        course_ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, ProgressDocument>, ApiError> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut cursor = self
            .progress()
            .find(doc! {
                "learner_id": &learner.id,
                "course_id": { "$in": course_ids.to_vec() }
            })
            .await?;

        let mut progress = HashMap::new();
        while let Some(record) = cursor.try_next().await? {
            progress.insert(record.course_id, record);
        }
        Ok(progress)
    }

    async fn parse_and_verify_courses(&self, ids: &[String]) -> Result<Vec<ObjectId>, ApiError> {
        let course_ids = ids
            .iter()
            .map(|id| parse_object_id(id, "course"))
            .collect::<Result<Vec<_>, _>>()?;

        if !course_ids.is_empty() {
            let found = self
                .courses()
                .count_documents(doc! { "_id": { "$in": course_ids.clone() } })
                .await?;
            if found as usize != course_ids.len() {
                return Err(ApiError::validation(
                    "Path references one or more unknown courses",
                ));
            }
        }

        Ok(course_ids)
    }

    pub async fn find_path(&self, path_id: &str) -> Result<PathDocument, ApiError> {
        let oid = parse_object_id(path_id, "path")?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Path not found"))
    }
}

struct PathRollup {
    percent: i32,
    courses_completed: usize,
    courses: Vec<PathCourseProgress>,
}
