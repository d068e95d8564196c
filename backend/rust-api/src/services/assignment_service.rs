use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};
use mongodb::{Collection, Database};

use crate::errors::ApiError;
use crate::middlewares::auth::AuthUser;
use crate::models::assignment::{
    ensure_questions_valid, AssignmentCreateRequest, AssignmentDetail, AssignmentDocument,
    AssignmentUpdateRequest,
};
use crate::models::CourseDocument;
use crate::utils::parse_object_id;

pub struct AssignmentService {
    mongo: Database,
}

impl AssignmentService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<AssignmentDocument> {
        self.mongo.collection("assignments")
    }

    fn courses(&self) -> Collection<CourseDocument> {
        self.mongo.collection("courses")
    }

    pub async fn create(
        &self,
        coach: &AuthUser,
        req: AssignmentCreateRequest,
    ) -> Result<AssignmentDetail, ApiError> {
        let course_id = parse_object_id(&req.course_id, "course")?;
        let course = self
            .courses()
            .find_one(doc! { "_id": course_id })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))?;
        if course.coach_id != coach.id {
            return Err(ApiError::forbidden("You do not own this course"));
        }

        ensure_questions_valid(req.kind, &req.mcq_questions, &req.subjective_questions)?;

        let now = BsonDateTime::now();
        let assignment = AssignmentDocument {
            id: ObjectId::new(),
            course_id,
            title: req.title,
            kind: req.kind,
            mcq_questions: req.mcq_questions,
            subjective_questions: req.subjective_questions,
            created_at: now,
            updated_at: now,
        };

        self.collection().insert_one(&assignment).await?;
        tracing::info!(
            "Assignment {} ({}) created for course {}",
            assignment.id.to_hex(),
            assignment.kind.as_str(),
            course_id.to_hex()
        );

        Ok(AssignmentDetail::from_doc(&assignment))
    }

    /// Returns the assignment together with its course so the handler can
    /// choose between the owner view and the redacted learner view.
    pub async fn get_with_course(
        &self,
        assignment_id: &str,
    ) -> Result<(AssignmentDocument, CourseDocument), ApiError> {
        let assignment = self.find_assignment(assignment_id).await?;
        let course = self
            .courses()
            .find_one(doc! { "_id": assignment.course_id })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))?;
        Ok((assignment, course))
    }

    pub async fn update(
        &self,
        coach: &AuthUser,
        assignment_id: &str,
        req: AssignmentUpdateRequest,
    ) -> Result<AssignmentDetail, ApiError> {
        let (assignment, course) = self.get_with_course(assignment_id).await?;
        if course.coach_id != coach.id {
            return Err(ApiError::forbidden("You do not own this course"));
        }

        let mcq = req.mcq_questions.unwrap_or_else(|| assignment.mcq_questions.clone());
        let subjective = req
            .subjective_questions
            .unwrap_or_else(|| assignment.subjective_questions.clone());
        ensure_questions_valid(assignment.kind, &mcq, &subjective)?;

        let mut set = doc! { "updatedAt": BsonDateTime::now() };
        if let Some(title) = req.title {
            set.insert("title", title);
        }
        set.insert(
            "mcq_questions",
            to_bson(&mcq).map_err(|e| ApiError::internal(format!("Encode failed: {}", e)))?,
        );
        set.insert(
            "subjective_questions",
            to_bson(&subjective)
                .map_err(|e| ApiError::internal(format!("Encode failed: {}", e)))?,
        );

        self.collection()
            .update_one(doc! { "_id": assignment.id }, doc! { "$set": set })
            .await?;

        let updated = self.find_assignment(assignment_id).await?;
        Ok(AssignmentDetail::from_doc(&updated))
    }

    pub async fn delete(&self, coach: &AuthUser, assignment_id: &str) -> Result<(), ApiError> {
        let (assignment, course) = self.get_with_course(assignment_id).await?;
        if course.coach_id != coach.id {
            return Err(ApiError::forbidden("You do not own this course"));
        }

        self.collection()
            .delete_one(doc! { "_id": assignment.id })
            .await?;
        tracing::info!("Assignment {} deleted", assignment.id.to_hex());
        Ok(())
    }

    pub async fn find_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<AssignmentDocument, ApiError> {
        let oid = parse_object_id(assignment_id, "assignment")?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Assignment not found"))
    }
}
