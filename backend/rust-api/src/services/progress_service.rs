use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};
use mongodb::{Collection, Database};
use uuid::Uuid;

use crate::errors::{is_duplicate_key, ApiError};
use crate::middlewares::auth::AuthUser;
use crate::models::assignment::AssignmentKind;
use crate::models::progress::{
    GradeSubmissionRequest, MarkResourceCompleteRequest, ProgressDocument, ProgressView,
    SubmissionRecord, SubmissionView, SubmitRequest, SubmitResponse,
};
use crate::models::{CourseDocument, ResourceKind};
use crate::services::grader::{grade_mcq, percent};
use crate::utils::parse_object_id;

use super::assignment_service::AssignmentService;
use super::course_service::CourseService;

/// Completed resources over the course's total resource count, rounded.
/// Zero-resource courses report 0, never a division error.
pub fn course_progress_percent(progress: &ProgressDocument, course: &CourseDocument) -> i32 {
    percent(progress.completed_resources(), course.total_resources())
}

pub struct ProgressService {
    mongo: Database,
}

impl ProgressService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<ProgressDocument> {
        self.mongo.collection("progress")
    }

    pub async fn enroll(&self, learner: &AuthUser, course_id: &str) -> Result<ProgressView, ApiError> {
        let course = CourseService::new(self.mongo.clone())
            .find_course(course_id)
            .await?;

        let progress = ProgressDocument {
            id: ObjectId::new(),
            learner_id: learner.id.clone(),
            course_id: course.id,
            enrolled_at: BsonDateTime::now(),
            completed_at: None,
            completed_videos: Default::default(),
            completed_documents: Default::default(),
            submissions: Vec::new(),
        };

        // The unique (learner_id, course_id) index turns a concurrent or
        // repeated enroll into a clean duplicate-key failure.
        if let Err(err) = self.collection().insert_one(&progress).await {
            if is_duplicate_key(&err) {
                return Err(ApiError::conflict("Already enrolled in this course"));
            }
            return Err(err.into());
        }

        tracing::info!(
            "Learner {} enrolled in course {}",
            learner.id,
            course.id.to_hex()
        );

        Ok(ProgressView::from_doc(
            &progress,
            course_progress_percent(&progress, &course),
        ))
    }

    pub async fn mark_resource_complete(
        &self,
        learner: &AuthUser,
        course_id: &str,
        req: MarkResourceCompleteRequest,
    ) -> Result<ProgressView, ApiError> {
        let course = CourseService::new(self.mongo.clone())
            .find_course(course_id)
            .await?;

        ensure_resource_in_course(&course, &req.resource_id, req.kind)?;

        let field = match req.kind {
            ResourceKind::Video => "completed_videos",
            ResourceKind::Document => "completed_documents",
        };

        // $addToSet keeps the completion idempotent; re-completing an
        // already-done resource is a success no-op.
        let result = self
            .collection()
            .update_one(
                doc! { "learner_id": &learner.id, "course_id": course.id },
                doc! { "$addToSet": { field: &req.resource_id } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::not_found("Not enrolled in this course"));
        }

        self.view(learner, &course).await
    }

    /// Explicit course-completion marking. `completed_at` is never derived
    /// from the percentage reaching 100.
    pub async fn mark_course_complete(
        &self,
        learner: &AuthUser,
        course_id: &str,
    ) -> Result<ProgressView, ApiError> {
        let course = CourseService::new(self.mongo.clone())
            .find_course(course_id)
            .await?;

        let result = self
            .collection()
            .update_one(
                doc! { "learner_id": &learner.id, "course_id": course.id },
                doc! { "$set": { "completed_at": BsonDateTime::now() } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::not_found("Not enrolled in this course"));
        }

        self.view(learner, &course).await
    }

    pub async fn get(&self, learner: &AuthUser, course_id: &str) -> Result<ProgressView, ApiError> {
        let course = CourseService::new(self.mongo.clone())
            .find_course(course_id)
            .await?;
        self.view(learner, &course).await
    }

    pub async fn submit(
        &self,
        learner: &AuthUser,
        assignment_id: &str,
        req: SubmitRequest,
    ) -> Result<SubmitResponse, ApiError> {
        let assignment = AssignmentService::new(self.mongo.clone())
            .find_assignment(assignment_id)
            .await?;

        let progress = self
            .collection()
            .find_one(doc! { "learner_id": &learner.id, "course_id": assignment.course_id })
            .await?
            .ok_or_else(|| ApiError::not_found("Not enrolled in this course"))?;

        let submission = match assignment.kind {
            AssignmentKind::Mcq => {
                let selected = req.selected_options.ok_or_else(|| {
                    ApiError::validation("selected_options is required for an MCQ assignment")
                })?;
                let grade = grade_mcq(&assignment.mcq_questions, &selected);
                tracing::info!(
                    "Graded MCQ submission: assignment={}, learner={}, score={}",
                    assignment.id.to_hex(),
                    learner.id,
                    grade.score
                );
                SubmissionRecord {
                    id: Uuid::new_v4().to_string(),
                    assignment_id: assignment.id,
                    submitted_at: BsonDateTime::now(),
                    selected_options: Some(selected),
                    answers: None,
                    score: Some(grade.score),
                    feedback: None,
                    graded_at: None,
                }
            }
            AssignmentKind::Subjective => {
                let answers = req.answers.ok_or_else(|| {
                    ApiError::validation("answers is required for a subjective assignment")
                })?;
                enforce_word_limits(&assignment.subjective_questions, &answers)?;
                SubmissionRecord {
                    id: Uuid::new_v4().to_string(),
                    assignment_id: assignment.id,
                    submitted_at: BsonDateTime::now(),
                    selected_options: None,
                    answers: Some(answers),
                    score: None,
                    feedback: None,
                    graded_at: None,
                }
            }
        };

        let submission_bson = to_bson(&submission)
            .map_err(|e| ApiError::internal(format!("Failed to encode submission: {}", e)))?;

        // Resubmissions append; nothing is overwritten.
        self.collection()
            .update_one(
                doc! { "_id": progress.id },
                doc! { "$push": { "submissions": submission_bson } },
            )
            .await?;

        Ok(SubmitResponse {
            submission: SubmissionView::from_record(&submission),
        })
    }

    /// Coach grading. Sets score/feedback/graded_at as a unit, overwriting
    /// any prior grade (last write wins, no history).
    pub async fn grade_submission(
        &self,
        coach: &AuthUser,
        progress_id: &str,
        submission_id: &str,
        req: GradeSubmissionRequest,
    ) -> Result<SubmissionView, ApiError> {
        let progress_oid = parse_object_id(progress_id, "progress")?;
        let progress = self
            .collection()
            .find_one(doc! { "_id": progress_oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Progress record not found"))?;

        let courses: Collection<CourseDocument> = self.mongo.collection("courses");
        let course = courses
            .find_one(doc! { "_id": progress.course_id })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))?;
        if course.coach_id != coach.id {
            return Err(ApiError::forbidden(
                "Only the coach owning the course may grade submissions",
            ));
        }

        if !progress
            .submissions
            .iter()
            .any(|submission| submission.id == submission_id)
        {
            return Err(ApiError::not_found("Submission not found"));
        }

        let graded_at = BsonDateTime::now();
        self.collection()
            .update_one(
                doc! { "_id": progress.id, "submissions.id": submission_id },
                doc! { "$set": {
                    "submissions.$.score": req.score,
                    "submissions.$.feedback": &req.feedback,
                    "submissions.$.graded_at": graded_at,
                } },
            )
            .await?;

        tracing::info!(
            "Submission {} graded by coach {} (score: {:?})",
            submission_id,
            coach.id,
            req.score
        );

        let updated = self
            .collection()
            .find_one(doc! { "_id": progress.id })
            .await?
            .ok_or_else(|| ApiError::not_found("Progress record not found"))?;
        let record = updated
            .submissions
            .iter()
            .find(|submission| submission.id == submission_id)
            .ok_or_else(|| ApiError::not_found("Submission not found"))?;

        Ok(SubmissionView::from_record(record))
    }

    async fn view(
        &self,
        learner: &AuthUser,
        course: &CourseDocument,
    ) -> Result<ProgressView, ApiError> {
        let progress = self
            .collection()
            .find_one(doc! { "learner_id": &learner.id, "course_id": course.id })
            .await?
            .ok_or_else(|| ApiError::not_found("Not enrolled in this course"))?;

        Ok(ProgressView::from_doc(
            &progress,
            course_progress_percent(&progress, course),
        ))
    }
}

/// A completion may only reference a resource the course actually holds,
/// recorded under the resource's stored kind. Unknown ids or a kind
/// mismatch would let the completed count exceed the course total.
fn ensure_resource_in_course(
    course: &CourseDocument,
    resource_id: &str,
    kind: ResourceKind,
) -> Result<(), ApiError> {
    let resource = course
        .find_resource(resource_id)
        .ok_or_else(|| ApiError::not_found("Resource not found in this course"))?;
    if resource.kind != kind {
        return Err(ApiError::validation(
            "Resource kind does not match the stored resource",
        ));
    }
    Ok(())
}

fn enforce_word_limits(
    questions: &[crate::models::assignment::SubjectiveQuestion],
    answers: &[String],
) -> Result<(), ApiError> {
    for (index, question) in questions.iter().enumerate() {
        let Some(limit) = question.word_limit else {
            continue;
        };
        let Some(answer) = answers.get(index) else {
            continue;
        };
        let words = answer.split_whitespace().count();
        if words > limit as usize {
            return Err(ApiError::validation(format!(
                "Answer {} exceeds the {}-word limit ({} words)",
                index + 1,
                limit,
                words
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment::SubjectiveQuestion;
    use crate::models::course::{ModuleRecord, ResourceRecord};
    use std::collections::BTreeSet;

    fn course_with_resources(counts: &[usize]) -> CourseDocument {
        CourseDocument {
            id: ObjectId::new(),
            title: "course".to_string(),
            description: String::new(),
            coach_id: "coach".to_string(),
            modules: counts
                .iter()
                .enumerate()
                .map(|(m, count)| ModuleRecord {
                    id: format!("m{}", m),
                    title: format!("Module {}", m),
                    resources: (0..*count)
                        .map(|r| ResourceRecord {
                            id: format!("m{}r{}", m, r),
                            title: format!("Resource {}", r),
                            kind: ResourceKind::Video,
                            url: String::new(),
                        })
                        .collect(),
                    assignment_id: None,
                })
                .collect(),
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        }
    }

    fn progress_with(videos: &[&str], documents: &[&str]) -> ProgressDocument {
        ProgressDocument {
            id: ObjectId::new(),
            learner_id: "learner".to_string(),
            course_id: ObjectId::new(),
            enrolled_at: BsonDateTime::now(),
            completed_at: None,
            completed_videos: videos.iter().map(|s| s.to_string()).collect(),
            completed_documents: documents.iter().map(|s| s.to_string()).collect(),
            submissions: Vec::new(),
        }
    }

    #[test]
    fn two_videos_one_document_of_five_is_60_percent() {
        let course = course_with_resources(&[3, 2]);
        let progress = progress_with(&["m0r0", "m0r1"], &["m1r0"]);
        assert_eq!(course_progress_percent(&progress, &course), 60);
    }

    #[test]
    fn zero_resource_course_reports_zero_percent() {
        let course = course_with_resources(&[]);
        let progress = progress_with(&[], &[]);
        assert_eq!(course_progress_percent(&progress, &course), 0);
    }

    #[test]
    fn duplicate_completion_does_not_change_percent() {
        let course = course_with_resources(&[4]);
        let mut progress = progress_with(&["m0r0"], &[]);
        let before = course_progress_percent(&progress, &course);
        progress.completed_videos.insert("m0r0".to_string());
        assert_eq!(course_progress_percent(&progress, &course), before);
        assert_eq!(progress.completed_videos, BTreeSet::from(["m0r0".to_string()]));
    }

    #[test]
    fn completion_requires_a_known_resource_id() {
        let course = course_with_resources(&[1]);
        assert!(ensure_resource_in_course(&course, "m0r0", ResourceKind::Video).is_ok());
        assert!(ensure_resource_in_course(&course, "bogus-1", ResourceKind::Video).is_err());
    }

    #[test]
    fn completion_kind_must_match_the_stored_resource() {
        // Counting one real resource under both kinds would double it.
        let course = course_with_resources(&[1]);
        assert!(ensure_resource_in_course(&course, "m0r0", ResourceKind::Document).is_err());
    }

    #[test]
    fn word_limit_enforced_per_question() {
        let questions = vec![
            SubjectiveQuestion {
                prompt: "short".to_string(),
                word_limit: Some(3),
            },
            SubjectiveQuestion {
                prompt: "free".to_string(),
                word_limit: None,
            },
        ];

        let ok = vec!["three words here".to_string(), "as long as you like".to_string()];
        assert!(enforce_word_limits(&questions, &ok).is_ok());

        let too_long = vec!["this answer has too many words".to_string()];
        assert!(enforce_word_limits(&questions, &too_long).is_err());
    }
}
