use std::collections::BTreeSet;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::time::bson_to_iso;

/// A graded or pending answer to one assignment. Appended on submit and
/// immutable afterwards except for score/feedback/graded_at, which a coach
/// grading action overwrites as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: String,
    pub assignment_id: ObjectId,
    pub submitted_at: mongodb::bson::DateTime,
    #[serde(default)]
    pub selected_options: Option<Vec<Option<u32>>>,
    #[serde(default)]
    pub answers: Option<Vec<String>>,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub graded_at: Option<mongodb::bson::DateTime>,
}

/// One record per (learner, course) pair, enforced by a unique index.
/// Completion collections are sets so re-completing a resource is a
/// structural no-op.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub learner_id: String,
    pub course_id: ObjectId,
    pub enrolled_at: mongodb::bson::DateTime,
    #[serde(default)]
    pub completed_at: Option<mongodb::bson::DateTime>,
    #[serde(default)]
    pub completed_videos: BTreeSet<String>,
    #[serde(default)]
    pub completed_documents: BTreeSet<String>,
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
}

impl ProgressDocument {
    pub fn completed_resources(&self) -> usize {
        self.completed_videos.len() + self.completed_documents.len()
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub id: String,
    pub assignment_id: String,
    pub submitted_at: String,
    pub selected_options: Option<Vec<Option<u32>>>,
    pub answers: Option<Vec<String>>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub graded_at: Option<String>,
}

impl SubmissionView {
    pub fn from_record(record: &SubmissionRecord) -> Self {
        Self {
            id: record.id.clone(),
            assignment_id: record.assignment_id.to_hex(),
            submitted_at: bson_to_iso(&record.submitted_at),
            selected_options: record.selected_options.clone(),
            answers: record.answers.clone(),
            score: record.score,
            feedback: record.feedback.clone(),
            graded_at: record.graded_at.as_ref().map(bson_to_iso),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub id: String,
    pub course_id: String,
    pub enrolled_at: String,
    pub completed_at: Option<String>,
    pub percent: i32,
    pub completed_videos: Vec<String>,
    pub completed_documents: Vec<String>,
    pub submissions: Vec<SubmissionView>,
}

impl ProgressView {
    pub fn from_doc(doc: &ProgressDocument, percent: i32) -> Self {
        Self {
            id: doc.id.to_hex(),
            course_id: doc.course_id.to_hex(),
            enrolled_at: bson_to_iso(&doc.enrolled_at),
            completed_at: doc.completed_at.as_ref().map(bson_to_iso),
            percent,
            completed_videos: doc.completed_videos.iter().cloned().collect(),
            completed_documents: doc.completed_documents.iter().cloned().collect(),
            submissions: doc.submissions.iter().map(SubmissionView::from_record).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkResourceCompleteRequest {
    pub resource_id: String,
    pub kind: super::course::ResourceKind,
}

/// Body of a submission POST. Which field is required depends on the
/// assignment kind: `selected_options` for MCQ, `answers` for subjective.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub selected_options: Option<Vec<Option<u32>>>,
    #[serde(default)]
    pub answers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GradeSubmissionRequest {
    #[validate(range(min = 0, max = 100))]
    pub score: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission: SubmissionView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime as BsonDateTime};

    #[test]
    fn progress_document_defaults_empty_collections() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "learner_id": "learner-1",
            "course_id": ObjectId::new(),
            "enrolled_at": BsonDateTime::now(),
        };

        let parsed: ProgressDocument =
            mongodb::bson::from_document(doc).expect("progress should deserialize");
        assert!(parsed.completed_videos.is_empty());
        assert!(parsed.completed_documents.is_empty());
        assert!(parsed.submissions.is_empty());
        assert!(parsed.completed_at.is_none());
        assert_eq!(parsed.completed_resources(), 0);
    }

    #[test]
    fn completion_sets_deduplicate_inserts() {
        let mut progress = ProgressDocument {
            id: ObjectId::new(),
            learner_id: "learner-1".to_string(),
            course_id: ObjectId::new(),
            enrolled_at: BsonDateTime::now(),
            completed_at: None,
            completed_videos: BTreeSet::new(),
            completed_documents: BTreeSet::new(),
            submissions: Vec::new(),
        };

        progress.completed_videos.insert("r1".to_string());
        progress.completed_videos.insert("r1".to_string());
        progress.completed_documents.insert("r2".to_string());

        assert_eq!(progress.completed_resources(), 2);
    }

    #[test]
    fn submission_record_round_trips_through_bson() {
        let record = SubmissionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            assignment_id: ObjectId::new(),
            submitted_at: BsonDateTime::now(),
            selected_options: Some(vec![Some(1), None, Some(3)]),
            answers: None,
            score: Some(67),
            feedback: None,
            graded_at: None,
        };

        let bson = mongodb::bson::to_document(&record).unwrap();
        let parsed: SubmissionRecord = mongodb::bson::from_document(bson).unwrap();
        assert_eq!(parsed.id, record.id);
        assert_eq!(parsed.selected_options, Some(vec![Some(1), None, Some(3)]));
        assert_eq!(parsed.score, Some(67));
    }
}
