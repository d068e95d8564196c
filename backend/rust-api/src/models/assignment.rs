use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ApiError;
use crate::utils::time::bson_to_iso;

pub const MIN_MCQ_OPTIONS: usize = 2;
pub const MAX_MCQ_OPTIONS: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    Mcq,
    Subjective,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::Mcq => "mcq",
            AssignmentKind::Subjective => "subjective",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqQuestion {
    pub prompt: String,
    pub options: Vec<McqOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectiveQuestion {
    pub prompt: String,
    #[serde(default)]
    pub word_limit: Option<u32>,
}

/// Kind determines which question list is populated: `mcq_questions` for
/// `Mcq`, `subjective_questions` for `Subjective`; the other stays empty.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub course_id: ObjectId,
    pub title: String,
    pub kind: AssignmentKind,
    #[serde(default)]
    pub mcq_questions: Vec<McqQuestion>,
    #[serde(default)]
    pub subjective_questions: Vec<SubjectiveQuestion>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: mongodb::bson::DateTime,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: mongodb::bson::DateTime,
}

/// Full view, answer key included. Only the owning coach sees this.
#[derive(Debug, Serialize)]
pub struct AssignmentDetail {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub kind: AssignmentKind,
    pub mcq_questions: Vec<McqQuestion>,
    pub subjective_questions: Vec<SubjectiveQuestion>,
    pub created_at: String,
    pub updated_at: String,
}

impl AssignmentDetail {
    pub fn from_doc(doc: &AssignmentDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            course_id: doc.course_id.to_hex(),
            title: doc.title.clone(),
            kind: doc.kind,
            mcq_questions: doc.mcq_questions.clone(),
            subjective_questions: doc.subjective_questions.clone(),
            created_at: bson_to_iso(&doc.created_at),
            updated_at: bson_to_iso(&doc.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct McqQuestionView {
    pub prompt: String,
    pub options: Vec<String>,
}

/// Learner-facing view: option correctness flags are stripped so the
/// answer key never leaves the server.
#[derive(Debug, Serialize)]
pub struct AssignmentLearnerView {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub kind: AssignmentKind,
    pub mcq_questions: Vec<McqQuestionView>,
    pub subjective_questions: Vec<SubjectiveQuestion>,
}

impl AssignmentLearnerView {
    pub fn from_doc(doc: &AssignmentDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            course_id: doc.course_id.to_hex(),
            title: doc.title.clone(),
            kind: doc.kind,
            mcq_questions: doc
                .mcq_questions
                .iter()
                .map(|question| McqQuestionView {
                    prompt: question.prompt.clone(),
                    options: question
                        .options
                        .iter()
                        .map(|option| option.text.clone())
                        .collect(),
                })
                .collect(),
            subjective_questions: doc.subjective_questions.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignmentCreateRequest {
    pub course_id: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub kind: AssignmentKind,
    #[serde(default)]
    pub mcq_questions: Vec<McqQuestion>,
    #[serde(default)]
    pub subjective_questions: Vec<SubjectiveQuestion>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignmentUpdateRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    pub mcq_questions: Option<Vec<McqQuestion>>,
    #[serde(default)]
    pub subjective_questions: Option<Vec<SubjectiveQuestion>>,
}

pub fn ensure_questions_valid(
    kind: AssignmentKind,
    mcq_questions: &[McqQuestion],
    subjective_questions: &[SubjectiveQuestion],
) -> Result<(), ApiError> {
    match kind {
        AssignmentKind::Mcq => {
            if mcq_questions.is_empty() {
                return Err(ApiError::validation(
                    "MCQ assignment must contain at least one question",
                ));
            }
            if !subjective_questions.is_empty() {
                return Err(ApiError::validation(
                    "MCQ assignment must not carry subjective questions",
                ));
            }
            for (index, question) in mcq_questions.iter().enumerate() {
                let count = question.options.len();
                if !(MIN_MCQ_OPTIONS..=MAX_MCQ_OPTIONS).contains(&count) {
                    return Err(ApiError::validation(format!(
                        "Question {} must have between {} and {} options",
                        index + 1,
                        MIN_MCQ_OPTIONS,
                        MAX_MCQ_OPTIONS
                    )));
                }
                if !question.options.iter().any(|option| option.is_correct) {
                    return Err(ApiError::validation(format!(
                        "Question {} must mark at least one option correct",
                        index + 1
                    )));
                }
            }
        }
        AssignmentKind::Subjective => {
            if subjective_questions.is_empty() {
                return Err(ApiError::validation(
                    "Subjective assignment must contain at least one question",
                ));
            }
            if !mcq_questions.is_empty() {
                return Err(ApiError::validation(
                    "Subjective assignment must not carry MCQ questions",
                ));
            }
        }
    }
    Ok(())
}
