//! Persistence-level tests for enrollment, submission grading, and
//! resource completion. They need a reachable MongoDB (MONGO_URI, default
//! localhost) and skip themselves when none is available.

use mongodb::bson::doc;
use mongodb::{Client, Database};

use learnhub_api::errors::ApiError;
use learnhub_api::middlewares::auth::{AuthUser, Role};
use learnhub_api::models::assignment::{
    AssignmentCreateRequest, AssignmentKind, SubjectiveQuestion,
};
use learnhub_api::models::course::{
    CourseCreateRequest, CourseDetail, ModuleInput, ResourceInput, ResourceKind,
};
use learnhub_api::models::progress::{
    GradeSubmissionRequest, MarkResourceCompleteRequest, SubmitRequest,
};
use learnhub_api::services::{
    assignment_service::AssignmentService, course_service::CourseService, ensure_indexes,
    progress_service::ProgressService,
};

async fn test_database() -> Option<Database> {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| {
        "mongodb://localhost:27017/?serverSelectionTimeoutMS=500&connectTimeoutMS=500".to_string()
    });

    let client = Client::with_uri_str(&uri).await.ok()?;
    // Fresh database per test so parallel runs never collide.
    let db = client.database(&format!("learnhub_test_{}", uuid::Uuid::new_v4().simple()));

    if db.run_command(doc! { "ping": 1 }).await.is_err() {
        eprintln!("MongoDB not reachable at {}; skipping", uri);
        return None;
    }

    ensure_indexes(&db).await.expect("Failed to create indexes");
    Some(db)
}

fn coach() -> AuthUser {
    AuthUser {
        id: "coach-1".to_string(),
        role: Role::Coach,
    }
}

fn learner() -> AuthUser {
    AuthUser {
        id: "learner-1".to_string(),
        role: Role::Student,
    }
}

async fn seed_course(db: &Database) -> CourseDetail {
    CourseService::new(db.clone())
        .create(
            &coach(),
            CourseCreateRequest {
                title: "Rust backend basics".to_string(),
                description: String::new(),
                modules: vec![ModuleInput {
                    title: "Getting started".to_string(),
                    resources: vec![ResourceInput {
                        title: "Welcome".to_string(),
                        kind: ResourceKind::Video,
                        url: "https://example.com/welcome".to_string(),
                    }],
                    assignment_id: None,
                }],
            },
        )
        .await
        .expect("Failed to seed course")
}

#[tokio::test]
async fn duplicate_enroll_is_a_conflict() {
    let Some(db) = test_database().await else {
        return;
    };
    let course = seed_course(&db).await;
    let progress = ProgressService::new(db.clone());

    progress
        .enroll(&learner(), &course.id)
        .await
        .expect("First enroll must succeed");

    let err = progress
        .enroll(&learner(), &course.id)
        .await
        .expect_err("Second enroll must fail");
    assert!(matches!(err, ApiError::Conflict(_)), "got {:?}", err);

    db.drop().await.ok();
}

#[tokio::test]
async fn second_grade_overwrites_the_first() {
    let Some(db) = test_database().await else {
        return;
    };
    let course = seed_course(&db).await;

    let assignment = AssignmentService::new(db.clone())
        .create(
            &coach(),
            AssignmentCreateRequest {
                course_id: course.id.clone(),
                title: "Essay".to_string(),
                kind: AssignmentKind::Subjective,
                mcq_questions: Vec::new(),
                subjective_questions: vec![SubjectiveQuestion {
                    prompt: "Discuss ownership".to_string(),
                    word_limit: None,
                }],
            },
        )
        .await
        .expect("Failed to create assignment");

    let progress = ProgressService::new(db.clone());
    let enrolled = progress
        .enroll(&learner(), &course.id)
        .await
        .expect("Enroll must succeed");

    let submitted = progress
        .submit(
            &learner(),
            &assignment.id,
            SubmitRequest {
                selected_options: None,
                answers: Some(vec!["Ownership moves values".to_string()]),
            },
        )
        .await
        .expect("Submit must succeed");

    let first = progress
        .grade_submission(
            &coach(),
            &enrolled.id,
            &submitted.submission.id,
            GradeSubmissionRequest {
                score: Some(40),
                feedback: Some("Too thin".to_string()),
            },
        )
        .await
        .expect("First grade must succeed");
    assert_eq!(first.score, Some(40));

    let second = progress
        .grade_submission(
            &coach(),
            &enrolled.id,
            &submitted.submission.id,
            GradeSubmissionRequest {
                score: Some(85),
                feedback: Some("Much better after revision".to_string()),
            },
        )
        .await
        .expect("Second grade must succeed");
    assert_eq!(second.score, Some(85));
    assert_eq!(second.feedback.as_deref(), Some("Much better after revision"));
    assert!(second.graded_at.is_some());

    // The stored record carries only the second grade.
    let reloaded = progress
        .get(&learner(), &course.id)
        .await
        .expect("Progress fetch must succeed");
    assert_eq!(reloaded.submissions.len(), 1);
    assert_eq!(reloaded.submissions[0].score, Some(85));

    db.drop().await.ok();
}

#[tokio::test]
async fn unknown_resource_completions_are_rejected() {
    let Some(db) = test_database().await else {
        return;
    };
    let course = seed_course(&db).await;
    let progress = ProgressService::new(db.clone());

    progress
        .enroll(&learner(), &course.id)
        .await
        .expect("Enroll must succeed");

    let resource_id = course.modules[0].resources[0].id.clone();

    // Ids the course does not hold must not count toward the percentage.
    let err = progress
        .mark_resource_complete(
            &learner(),
            &course.id,
            MarkResourceCompleteRequest {
                resource_id: "bogus-1".to_string(),
                kind: ResourceKind::Video,
            },
        )
        .await
        .expect_err("Unknown resource id must be rejected");
    assert!(matches!(err, ApiError::NotFound(_)), "got {:?}", err);

    // Neither may a real id recorded under the wrong kind.
    let err = progress
        .mark_resource_complete(
            &learner(),
            &course.id,
            MarkResourceCompleteRequest {
                resource_id: resource_id.clone(),
                kind: ResourceKind::Document,
            },
        )
        .await
        .expect_err("Kind mismatch must be rejected");
    assert!(matches!(err, ApiError::Validation(_)), "got {:?}", err);

    let done = progress
        .mark_resource_complete(
            &learner(),
            &course.id,
            MarkResourceCompleteRequest {
                resource_id,
                kind: ResourceKind::Video,
            },
        )
        .await
        .expect("Valid completion must succeed");
    assert_eq!(done.percent, 100);

    db.drop().await.ok();
}
