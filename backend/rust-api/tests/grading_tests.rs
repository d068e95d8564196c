use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

use learnhub_api::models::assignment::{
    ensure_questions_valid, AssignmentDocument, AssignmentKind, AssignmentLearnerView, McqOption,
    McqQuestion,
};
use learnhub_api::models::course::{CourseDocument, ModuleRecord, ResourceKind, ResourceRecord};
use learnhub_api::models::progress::ProgressDocument;
use learnhub_api::services::grader::{grade_mcq, percent};
use learnhub_api::services::path_service::aggregate_path_percent;
use learnhub_api::services::progress_service::course_progress_percent;

fn question_with_key(correct_index: usize) -> McqQuestion {
    McqQuestion {
        prompt: "pick".to_string(),
        options: (0..4)
            .map(|i| McqOption {
                text: format!("option {}", i),
                is_correct: i == correct_index,
            })
            .collect(),
    }
}

fn course(counts: &[usize]) -> CourseDocument {
    CourseDocument {
        id: ObjectId::new(),
        title: "course".to_string(),
        description: String::new(),
        coach_id: "coach-1".to_string(),
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
                        kind: if r % 2 == 0 {
                            ResourceKind::Video
                        } else {
                            ResourceKind::Document
                        },
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

fn empty_progress(course_id: ObjectId) -> ProgressDocument {
    ProgressDocument {
        id: ObjectId::new(),
        learner_id: "learner-1".to_string(),
        course_id,
        enrolled_at: BsonDateTime::now(),
        completed_at: None,
        completed_videos: Default::default(),
        completed_documents: Default::default(),
        submissions: Vec::new(),
    }
}

#[test]
fn mcq_scoring_grades_three_of_four_as_75() {
    // Answer key [1, 0, 2, 1], submission [1, 0, 0, 1].
    let questions = vec![
        question_with_key(1),
        question_with_key(0),
        question_with_key(2),
        question_with_key(1),
    ];
    let answers = vec![Some(1), Some(0), Some(0), Some(1)];

    let grade = grade_mcq(&questions, &answers);
    assert_eq!(grade.score, 75);
    assert_eq!(grade.correct_count, 3);
    assert_eq!(grade.total_questions, 4);
}

#[test]
fn short_answer_vectors_never_panic() {
    let questions = vec![question_with_key(0), question_with_key(1), question_with_key(2)];

    for len in 0..=5 {
        let answers: Vec<Option<u32>> = (0..len).map(|_| Some(0)).collect();
        let grade = grade_mcq(&questions, &answers);
        assert!(grade.score <= 100);
        assert_eq!(grade.total_questions, 3);
    }
}

#[test]
fn score_is_always_the_rounded_ratio() {
    let questions: Vec<McqQuestion> = (0..7).map(|_| question_with_key(0)).collect();
    for correct in 0..=7usize {
        let answers: Vec<Option<u32>> = (0..7)
            .map(|i| if i < correct { Some(0) } else { Some(1) })
            .collect();
        let grade = grade_mcq(&questions, &answers);
        assert_eq!(grade.correct_count, correct);
        assert_eq!(grade.score, percent(correct, 7));
    }
}

#[test]
fn course_percent_scenario_two_modules() {
    // Module A: 3 resources, module B: 2 resources; 2 videos + 1 document done.
    let course = course(&[3, 2]);
    let mut progress = empty_progress(course.id);
    progress.completed_videos.insert("m0r0".to_string());
    progress.completed_videos.insert("m0r2".to_string());
    progress.completed_documents.insert("m1r1".to_string());

    assert_eq!(course_progress_percent(&progress, &course), 60);
}

#[test]
fn zero_resource_course_never_divides_by_zero() {
    let course = course(&[]);
    let progress = empty_progress(course.id);
    assert_eq!(course_progress_percent(&progress, &course), 0);
}

#[test]
fn path_percent_is_zero_without_any_enrollment() {
    // A path whose courses the learner never enrolled in: all completed
    // counts are zero.
    let rows = vec![(5, 0), (8, 0), (0, 0)];
    assert_eq!(aggregate_path_percent(&rows), 0);
}

#[test]
fn path_percent_weights_courses_by_resource_count() {
    // 10-resource course fully done, 10-resource course untouched.
    assert_eq!(aggregate_path_percent(&[(10, 10), (10, 0)]), 50);
    // Larger course dominates the aggregate.
    assert_eq!(aggregate_path_percent(&[(30, 30), (10, 0)]), 75);
}

#[test]
fn learner_view_never_leaks_the_answer_key() {
    let assignment = AssignmentDocument {
        id: ObjectId::new(),
        course_id: ObjectId::new(),
        title: "Final quiz".to_string(),
        kind: AssignmentKind::Mcq,
        mcq_questions: vec![question_with_key(2), question_with_key(0)],
        subjective_questions: Vec::new(),
        created_at: BsonDateTime::now(),
        updated_at: BsonDateTime::now(),
    };

    let view = AssignmentLearnerView::from_doc(&assignment);
    let json = serde_json::to_value(&view).unwrap();
    assert!(!json.to_string().contains("is_correct"));
    assert_eq!(json["mcq_questions"][0]["options"].as_array().unwrap().len(), 4);
}

#[test]
fn assignment_kind_gates_question_lists() {
    assert!(ensure_questions_valid(AssignmentKind::Mcq, &[question_with_key(0)], &[]).is_ok());
    assert!(ensure_questions_valid(AssignmentKind::Subjective, &[question_with_key(0)], &[]).is_err());
}
