use crate::models::assignment::McqQuestion;

/// Deterministic result of auto-grading an MCQ submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McqGrade {
    pub score: i32,
    pub correct_count: usize,
    pub total_questions: usize,
}

/// Scores a selection vector against the question list, position by
/// position. A missing or out-of-range selection counts as incorrect,
/// never as an error. Pure; no side effects.
pub fn grade_mcq(questions: &[McqQuestion], answers: &[Option<u32>]) -> McqGrade {
    let total_questions = questions.len();
    let correct_count = questions
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            answers
                .get(*index)
                .copied()
                .flatten()
                .and_then(|selected| question.options.get(selected as usize))
                .map(|option| option.is_correct)
                .unwrap_or(false)
        })
        .count();

    McqGrade {
        score: percent(correct_count, total_questions),
        correct_count,
        total_questions,
    }
}

/// Rounded completion percentage, half up; 0 when the denominator is 0.
pub fn percent(completed: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment::McqOption;

    fn question(correct_index: usize, option_count: usize) -> McqQuestion {
        McqQuestion {
            prompt: "q".to_string(),
            options: (0..option_count)
                .map(|i| McqOption {
                    text: format!("o{}", i),
                    is_correct: i == correct_index,
                })
                .collect(),
        }
    }

    #[test]
    fn grades_three_of_four_as_75() {
        // Answer key at indices [1, 0, 2, 1]; last selection is wrong.
        let questions = vec![question(1, 4), question(0, 4), question(2, 4), question(1, 4)];
        let answers = vec![Some(1), Some(0), Some(0), Some(1)];

        let grade = grade_mcq(&questions, &answers);
        assert_eq!(grade.score, 75);
        assert_eq!(grade.correct_count, 3);
        assert_eq!(grade.total_questions, 4);
    }

    #[test]
    fn short_answer_vector_counts_missing_as_incorrect() {
        let questions = vec![question(0, 3), question(1, 3), question(2, 3)];
        let answers = vec![Some(0)];

        let grade = grade_mcq(&questions, &answers);
        assert_eq!(grade.correct_count, 1);
        assert_eq!(grade.score, 33);
    }

    #[test]
    fn out_of_range_and_null_selections_are_incorrect() {
        let questions = vec![question(0, 2), question(0, 2)];
        let answers = vec![Some(99), None];

        let grade = grade_mcq(&questions, &answers);
        assert_eq!(grade.correct_count, 0);
        assert_eq!(grade.score, 0);
    }

    #[test]
    fn empty_question_list_scores_zero() {
        let grade = grade_mcq(&[], &[Some(0)]);
        assert_eq!(grade.score, 0);
        assert_eq!(grade.total_questions, 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(3, 5), 60);
        assert_eq!(percent(1, 8), 13); // 12.5 rounds up
    }
}
