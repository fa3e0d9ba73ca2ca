use serde::{Deserialize, Serialize};

use crate::models::Question;

/// The outcome of one question within a graded submission.
///
/// `user_answer` stays `None` when the submission carried no entry for
/// that question; the score treats that the same as a wrong answer but
/// the snapshot keeps the distinction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    /// Index of the question within the quiz
    pub index: usize,

    /// The key the user submitted, if any
    pub user_answer: Option<String>,

    /// The stored correct key
    pub correct_answer: String,

    pub correct: bool,
}

/// Aggregate result of grading one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedAttempt {
    pub outcomes: Vec<QuestionOutcome>,
    pub correct_count: usize,
    pub incorrect_count: usize,

    /// Unrounded percentage of correct answers
    pub percentage: f64,

    /// Percentage rounded to the nearest integer, the stored "score"
    pub score: i32,
}

/// Grades a submitted answer set against the stored question list.
///
/// Each submitted answer is compared positionally to the question at
/// the same index. A missing entry (submission shorter than the quiz,
/// or an explicit null) counts as incorrect. Entries beyond the last
/// question are ignored.
///
/// ### Arguments
///
/// * `questions` - The stored question list
/// * `answers` - The submitted answer keys, positionally aligned
///
/// ### Returns
///
/// The per-question outcomes plus aggregate counts; for an empty
/// question list the percentage is 0 rather than undefined.
pub fn grade_answers(questions: &[Question], answers: &[Option<String>]) -> GradedAttempt {
    let mut outcomes = Vec::with_capacity(questions.len());
    let mut correct_count = 0usize;

    for (index, question) in questions.iter().enumerate() {
        let user_answer = answers.get(index).and_then(|a| a.clone());
        let correct = user_answer.as_deref() == Some(question.correct_answer.as_str());
        if correct {
            correct_count += 1;
        }
        outcomes.push(QuestionOutcome {
            index,
            user_answer,
            correct_answer: question.correct_answer.clone(),
            correct,
        });
    }

    let total = questions.len();
    let incorrect_count = total - correct_count;
    let percentage = if total == 0 {
        0.0
    } else {
        100.0 * correct_count as f64 / total as f64
    };

    GradedAttempt {
        outcomes,
        correct_count,
        incorrect_count,
        percentage,
        score: percentage.round() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    /// Builds a four-option question whose correct key is `correct`.
    fn question(correct: &str) -> Question {
        Question {
            question: "q".to_string(),
            options: BTreeMap::from([
                ("A".to_string(), "a".to_string()),
                ("B".to_string(), "b".to_string()),
                ("C".to_string(), "c".to_string()),
                ("D".to_string(), "d".to_string()),
            ]),
            correct_answer: correct.to_string(),
            explanation: String::new(),
            difficulty: "moyen".to_string(),
            topic: None,
        }
    }

    fn submitted(keys: &[&str]) -> Vec<Option<String>> {
        keys.iter().map(|k| Some(k.to_string())).collect()
    }

    #[test]
    fn test_half_correct_scores_fifty() {
        // Four questions, answers A/B/C/D against correct A/X/C/Y.
        let questions = vec![question("A"), question("X"), question("C"), question("Y")];
        let graded = grade_answers(&questions, &submitted(&["A", "B", "C", "D"]));

        assert_eq!(graded.correct_count, 2);
        assert_eq!(graded.incorrect_count, 2);
        assert_eq!(graded.score, 50);
        assert!((graded.percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_answers_count_incorrect_but_stay_distinguishable() {
        let questions = vec![question("A"), question("B"), question("C")];
        let graded = grade_answers(&questions, &submitted(&["A"]));

        assert_eq!(graded.correct_count, 1);
        assert_eq!(graded.incorrect_count, 2);
        assert_eq!(graded.outcomes[1].user_answer, None);
        assert_eq!(graded.outcomes[2].user_answer, None);
        assert!(!graded.outcomes[1].correct);
    }

    #[test]
    fn test_extra_answers_are_ignored() {
        let questions = vec![question("A")];
        let graded = grade_answers(&questions, &submitted(&["A", "B", "C"]));

        assert_eq!(graded.outcomes.len(), 1);
        assert_eq!(graded.correct_count, 1);
        assert_eq!(graded.score, 100);
    }

    #[test]
    fn test_empty_quiz_scores_zero_not_nan() {
        let graded = grade_answers(&[], &[]);
        assert_eq!(graded.score, 0);
        assert_eq!(graded.percentage, 0.0);
        assert!(graded.outcomes.is_empty());
    }

    #[test]
    fn test_rounding_to_nearest_integer() {
        // 1 of 3 correct: 33.33… rounds down to 33.
        let questions = vec![question("A"), question("B"), question("C")];
        let graded = grade_answers(&questions, &submitted(&["A", "Z", "Z"]));
        assert_eq!(graded.score, 33);

        // 2 of 3 correct: 66.66… rounds up to 67.
        let graded = grade_answers(&questions, &submitted(&["A", "B", "Z"]));
        assert_eq!(graded.score, 67);
    }

    /// Generates a quiz together with a submission of arbitrary overlap.
    fn arb_submission() -> impl Strategy<Value = (Vec<Question>, Vec<Option<String>>)> {
        let key = prop_oneof![Just("A"), Just("B"), Just("C"), Just("D")];
        let answer = prop_oneof![
            Just(None),
            prop_oneof![Just("A"), Just("B"), Just("C"), Just("D")].prop_map(|k| Some(k.to_string())),
        ];
        (
            prop::collection::vec(key.prop_map(question), 1..40),
            prop::collection::vec(answer, 0..50),
        )
    }

    proptest! {
        #[test]
        fn prop_counts_partition_the_quiz((questions, answers) in arb_submission()) {
            let graded = grade_answers(&questions, &answers);
            prop_assert_eq!(graded.correct_count + graded.incorrect_count, questions.len());
            prop_assert_eq!(graded.outcomes.len(), questions.len());
        }

        #[test]
        fn prop_score_is_rounded_percentage((questions, answers) in arb_submission()) {
            let graded = grade_answers(&questions, &answers);
            let expected = (100.0 * graded.correct_count as f64 / questions.len() as f64).round() as i32;
            prop_assert_eq!(graded.score, expected);
            prop_assert!(graded.percentage >= 0.0 && graded.percentage <= 100.0);
        }
    }
}
