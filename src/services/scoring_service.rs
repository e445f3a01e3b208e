use serde::Serialize;

use crate::models::answer::AnswerSheet;
use crate::models::placement_result::{RecommendedLevel, ResultDraft};
use crate::models::question::Question;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutcome {
    pub index: usize,
    pub points_awarded: u32,
    pub max_points: u32,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub score: i64,
    pub total_possible_points: i64,
    pub percentage: f64,
    pub recommended_level: RecommendedLevel,
    pub breakdown: Vec<QuestionOutcome>,
}

impl ScoreCard {
    pub fn into_draft(self, student_id: i64, test_id: i64, answers: AnswerSheet) -> ResultDraft {
        ResultDraft {
            student_id,
            test_id,
            score: self.score,
            total_points: self.total_possible_points,
            percentage: self.percentage,
            recommended_level: self.recommended_level,
            answers,
        }
    }
}

pub struct ScoringService;

impl ScoringService {
    /// Scores answers positionally against `questions`.
    ///
    /// An answer earns the question's points only when it is present and
    /// equal to the resolved key, so a skipped answer can never match a
    /// question whose key is missing. Answer lists shorter or longer than the
    /// question list are not an error.
    pub fn score(questions: &[Question], answers: &AnswerSheet) -> ScoreCard {
        let mut total_possible_points: i64 = 0;
        let mut score: i64 = 0;
        let mut breakdown = Vec::with_capacity(questions.len());

        for (index, question) in questions.iter().enumerate() {
            total_possible_points += i64::from(question.points);

            let is_correct = match (answers.get(index), question.correct_answer()) {
                (Some(given), Some(expected)) => given == expected,
                _ => false,
            };
            let points_awarded = if is_correct { question.points } else { 0 };
            score += i64::from(points_awarded);

            breakdown.push(QuestionOutcome {
                index,
                points_awarded,
                max_points: question.points,
                is_correct,
            });
        }

        let percentage = if total_possible_points > 0 {
            (score as f64 / total_possible_points as f64) * 100.0
        } else {
            0.0
        };

        ScoreCard {
            score,
            total_possible_points,
            percentage,
            recommended_level: RecommendedLevel::from_percentage(percentage),
            breakdown,
        }
    }
}
