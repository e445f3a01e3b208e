use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::answer::AnswerSheet;
use crate::models::placement_result::PlacementResult;
use crate::services::attempt_service::Submission;
use crate::services::scoring_service::QuestionOutcome;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitPlacementRequest {
    #[validate(range(min = 1, message = "test_id must be a positive id"))]
    pub test_id: i64,
    #[validate(range(min = 1, message = "student_id must be a positive id"))]
    pub student_id: i64,
    #[serde(default)]
    pub answers: AnswerSheet,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitPlacementResponse {
    #[serde(flatten)]
    pub result: PlacementResult,
    pub breakdown: Vec<QuestionOutcome>,
    pub message: String,
}

impl From<Submission> for SubmitPlacementResponse {
    fn from(submission: Submission) -> Self {
        let message = format!(
            "Placement test submitted. Recommended level: {}",
            submission.result.recommended_level.as_str()
        );
        Self {
            result: submission.result,
            breakdown: submission.score_card.breakdown,
            message,
        }
    }
}
