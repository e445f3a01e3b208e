use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::{decode_answers, AnswerSheet};

pub const ADVANCED_THRESHOLD: f64 = 80.0;
pub const INTERMEDIATE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendedLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl RecommendedLevel {
    /// Bands are closed at their lower bound.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= ADVANCED_THRESHOLD {
            RecommendedLevel::Advanced
        } else if percentage >= INTERMEDIATE_THRESHOLD {
            RecommendedLevel::Intermediate
        } else {
            RecommendedLevel::Beginner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedLevel::Beginner => "Beginner",
            RecommendedLevel::Intermediate => "Intermediate",
            RecommendedLevel::Advanced => "Advanced",
        }
    }
}

impl FromStr for RecommendedLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Beginner" => Ok(RecommendedLevel::Beginner),
            "Intermediate" => Ok(RecommendedLevel::Intermediate),
            "Advanced" => Ok(RecommendedLevel::Advanced),
            other => Err(Error::Internal(format!("Unknown recommended level: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    #[default]
    Completed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Completed => "completed",
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "completed" => Ok(AttemptStatus::Completed),
            other => Err(Error::Internal(format!("Unknown attempt status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementResult {
    pub id: Uuid,
    pub student_id: i64,
    pub test_id: i64,
    pub score: i64,
    /// Sum of question point values, not a question count.
    pub total_points: i64,
    pub percentage: f64,
    pub recommended_level: RecommendedLevel,
    pub answers: AnswerSheet,
    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementResultWithNames {
    #[serde(flatten)]
    pub result: PlacementResult,
    pub student_name: Option<String>,
    pub test_title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResultDraft {
    pub student_id: i64,
    pub test_id: i64,
    pub score: i64,
    pub total_points: i64,
    pub percentage: f64,
    pub recommended_level: RecommendedLevel,
    pub answers: AnswerSheet,
}

impl ResultDraft {
    pub fn into_result(self, id: Uuid, created_at: DateTime<Utc>) -> PlacementResult {
        PlacementResult {
            id,
            student_id: self.student_id,
            test_id: self.test_id,
            score: self.score,
            total_points: self.total_points,
            percentage: self.percentage,
            recommended_level: self.recommended_level,
            answers: self.answers,
            status: AttemptStatus::Completed,
            created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PlacementResultRow {
    pub id: Uuid,
    pub student_id: i64,
    pub test_id: i64,
    pub score: i64,
    pub total_points: i64,
    pub percentage: f64,
    pub recommended_level: String,
    pub answers: JsonValue,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PlacementResultRow> for PlacementResult {
    type Error = Error;

    fn try_from(row: PlacementResultRow) -> Result<Self> {
        Ok(PlacementResult {
            id: row.id,
            student_id: row.student_id,
            test_id: row.test_id,
            score: row.score,
            total_points: row.total_points,
            percentage: row.percentage,
            recommended_level: row.recommended_level.parse()?,
            answers: decode_answers(row.answers).map_err(|e| {
                Error::Internal(format!("Result {} has unreadable answers: {}", row.id, e))
            })?,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct PlacementResultWithNamesRow {
    #[sqlx(flatten)]
    pub result: PlacementResultRow,
    pub student_name: Option<String>,
    pub test_title: Option<String>,
}

impl TryFrom<PlacementResultWithNamesRow> for PlacementResultWithNames {
    type Error = Error;

    fn try_from(row: PlacementResultWithNamesRow) -> Result<Self> {
        Ok(PlacementResultWithNames {
            result: row.result.try_into()?,
            student_name: row.student_name,
            test_title: row.test_title,
        })
    }
}
