use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::question::{decode_questions, Question};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Active,
    Inactive,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Active => "active",
            TestStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for TestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(TestStatus::Active),
            "inactive" => Ok(TestStatus::Inactive),
            other => Err(Error::BadRequest(format!("Unknown test status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub status: TestStatus,
    pub questions: Vec<Question>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Test {
    pub fn is_active(&self) -> bool {
        self.status == TestStatus::Active
    }
}

/// Row shape of the `tests` table; `questions` is decoded on conversion.
#[derive(Debug, FromRow)]
pub struct TestRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub status: String,
    pub questions: JsonValue,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TestRow> for Test {
    type Error = Error;

    fn try_from(row: TestRow) -> Result<Self> {
        let questions = decode_questions(row.questions).map_err(|e| {
            Error::Internal(format!("Test {} has an unreadable question list: {}", row.id, e))
        })?;
        Ok(Test {
            id: row.id,
            title: row.title,
            description: row.description,
            duration_minutes: row.duration_minutes,
            status: row.status.parse().unwrap_or(TestStatus::Inactive),
            questions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TestDraft {
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub status: TestStatus,
    pub questions: Vec<Question>,
}

/// Partial edit; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TestChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub status: Option<TestStatus>,
    pub questions: Option<Vec<Question>>,
}

impl TestChanges {
    pub fn apply(self, test: &mut Test) {
        if let Some(title) = self.title {
            test.title = title;
        }
        if let Some(description) = self.description {
            test.description = Some(description);
        }
        if let Some(duration) = self.duration_minutes {
            test.duration_minutes = duration;
        }
        if let Some(status) = self.status {
            test.status = status;
        }
        if let Some(questions) = self.questions {
            test.questions = questions;
        }
    }
}
