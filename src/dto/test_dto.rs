use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::Question;
use crate::models::test::{Test, TestStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestPayload {
    #[serde(deserialize_with = "trim_string")]
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: i32,

    pub status: Option<TestStatus>,

    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTestPayload {
    // Blank strings are treated as "not provided"
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration_minutes: Option<i32>,

    pub status: Option<TestStatus>,

    pub questions: Option<Vec<Question>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestListQuery {
    pub status: Option<TestStatus>,
}

/// Student-facing question: the answer key is never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicTest {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub total_questions: usize,
    pub total_points: i64,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Test> for PublicTest {
    fn from(test: &Test) -> Self {
        let questions: Vec<PublicQuestion> = test
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| PublicQuestion {
                index,
                question: q.question.clone(),
                options: q.options().to_vec(),
                points: q.points,
            })
            .collect();

        Self {
            id: test.id,
            title: test.title.clone(),
            description: test.description.clone(),
            duration_minutes: test.duration_minutes,
            total_questions: questions.len(),
            total_points: test.questions.iter().map(|q| i64::from(q.points)).sum(),
            questions,
        }
    }
}

fn trim_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().to_string())
}

fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_test_hides_answer_keys() {
        let test = Test {
            id: 3,
            title: "Placement".into(),
            description: None,
            duration_minutes: 10,
            status: TestStatus::Active,
            questions: vec![
                Question::indexed("q1", &["a", "b"], 1).with_points(2),
                Question::direct("q2", "secret"),
            ],
            created_at: None,
            updated_at: None,
        };
        let public = PublicTest::from(&test);
        assert_eq!(public.total_questions, 2);
        assert_eq!(public.total_points, 3);

        let body = serde_json::to_string(&public).unwrap();
        assert!(!body.contains("secret"));
        assert!(!body.contains("correctOption"));
    }

    #[test]
    fn blank_update_fields_are_ignored() {
        let payload: UpdateTestPayload =
            serde_json::from_value(json!({ "title": "   ", "description": "" })).unwrap();
        assert!(payload.title.is_none());
        assert!(payload.description.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn create_rejects_blank_title_and_zero_duration() {
        let payload: CreateTestPayload =
            serde_json::from_value(json!({ "title": "  ", "duration_minutes": 0 })).unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("duration_minutes"));
    }
}
