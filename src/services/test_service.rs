use std::sync::Arc;

use crate::database::repository::{ResultStore, TestCatalog};
use crate::dto::test_dto::{CreateTestPayload, UpdateTestPayload};
use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionKind};
use crate::models::test::{Test, TestChanges, TestDraft, TestStatus};

#[derive(Clone)]
pub struct TestService {
    catalog: Arc<dyn TestCatalog>,
    results: Arc<dyn ResultStore>,
}

impl TestService {
    pub fn new(catalog: Arc<dyn TestCatalog>, results: Arc<dyn ResultStore>) -> Self {
        Self { catalog, results }
    }

    pub async fn create_test(&self, payload: CreateTestPayload) -> Result<Test> {
        validate_questions(&payload.questions)?;

        let test = self
            .catalog
            .create(TestDraft {
                title: payload.title,
                description: payload.description,
                duration_minutes: payload.duration_minutes,
                status: payload.status.unwrap_or_default(),
                questions: payload.questions,
            })
            .await?;

        tracing::info!(test_id = test.id, questions = test.questions.len(), "test created");
        Ok(test)
    }

    pub async fn update_test(&self, test_id: i64, payload: UpdateTestPayload) -> Result<Test> {
        if let Some(questions) = &payload.questions {
            validate_questions(questions)?;
        }

        let changes = TestChanges {
            title: payload.title,
            description: payload.description,
            duration_minutes: payload.duration_minutes,
            status: payload.status,
            questions: payload.questions,
        };

        self.catalog
            .update(test_id, changes)
            .await?
            .ok_or_else(Error::test_not_found)
    }

    pub async fn get_test(&self, test_id: i64) -> Result<Test> {
        self.catalog
            .find_by_id(test_id)
            .await?
            .ok_or_else(Error::test_not_found)
    }

    /// Inactive tests are invisible to students.
    pub async fn get_active_test(&self, test_id: i64) -> Result<Test> {
        let test = self.get_test(test_id).await?;
        if !test.is_active() {
            return Err(Error::test_not_found());
        }
        Ok(test)
    }

    pub async fn list_tests(&self, status: Option<TestStatus>) -> Result<Vec<Test>> {
        self.catalog.list(status).await
    }

    /// Tests that already have results are kept; deactivate them instead.
    pub async fn delete_test(&self, test_id: i64) -> Result<()> {
        let submitted = self.results.count_for_test(test_id).await?;
        if submitted > 0 {
            return Err(Error::Conflict(format!(
                "Test has {} submitted result(s); set it inactive instead",
                submitted
            )));
        }

        if !self.catalog.delete(test_id).await? {
            return Err(Error::test_not_found());
        }
        tracing::info!(test_id, "test deleted");
        Ok(())
    }
}

/// Every question needs text and a resolvable answer key.
pub fn validate_questions(questions: &[Question]) -> Result<()> {
    for (index, question) in questions.iter().enumerate() {
        let number = index + 1;
        if question.question.trim().is_empty() {
            return Err(Error::BadRequest(format!("Question {} has no text", number)));
        }
        match &question.kind {
            QuestionKind::IndexedChoice {
                options,
                correct_index,
            } => {
                let Some(correct_index) = *correct_index else {
                    return Err(Error::BadRequest(format!(
                        "Question {}: correctOption is not an option index",
                        number
                    )));
                };
                if correct_index >= options.len() {
                    return Err(Error::BadRequest(format!(
                        "Question {}: correctOption {} is outside its {} option(s)",
                        number,
                        correct_index,
                        options.len()
                    )));
                }
            }
            QuestionKind::DirectAnswer { correct_value, .. } => {
                if correct_value.is_none() {
                    return Err(Error::BadRequest(format!(
                        "Question {} has no correct answer",
                        number
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::models::answer::AnswerSheet;
    use crate::models::placement_result::{RecommendedLevel, ResultDraft};

    fn service(store: &Arc<MemoryStore>) -> TestService {
        TestService::new(store.clone(), store.clone())
    }

    fn payload(questions: Vec<Question>) -> CreateTestPayload {
        CreateTestPayload {
            title: "Grammar placement".into(),
            description: Some("Twenty minutes".into()),
            duration_minutes: 20,
            status: None,
            questions,
        }
    }

    #[test]
    fn validate_questions_rejects_unresolvable_keys() {
        assert!(validate_questions(&[Question::indexed("q", &["a", "b"], 1)]).is_ok());
        assert!(validate_questions(&[Question::indexed("q", &["a", "b"], 2)]).is_err());
        assert!(validate_questions(&[Question::indexed(" ", &["a"], 0)]).is_err());

        let unusable = Question {
            question: "q".into(),
            points: 1,
            kind: QuestionKind::IndexedChoice {
                options: vec!["a".into()],
                correct_index: None,
            },
        };
        assert!(validate_questions(&[unusable]).is_err());

        let keyless = Question {
            question: "q".into(),
            points: 1,
            kind: QuestionKind::DirectAnswer {
                options: vec![],
                correct_value: None,
            },
        };
        assert!(validate_questions(&[keyless]).is_err());
    }

    #[tokio::test]
    async fn create_defaults_to_active_and_update_is_partial() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let test = svc
            .create_test(payload(vec![Question::direct("q", "a")]))
            .await
            .unwrap();
        assert_eq!(test.status, TestStatus::Active);

        let updated = svc
            .update_test(
                test.id,
                UpdateTestPayload {
                    status: Some(TestStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TestStatus::Inactive);
        assert_eq!(updated.title, "Grammar placement");
        assert_eq!(updated.questions.len(), 1);

        assert!(matches!(
            svc.get_active_test(test.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(svc.list_tests(Some(TestStatus::Active)).await.unwrap().is_empty());
        assert_eq!(svc.list_tests(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_missing_test_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = service(&store)
            .update_test(77, UpdateTestPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_refuses_tests_with_results() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let kept = svc.create_test(payload(vec![])).await.unwrap();
        let spare = svc.create_test(payload(vec![])).await.unwrap();

        store
            .insert(ResultDraft {
                student_id: 1,
                test_id: kept.id,
                score: 0,
                total_points: 0,
                percentage: 0.0,
                recommended_level: RecommendedLevel::Beginner,
                answers: AnswerSheet::default(),
            })
            .await
            .unwrap();

        assert!(matches!(svc.delete_test(kept.id).await.unwrap_err(), Error::Conflict(_)));
        svc.delete_test(spare.id).await.unwrap();
        assert!(matches!(svc.delete_test(spare.id).await.unwrap_err(), Error::NotFound(_)));
    }
}
