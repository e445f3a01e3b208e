use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::database::repository::{ResultStore, StudentDirectory, TestCatalog};
use crate::error::{Error, Result};
use crate::models::answer::AnswerSheet;
use crate::models::placement_result::{PlacementResult, PlacementResultWithNames};
use crate::services::scoring_service::{ScoreCard, ScoringService};

/// False when `existing` already holds a result for this student and test.
pub fn can_submit(student_id: i64, test_id: i64, existing: &[PlacementResult]) -> bool {
    !existing
        .iter()
        .any(|r| r.student_id == student_id && r.test_id == test_id)
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub result: PlacementResult,
    pub score_card: ScoreCard,
}

#[derive(Clone)]
pub struct AttemptService {
    tests: Arc<dyn TestCatalog>,
    results: Arc<dyn ResultStore>,
    students: Arc<dyn StudentDirectory>,
}

impl AttemptService {
    pub fn new(
        tests: Arc<dyn TestCatalog>,
        results: Arc<dyn ResultStore>,
        students: Arc<dyn StudentDirectory>,
    ) -> Self {
        Self {
            tests,
            results,
            students,
        }
    }

    /// Scores and stores a student's single attempt at a test.
    ///
    /// Duplicate attempts are rejected with `Error::Conflict` before any
    /// scoring happens; the store's own uniqueness guarantee rejects the
    /// same way when two submissions race past the check.
    pub async fn submit(
        &self,
        student_id: i64,
        test_id: i64,
        answers: AnswerSheet,
    ) -> Result<Submission> {
        let existing = self.results.find_by_student(student_id).await?;
        if !can_submit(student_id, test_id, &existing) {
            tracing::warn!(student_id, test_id, "rejected duplicate placement submission");
            return Err(Error::duplicate_attempt());
        }

        let test = self
            .tests
            .find_by_id(test_id)
            .await?
            .ok_or_else(Error::test_not_found)?;

        if self.students.find_by_id(student_id).await?.is_none() {
            tracing::warn!(student_id, test_id, "placement submission for unknown student");
            return Err(Error::student_not_found());
        }

        let score_card = ScoringService::score(&test.questions, &answers);
        let draft = score_card.clone().into_draft(student_id, test_id, answers);

        let result = match self.results.insert(draft).await {
            Ok(result) => result,
            Err(Error::Conflict(msg)) => {
                tracing::warn!(student_id, test_id, "concurrent placement submission lost the insert");
                return Err(Error::Conflict(msg));
            }
            Err(e) => {
                tracing::error!(student_id, test_id, error = ?e, "failed to store placement result");
                return Err(e);
            }
        };

        tracing::info!(
            student_id,
            test_id,
            result_id = %result.id,
            score = result.score,
            total_points = result.total_points,
            level = result.recommended_level.as_str(),
            "placement test submitted"
        );

        Ok(Submission { result, score_card })
    }

    pub async fn results_for_student(&self, student_id: i64) -> Result<Vec<PlacementResult>> {
        self.results.find_by_student(student_id).await
    }

    pub async fn all_results(&self) -> Result<Vec<PlacementResultWithNames>> {
        self.results.find_all().await
    }

    pub async fn result_by_id(&self, id: Uuid) -> Result<PlacementResult> {
        self.results
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Result not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::repository::{MockResultStore, MockStudentDirectory, MockTestCatalog};
    use crate::models::placement_result::{AttemptStatus, RecommendedLevel};
    use crate::models::question::Question;
    use crate::models::student::Student;
    use crate::models::test::{Test, TestDraft, TestStatus};
    use chrono::Utc;

    fn sample_test(id: i64) -> Test {
        Test {
            id,
            title: "General English placement".into(),
            description: None,
            duration_minutes: 20,
            status: TestStatus::Active,
            questions: vec![
                Question::indexed("She ___ to school.", &["go", "goes", "going"], 1),
                Question::direct("Opposite of 'cold'", "hot"),
            ],
            created_at: None,
            updated_at: None,
        }
    }

    fn known_students() -> MockStudentDirectory {
        let mut students = MockStudentDirectory::new();
        students.expect_find_by_id().returning(|id| {
            Ok(Some(Student {
                id,
                name: format!("Student {}", id),
                email: format!("student{}@example.com", id),
                registered_at: None,
            }))
        });
        students
    }

    fn stored_result(student_id: i64, test_id: i64) -> PlacementResult {
        PlacementResult {
            id: Uuid::new_v4(),
            student_id,
            test_id,
            score: 1,
            total_points: 2,
            percentage: 50.0,
            recommended_level: RecommendedLevel::Intermediate,
            answers: AnswerSheet::default(),
            status: AttemptStatus::Completed,
            created_at: Utc::now(),
        }
    }

    fn answers(values: &[Option<&str>]) -> AnswerSheet {
        values.iter().copied().collect()
    }

    #[test]
    fn can_submit_only_blocks_matching_test() {
        let existing = vec![stored_result(1, 10), stored_result(1, 11)];
        assert!(!can_submit(1, 10, &existing));
        assert!(can_submit(1, 12, &existing));
        assert!(can_submit(1, 12, &[]));
    }

    #[tokio::test]
    async fn duplicate_submission_never_reaches_insert() {
        let mut results = MockResultStore::new();
        results
            .expect_find_by_student()
            .returning(|student_id| Ok(vec![stored_result(student_id, 10)]));
        results.expect_insert().times(0);
        let mut tests = MockTestCatalog::new();
        tests.expect_find_by_id().times(0);

        let service = AttemptService::new(Arc::new(tests), Arc::new(results), Arc::new(known_students()));
        let err = service.submit(1, 10, AnswerSheet::default()).await.unwrap_err();
        match err {
            Error::Conflict(msg) => assert_eq!(msg, "You have already submitted this placement test."),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_test_is_not_found() {
        let mut results = MockResultStore::new();
        results.expect_find_by_student().returning(|_| Ok(vec![]));
        results.expect_insert().times(0);
        let mut tests = MockTestCatalog::new();
        tests.expect_find_by_id().returning(|_| Ok(None));

        let service = AttemptService::new(Arc::new(tests), Arc::new(results), Arc::new(known_students()));
        let err = service.submit(1, 99, AnswerSheet::default()).await.unwrap_err();
        match err {
            Error::NotFound(msg) => assert_eq!(msg, "Test not found"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let mut results = MockResultStore::new();
        results.expect_find_by_student().returning(|_| Ok(vec![]));
        results
            .expect_insert()
            .times(1)
            .returning(|_| Err(Error::Internal("disk full".into())));
        let mut tests = MockTestCatalog::new();
        tests
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_test(id))));

        let service = AttemptService::new(Arc::new(tests), Arc::new(results), Arc::new(known_students()));
        let err = service
            .submit(1, 5, answers(&[Some("goes"), Some("hot")]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn insert_receives_scored_draft() {
        let mut results = MockResultStore::new();
        results.expect_find_by_student().returning(|_| Ok(vec![]));
        results
            .expect_insert()
            .withf(|draft| {
                draft.student_id == 4
                    && draft.test_id == 5
                    && draft.score == 1
                    && draft.total_points == 2
                    && draft.recommended_level == RecommendedLevel::Intermediate
            })
            .times(1)
            .returning(|draft| Ok(draft.into_result(Uuid::new_v4(), Utc::now())));
        let mut tests = MockTestCatalog::new();
        tests
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_test(id))));

        let service = AttemptService::new(Arc::new(tests), Arc::new(results), Arc::new(known_students()));
        let submission = service
            .submit(4, 5, answers(&[Some("goes"), Some("warm")]))
            .await
            .unwrap();
        assert_eq!(submission.result.percentage, 50.0);
        assert_eq!(submission.score_card.breakdown.len(), 2);
    }

    #[tokio::test]
    async fn sequential_resubmissions_always_conflict() {
        let store = Arc::new(MemoryStore::new());
        let test = TestCatalog::create(
            store.as_ref(),
            TestDraft {
                title: "Placement".into(),
                description: None,
                duration_minutes: 15,
                status: TestStatus::Active,
                questions: sample_test(0).questions,
            },
        )
        .await
        .unwrap();
        store
            .add_student(Student {
                id: 7,
                name: "Madina".into(),
                email: "madina@example.com".into(),
                registered_at: None,
            })
            .await;
        let service = AttemptService::new(store.clone(), store.clone(), store.clone());

        let first = service
            .submit(7, test.id, answers(&[Some("goes"), Some("hot")]))
            .await
            .unwrap();
        assert_eq!(first.result.recommended_level, RecommendedLevel::Advanced);

        for attempt in [
            answers(&[]),
            answers(&[Some("go"), None]),
            answers(&[Some("goes"), Some("hot")]),
        ] {
            let err = service.submit(7, test.id, attempt).await.unwrap_err();
            assert!(matches!(err, Error::Conflict(_)));
        }
        assert_eq!(service.results_for_student(7).await.unwrap().len(), 1);
        assert_eq!(service.result_by_id(first.result.id).await.unwrap().id, first.result.id);
    }

    #[tokio::test]
    async fn unknown_student_is_not_found_and_never_inserts() {
        let mut results = MockResultStore::new();
        results.expect_find_by_student().returning(|_| Ok(vec![]));
        results.expect_insert().times(0);
        let mut tests = MockTestCatalog::new();
        tests
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_test(id))));
        let mut students = MockStudentDirectory::new();
        students.expect_find_by_id().returning(|_| Ok(None));

        let service = AttemptService::new(Arc::new(tests), Arc::new(results), Arc::new(students));
        let err = service
            .submit(404, 5, answers(&[Some("goes")]))
            .await
            .unwrap_err();
        match err {
            Error::NotFound(msg) => assert_eq!(msg, "Student not found"),
            other => panic!("expected not found, got {:?}", other),
        }
    }
}
