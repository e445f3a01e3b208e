use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::repository::{ResultStore, StudentDirectory, TestCatalog};
use crate::error::{Error, Result};
use crate::models::placement_result::{PlacementResult, PlacementResultWithNames, ResultDraft};
use crate::models::student::Student;
use crate::models::test::{Test, TestChanges, TestDraft, TestStatus};

#[derive(Debug, Default)]
struct Inner {
    tests: BTreeMap<i64, Test>,
    last_test_id: i64,
    students: HashMap<i64, Student>,
    results: Vec<PlacementResult>,
}

/// Process-local store used when no database is configured and in tests.
/// Every check-then-write runs under one write lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_student(&self, student: Student) {
        let mut inner = self.inner.write().await;
        inner.students.insert(student.id, student);
    }
}

#[async_trait]
impl TestCatalog for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Test>> {
        Ok(self.inner.read().await.tests.get(&id).cloned())
    }

    async fn list(&self, status: Option<TestStatus>) -> Result<Vec<Test>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tests
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect())
    }

    async fn create(&self, draft: TestDraft) -> Result<Test> {
        let mut inner = self.inner.write().await;
        inner.last_test_id += 1;
        let now = Utc::now();
        let test = Test {
            id: inner.last_test_id,
            title: draft.title,
            description: draft.description,
            duration_minutes: draft.duration_minutes,
            status: draft.status,
            questions: draft.questions,
            created_at: Some(now),
            updated_at: Some(now),
        };
        inner.tests.insert(test.id, test.clone());
        Ok(test)
    }

    async fn update(&self, id: i64, changes: TestChanges) -> Result<Option<Test>> {
        let mut inner = self.inner.write().await;
        let Some(test) = inner.tests.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(test);
        test.updated_at = Some(Utc::now());
        Ok(Some(test.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.tests.remove(&id).is_some())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn find_by_student(&self, student_id: i64) -> Result<Vec<PlacementResult>> {
        let inner = self.inner.read().await;
        Ok(inner
            .results
            .iter()
            .rev()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<PlacementResultWithNames>> {
        let inner = self.inner.read().await;
        Ok(inner
            .results
            .iter()
            .rev()
            .map(|r| PlacementResultWithNames {
                result: r.clone(),
                student_name: inner.students.get(&r.student_id).map(|s| s.name.clone()),
                test_title: inner.tests.get(&r.test_id).map(|t| t.title.clone()),
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlacementResult>> {
        let inner = self.inner.read().await;
        Ok(inner.results.iter().find(|r| r.id == id).cloned())
    }

    async fn count_for_test(&self, test_id: i64) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner.results.iter().filter(|r| r.test_id == test_id).count() as i64)
    }

    async fn insert(&self, draft: ResultDraft) -> Result<PlacementResult> {
        let mut inner = self.inner.write().await;
        if inner
            .results
            .iter()
            .any(|r| r.student_id == draft.student_id && r.test_id == draft.test_id)
        {
            return Err(Error::duplicate_attempt());
        }
        let result = draft.into_result(Uuid::new_v4(), Utc::now());
        inner.results.push(result.clone());
        Ok(result)
    }
}

#[async_trait]
impl StudentDirectory for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>> {
        Ok(self.inner.read().await.students.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerSheet;
    use crate::models::placement_result::RecommendedLevel;

    fn draft(student_id: i64, test_id: i64) -> ResultDraft {
        ResultDraft {
            student_id,
            test_id,
            score: 1,
            total_points: 2,
            percentage: 50.0,
            recommended_level: RecommendedLevel::Intermediate,
            answers: AnswerSheet(vec![Some("a".into())]),
        }
    }

    #[tokio::test]
    async fn insert_rejects_second_result_for_same_pair() {
        let store = MemoryStore::new();
        store.insert(draft(1, 7)).await.unwrap();
        let err = store.insert(draft(1, 7)).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        store.insert(draft(2, 7)).await.unwrap();
        store.insert(draft(1, 8)).await.unwrap();
        assert_eq!(store.count_for_test(7).await.unwrap(), 2);
        assert_eq!(store.find_by_student(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_inserts_for_same_pair_keep_one_row() {
        let store = MemoryStore::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(draft(3, 9)).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.count_for_test(9).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_all_joins_display_names() {
        let store = MemoryStore::new();
        store
            .add_student(Student {
                id: 1,
                name: "Amina".into(),
                email: "amina@example.com".into(),
                registered_at: None,
            })
            .await;
        let test = TestCatalog::create(
            &store,
            TestDraft {
                title: "Placement A".into(),
                description: None,
                duration_minutes: 30,
                status: TestStatus::Active,
                questions: vec![],
            },
        )
        .await
        .unwrap();
        store.insert(draft(1, test.id)).await.unwrap();
        store.insert(draft(42, test.id)).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].student_name, None);
        assert_eq!(all[1].student_name.as_deref(), Some("Amina"));
        assert!(all.iter().all(|r| r.test_title.as_deref() == Some("Placement A")));
    }
}
