//! Storage seams for the placement flow.
//!
//! Services receive these as `Arc<dyn ...>` handles so the scoring and
//! attempt logic can run against Postgres in production and against
//! [`MemoryStore`](crate::database::memory::MemoryStore) or mocks in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::placement_result::{PlacementResult, PlacementResultWithNames, ResultDraft};
use crate::models::student::Student;
use crate::models::test::{Test, TestChanges, TestDraft, TestStatus};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestCatalog: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Test>>;

    /// Ordered by id. `None` lists every status.
    async fn list(&self, status: Option<TestStatus>) -> Result<Vec<Test>>;

    async fn create(&self, draft: TestDraft) -> Result<Test>;

    async fn update(&self, id: i64, changes: TestChanges) -> Result<Option<Test>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Newest first.
    async fn find_by_student(&self, student_id: i64) -> Result<Vec<PlacementResult>>;

    /// Every result joined with student name and test title, newest first.
    async fn find_all(&self) -> Result<Vec<PlacementResultWithNames>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlacementResult>>;

    async fn count_for_test(&self, test_id: i64) -> Result<i64>;

    /// Must fail with `Error::Conflict` when a result for the same
    /// (student, test) pair already exists, even under concurrent inserts.
    async fn insert(&self, draft: ResultDraft) -> Result<PlacementResult>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>>;
}
