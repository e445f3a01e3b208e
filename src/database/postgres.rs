use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::repository::{ResultStore, StudentDirectory, TestCatalog};
use crate::error::{Error, Result};
use crate::models::placement_result::{
    PlacementResult, PlacementResultRow, PlacementResultWithNames, PlacementResultWithNamesRow,
    ResultDraft,
};
use crate::models::question::encode_questions;
use crate::models::student::Student;
use crate::models::test::{Test, TestChanges, TestDraft, TestRow, TestStatus};

const TEST_COLUMNS: &str =
    "id, title, description, duration_minutes, status, questions, created_at, updated_at";

const RESULT_COLUMNS: &str = "id, student_id, test_id, score, total_points, percentage, \
     recommended_level, answers, status, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TestCatalog for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Test>> {
        let row = sqlx::query_as::<_, TestRow>(&format!(
            "SELECT {} FROM tests WHERE id = $1",
            TEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Test::try_from).transpose()
    }

    async fn list(&self, status: Option<TestStatus>) -> Result<Vec<Test>> {
        let rows = sqlx::query_as::<_, TestRow>(&format!(
            r#"
            SELECT {} FROM tests
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY id
            "#,
            TEST_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Test::try_from).collect()
    }

    async fn create(&self, draft: TestDraft) -> Result<Test> {
        let questions_json = encode_questions(&draft.questions)?;
        let row = sqlx::query_as::<_, TestRow>(&format!(
            r#"
            INSERT INTO tests (title, description, duration_minutes, status, questions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TEST_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.duration_minutes)
        .bind(draft.status.as_str())
        .bind(questions_json)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update(&self, id: i64, changes: TestChanges) -> Result<Option<Test>> {
        let questions_json = match &changes.questions {
            Some(questions) => Some(encode_questions(questions)?),
            None => None,
        };

        let row = sqlx::query_as::<_, TestRow>(&format!(
            r#"
            UPDATE tests
            SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                duration_minutes = COALESCE($3, duration_minutes),
                status = COALESCE($4, status),
                questions = COALESCE($5, questions),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            TEST_COLUMNS
        ))
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.duration_minutes)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(questions_json)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Test::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn find_by_student(&self, student_id: i64) -> Result<Vec<PlacementResult>> {
        let rows = sqlx::query_as::<_, PlacementResultRow>(&format!(
            "SELECT {} FROM placement_results WHERE student_id = $1 ORDER BY created_at DESC",
            RESULT_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PlacementResult::try_from).collect()
    }

    async fn find_all(&self) -> Result<Vec<PlacementResultWithNames>> {
        let rows = sqlx::query_as::<_, PlacementResultWithNamesRow>(
            r#"
            SELECT
                r.id, r.student_id, r.test_id, r.score, r.total_points, r.percentage,
                r.recommended_level, r.answers, r.status, r.created_at,
                s.name AS student_name,
                t.title AS test_title
            FROM placement_results r
            LEFT JOIN students s ON s.id = r.student_id
            LEFT JOIN tests t ON t.id = r.test_id
            ORDER BY r.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(PlacementResultWithNames::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlacementResult>> {
        let row = sqlx::query_as::<_, PlacementResultRow>(&format!(
            "SELECT {} FROM placement_results WHERE id = $1",
            RESULT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PlacementResult::try_from).transpose()
    }

    async fn count_for_test(&self, test_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM placement_results WHERE test_id = $1")
                .bind(test_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn insert(&self, draft: ResultDraft) -> Result<PlacementResult> {
        let answers_json = serde_json::to_value(&draft.answers)?;

        // The unique constraint decides the race; a losing insert returns no row.
        let row = sqlx::query_as::<_, PlacementResultRow>(&format!(
            r#"
            INSERT INTO placement_results (
                id, student_id, test_id, score, total_points, percentage,
                recommended_level, answers, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed')
            ON CONFLICT (student_id, test_id) DO NOTHING
            RETURNING {}
            "#,
            RESULT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(draft.student_id)
        .bind(draft.test_id)
        .bind(draft.score)
        .bind(draft.total_points)
        .bind(draft.percentage)
        .bind(draft.recommended_level.as_str())
        .bind(answers_json)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(Error::duplicate_attempt()),
        }
    }
}

#[async_trait]
impl StudentDirectory for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT id, name, email, registered_at FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }
}
