use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::database::repository::{ResultStore, StudentDirectory};
use crate::error::{Error, Result};

pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Time after registration during which a first attempt may be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityWindow {
    pub length: Duration,
    pub grace: Duration,
}

impl Default for EligibilityWindow {
    fn default() -> Self {
        Self {
            length: Duration::hours(DEFAULT_WINDOW_HOURS),
            grace: Duration::zero(),
        }
    }
}

impl EligibilityWindow {
    pub fn new(length: Duration, grace: Duration) -> Self {
        Self { length, grace }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::hours(config.eligibility_window_hours),
            Duration::minutes(config.eligibility_grace_minutes),
        )
    }

    pub fn total(&self) -> Duration {
        self.length + self.grace
    }

    pub fn closes_at(&self, registered_at: DateTime<Utc>) -> DateTime<Utc> {
        registered_at + self.total()
    }
}

/// An existing attempt always passes so the student can reach their result.
/// A missing registration time fails open.
pub fn is_eligible(
    now: DateTime<Utc>,
    registered_at: Option<DateTime<Utc>>,
    has_existing_attempt: bool,
    window: &EligibilityWindow,
) -> bool {
    if has_existing_attempt {
        return true;
    }
    match registered_at {
        Some(registered_at) => now.signed_duration_since(registered_at) <= window.total(),
        None => true,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityStatus {
    pub student_id: i64,
    pub test_id: i64,
    pub eligible: bool,
    pub has_existing_attempt: bool,
    pub result_id: Option<Uuid>,
    pub closes_at: Option<DateTime<Utc>>,
    pub seconds_remaining: Option<i64>,
}

#[derive(Clone)]
pub struct EligibilityService {
    students: Arc<dyn StudentDirectory>,
    results: Arc<dyn ResultStore>,
    window: EligibilityWindow,
}

impl EligibilityService {
    pub fn new(
        students: Arc<dyn StudentDirectory>,
        results: Arc<dyn ResultStore>,
        window: EligibilityWindow,
    ) -> Self {
        Self {
            students,
            results,
            window,
        }
    }

    pub fn window(&self) -> EligibilityWindow {
        self.window
    }

    pub async fn check(
        &self,
        student_id: i64,
        test_id: i64,
        now: DateTime<Utc>,
    ) -> Result<EligibilityStatus> {
        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or_else(Error::student_not_found)?;

        let existing = self
            .results
            .find_by_student(student_id)
            .await?
            .into_iter()
            .find(|r| r.test_id == test_id);
        let has_existing_attempt = existing.is_some();

        let eligible = is_eligible(now, student.registered_at, has_existing_attempt, &self.window);
        let closes_at = student.registered_at.map(|at| self.window.closes_at(at));
        let seconds_remaining = match (has_existing_attempt, closes_at) {
            (false, Some(closes_at)) => Some((closes_at - now).num_seconds().max(0)),
            _ => None,
        };

        tracing::debug!(student_id, test_id, eligible, has_existing_attempt, "eligibility checked");

        Ok(EligibilityStatus {
            student_id,
            test_id,
            eligible,
            has_existing_attempt,
            result_id: existing.map(|r| r.id),
            closes_at,
            seconds_remaining,
        })
    }
}
