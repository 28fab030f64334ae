use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a thumbnail job. Claiming a job moves it to `Running`; a job
/// ends `Completed` only once all derivative widths are written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Display for ThumbnailJobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ThumbnailJobStatus::Pending => write!(f, "pending"),
            ThumbnailJobStatus::Running => write!(f, "running"),
            ThumbnailJobStatus::Completed => write!(f, "completed"),
            ThumbnailJobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ThumbnailJobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ThumbnailJobStatus::Pending),
            "running" => Ok(ThumbnailJobStatus::Running),
            "completed" => Ok(ThumbnailJobStatus::Completed),
            "failed" => Ok(ThumbnailJobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Queued thumbnail work item. Job state is tracked explicitly so "never
/// requested", "in progress", and "failed" are distinguishable from "done"
/// without probing the blob store.
#[derive(Debug, Clone, FromRow)]
pub struct ThumbnailJob {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub status: ThumbnailJobStatus,
    pub error: Option<serde_json::Value>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    /// Earliest time a worker may claim this job; pushed forward on retry.
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ThumbnailJob {
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ThumbnailJobStatus::Pending,
            ThumbnailJobStatus::Running,
            ThumbnailJobStatus::Completed,
            ThumbnailJobStatus::Failed,
        ] {
            assert_eq!(
                status.to_string().parse::<ThumbnailJobStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn test_can_retry() {
        let mut job = ThumbnailJob {
            id: Uuid::new_v4(),
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: ThumbnailJobStatus::Pending,
            error: None,
            retry_count: 0,
            max_retries: 3,
            created_at: Utc::now(),
            scheduled_at: Utc::now(),
            started_at: None,
            completed_at: None,
            updated_at: Utc::now(),
        };
        assert!(job.can_retry());
        job.retry_count = 3;
        assert!(!job.can_retry());
    }
}
