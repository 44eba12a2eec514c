use crate::domain::value_objects::{PendingWriteId, WritePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub id: PendingWriteId,
    pub payload: WritePayload,
    /// Original capture time, preserved through replay.
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl PendingWrite {
    pub fn new(id: PendingWriteId, payload: WritePayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            payload,
            created_at,
            synced: false,
            attempts: 0,
            last_error: None,
            last_attempt_at: None,
        }
    }

    pub fn with_attempts(
        mut self,
        attempts: u32,
        last_error: Option<String>,
        last_attempt_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.attempts = attempts;
        self.last_error = last_error;
        self.last_attempt_at = last_attempt_at;
        self
    }
}
