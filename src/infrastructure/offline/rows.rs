use crate::domain::entities::PendingWrite;
use crate::domain::value_objects::{PendingWriteId, WritePayload};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PendingWriteRow {
    pub id: String,
    pub payload: String,
    pub created_at: i64,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<i64>,
}

impl PendingWriteRow {
    pub fn into_domain(self) -> Result<PendingWrite, AppError> {
        let id = PendingWriteId::new(self.id).map_err(AppError::Internal)?;
        let payload = WritePayload::from_json_str(&self.payload).map_err(AppError::Serialization)?;
        let created_at = millis_to_datetime(self.created_at)?;
        let last_attempt_at = self.last_attempt_at.map(millis_to_datetime).transpose()?;

        Ok(PendingWrite::new(id, payload, created_at).with_attempts(
            self.attempts.max(0) as u32,
            self.last_error,
            last_attempt_at,
        ))
    }
}

fn millis_to_datetime(value: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .ok_or_else(|| AppError::Internal(format!("Invalid timestamp: {value}")))
}
