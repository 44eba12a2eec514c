pub mod pending_write_id;
pub mod write_payload;

pub use pending_write_id::PendingWriteId;
pub use write_payload::WritePayload;
