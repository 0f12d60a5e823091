use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use vecsync_domain::{record::Record, status::EmbeddingStatus};

use crate::Error;

#[derive(Debug, sqlx::FromRow)]
pub struct RecordRow {
	pub id: i64,
	pub data: Option<Value>,
	pub embedding_status: String,
	pub embedding_error: Option<String>,
	pub embedding_attempts: i32,
	pub embedding_last_attempt: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl TryFrom<RecordRow> for Record {
	type Error = Error;

	fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			payload: row.data.unwrap_or(Value::Null),
			embedding_status: row.embedding_status.parse()?,
			embedding_error: row.embedding_error,
			embedding_attempts: row.embedding_attempts,
			embedding_last_attempt: row.embedding_last_attempt,
			created_at: row.created_at,
			updated_at: row.updated_at,
		})
	}
}

/// Status write for one record, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
	pub id: i64,
	pub status: EmbeddingStatus,
	pub error: Option<String>,
	pub increment_attempts: bool,
}

/// Record count per embedding status. Unrecognized status values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
	pub counts: BTreeMap<String, i64>,
}
impl StatusCounts {
	pub fn get(&self, status: EmbeddingStatus) -> i64 {
		self.counts.get(status.as_str()).copied().unwrap_or(0)
	}

	pub fn total(&self) -> i64 {
		self.counts.values().sum()
	}
}
