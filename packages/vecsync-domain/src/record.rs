use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::status::EmbeddingStatus;

/// Payload field that describes why a record was created. Never embedded.
pub const RESERVED_INTENTION_FIELD: &str = "intention";
/// Domain tag attached to every unit produced for this pipeline.
pub const SERVICE_DOMAIN: &str = "service";

#[derive(Debug, Clone)]
pub struct Record {
	pub id: i64,
	pub payload: Value,
	pub embedding_status: EmbeddingStatus,
	pub embedding_error: Option<String>,
	pub embedding_attempts: i32,
	pub embedding_last_attempt: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
	#[serde(rename = "texte")]
	Text,
}

/// One field of one record, ready to be sent to the vectorization service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddableUnit {
	pub record_id: i64,
	pub field: String,
	pub value: String,
	pub data_type: DataType,
	pub locale: String,
	pub domain: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	Succeeded { vector_id: Option<String> },
	Failed { error: String },
}
impl Outcome {
	pub fn failed(error: impl Into<String>) -> Self {
		Self::Failed { error: error.into() }
	}

	pub fn is_success(&self) -> bool {
		matches!(self, Self::Succeeded { .. })
	}
}
