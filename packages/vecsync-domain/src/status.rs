use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Embedding lifecycle of a record.
///
/// `pending → processing → success | failed`. `none` marks records that were never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
	None,
	Pending,
	Processing,
	Success,
	Failed,
}
impl EmbeddingStatus {
	pub const ALL: [Self; 5] =
		[Self::None, Self::Pending, Self::Processing, Self::Success, Self::Failed];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Pending => "pending",
			Self::Processing => "processing",
			Self::Success => "success",
			Self::Failed => "failed",
		}
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Success | Self::Failed)
	}
}
impl fmt::Display for EmbeddingStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for EmbeddingStatus {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		let normalized = value.trim().to_ascii_lowercase();

		Self::ALL
			.into_iter()
			.find(|status| status.as_str() == normalized)
			.ok_or_else(|| Error::UnknownStatus { value: value.to_string() })
	}
}
