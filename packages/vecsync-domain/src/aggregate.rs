use serde::Serialize;

use vecsync_config::PartialPolicy;

use crate::{record::Outcome, status::EmbeddingStatus};

pub const NO_SUCCESSFUL_EMBEDDINGS: &str = "no successful embeddings";

/// Per-record success count over attempted units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
	pub succeeded: u32,
	pub total: u32,
}
impl Tally {
	pub fn record(&mut self, outcome: &Outcome) {
		self.total += 1;

		if outcome.is_success() {
			self.succeeded += 1;
		}
	}

	pub fn failed(&self) -> u32 {
		self.total - self.succeeded
	}

	pub fn is_partial(&self) -> bool {
		self.succeeded > 0 && self.succeeded < self.total
	}
}
impl<'a> FromIterator<&'a Outcome> for Tally {
	fn from_iter<I: IntoIterator<Item = &'a Outcome>>(iter: I) -> Self {
		let mut tally = Self::default();

		for outcome in iter {
			tally.record(outcome);
		}

		tally
	}
}

/// Terminal status and diagnostic for one reconciled record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
	pub status: EmbeddingStatus,
	pub error: Option<String>,
}

/// Folds a tally into the record's terminal state.
///
/// A record with no units counts as fully embedded.
pub fn verdict(tally: Tally, policy: PartialPolicy) -> Verdict {
	if tally.total > 0 && tally.succeeded == 0 {
		return Verdict {
			status: EmbeddingStatus::Failed,
			error: Some(NO_SUCCESSFUL_EMBEDDINGS.to_string()),
		};
	}
	if tally.is_partial() {
		let note = format!("partial: {}/{}", tally.succeeded, tally.total);
		let status = match policy {
			PartialPolicy::Success => EmbeddingStatus::Success,
			PartialPolicy::Fail => EmbeddingStatus::Failed,
		};

		return Verdict { status, error: Some(note) };
	}

	Verdict { status: EmbeddingStatus::Success, error: None }
}
