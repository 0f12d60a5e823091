use serde::Serialize;

/// Aggregate counts for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
	/// Pending records fetched at the start of the pass.
	pub total: usize,
	pub succeeded: usize,
	pub failed: usize,
	/// Records left alone because the claim did not go through.
	pub skipped: usize,
	/// Stale `processing` records moved back to `pending` before the fetch.
	pub reclaimed: u64,
	pub cancelled: bool,
}
impl PassReport {
	pub fn processed(&self) -> usize {
		self.succeeded + self.failed
	}

	pub fn log(&self) {
		if self.failed == 0 && self.succeeded == self.total {
			tracing::info!(
				total = self.total,
				succeeded = self.succeeded,
				reclaimed = self.reclaimed,
				"Reconciliation pass completed."
			);
		} else {
			tracing::warn!(
				total = self.total,
				succeeded = self.succeeded,
				failed = self.failed,
				skipped = self.skipped,
				reclaimed = self.reclaimed,
				cancelled = self.cancelled,
				"Reconciliation pass completed with failures or skipped records."
			);
		}
	}
}
