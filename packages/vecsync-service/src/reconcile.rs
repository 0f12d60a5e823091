//! The reconciliation pass.
//!
//! One pass fetches every pending record and walks them oldest first. Each record is claimed
//! (`pending → processing`, attempts +1), its payload is split into units, every unit is
//! submitted in order, and the tally is folded into the terminal status. Errors stay inside the
//! record that raised them. Only a failed fetch at the start aborts the pass.

use std::{sync::Arc, time::Duration as StdDuration};

use time::{Duration, OffsetDateTime};
use tokio::{sync::watch, time as tokio_time};

use vecsync_config::{Config, PartialPolicy};
use vecsync_domain::{
	aggregate::{self, Tally, Verdict},
	extract,
	record::Record,
	status::EmbeddingStatus,
};
use vecsync_storage::models::StatusUpdate;

use crate::{EmbeddingSubmitter, Error, PassReport, RecordStore, Result};

const MAX_ERROR_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";
const SECRET_KEYS: [&str; 6] = ["api_key", "api-key", "apikey", "password", "secret", "token"];

#[derive(Debug, Clone)]
pub struct ReconcileSettings {
	pub per_unit_delay: StdDuration,
	pub per_record_delay: StdDuration,
	pub partial_policy: PartialPolicy,
	pub locale: String,
	pub reclaim_stale: bool,
	pub lease: Duration,
}
impl ReconcileSettings {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			per_unit_delay: StdDuration::from_millis(cfg.reconcile.per_unit_delay_ms),
			per_record_delay: StdDuration::from_millis(cfg.reconcile.per_record_delay_ms),
			partial_policy: cfg.reconcile.partial_policy,
			locale: cfg.providers.embedding.locale.clone(),
			reclaim_stale: cfg.reconcile.reclaim_stale,
			lease: Duration::seconds(cfg.reconcile.lease_seconds),
		}
	}
}
impl Default for ReconcileSettings {
	fn default() -> Self {
		Self {
			per_unit_delay: StdDuration::from_millis(500),
			per_record_delay: StdDuration::from_secs(2),
			partial_policy: PartialPolicy::Success,
			locale: "fra".to_string(),
			reclaim_stale: true,
			lease: Duration::minutes(15),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
	Succeeded,
	Failed,
	Skipped,
}

pub struct Reconciler {
	store: Arc<dyn RecordStore>,
	embedder: Arc<dyn EmbeddingSubmitter>,
	settings: ReconcileSettings,
}
impl Reconciler {
	pub fn new(
		store: Arc<dyn RecordStore>,
		embedder: Arc<dyn EmbeddingSubmitter>,
		settings: ReconcileSettings,
	) -> Self {
		Self { store, embedder, settings }
	}

	/// Runs one pass over the currently pending records.
	///
	/// `shutdown` is checked between records and during the inter-record pause. A record that
	/// has been claimed is always finished before the pass stops.
	pub async fn run_pass(&self, shutdown: &watch::Receiver<bool>) -> Result<PassReport> {
		let mut report = PassReport::default();

		if self.settings.reclaim_stale {
			let now = OffsetDateTime::now_utc();

			match self.store.reclaim_stale(now, self.settings.lease).await {
				Ok(count) => report.reclaimed = count,
				Err(err) => {
					tracing::warn!(error = %err, "Stale processing sweep failed.");
				},
			}
		}

		let records =
			self.store.fetch_pending().await.map_err(|source| Error::FetchPending { source })?;

		report.total = records.len();

		if records.is_empty() {
			tracing::info!("No records pending embedding.");

			return Ok(report);
		}

		tracing::info!(count = records.len(), "Starting reconciliation pass.");

		for (index, record) in records.iter().enumerate() {
			if *shutdown.borrow() {
				report.cancelled = true;

				break;
			}

			tracing::debug!(
				record_id = record.id,
				position = index + 1,
				total = records.len(),
				"Reconciling record."
			);

			match self.process_record(record).await {
				Disposition::Succeeded => report.succeeded += 1,
				Disposition::Failed => report.failed += 1,
				Disposition::Skipped => report.skipped += 1,
			}

			let is_last = index + 1 == records.len();

			if !is_last && pause(self.settings.per_record_delay, shutdown).await {
				report.cancelled = true;

				break;
			}
		}

		report.log();

		Ok(report)
	}

	async fn process_record(&self, record: &Record) -> Disposition {
		let now = OffsetDateTime::now_utc();

		match self.store.claim(record.id, now).await {
			Ok(true) => {
				tracing::info!(
					record_id = record.id,
					status = %EmbeddingStatus::Processing,
					attempts = record.embedding_attempts.saturating_add(1),
					"Record claimed."
				);
			},
			Ok(false) => {
				tracing::info!(record_id = record.id, "Record is no longer pending. Skipping.");

				return Disposition::Skipped;
			},
			Err(err) => {
				tracing::error!(record_id = record.id, error = %err, "Failed to claim record.");

				return Disposition::Skipped;
			},
		}

		let verdict = self.embed_record(record).await;
		let update = StatusUpdate {
			id: record.id,
			status: verdict.status,
			error: verdict.error.as_deref().map(sanitize_error),
			increment_attempts: false,
		};

		if let Err(err) = self.store.update_status(&update, OffsetDateTime::now_utc()).await {
			tracing::error!(
				record_id = record.id,
				status = %update.status,
				error = %err,
				"Failed to persist record status."
			);

			return Disposition::Failed;
		}

		match update.status {
			EmbeddingStatus::Success => {
				match update.error.as_deref() {
					Some(note) => tracing::warn!(
						record_id = record.id,
						status = %update.status,
						note,
						"Record partially embedded."
					),
					None => tracing::info!(
						record_id = record.id,
						status = %update.status,
						"Record embedded."
					),
				}

				Disposition::Succeeded
			},
			_ => {
				tracing::warn!(
					record_id = record.id,
					status = %update.status,
					error = update.error.as_deref().unwrap_or_default(),
					"Record embedding failed."
				);

				Disposition::Failed
			},
		}
	}

	async fn embed_record(&self, record: &Record) -> Verdict {
		let units = extract::extract_units(record.id, &record.payload, &self.settings.locale);

		tracing::debug!(record_id = record.id, units = units.len(), "Extracted embeddable units.");

		let mut tally = Tally::default();

		for (index, unit) in units.iter().enumerate() {
			if index > 0 && !self.settings.per_unit_delay.is_zero() {
				tokio_time::sleep(self.settings.per_unit_delay).await;
			}

			let outcome = self.embedder.submit(unit).await;

			tracing::debug!(
				record_id = record.id,
				field = %unit.field,
				success = outcome.is_success(),
				"Unit submitted."
			);
			tally.record(&outcome);
		}

		aggregate::verdict(tally, self.settings.partial_policy)
	}
}

/// Sleeps for `duration`. Returns `true` when shutdown was requested first.
async fn pause(duration: StdDuration, shutdown: &watch::Receiver<bool>) -> bool {
	if *shutdown.borrow() {
		return true;
	}
	if duration.is_zero() {
		return false;
	}

	let mut shutdown = shutdown.clone();
	let sleep = tokio_time::sleep(duration);

	tokio::pin!(sleep);

	tokio::select! {
		_ = &mut sleep => false,
		stopped = async { shutdown.wait_for(|stop| *stop).await.is_ok() } => {
			if stopped {
				return true;
			}

			// Sender dropped: nobody can ask for shutdown any more.
			sleep.await;

			false
		},
	}
}

/// Redacts credentials and bounds the length of text persisted as `embedding_error`.
pub fn sanitize_error(text: &str) -> String {
	let mut words = Vec::new();
	let mut after_bearer = false;

	for word in text.split_whitespace() {
		let clean = if after_bearer {
			REDACTED.to_string()
		} else {
			redact_assignment(word).unwrap_or_else(|| word.to_string())
		};

		after_bearer = word.eq_ignore_ascii_case("bearer");
		words.push(clean);
	}

	let text = words.join(" ");

	match text.char_indices().nth(MAX_ERROR_CHARS) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text,
	}
}

/// `api_key=abc` becomes `api_key=[REDACTED]`. Words without a secret-looking key are left alone.
fn redact_assignment(word: &str) -> Option<String> {
	let (key, _) = word.split_once(['=', ':'])?;
	let lowered = key.to_ascii_lowercase();

	if !SECRET_KEYS.iter().any(|secret| lowered.contains(secret)) {
		return None;
	}

	let separator = &word[key.len()..=key.len()];

	Some(format!("{key}{separator}{REDACTED}"))
}
