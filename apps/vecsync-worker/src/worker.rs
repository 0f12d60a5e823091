use std::{sync::Arc, time::Duration as StdDuration};

use time::{Duration, OffsetDateTime};
use tokio::{sync::watch, time as tokio_time};

use vecsync_config::{Config, Reconcile};
use vecsync_providers::embedding::EmbeddingClient;
use vecsync_service::{PassReport, ReconcileSettings, Reconciler};
use vecsync_storage::records::PgRecordStore;

use crate::Result;

pub struct WorkerState {
	pub reconciler: Reconciler,
	pub poll_interval: StdDuration,
}
impl WorkerState {
	pub fn new(cfg: &Config, store: PgRecordStore) -> Result<Self> {
		let embedder = EmbeddingClient::new(&cfg.providers.embedding)?;

		tracing::info!(url = %embedder.url(), table = %cfg.storage.postgres.table, "Worker ready.");

		let reconciler = Reconciler::new(
			Arc::new(store),
			Arc::new(embedder),
			ReconcileSettings::from_config(cfg),
		);

		Ok(Self { reconciler, poll_interval: StdDuration::from_millis(cfg.reconcile.poll_interval_ms) })
	}
}

/// One pass. A fetch failure at the start is returned so the process exits non-zero.
pub async fn run_once(state: &WorkerState) -> Result<PassReport> {
	let shutdown = shutdown_signal();
	let report = state.reconciler.run_pass(&shutdown).await?;

	Ok(report)
}

pub async fn run_worker(state: WorkerState) -> Result<()> {
	let shutdown = shutdown_signal();

	loop {
		if let Err(err) = state.reconciler.run_pass(&shutdown).await {
			tracing::error!(error = %err, "Reconciliation pass failed.");
		}
		if *shutdown.borrow() {
			break;
		}

		let mut stop = shutdown.clone();

		tokio::select! {
			_ = tokio_time::sleep(state.poll_interval) => {},
			stopped = async { stop.wait_for(|stop| *stop).await.is_ok() } => {
				if stopped {
					break;
				}
			},
		}
	}

	tracing::info!("Worker stopped.");

	Ok(())
}

pub async fn requeue(store: &PgRecordStore, ids: &[i64]) -> Result<u64> {
	let now = OffsetDateTime::now_utc();
	let mut requeued = 0;

	for &id in ids {
		if store.requeue(id, now).await? {
			tracing::info!(record_id = id, "Record requeued.");

			requeued += 1;
		} else {
			tracing::warn!(record_id = id, "Record is missing or not in a requeueable status.");
		}
	}

	tracing::info!(requested = ids.len(), requeued, "Requeue finished.");

	Ok(requeued)
}

pub async fn reclaim(store: &PgRecordStore, cfg: &Reconcile) -> Result<u64> {
	let reclaimed =
		store.reclaim_stale(OffsetDateTime::now_utc(), Duration::seconds(cfg.lease_seconds)).await?;

	tracing::info!(reclaimed, lease_seconds = cfg.lease_seconds, "Stale processing sweep finished.");

	Ok(reclaimed)
}

pub async fn stats(store: &PgRecordStore) -> Result<String> {
	let counts = store.status_counts().await?;

	Ok(serde_json::to_string_pretty(&counts)?)
}

/// Flips to `true` on Ctrl-C. The current record is always finished first.
fn shutdown_signal() -> watch::Receiver<bool> {
	let (tx, rx) = watch::channel(false);

	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => {
				tracing::info!("Shutdown requested. Finishing the current record.");

				let _ = tx.send(true);
			},
			Err(err) => {
				tracing::error!(error = %err, "Failed to listen for shutdown signal.");

				tx.closed().await;
			},
		}
	});

	rx
}
