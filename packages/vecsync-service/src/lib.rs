pub mod reconcile;
pub mod report;

mod error;

use std::{future::Future, pin::Pin};

use time::{Duration, OffsetDateTime};

pub use error::{Error, Result};
pub use reconcile::{ReconcileSettings, Reconciler};
pub use report::PassReport;
use vecsync_domain::record::{EmbeddableUnit, Outcome, Record};
use vecsync_providers::embedding::EmbeddingClient;
use vecsync_storage::{models::StatusUpdate, records::PgRecordStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence the reconciler needs. Implemented for Postgres by [`PgRecordStore`].
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn fetch_pending(&self) -> BoxFuture<'_, vecsync_storage::Result<Vec<Record>>>;

	fn claim(&self, id: i64, now: OffsetDateTime) -> BoxFuture<'_, vecsync_storage::Result<bool>>;

	fn update_status<'a>(
		&'a self,
		update: &'a StatusUpdate,
		now: OffsetDateTime,
	) -> BoxFuture<'a, vecsync_storage::Result<()>>;

	fn reclaim_stale(
		&self,
		now: OffsetDateTime,
		lease: Duration,
	) -> BoxFuture<'_, vecsync_storage::Result<u64>>;
}

/// Sends one unit to the vectorization service. Never fails; errors become [`Outcome::Failed`].
pub trait EmbeddingSubmitter
where
	Self: Send + Sync,
{
	fn submit<'a>(&'a self, unit: &'a EmbeddableUnit) -> BoxFuture<'a, Outcome>;
}

impl RecordStore for PgRecordStore {
	fn fetch_pending(&self) -> BoxFuture<'_, vecsync_storage::Result<Vec<Record>>> {
		Box::pin(PgRecordStore::fetch_pending(self))
	}

	fn claim(&self, id: i64, now: OffsetDateTime) -> BoxFuture<'_, vecsync_storage::Result<bool>> {
		Box::pin(PgRecordStore::claim(self, id, now))
	}

	fn update_status<'a>(
		&'a self,
		update: &'a StatusUpdate,
		now: OffsetDateTime,
	) -> BoxFuture<'a, vecsync_storage::Result<()>> {
		Box::pin(PgRecordStore::update_status(self, update, now))
	}

	fn reclaim_stale(
		&self,
		now: OffsetDateTime,
		lease: Duration,
	) -> BoxFuture<'_, vecsync_storage::Result<u64>> {
		Box::pin(PgRecordStore::reclaim_stale(self, now, lease))
	}
}

impl EmbeddingSubmitter for EmbeddingClient {
	fn submit<'a>(&'a self, unit: &'a EmbeddableUnit) -> BoxFuture<'a, Outcome> {
		Box::pin(EmbeddingClient::submit(self, unit))
	}
}
