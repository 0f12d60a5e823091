//! Queries against the record table.
//!
//! Column names are fixed. The table name comes from configuration and is validated as a plain
//! identifier there, so it is interpolated rather than bound.

use time::{Duration, OffsetDateTime};

use vecsync_domain::{record::Record, status::EmbeddingStatus};

use crate::{
	Error, Result,
	db::Db,
	models::{RecordRow, StatusCounts, StatusUpdate},
};

pub struct PgRecordStore {
	db: Db,
	table: String,
}
impl PgRecordStore {
	pub fn new(db: Db, table: impl Into<String>) -> Result<Self> {
		let table = table.into();

		if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return Err(Error::InvalidArgument(format!("Invalid record table name {table:?}.")));
		}

		Ok(Self { db, table })
	}

	pub fn db(&self) -> &Db {
		&self.db
	}

	/// Pending records, oldest first.
	pub async fn fetch_pending(&self) -> Result<Vec<Record>> {
		let sql = format!(
			"\
SELECT
	id::BIGINT AS id,
	data::JSONB AS data,
	COALESCE(embedding_status, 'none') AS embedding_status,
	embedding_error,
	COALESCE(embedding_attempts, 0)::INT4 AS embedding_attempts,
	embedding_last_attempt::TIMESTAMPTZ AS embedding_last_attempt,
	COALESCE(created_at::TIMESTAMPTZ, now()) AS created_at,
	COALESCE(updated_at::TIMESTAMPTZ, now()) AS updated_at
FROM {}
WHERE embedding_status = $1
ORDER BY created_at ASC, id ASC",
			self.table
		);
		let rows = sqlx::query_as::<_, RecordRow>(&sql)
			.bind(EmbeddingStatus::Pending.as_str())
			.fetch_all(&self.db.pool)
			.await?;

		rows.into_iter().map(Record::try_from).collect()
	}

	/// Final status write keyed by id. Only terminal statuses are accepted; the other moves go
	/// through [`Self::claim`], [`Self::reclaim_stale`] and [`Self::requeue`].
	pub async fn update_status(&self, update: &StatusUpdate, now: OffsetDateTime) -> Result<()> {
		if !update.status.is_terminal() {
			return Err(Error::InvalidArgument(format!(
				"Final status for record {} must be success or failed, got {}.",
				update.id, update.status
			)));
		}

		let sql = format!(
			"\
UPDATE {}
SET embedding_status = $1,
	embedding_error = $2,
	embedding_attempts = COALESCE(embedding_attempts, 0) + CASE WHEN $3 THEN 1 ELSE 0 END,
	embedding_last_attempt = CASE WHEN $3 THEN $4 ELSE embedding_last_attempt END,
	updated_at = $4
WHERE id = $5",
			self.table
		);
		let result = sqlx::query(&sql)
			.bind(update.status.as_str())
			.bind(update.error.as_deref())
			.bind(update.increment_attempts)
			.bind(now)
			.bind(update.id)
			.execute(&self.db.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(Error::NotFound(format!("Record {} does not exist.", update.id)));
		}

		Ok(())
	}

	/// Moves a record from `pending` to `processing` and starts its lease.
	///
	/// Returns `false` when the record is no longer pending.
	pub async fn claim(&self, id: i64, now: OffsetDateTime) -> Result<bool> {
		let sql = format!(
			"\
UPDATE {}
SET embedding_status = $1,
	embedding_error = NULL,
	embedding_attempts = COALESCE(embedding_attempts, 0) + 1,
	embedding_last_attempt = $2,
	updated_at = $2
WHERE id = $3 AND embedding_status = $4",
			self.table
		);
		let result = sqlx::query(&sql)
			.bind(EmbeddingStatus::Processing.as_str())
			.bind(now)
			.bind(id)
			.bind(EmbeddingStatus::Pending.as_str())
			.execute(&self.db.pool)
			.await?;

		Ok(result.rows_affected() == 1)
	}

	/// Returns `processing` records whose lease expired to `pending`.
	pub async fn reclaim_stale(&self, now: OffsetDateTime, lease: Duration) -> Result<u64> {
		let cutoff = now - lease;
		let sql = format!(
			"\
UPDATE {}
SET embedding_status = $1,
	updated_at = $2
WHERE embedding_status = $3
	AND (embedding_last_attempt IS NULL OR embedding_last_attempt < $4)",
			self.table
		);
		let result = sqlx::query(&sql)
			.bind(EmbeddingStatus::Pending.as_str())
			.bind(now)
			.bind(EmbeddingStatus::Processing.as_str())
			.bind(cutoff)
			.execute(&self.db.pool)
			.await?;

		if result.rows_affected() > 0 {
			tracing::info!(count = result.rows_affected(), "Reclaimed stale processing records.");
		}

		Ok(result.rows_affected())
	}

	/// Puts a `failed` or never-queued record back in the queue.
	pub async fn requeue(&self, id: i64, now: OffsetDateTime) -> Result<bool> {
		let sql = format!(
			"\
UPDATE {}
SET embedding_status = $1,
	updated_at = $2
WHERE id = $3 AND COALESCE(embedding_status, 'none') IN ($4, $5)",
			self.table
		);
		let result = sqlx::query(&sql)
			.bind(EmbeddingStatus::Pending.as_str())
			.bind(now)
			.bind(id)
			.bind(EmbeddingStatus::Failed.as_str())
			.bind(EmbeddingStatus::None.as_str())
			.execute(&self.db.pool)
			.await?;

		Ok(result.rows_affected() == 1)
	}

	pub async fn status_counts(&self) -> Result<StatusCounts> {
		let sql = format!(
			"\
SELECT
	COALESCE(embedding_status, 'none') AS status,
	COUNT(*)::BIGINT AS count
FROM {}
GROUP BY 1",
			self.table
		);
		let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(&self.db.pool).await?;

		Ok(StatusCounts { counts: rows.into_iter().collect() })
	}
}
