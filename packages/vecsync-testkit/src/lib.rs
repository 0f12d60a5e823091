//! Disposable Postgres databases for storage tests.
//!
//! Tests read `VECSYNC_PG_DSN`, create a uniquely named database next to it, and drop it when the
//! handle goes away.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

/// Columns the record store touches. `{table}` is replaced with the configured table name.
pub const RECORD_TABLE_SQL: &str = "\
CREATE TABLE IF NOT EXISTS {table} (
	id SERIAL PRIMARY KEY,
	data JSONB,
	embedding_status TEXT DEFAULT 'none',
	embedding_error TEXT,
	embedding_attempts INTEGER DEFAULT 0,
	embedding_last_attempt TIMESTAMP,
	created_at TIMESTAMP NOT NULL DEFAULT NOW(),
	updated_at TIMESTAMP NOT NULL DEFAULT NOW()
)";

pub fn env_dsn() -> Option<String> {
	env::var("VECSYNC_PG_DSN").ok()
}

pub struct TestDatabase {
	name: String,
	dsn: String,
	admin: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let (admin, mut conn) = admin_connection(&base).await?;
		let name = format!("vecsync_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub async fn create_record_table(&self, table: &str) -> Result<()> {
		let mut conn = PgConnection::connect(&self.dsn).await?;

		conn.execute(RECORD_TABLE_SQL.replace("{table}", table).as_str()).await?;

		Ok(())
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.admin).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let admin = self.admin.clone();
		// Drop cannot await, so the cleanup gets its own runtime.
		let worker = thread::spawn(move || {
			let result = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| err.to_string())
				.and_then(|runtime| {
					runtime.block_on(drop_database(&name, &admin)).map_err(|err| err.to_string())
				});

			if let Err(err) = result {
				eprintln!("Failed to drop test database {name}: {err}.");
			}
		});

		let _ = worker.join();
	}
}

async fn admin_connection(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let postgres = base.clone().database("postgres");

	match PgConnection::connect_with(&postgres).await {
		Ok(conn) => Ok((postgres, conn)),
		Err(_) => {
			let template = base.clone().database("template1");
			let conn =
				PgConnection::connect_with(&template).await.map_err(Error::NoAdminDatabase)?;

			Ok((template, conn))
		},
	}
}

async fn drop_database(name: &str, admin: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin).await?;

	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await?;
	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await?;

	Ok(())
}
