pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("VECSYNC_PG_DSN is not a valid Postgres DSN: {0}")]
	InvalidDsn(sqlx::Error),
	#[error("No admin database (postgres, template1) accepted the connection: {0}")]
	NoAdminDatabase(sqlx::Error),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
