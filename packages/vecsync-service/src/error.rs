pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to fetch pending records: {source}")]
	FetchPending { source: vecsync_storage::Error },
}
