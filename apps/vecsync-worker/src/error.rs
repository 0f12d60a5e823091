pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Reconciliation pass was not completed: {0}")]
	Pass(#[from] vecsync_service::Error),
	#[error(transparent)]
	Storage(#[from] vecsync_storage::Error),
	#[error(transparent)]
	Providers(#[from] vecsync_providers::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
}
