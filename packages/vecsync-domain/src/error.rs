pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown embedding status {value:?}.")]
	UnknownStatus { value: String },
}
