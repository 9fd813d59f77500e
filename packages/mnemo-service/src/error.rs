pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<mnemo_storage::Error> for Error {
	fn from(err: mnemo_storage::Error) -> Self {
		match err {
			mnemo_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			mnemo_storage::Error::Qdrant(inner) => Self::Storage { message: inner.to_string() },
		}
	}
}

impl From<mnemo_providers::Error> for Error {
	fn from(err: mnemo_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
