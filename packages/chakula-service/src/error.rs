pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("History error: {message}")]
	History { message: String },
}
impl From<chakula_providers::Error> for Error {
	fn from(err: chakula_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::History { message: err.to_string() }
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::History { message: err.to_string() }
	}
}
