use tollgate_domain::action::ExecutionStatus;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Not allowlisted. Never executed.
	#[error("Validation denied: {message}")]
	ValidationDenied { status: ExecutionStatus, message: String },
	/// Refused by the store's access control before any mutation.
	#[error("Access denied: {message}")]
	AccessDenied { message: String },
	/// Raised while running. State may be partially mutated.
	#[error("Execution error: {message}")]
	Execution { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Data consistency error: {message}")]
	DataConsistency { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}
impl Error {
	/// Caller-facing status when this error ends a request.
	pub fn status(&self) -> ExecutionStatus {
		match self {
			Self::ValidationDenied { status, .. } => *status,
			Self::AccessDenied { .. } => ExecutionStatus::Denied,
			_ => ExecutionStatus::Error,
		}
	}

	/// Message without the taxonomy prefix.
	pub fn detail(&self) -> &str {
		match self {
			Self::ValidationDenied { message, .. }
			| Self::AccessDenied { message }
			| Self::Execution { message }
			| Self::Provider { message }
			| Self::DataConsistency { message }
			| Self::InvalidRequest { message }
			| Self::NotFound { message }
			| Self::Conflict { message }
			| Self::Storage { message }
			| Self::Qdrant { message } => message,
		}
	}
}

impl From<tollgate_storage::Error> for Error {
	fn from(err: tollgate_storage::Error) -> Self {
		match err {
			tollgate_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			tollgate_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			tollgate_storage::Error::NotFound(message) => Self::NotFound { message },
			tollgate_storage::Error::Conflict(message) => Self::Conflict { message },
			tollgate_storage::Error::DataConsistency(message) => Self::DataConsistency { message },
			tollgate_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
			tollgate_storage::Error::QdrantAlias(message) => Self::Qdrant { message },
		}
	}
}

impl From<tollgate_providers::Error> for Error {
	fn from(err: tollgate_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<tollgate_domain::catalog::CatalogError> for Error {
	fn from(err: tollgate_domain::catalog::CatalogError) -> Self {
		Self::DataConsistency { message: err.to_string() }
	}
}

impl From<tollgate_domain::retrieval::DimensionMismatch> for Error {
	fn from(err: tollgate_domain::retrieval::DimensionMismatch) -> Self {
		Self::DataConsistency { message: err.to_string() }
	}
}

impl From<crate::registry::StoreError> for Error {
	fn from(err: crate::registry::StoreError) -> Self {
		use crate::registry::StoreError;

		match err {
			StoreError::AccessDenied(message) => Self::AccessDenied { message },
			StoreError::MissingOperation(message) =>
				Self::ValidationDenied { status: ExecutionStatus::NoValidMethod, message },
			StoreError::Failed(message) => Self::Execution { message },
		}
	}
}

impl From<crate::registry::RegistryError> for Error {
	fn from(err: crate::registry::RegistryError) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
