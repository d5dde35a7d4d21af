#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Data consistency: {0}")]
	DataConsistency(String),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
	#[error("Qdrant alias update failed: {0}")]
	QdrantAlias(String),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}

impl From<tollgate_domain::retrieval::DimensionMismatch> for Error {
	fn from(err: tollgate_domain::retrieval::DimensionMismatch) -> Self {
		Self::DataConsistency(err.to_string())
	}
}

impl From<tollgate_domain::catalog::CatalogError> for Error {
	fn from(err: tollgate_domain::catalog::CatalogError) -> Self {
		Self::DataConsistency(err.to_string())
	}
}
