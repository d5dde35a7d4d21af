use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read manifest at {path:?}.")]
	ReadManifest { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse manifest at {path:?}.")]
	ParseManifest { path: PathBuf, source: serde_json::Error },
	#[error("{0}")]
	Validation(String),
	#[error(transparent)]
	Storage(#[from] tollgate_storage::Error),
	#[error(transparent)]
	Service(#[from] tollgate_service::Error),
}
