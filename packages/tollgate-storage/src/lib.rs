pub mod audit;
pub mod catalog;
pub mod db;
pub mod knowledge;
pub mod memory;
pub mod models;
pub mod qdrant;
pub mod schema;
pub mod sessions;
pub mod vectors;

mod error;

pub use error::Error;

use std::{future::Future, pin::Pin};

use uuid::Uuid;

use tollgate_domain::{
	audit::{AuditQuery, ExecutionAuditRecord},
	catalog::CatalogEntity,
	retrieval::{EmbeddingRecord, KnowledgeDocument, Namespace, ScoredChunk},
	session::{ChatSession, SessionOutcome},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistent Catalog Store.
pub trait CatalogRepository
where
	Self: Send + Sync,
{
	fn load_catalog(&self) -> BoxFuture<'_, Result<Vec<CatalogEntity>>>;

	/// Replaces every entity and child row as one unit.
	fn replace_catalog<'a>(&'a self, entities: &'a [CatalogEntity]) -> BoxFuture<'a, Result<()>>;
}

/// Embedding storage. Readers see either the previous or the new complete record set.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn replace_records(&self, records: Vec<EmbeddingRecord>) -> BoxFuture<'_, Result<()>>;

	/// Ranked by cosine similarity descending, ties by record position.
	fn search<'a>(
		&'a self,
		query: &'a [f32],
		namespaces: &'a [Namespace],
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>>;

	fn count(&self) -> BoxFuture<'_, Result<u64>>;
}

/// Append-only execution audit.
pub trait AuditSink
where
	Self: Send + Sync,
{
	fn append<'a>(&'a self, record: &'a ExecutionAuditRecord) -> BoxFuture<'a, Result<()>>;

	fn query<'a>(
		&'a self,
		query: &'a AuditQuery,
	) -> BoxFuture<'a, Result<Vec<ExecutionAuditRecord>>>;
}

pub trait SessionLedger
where
	Self: Send + Sync,
{
	fn open<'a>(&'a self, session: &'a ChatSession) -> BoxFuture<'a, Result<()>>;

	fn find(&self, session_id: Uuid) -> BoxFuture<'_, Result<Option<ChatSession>>>;

	/// Moves a draft session to its terminal state. Any other starting state is a conflict.
	fn close<'a>(
		&'a self,
		session_id: Uuid,
		outcome: &'a SessionOutcome,
	) -> BoxFuture<'a, Result<ChatSession>>;
}

pub trait KnowledgeSource
where
	Self: Send + Sync,
{
	fn active_documents(&self) -> BoxFuture<'_, Result<Vec<KnowledgeDocument>>>;
}
