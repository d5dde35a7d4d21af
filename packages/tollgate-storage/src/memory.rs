//! In-process backends. The vector index is a usable production backend for single-process
//! deployments; the rest serve tests and embedded use.

use std::sync::{Arc, Mutex, RwLock};

use time::OffsetDateTime;
use uuid::Uuid;

use tollgate_domain::{
	audit::{AuditQuery, ExecutionAuditRecord},
	catalog::CatalogEntity,
	retrieval::{EmbeddingRecord, KnowledgeDocument, Namespace, ScoredChunk},
	session::{ChatSession, SessionOutcome},
};

use crate::{
	AuditSink, BoxFuture, CatalogRepository, Error, KnowledgeSource, Result, SessionLedger,
	VectorIndex,
};

/// Exact linear-scan index. A rebuild swaps the whole record set behind one pointer.
#[derive(Default)]
pub struct MemoryVectorIndex {
	records: RwLock<Arc<Vec<EmbeddingRecord>>>,
}
impl MemoryVectorIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn snapshot(&self) -> Arc<Vec<EmbeddingRecord>> {
		self.records.read().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

impl VectorIndex for MemoryVectorIndex {
	fn replace_records(&self, mut records: Vec<EmbeddingRecord>) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			records.sort_by_key(|record| record.position);

			let next = Arc::new(records);
			let mut guard = self.records.write().unwrap_or_else(|err| err.into_inner());

			*guard = next;

			Ok(())
		})
	}

	fn search<'a>(
		&'a self,
		query: &'a [f32],
		namespaces: &'a [Namespace],
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(async move {
			let snapshot = self.snapshot();
			let candidates = snapshot
				.iter()
				.filter(|record| namespaces.contains(&record.namespace))
				.cloned()
				.collect::<Vec<_>>();

			crate::vectors::rank_records(&candidates, query, limit)
		})
	}

	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async move { Ok(self.snapshot().len() as u64) })
	}
}

#[derive(Default)]
pub struct MemoryCatalogRepository {
	entities: RwLock<Vec<CatalogEntity>>,
}
impl MemoryCatalogRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

impl CatalogRepository for MemoryCatalogRepository {
	fn load_catalog(&self) -> BoxFuture<'_, Result<Vec<CatalogEntity>>> {
		Box::pin(async move {
			Ok(self.entities.read().unwrap_or_else(|err| err.into_inner()).clone())
		})
	}

	fn replace_catalog<'a>(&'a self, entities: &'a [CatalogEntity]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			*self.entities.write().unwrap_or_else(|err| err.into_inner()) = entities.to_vec();

			Ok(())
		})
	}
}

#[derive(Default)]
pub struct MemoryAuditSink {
	records: Mutex<Vec<ExecutionAuditRecord>>,
}
impl MemoryAuditSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn records(&self) -> Vec<ExecutionAuditRecord> {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn len(&self) -> usize {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl AuditSink for MemoryAuditSink {
	fn append<'a>(&'a self, record: &'a ExecutionAuditRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.records.lock().unwrap_or_else(|err| err.into_inner()).push(record.clone());

			Ok(())
		})
	}

	fn query<'a>(
		&'a self,
		query: &'a AuditQuery,
	) -> BoxFuture<'a, Result<Vec<ExecutionAuditRecord>>> {
		Box::pin(async move {
			let records = self.records.lock().unwrap_or_else(|err| err.into_inner());
			let mut matched = records
				.iter()
				.rev()
				.filter(|record| query.matches(record))
				.cloned()
				.collect::<Vec<_>>();

			matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
			matched.truncate(crate::audit::effective_limit(query));

			Ok(matched)
		})
	}
}

#[derive(Default)]
pub struct MemorySessionLedger {
	sessions: Mutex<Vec<ChatSession>>,
}
impl MemorySessionLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn sessions(&self) -> Vec<ChatSession> {
		self.sessions.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

impl SessionLedger for MemorySessionLedger {
	fn open<'a>(&'a self, session: &'a ChatSession) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());

			if sessions.iter().any(|existing| existing.session_id == session.session_id) {
				return Err(Error::Conflict(format!("Session {} already exists.", session.session_id)));
			}

			sessions.push(session.clone());

			Ok(())
		})
	}

	fn find(&self, session_id: Uuid) -> BoxFuture<'_, Result<Option<ChatSession>>> {
		Box::pin(async move {
			Ok(self
				.sessions
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.iter()
				.find(|session| session.session_id == session_id)
				.cloned())
		})
	}

	fn close<'a>(
		&'a self,
		session_id: Uuid,
		outcome: &'a SessionOutcome,
	) -> BoxFuture<'a, Result<ChatSession>> {
		Box::pin(async move {
			let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
			let session = sessions
				.iter_mut()
				.find(|session| session.session_id == session_id)
				.ok_or_else(|| Error::NotFound(format!("Session {session_id}.")))?;

			session.state = session
				.state
				.transition(outcome.state)
				.map_err(|err| Error::Conflict(err.to_string()))?;
			session.answer = outcome.answer.clone();
			session.action_payload = outcome.action_payload.clone();
			session.closed_at = Some(OffsetDateTime::now_utc());

			Ok(session.clone())
		})
	}
}

#[derive(Default)]
pub struct MemoryKnowledgeSource {
	documents: RwLock<Vec<KnowledgeDocument>>,
}
impl MemoryKnowledgeSource {
	pub fn new(documents: Vec<KnowledgeDocument>) -> Self {
		Self { documents: RwLock::new(documents) }
	}
}

impl KnowledgeSource for MemoryKnowledgeSource {
	fn active_documents(&self) -> BoxFuture<'_, Result<Vec<KnowledgeDocument>>> {
		Box::pin(async move {
			Ok(self
				.documents
				.read()
				.unwrap_or_else(|err| err.into_inner())
				.iter()
				.filter(|document| document.active)
				.cloned()
				.collect())
		})
	}
}
