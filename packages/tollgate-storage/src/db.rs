use sqlx::{PgPool, postgres::PgPoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

use tollgate_domain::{
	audit::{AuditQuery, ExecutionAuditRecord},
	catalog::CatalogEntity,
	retrieval::{EmbeddingRecord, KnowledgeDocument, Namespace, ScoredChunk},
	session::{ChatSession, SessionOutcome},
};

use crate::{
	AuditSink, BoxFuture, CatalogRepository, KnowledgeSource, Result, SessionLedger, VectorIndex,
	audit, catalog, knowledge, schema, sessions, vectors,
};

#[derive(Clone)]
pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &tollgate_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self, vector_dim: u32) -> Result<()> {
		let sql = schema::render_schema(vector_dim);
		let lock_id: i64 = 7_120_115;
		// Advisory locks are held per connection. Keep the lock inside one transaction so it is
		// released with it.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	pub async fn upsert_knowledge_document(&self, document: &KnowledgeDocument) -> Result<()> {
		knowledge::upsert_document(&self.pool, document, OffsetDateTime::now_utc()).await
	}
}

impl CatalogRepository for Db {
	fn load_catalog(&self) -> BoxFuture<'_, Result<Vec<CatalogEntity>>> {
		Box::pin(async move {
			let mut tx = self.pool.begin().await?;
			let entities = catalog::load_catalog(&mut *tx).await?;

			tx.commit().await?;

			Ok(entities)
		})
	}

	fn replace_catalog<'a>(&'a self, entities: &'a [CatalogEntity]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut tx = self.pool.begin().await?;

			catalog::replace_catalog(&mut *tx, entities).await?;

			tx.commit().await?;

			Ok(())
		})
	}
}

impl VectorIndex for Db {
	fn replace_records(&self, records: Vec<EmbeddingRecord>) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let mut tx = self.pool.begin().await?;

			vectors::replace_embedding_records(&mut *tx, &records).await?;

			tx.commit().await?;

			Ok(())
		})
	}

	fn search<'a>(
		&'a self,
		query: &'a [f32],
		namespaces: &'a [Namespace],
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(vectors::search_embedding_records(&self.pool, query, namespaces, limit))
	}

	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		Box::pin(vectors::count_embedding_records(&self.pool))
	}
}

impl AuditSink for Db {
	fn append<'a>(&'a self, record: &'a ExecutionAuditRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(audit::insert_audit_record(&self.pool, record))
	}

	fn query<'a>(
		&'a self,
		query: &'a AuditQuery,
	) -> BoxFuture<'a, Result<Vec<ExecutionAuditRecord>>> {
		Box::pin(audit::query_audit_records(&self.pool, query))
	}
}

impl SessionLedger for Db {
	fn open<'a>(&'a self, session: &'a ChatSession) -> BoxFuture<'a, Result<()>> {
		Box::pin(sessions::insert_session(&self.pool, session))
	}

	fn find(&self, session_id: Uuid) -> BoxFuture<'_, Result<Option<ChatSession>>> {
		Box::pin(sessions::get_session(&self.pool, session_id))
	}

	fn close<'a>(
		&'a self,
		session_id: Uuid,
		outcome: &'a SessionOutcome,
	) -> BoxFuture<'a, Result<ChatSession>> {
		let now = OffsetDateTime::now_utc();

		Box::pin(sessions::close_session(&self.pool, session_id, outcome, now))
	}
}

impl KnowledgeSource for Db {
	fn active_documents(&self) -> BoxFuture<'_, Result<Vec<KnowledgeDocument>>> {
		Box::pin(knowledge::list_active_documents(&self.pool))
	}
}
