use sqlx::PgExecutor;
use time::OffsetDateTime;

use tollgate_domain::retrieval::KnowledgeDocument;

use crate::{Result, models::KnowledgeDocumentRow};

pub async fn list_active_documents<'e, E>(executor: E) -> Result<Vec<KnowledgeDocument>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, KnowledgeDocumentRow>(
		"\
SELECT document_id, name, source, body, active
FROM knowledge_documents
WHERE active
ORDER BY created_at ASC, document_id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().map(KnowledgeDocument::from).collect())
}

pub async fn upsert_document<'e, E>(
	executor: E,
	document: &KnowledgeDocument,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO knowledge_documents (document_id, name, source, body, active, created_at)
VALUES ($1,$2,$3,$4,$5,$6)
ON CONFLICT (document_id) DO UPDATE
SET name = EXCLUDED.name, source = EXCLUDED.source, body = EXCLUDED.body, active = EXCLUDED.active",
	)
	.bind(document.document_id)
	.bind(document.name.as_str())
	.bind(document.source.as_str())
	.bind(document.body.as_str())
	.bind(document.active)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(())
}
