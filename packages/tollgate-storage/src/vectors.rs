use sqlx::{PgConnection, PgExecutor};

use tollgate_domain::retrieval::{self, EmbeddingRecord, Namespace, ScoredChunk};

use crate::{Result, models::EmbeddingRow};

/// Swaps the full record set. Run inside a transaction.
pub async fn replace_embedding_records(
	conn: &mut PgConnection,
	records: &[EmbeddingRecord],
) -> Result<()> {
	sqlx::query("DELETE FROM embedding_records").execute(&mut *conn).await?;

	for record in records {
		sqlx::query(
			"\
INSERT INTO embedding_records (record_id, position, namespace, text, vec, document_id)
VALUES ($1,$2,$3,$4,$5,$6)",
		)
		.bind(record.record_id)
		.bind(record.position as i64)
		.bind(record.namespace.as_str())
		.bind(record.text.as_str())
		.bind(&record.vector)
		.bind(record.document_id)
		.execute(&mut *conn)
		.await?;
	}

	Ok(())
}

/// Exact cosine scan over the stored vectors of the requested namespaces.
pub async fn search_embedding_records<'e, E>(
	executor: E,
	query: &[f32],
	namespaces: &[Namespace],
	limit: usize,
) -> Result<Vec<ScoredChunk>>
where
	E: PgExecutor<'e>,
{
	let names = namespaces.iter().map(|namespace| namespace.as_str()).collect::<Vec<_>>();
	let rows = sqlx::query_as::<_, EmbeddingRow>(
		"\
SELECT record_id, position, namespace, text, vec, document_id
FROM embedding_records
WHERE namespace = ANY($1)
ORDER BY position ASC",
	)
	.bind(&names)
	.fetch_all(executor)
	.await?;
	let records =
		rows.into_iter().map(EmbeddingRecord::try_from).collect::<Result<Vec<_>>>()?;

	rank_records(&records, query, limit)
}

pub async fn count_embedding_records<'e, E>(executor: E) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let (count,): (i64,) =
		sqlx::query_as("SELECT COUNT(*) FROM embedding_records").fetch_one(executor).await?;

	Ok(count.max(0) as u64)
}

/// `records` must be in position order.
pub(crate) fn rank_records(
	records: &[EmbeddingRecord],
	query: &[f32],
	limit: usize,
) -> Result<Vec<ScoredChunk>> {
	let ranked = retrieval::rank_by_cosine(
		query,
		records.iter().enumerate().map(|(idx, record)| (idx, record.vector.as_slice())),
		limit,
	)?;

	Ok(ranked
		.into_iter()
		.map(|(idx, score)| ScoredChunk::from_record(&records[idx], score))
		.collect())
}
