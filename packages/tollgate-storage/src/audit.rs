use sqlx::{PgExecutor, Postgres, QueryBuilder};

use tollgate_domain::audit::{AuditQuery, ExecutionAuditRecord};

use crate::{Result, models::AuditRow};

const DEFAULT_QUERY_LIMIT: u32 = 100;
const MAX_QUERY_LIMIT: u32 = 1_000;

pub async fn insert_audit_record<'e, E>(executor: E, record: &ExecutionAuditRecord) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO execution_audit (
\taudit_id,
\tactor,
\tentity,
\toperation,
\tfilter,
\t\"values\",
\tstatus,
\tmessage,
\tresult,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
	)
	.bind(record.audit_id)
	.bind(record.actor.as_str())
	.bind(record.entity.as_str())
	.bind(record.operation.as_str())
	.bind(&record.filter)
	.bind(&record.values)
	.bind(record.status.as_str())
	.bind(record.message.as_str())
	.bind(record.result.as_ref())
	.bind(record.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn query_audit_records<'e, E>(
	executor: E,
	query: &AuditQuery,
) -> Result<Vec<ExecutionAuditRecord>>
where
	E: PgExecutor<'e>,
{
	let mut builder = QueryBuilder::<Postgres>::new(
		"\
SELECT
\taudit_id,
\tactor,
\tentity,
\toperation,
\tfilter,
\t\"values\",
\tstatus,
\tmessage,
\tresult,
\tcreated_at
FROM execution_audit
WHERE TRUE",
	);

	if let Some(entity) = &query.entity {
		builder.push(" AND entity = ").push_bind(entity.as_str());
	}
	if let Some(operation) = &query.operation {
		builder.push(" AND operation = ").push_bind(operation.as_str());
	}
	if let Some(status) = query.status {
		builder.push(" AND status = ").push_bind(status.as_str());
	}
	if let Some(since) = query.since {
		builder.push(" AND created_at >= ").push_bind(since);
	}
	if let Some(until) = query.until {
		builder.push(" AND created_at < ").push_bind(until);
	}

	builder
		.push(" ORDER BY created_at DESC, audit_id ASC LIMIT ")
		.push_bind(effective_limit(query) as i64);

	let rows = builder.build_query_as::<AuditRow>().fetch_all(executor).await?;

	rows.into_iter().map(ExecutionAuditRecord::try_from).collect()
}

pub(crate) fn effective_limit(query: &AuditQuery) -> usize {
	query.limit.unwrap_or(DEFAULT_QUERY_LIMIT).min(MAX_QUERY_LIMIT) as usize
}
