use std::collections::HashMap;

use sqlx::{PgConnection, PgExecutor};

use tollgate_domain::catalog::{CatalogEntity, CatalogField, CatalogOperation};

use crate::{
	Result,
	models::{CatalogEntityRow, CatalogFieldRow, CatalogOperationRow},
};

const CATALOG_LOCK_ID: i64 = 7_120_116;

/// Clears the catalog and writes `entities` in order. Run inside a transaction so readers never
/// observe the empty intermediate state.
///
/// Concurrent replaces serialize on a transaction-scoped advisory lock. Without it, a second
/// writer's delete misses rows the first one is still inserting and its own inserts collide with
/// them on commit.
pub async fn replace_catalog(conn: &mut PgConnection, entities: &[CatalogEntity]) -> Result<()> {
	sqlx::query("SELECT pg_advisory_xact_lock($1)")
		.bind(CATALOG_LOCK_ID)
		.execute(&mut *conn)
		.await?;
	sqlx::query("DELETE FROM catalog_entities").execute(&mut *conn).await?;

	for (position, entity) in entities.iter().enumerate() {
		insert_entity(&mut *conn, position as i32, entity).await?;

		for (field_position, field) in entity.fields.iter().enumerate() {
			insert_field(&mut *conn, &entity.name, field_position as i32, field).await?;
		}
		for (op_position, operation) in entity.operations.iter().enumerate() {
			insert_operation(&mut *conn, &entity.name, op_position as i32, operation).await?;
		}
	}

	Ok(())
}

async fn insert_entity<'e, E>(executor: E, position: i32, entity: &CatalogEntity) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO catalog_entities (name, position, label, description, transient, refreshed_at)
VALUES ($1,$2,$3,$4,$5,$6)",
	)
	.bind(entity.name.as_str())
	.bind(position)
	.bind(entity.label.as_str())
	.bind(entity.description.as_str())
	.bind(entity.transient)
	.bind(entity.refreshed_at)
	.execute(executor)
	.await?;

	Ok(())
}

async fn insert_field<'e, E>(
	executor: E,
	entity_name: &str,
	position: i32,
	field: &CatalogField,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO catalog_fields (
\tentity_name,
\tposition,
\tname,
\tfield_type,
\tlabel,
\trequired,
\treadonly,
\trelated_entity
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
	)
	.bind(entity_name)
	.bind(position)
	.bind(field.name.as_str())
	.bind(field.field_type.as_str())
	.bind(field.label.as_str())
	.bind(field.required)
	.bind(field.readonly)
	.bind(field.related_entity.as_deref())
	.execute(executor)
	.await?;

	Ok(())
}

async fn insert_operation<'e, E>(
	executor: E,
	entity_name: &str,
	position: i32,
	operation: &CatalogOperation,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO catalog_operations (entity_name, position, name, signature, doc, is_safe_candidate)
VALUES ($1,$2,$3,$4,$5,$6)",
	)
	.bind(entity_name)
	.bind(position)
	.bind(operation.name.as_str())
	.bind(operation.signature.as_str())
	.bind(operation.doc.as_str())
	.bind(operation.is_safe_candidate)
	.execute(executor)
	.await?;

	Ok(())
}

/// Reads the whole catalog in insertion order. Use a single transaction to get a consistent
/// snapshot across the three tables.
pub async fn load_catalog(conn: &mut PgConnection) -> Result<Vec<CatalogEntity>> {
	let entities = sqlx::query_as::<_, CatalogEntityRow>(
		"\
SELECT name, position, label, description, transient, refreshed_at
FROM catalog_entities
ORDER BY position ASC",
	)
	.fetch_all(&mut *conn)
	.await?;
	let fields = sqlx::query_as::<_, CatalogFieldRow>(
		"\
SELECT entity_name, position, name, field_type, label, required, readonly, related_entity
FROM catalog_fields
ORDER BY entity_name ASC, position ASC",
	)
	.fetch_all(&mut *conn)
	.await?;
	let operations = sqlx::query_as::<_, CatalogOperationRow>(
		"\
SELECT entity_name, position, name, signature, doc, is_safe_candidate
FROM catalog_operations
ORDER BY entity_name ASC, position ASC",
	)
	.fetch_all(&mut *conn)
	.await?;
	let mut fields_by_entity: HashMap<String, Vec<CatalogField>> = HashMap::new();
	let mut operations_by_entity: HashMap<String, Vec<CatalogOperation>> = HashMap::new();

	for row in fields {
		fields_by_entity.entry(row.entity_name.clone()).or_default().push(row.into());
	}
	for row in operations {
		operations_by_entity.entry(row.entity_name.clone()).or_default().push(row.into());
	}

	Ok(entities
		.into_iter()
		.map(|row| CatalogEntity {
			fields: fields_by_entity.remove(&row.name).unwrap_or_default(),
			operations: operations_by_entity.remove(&row.name).unwrap_or_default(),
			name: row.name,
			label: row.label,
			description: row.description,
			transient: row.transient,
			refreshed_at: row.refreshed_at,
		})
		.collect())
}
