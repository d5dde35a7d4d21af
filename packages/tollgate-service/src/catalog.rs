use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use tollgate_domain::catalog::{self, Catalog, CatalogEntity, CatalogField, CatalogOperation};

use crate::{Result, TollgateService, registry::RegistryEntity};

/// Shared, read-mostly catalog. Readers take a snapshot; a refresh or reload publishes a complete
/// new one. Until the first publish there is no snapshot at all, which is distinct from a
/// published catalog that happens to be empty.
#[derive(Clone, Default)]
pub struct CatalogHandle {
	current: Arc<RwLock<Option<Arc<Catalog>>>>,
}
impl CatalogHandle {
	pub fn snapshot(&self) -> Option<Arc<Catalog>> {
		self.current.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn publish(&self, catalog: Catalog) {
		let next = Arc::new(catalog);

		*self.current.write().unwrap_or_else(|err| err.into_inner()) = Some(next);
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshReport {
	pub entity_count: u64,
	pub operation_count: u64,
	pub safe_operation_count: u64,
	/// Registry names with no live counterpart.
	pub skipped: Vec<String>,
}

impl TollgateService {
	/// Walks the registry and fully replaces the catalog.
	pub async fn refresh_catalog(&self) -> Result<RefreshReport> {
		let _guard = self.maintenance.lock().await;
		let now = OffsetDateTime::now_utc();
		let names = self.live.registry.entity_names().await?;
		let mut entities = Vec::with_capacity(names.len());
		let mut skipped = Vec::new();

		for name in names {
			match self.live.registry.describe(&name).await? {
				Some(described) => entities.push(build_entity(
					described,
					&self.cfg.catalog.safe_prefixes,
					now,
				)),
				None => {
					tracing::debug!(entity = %name, "Registry entity has no live counterpart.");

					skipped.push(name);
				},
			}
		}

		let catalog = Catalog::new(entities)?;

		self.backends.catalog.replace_catalog(catalog.entities()).await?;

		let report = RefreshReport {
			entity_count: catalog.len() as u64,
			operation_count: catalog.operation_count() as u64,
			safe_operation_count: catalog
				.entities()
				.iter()
				.flat_map(|entity| entity.operations.iter())
				.filter(|operation| operation.is_safe_candidate)
				.count() as u64,
			skipped,
		};

		self.catalog.publish(catalog);

		tracing::info!(
			entities = report.entity_count,
			operations = report.operation_count,
			safe_operations = report.safe_operation_count,
			skipped = report.skipped.len(),
			"Catalog refreshed."
		);

		Ok(report)
	}

	/// Adopts whatever catalog is currently persisted, e.g. after a refresh by the worker.
	pub async fn reload_catalog(&self) -> Result<u64> {
		let entities = self.backends.catalog.load_catalog().await?;
		let catalog = Catalog::new(entities)?;
		let count = catalog.len() as u64;

		self.catalog.publish(catalog);

		tracing::info!(entities = count, "Catalog reloaded.");

		Ok(count)
	}
}

/// Builds one catalog entity with fresh children. Safety is decided here, never by the caller.
pub fn build_entity(
	described: RegistryEntity,
	safe_prefixes: &[String],
	refreshed_at: OffsetDateTime,
) -> CatalogEntity {
	let fields = described
		.fields
		.into_iter()
		.map(|field| CatalogField {
			label: if field.label.is_empty() { field.name.clone() } else { field.label },
			name: field.name,
			field_type: field.field_type,
			required: field.required,
			readonly: field.readonly,
			related_entity: field.related_entity,
		})
		.collect();
	let operations = described
		.operations
		.into_iter()
		.map(|operation| CatalogOperation {
			is_safe_candidate: catalog::is_safe_candidate(&operation.name, safe_prefixes),
			name: operation.name,
			signature: operation.signature,
			doc: operation.doc,
		})
		.collect();

	CatalogEntity {
		label: if described.label.is_empty() { described.name.clone() } else { described.label },
		name: described.name,
		description: described.description,
		transient: described.transient,
		refreshed_at,
		fields,
		operations,
	}
}
