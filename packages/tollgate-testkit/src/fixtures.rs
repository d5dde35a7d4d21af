use time::OffsetDateTime;
use uuid::Uuid;

use tollgate_domain::{
	catalog::{CatalogEntity, CatalogField, CatalogOperation},
	retrieval::{EmbeddingRecord, Namespace},
};

/// One entity with a required `name` field and a `(self)` operation per name. Names starting with
/// `action_` are marked as safe candidates.
pub fn catalog_entity(name: &str, operations: &[&str]) -> CatalogEntity {
	CatalogEntity {
		name: name.to_string(),
		label: name.to_uppercase(),
		description: format!("{name} records"),
		transient: false,
		// Postgres keeps microseconds.
		refreshed_at: OffsetDateTime::now_utc()
			.replace_nanosecond(0)
			.unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH),
		fields: vec![CatalogField {
			name: "name".to_string(),
			field_type: "char".to_string(),
			label: "Name".to_string(),
			required: true,
			readonly: false,
			related_entity: None,
		}],
		operations: operations
			.iter()
			.map(|operation| CatalogOperation {
				name: operation.to_string(),
				signature: "(self)".to_string(),
				doc: String::new(),
				is_safe_candidate: operation.starts_with("action_"),
			})
			.collect(),
	}
}

pub fn embedding_record(position: u64, namespace: Namespace, vector: Vec<f32>) -> EmbeddingRecord {
	EmbeddingRecord {
		record_id: Uuid::new_v4(),
		position,
		namespace,
		text: format!("record {position}"),
		vector,
		document_id: None,
	}
}
