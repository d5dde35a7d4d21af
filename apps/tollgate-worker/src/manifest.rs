//! Registry boundary backed by a JSON export of the host registry.

use std::{collections::HashSet, fs, path::Path};

use serde::Deserialize;
use serde_json::{Map, Value};

use tollgate_domain::{
	filter::Filter,
	result::{RecordSet, StoreOutput},
};
use tollgate_service::{
	BoxFuture,
	registry::{AccessMode, ObjectStore, Registry, RegistryEntity, RegistryError, StoreError},
};

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct Manifest {
	entities: Vec<RegistryEntity>,
	/// Names the host lists but cannot describe, e.g. abstract or uninstalled entities.
	#[serde(default)]
	unresolved: Vec<String>,
}

#[derive(Debug)]
pub struct ManifestRegistry {
	entities: Vec<RegistryEntity>,
	unresolved: Vec<String>,
}
impl ManifestRegistry {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadManifest { path: path.to_path_buf(), source: err })?;
		let manifest: Manifest = serde_json::from_str(&raw)
			.map_err(|err| Error::ParseManifest { path: path.to_path_buf(), source: err })?;

		Self::from_manifest(manifest)
	}

	pub fn from_json(raw: &str) -> Result<Self> {
		let manifest: Manifest = serde_json::from_str(raw).map_err(|err| Error::ParseManifest {
			path: "<inline>".into(),
			source: err,
		})?;

		Self::from_manifest(manifest)
	}

	fn from_manifest(manifest: Manifest) -> Result<Self> {
		let mut seen = HashSet::new();

		for name in manifest
			.entities
			.iter()
			.map(|entity| entity.name.as_str())
			.chain(manifest.unresolved.iter().map(String::as_str))
		{
			if name.trim().is_empty() {
				return Err(Error::Validation("Manifest entity names must be non-empty.".to_string()));
			}
			if !seen.insert(name) {
				return Err(Error::Validation(format!("Manifest lists entity {name} twice.")));
			}
		}

		Ok(Self { entities: manifest.entities, unresolved: manifest.unresolved })
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}
}

impl Registry for ManifestRegistry {
	fn entity_names(&self) -> BoxFuture<'_, Result<Vec<String>, RegistryError>> {
		let names = self
			.entities
			.iter()
			.map(|entity| entity.name.clone())
			.chain(self.unresolved.iter().cloned())
			.collect();

		Box::pin(async move { Ok(names) })
	}

	fn describe<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, Result<Option<RegistryEntity>, RegistryError>> {
		let described = self.entities.iter().find(|entity| entity.name == name).cloned();

		Box::pin(async move { Ok(described) })
	}
}

/// Stand-in for the live store in a process that only maintains the catalog and index.
pub struct DetachedStore;
impl DetachedStore {
	fn refuse<T>() -> BoxFuture<'static, Result<T, StoreError>>
	where
		T: Send + 'static,
	{
		Box::pin(async {
			Err(StoreError::Failed("The worker is not connected to a live store.".to_string()))
		})
	}
}

impl ObjectStore for DetachedStore {
	fn search<'a>(
		&'a self,
		_entity: &'a str,
		_filter: &'a Filter,
	) -> BoxFuture<'a, Result<RecordSet, StoreError>> {
		Self::refuse()
	}

	fn check_access<'a>(
		&'a self,
		_records: &'a RecordSet,
		_mode: AccessMode,
	) -> BoxFuture<'a, Result<(), StoreError>> {
		Self::refuse()
	}

	fn create<'a>(
		&'a self,
		_entity: &'a str,
		_values: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<StoreOutput, StoreError>> {
		Self::refuse()
	}

	fn update<'a>(
		&'a self,
		_records: &'a RecordSet,
		_values: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<StoreOutput, StoreError>> {
		Self::refuse()
	}

	fn delete<'a>(
		&'a self,
		_records: &'a RecordSet,
	) -> BoxFuture<'a, Result<StoreOutput, StoreError>> {
		Self::refuse()
	}

	fn has_operation<'a>(
		&'a self,
		_entity: &'a str,
		_operation: &'a str,
	) -> BoxFuture<'a, Result<bool, StoreError>> {
		Self::refuse()
	}

	fn invoke<'a>(
		&'a self,
		_records: &'a RecordSet,
		_operation: &'a str,
	) -> BoxFuture<'a, Result<Option<StoreOutput>, StoreError>> {
		Self::refuse()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MANIFEST: &str = r#"{
		"entities": [
			{
				"name": "invoice",
				"description": "Customer invoices",
				"fields": [{ "name": "amount", "type": "float", "required": true }],
				"operations": [{ "name": "action_post", "signature": "(self)" }]
			},
			{ "name": "partner" }
		],
		"unresolved": ["legacy.report"]
	}"#;

	#[tokio::test]
	async fn lists_unresolved_names_but_cannot_describe_them() {
		let registry = ManifestRegistry::from_json(MANIFEST).expect("Manifest must parse.");
		let names = registry.entity_names().await.expect("Listing must succeed.");

		assert_eq!(registry.len(), 2);
		assert_eq!(names, vec!["invoice", "partner", "legacy.report"]);

		let invoice = registry
			.describe("invoice")
			.await
			.expect("Describe must succeed.")
			.expect("Invoice must be described.");

		assert_eq!(invoice.fields[0].field_type, "float");
		assert!(invoice.fields[0].required);
		assert_eq!(invoice.operations[0].signature, "(self)");
		assert!(registry.describe("legacy.report").await.expect("Describe must succeed.").is_none());
	}

	#[test]
	fn rejects_duplicate_entity_names() {
		let raw = r#"{ "entities": [{ "name": "invoice" }], "unresolved": ["invoice"] }"#;

		assert!(matches!(ManifestRegistry::from_json(raw), Err(Error::Validation(_))));
	}

	#[tokio::test]
	async fn detached_store_refuses_every_call() {
		let records = RecordSet { entity: "invoice".to_string(), ids: vec![1] };

		assert!(matches!(
			DetachedStore.check_access(&records, AccessMode::Read).await,
			Err(StoreError::Failed(_))
		));
		assert!(matches!(
			DetachedStore.invoke(&records, "action_post").await,
			Err(StoreError::Failed(_))
		));
	}
}
