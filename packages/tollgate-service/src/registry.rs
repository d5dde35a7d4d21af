//! Boundaries to the live object store: the registry the catalog is synchronized from, and the
//! store that allowlisted actions run against.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tollgate_domain::{
	filter::Filter,
	result::{RecordSet, StoreOutput},
};

use crate::BoxFuture;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryField {
	pub name: String,
	#[serde(rename = "type")]
	pub field_type: String,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub required: bool,
	#[serde(default)]
	pub readonly: bool,
	#[serde(default)]
	pub related_entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOperation {
	pub name: String,
	#[serde(default)]
	pub signature: String,
	#[serde(default)]
	pub doc: String,
}

/// What the live registry reports about one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntity {
	pub name: String,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub transient: bool,
	#[serde(default)]
	pub fields: Vec<RegistryField>,
	#[serde(default)]
	pub operations: Vec<RegistryOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryError {
	pub message: String,
}
impl Display for RegistryError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Registry error: {}", self.message)
	}
}

impl std::error::Error for RegistryError {}

/// Enumeration interface the catalog builder walks.
pub trait Registry
where
	Self: Send + Sync,
{
	fn entity_names(&self) -> BoxFuture<'_, Result<Vec<String>, RegistryError>>;

	/// `None` when the name has no live counterpart.
	fn describe<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, Result<Option<RegistryEntity>, RegistryError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
	Read,
	Create,
	Write,
	Unlink,
}
impl AccessMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Read => "read",
			Self::Create => "create",
			Self::Write => "write",
			Self::Unlink => "unlink",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
	/// The store's own access control refused the call.
	AccessDenied(String),
	/// The operation is not callable on the resolved entity handle.
	MissingOperation(String),
	Failed(String),
}
impl Display for StoreError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::AccessDenied(message) | Self::MissingOperation(message) | Self::Failed(message) =>
				f.write_str(message),
		}
	}
}

impl std::error::Error for StoreError {}

/// The live store. Structural mutations are fixed methods; anything else goes through `invoke`
/// by name and is only reached for allowlisted operations.
pub trait ObjectStore
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		entity: &'a str,
		filter: &'a Filter,
	) -> BoxFuture<'a, Result<RecordSet, StoreError>>;

	fn check_access<'a>(
		&'a self,
		records: &'a RecordSet,
		mode: AccessMode,
	) -> BoxFuture<'a, Result<(), StoreError>>;

	fn create<'a>(
		&'a self,
		entity: &'a str,
		values: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<StoreOutput, StoreError>>;

	fn update<'a>(
		&'a self,
		records: &'a RecordSet,
		values: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<StoreOutput, StoreError>>;

	fn delete<'a>(
		&'a self,
		records: &'a RecordSet,
	) -> BoxFuture<'a, Result<StoreOutput, StoreError>>;

	fn has_operation<'a>(
		&'a self,
		entity: &'a str,
		operation: &'a str,
	) -> BoxFuture<'a, Result<bool, StoreError>>;

	/// Calls `operation` on `records` with no arguments.
	fn invoke<'a>(
		&'a self,
		records: &'a RecordSet,
		operation: &'a str,
	) -> BoxFuture<'a, Result<Option<StoreOutput>, StoreError>>;
}
