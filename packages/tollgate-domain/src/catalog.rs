use std::{
	collections::{HashMap, HashSet},
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Operations that mutate records directly rather than through a business method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralOp {
	Create,
	Update,
	Delete,
}
impl StructuralOp {
	/// Accepts the canonical names and the `write`/`unlink` spellings used by ORM registries.
	pub fn parse(name: &str) -> Option<Self> {
		match name {
			"create" => Some(Self::Create),
			"update" | "write" => Some(Self::Update),
			"delete" | "unlink" => Some(Self::Delete),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Create => "create",
			Self::Update => "update",
			Self::Delete => "delete",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogField {
	pub name: String,
	pub field_type: String,
	pub label: String,
	pub required: bool,
	pub readonly: bool,
	pub related_entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOperation {
	pub name: String,
	pub signature: String,
	pub doc: String,
	pub is_safe_candidate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntity {
	pub name: String,
	pub label: String,
	pub description: String,
	pub transient: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub refreshed_at: OffsetDateTime,
	pub fields: Vec<CatalogField>,
	pub operations: Vec<CatalogOperation>,
}
impl CatalogEntity {
	pub fn operation(&self, name: &str) -> Option<&CatalogOperation> {
		self.operations.iter().find(|operation| operation.name == name)
	}

	/// Text indexed for the `schema` namespace.
	pub fn index_text(&self) -> String {
		let fields = self
			.fields
			.iter()
			.map(|field| format!("{}:{}", field.name, field.field_type))
			.collect::<Vec<_>>()
			.join("; ");
		let operations = self
			.operations
			.iter()
			.map(|operation| format!("{}{}", operation.name, operation.signature))
			.collect::<Vec<_>>()
			.join("; ");

		format!(
			"entity={}\nlabel={}\ndescription={}\nfields={fields}\noperations={operations}",
			self.name, self.label, self.description
		)
	}

	/// Text indexed for the `operation` namespace.
	pub fn operation_index_text(&self, operation: &CatalogOperation) -> String {
		format!(
			"entity={}\noperation={}{}\ndoc={}",
			self.name, operation.name, operation.signature, operation.doc
		)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
	DuplicateEntity { entity: String },
	DuplicateOperation { entity: String, operation: String },
	DuplicateField { entity: String, field: String },
}
impl Display for CatalogError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::DuplicateEntity { entity } => write!(f, "Entity {entity:?} is listed twice."),
			Self::DuplicateOperation { entity, operation } =>
				write!(f, "Operation {operation:?} is listed twice on entity {entity:?}."),
			Self::DuplicateField { entity, field } =>
				write!(f, "Field {field:?} is listed twice on entity {entity:?}."),
		}
	}
}

impl std::error::Error for CatalogError {}

/// An immutable catalog snapshot. Entities keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
	entities: Vec<CatalogEntity>,
	by_name: HashMap<String, usize>,
}
impl Catalog {
	pub fn new(entities: Vec<CatalogEntity>) -> Result<Self, CatalogError> {
		let mut by_name = HashMap::with_capacity(entities.len());

		for (idx, entity) in entities.iter().enumerate() {
			if by_name.insert(entity.name.clone(), idx).is_some() {
				return Err(CatalogError::DuplicateEntity { entity: entity.name.clone() });
			}

			let mut operations = HashSet::with_capacity(entity.operations.len());

			for operation in &entity.operations {
				if !operations.insert(operation.name.as_str()) {
					return Err(CatalogError::DuplicateOperation {
						entity: entity.name.clone(),
						operation: operation.name.clone(),
					});
				}
			}

			let mut fields = HashSet::with_capacity(entity.fields.len());

			for field in &entity.fields {
				if !fields.insert(field.name.as_str()) {
					return Err(CatalogError::DuplicateField {
						entity: entity.name.clone(),
						field: field.name.clone(),
					});
				}
			}
		}

		Ok(Self { entities, by_name })
	}

	pub fn entity(&self, name: &str) -> Option<&CatalogEntity> {
		self.by_name.get(name).map(|idx| &self.entities[*idx])
	}

	pub fn contains(&self, name: &str) -> bool {
		self.by_name.contains_key(name)
	}

	pub fn entities(&self) -> &[CatalogEntity] {
		&self.entities
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	pub fn operation_count(&self) -> usize {
		self.entities.iter().map(|entity| entity.operations.len()).sum()
	}

	pub fn into_entities(self) -> Vec<CatalogEntity> {
		self.entities
	}
}

/// Build-time classification. Callers can never set this flag at request time.
pub fn is_safe_candidate(name: &str, safe_prefixes: &[String]) -> bool {
	if StructuralOp::parse(name).is_some() {
		return true;
	}

	safe_prefixes.iter().any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
}

/// Whether a recorded call signature needs arguments the executor cannot supply.
///
/// Receiver names (`self`, `cls`), starred parameters, and parameters with defaults are
/// optional. Anything else is a required positional or keyword parameter. A missing or unreadable
/// signature counts as requiring arguments.
pub fn signature_requires_arguments(signature: &str) -> bool {
	let Some(params) = signature_parameters(signature) else {
		return true;
	};

	params.into_iter().any(|param| {
		let name = param.split(':').next().unwrap_or(param).trim();

		!(matches!(name, "self" | "cls" | "/" | "*")
			|| name.starts_with('*')
			|| param.contains('='))
	})
}

/// Top-level parameters of `(...)`, ignoring commas nested in brackets or string literals. `None`
/// when the parentheses do not balance.
fn signature_parameters(signature: &str) -> Option<Vec<&str>> {
	let inner = signature.trim().strip_prefix('(')?;
	let mut params = Vec::new();
	let mut depth = 0_usize;
	let mut quote = None;
	let mut start = 0;

	for (i, ch) in inner.char_indices() {
		if let Some(open) = quote {
			if ch == open {
				quote = None;
			}

			continue;
		}

		match ch {
			'\'' | '"' => quote = Some(ch),
			'(' | '[' | '{' => depth += 1,
			')' if depth == 0 => {
				params.push(&inner[start..i]);

				return Some(
					params.into_iter().map(str::trim).filter(|param| !param.is_empty()).collect(),
				);
			},
			')' | ']' | '}' => depth = depth.checked_sub(1)?,
			',' if depth == 0 => {
				params.push(&inner[start..i]);

				start = i + 1;
			},
			_ => {},
		}
	}

	None
}

#[cfg(test)]
mod tests {
	use super::*;

	fn prefixes() -> Vec<String> {
		vec!["action_".to_string(), "button_".to_string()]
	}

	fn entity(name: &str, operations: &[&str]) -> CatalogEntity {
		CatalogEntity {
			name: name.to_string(),
			label: name.to_string(),
			description: String::new(),
			transient: false,
			refreshed_at: OffsetDateTime::UNIX_EPOCH,
			fields: Vec::new(),
			operations: operations
				.iter()
				.map(|operation| CatalogOperation {
					name: operation.to_string(),
					signature: "(self)".to_string(),
					doc: String::new(),
					is_safe_candidate: true,
				})
				.collect(),
		}
	}

	#[test]
	fn classifies_prefixes_and_structural_names() {
		let prefixes = prefixes();

		assert!(is_safe_candidate("action_confirm", &prefixes));
		assert!(is_safe_candidate("button_validate", &prefixes));
		assert!(is_safe_candidate("create", &prefixes));
		assert!(is_safe_candidate("write", &prefixes));
		assert!(is_safe_candidate("unlink", &prefixes));
		assert!(!is_safe_candidate("confirm", &prefixes));
		assert!(!is_safe_candidate("delete_all", &prefixes));
		assert!(!is_safe_candidate("actions", &prefixes));
	}

	#[test]
	fn detects_required_parameters() {
		assert!(!signature_requires_arguments("(self)"));
		assert!(!signature_requires_arguments("()"));
		assert!(!signature_requires_arguments("(self, force=False)"));
		assert!(!signature_requires_arguments("(self, *args, **kwargs)"));
		assert!(!signature_requires_arguments("(self, *, notify: bool = True)"));
		assert!(signature_requires_arguments("(self, partner_id)"));
		assert!(signature_requires_arguments("(self, amount: float)"));
		assert!(!signature_requires_arguments("(self) -> bool"));
	}

	#[test]
	fn unreadable_signatures_require_arguments() {
		assert!(signature_requires_arguments(""));
		assert!(signature_requires_arguments("   "));
		assert!(signature_requires_arguments("self"));
		assert!(signature_requires_arguments("(self"));
		assert!(signature_requires_arguments("(self, items: List[int)"));
	}

	#[test]
	fn nested_commas_stay_inside_one_parameter() {
		assert!(!signature_requires_arguments("(self, mapping: Dict[str, int] = None)"));
		assert!(!signature_requires_arguments("(self, pair: Tuple[int, int] = (0, 0))"));
		assert!(!signature_requires_arguments("(self, sep: str = ',')"));
		assert!(signature_requires_arguments("(self, mapping: Dict[str, int], flag=False)"));
	}

	#[test]
	fn rejects_duplicate_entities_and_operations() {
		let dup_entity = Catalog::new(vec![entity("invoice", &[]), entity("invoice", &[])]);

		assert_eq!(
			dup_entity,
			Err(CatalogError::DuplicateEntity { entity: "invoice".to_string() })
		);

		let dup_operation = Catalog::new(vec![entity("invoice", &["confirm", "confirm"])]);

		assert!(matches!(dup_operation, Err(CatalogError::DuplicateOperation { .. })));
	}

	#[test]
	fn keeps_insertion_order() {
		let catalog = Catalog::new(vec![entity("zeta", &[]), entity("alpha", &[])])
			.expect("Catalog must build.");
		let names = catalog.entities().iter().map(|entity| entity.name.as_str()).collect::<Vec<_>>();

		assert_eq!(names, vec!["zeta", "alpha"]);
		assert!(catalog.contains("alpha"));
		assert!(catalog.entity("missing").is_none());
	}

	#[test]
	fn index_text_lists_fields_and_operations() {
		let mut invoice = entity("invoice", &["action_post"]);

		invoice.fields.push(CatalogField {
			name: "amount".to_string(),
			field_type: "float".to_string(),
			label: "Amount".to_string(),
			required: true,
			readonly: false,
			related_entity: None,
		});

		let text = invoice.index_text();

		assert!(text.starts_with("entity=invoice\n"));
		assert!(text.contains("fields=amount:float"));
		assert!(text.contains("operations=action_post(self)"));
		assert_eq!(
			invoice.operation_index_text(&invoice.operations[0]),
			"entity=invoice\noperation=action_post(self)\ndoc="
		);
	}
}
