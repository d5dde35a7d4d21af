use crate::{
	action::{ActionRequest, ExecutionStatus, INVOKE_OPERATION_TOOL},
	catalog::{self, Catalog, StructuralOp},
};

/// Why the gate refused a request before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyCode {
	UnsupportedTool,
	UnknownEntity,
	UnlistedOperation,
	RequiresArguments,
}
impl DenyCode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::UnsupportedTool => "unsupported_tool",
			Self::UnknownEntity => "unknown_entity",
			Self::UnlistedOperation => "unlisted_operation",
			Self::RequiresArguments => "requires_arguments",
		}
	}

	/// Entity-level refusals are `denied`; operation-level refusals are `NO_VALID_METHOD`.
	pub fn status(self) -> ExecutionStatus {
		match self {
			Self::UnsupportedTool | Self::UnknownEntity => ExecutionStatus::Denied,
			Self::UnlistedOperation | Self::RequiresArguments => ExecutionStatus::NoValidMethod,
		}
	}

	pub fn describe(self) -> &'static str {
		match self {
			Self::UnsupportedTool => "The requested tool is not supported.",
			Self::UnknownEntity => "The requested entity is not in the catalog.",
			Self::UnlistedOperation => "The requested operation is not allowlisted for this entity.",
			Self::RequiresArguments =>
				"The requested operation needs arguments that cannot be supplied automatically.",
		}
	}
}

/// A request that passed the allowlist, with the dispatch route it is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorized {
	Structural(StructuralOp),
	Operation,
}

/// Allowlist check. The entity must exist before the operation is considered, and anything not
/// positively listed is refused.
pub fn authorize(catalog: &Catalog, request: &ActionRequest) -> Result<Authorized, DenyCode> {
	if request.tool != INVOKE_OPERATION_TOOL {
		return Err(DenyCode::UnsupportedTool);
	}

	let Some(entity) = catalog.entity(&request.entity) else {
		return Err(DenyCode::UnknownEntity);
	};

	if let Some(op) = StructuralOp::parse(&request.operation) {
		return Ok(Authorized::Structural(op));
	}

	let Some(operation) = entity.operation(&request.operation) else {
		return Err(DenyCode::UnlistedOperation);
	};

	if !operation.is_safe_candidate {
		return Err(DenyCode::UnlistedOperation);
	}
	if catalog::signature_requires_arguments(&operation.signature) {
		return Err(DenyCode::RequiresArguments);
	}

	Ok(Authorized::Operation)
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;

	use super::*;
	use crate::catalog::{CatalogEntity, CatalogOperation};

	fn operation(name: &str, signature: &str, safe: bool) -> CatalogOperation {
		CatalogOperation {
			name: name.to_string(),
			signature: signature.to_string(),
			doc: String::new(),
			is_safe_candidate: safe,
		}
	}

	fn catalog() -> Catalog {
		Catalog::new(vec![CatalogEntity {
			name: "invoice".to_string(),
			label: "Invoice".to_string(),
			description: String::new(),
			transient: false,
			refreshed_at: OffsetDateTime::UNIX_EPOCH,
			fields: Vec::new(),
			operations: vec![
				operation("confirm", "(self)", true),
				operation("delete_all", "(self)", false),
				operation("action_send", "(self, partner_id)", true),
				operation("action_reconcile", "", true),
			],
		}])
		.expect("Catalog must build.")
	}

	#[test]
	fn allows_safe_catalog_operations() {
		let request = ActionRequest::new("invoice", "confirm");

		assert_eq!(authorize(&catalog(), &request), Ok(Authorized::Operation));
	}

	#[test]
	fn denies_unsafe_and_unknown_operations() {
		let catalog = catalog();

		assert_eq!(
			authorize(&catalog, &ActionRequest::new("invoice", "delete_all")),
			Err(DenyCode::UnlistedOperation)
		);
		assert_eq!(
			authorize(&catalog, &ActionRequest::new("invoice", "totally_unknown")),
			Err(DenyCode::UnlistedOperation)
		);
	}

	#[test]
	fn structural_operations_still_need_a_known_entity() {
		let catalog = catalog();

		assert_eq!(
			authorize(&catalog, &ActionRequest::new("payroll", "create")),
			Err(DenyCode::UnknownEntity)
		);
		assert_eq!(
			authorize(&catalog, &ActionRequest::new("invoice", "write")),
			Ok(Authorized::Structural(StructuralOp::Update))
		);
	}

	#[test]
	fn denies_operations_with_required_arguments() {
		assert_eq!(
			authorize(&catalog(), &ActionRequest::new("invoice", "action_send")),
			Err(DenyCode::RequiresArguments)
		);
	}

	#[test]
	fn denies_safe_operations_without_a_recorded_signature() {
		assert_eq!(
			authorize(&catalog(), &ActionRequest::new("invoice", "action_reconcile")),
			Err(DenyCode::RequiresArguments)
		);
	}

	#[test]
	fn denies_foreign_tools() {
		let mut request = ActionRequest::new("invoice", "confirm");

		request.tool = "shell".to_string();

		assert_eq!(authorize(&catalog(), &request), Err(DenyCode::UnsupportedTool));
	}
}
