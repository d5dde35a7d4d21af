use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifiers of a resolved record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
	pub entity: String,
	pub ids: Vec<i64>,
}

/// Whatever an object store call hands back. Only [`serialize_output`] may turn it into a caller- or
/// audit-facing value.
#[derive(Clone)]
pub enum StoreOutput {
	Records(RecordSet),
	Value(Value),
	/// A live store object. Rendered through its text representation.
	Handle(Arc<dyn Display + Send + Sync>),
}
impl std::fmt::Debug for StoreOutput {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Records(records) => f.debug_tuple("Records").field(records).finish(),
			Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Self::Handle(handle) => f.debug_tuple("Handle").field(&handle.to_string()).finish(),
		}
	}
}

pub fn serialize_output(output: Option<&StoreOutput>) -> Value {
	match output {
		None => Value::Null,
		Some(StoreOutput::Records(records)) => serde_json::json!({
			"ids": records.ids,
			"entity": records.entity,
		}),
		Some(StoreOutput::Value(value)) => value.clone(),
		Some(StoreOutput::Handle(handle)) => Value::String(handle.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Partner(i64);
	impl Display for Partner {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			write!(f, "res.partner({},)", self.0)
		}
	}

	#[test]
	fn record_sets_become_ids_and_entity() {
		let output = StoreOutput::Records(RecordSet { entity: "invoice".to_string(), ids: vec![3, 7] });

		assert_eq!(
			serialize_output(Some(&output)),
			serde_json::json!({ "ids": [3, 7], "entity": "invoice" })
		);
	}

	#[test]
	fn structured_values_pass_through() {
		let value = serde_json::json!({ "total": 12.5, "lines": [1, 2] });

		assert_eq!(serialize_output(Some(&StoreOutput::Value(value.clone()))), value);
		assert_eq!(serialize_output(None), Value::Null);
	}

	#[test]
	fn handles_are_rendered_as_text() {
		let output = StoreOutput::Handle(Arc::new(Partner(9)));

		assert_eq!(serialize_output(Some(&output)), Value::String("res.partner(9,)".to_string()));
	}
}
