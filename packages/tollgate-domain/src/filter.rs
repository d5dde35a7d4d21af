use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
};

use serde_json::{Map, Value};

const MAX_FILTER_TERMS: usize = 32;
const MAX_IN_LIST_ITEMS: usize = 128;
const MAX_STRING_BYTES: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParseError {
	path: String,
	message: String,
}
impl FilterParseError {
	fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
		Self { path: path.into(), message: message.into() }
	}
}
impl Display for FilterParseError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.path, self.message)
	}
}

impl std::error::Error for FilterParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	In,
	NotIn,
	Like,
	ILike,
}
impl FilterOp {
	fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"=" | "==" => Some(Self::Eq),
			"!=" | "<>" => Some(Self::Ne),
			"<" => Some(Self::Lt),
			"<=" => Some(Self::Le),
			">" => Some(Self::Gt),
			">=" => Some(Self::Ge),
			"in" => Some(Self::In),
			"not in" => Some(Self::NotIn),
			"like" => Some(Self::Like),
			"ilike" => Some(Self::ILike),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Eq => "=",
			Self::Ne => "!=",
			Self::Lt => "<",
			Self::Le => "<=",
			Self::Gt => ">",
			Self::Ge => ">=",
			Self::In => "in",
			Self::NotIn => "not in",
			Self::Like => "like",
			Self::ILike => "ilike",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterTerm {
	pub field: String,
	pub op: FilterOp,
	pub value: Value,
}
impl FilterTerm {
	fn matches(&self, record: &Map<String, Value>) -> bool {
		let actual = record.get(&self.field).unwrap_or(&Value::Null);

		match self.op {
			FilterOp::Eq => values_equal(actual, &self.value),
			FilterOp::Ne => !values_equal(actual, &self.value),
			FilterOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
			FilterOp::Le => matches!(
				compare(actual, &self.value),
				Some(Ordering::Less | Ordering::Equal)
			),
			FilterOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
			FilterOp::Ge => matches!(
				compare(actual, &self.value),
				Some(Ordering::Greater | Ordering::Equal)
			),
			FilterOp::In => in_list(actual, &self.value),
			FilterOp::NotIn => !in_list(actual, &self.value),
			FilterOp::Like => match (actual.as_str(), self.value.as_str()) {
				(Some(actual), Some(needle)) => actual.contains(needle),
				_ => false,
			},
			FilterOp::ILike => match (actual.as_str(), self.value.as_str()) {
				(Some(actual), Some(needle)) =>
					actual.to_lowercase().contains(&needle.to_lowercase()),
				_ => false,
			},
		}
	}
}

/// A conjunction of `[field, operator, value]` terms. An empty filter selects every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
	terms: Vec<FilterTerm>,
}
impl Filter {
	/// Accepts `null`, an array of triples, or an object of field/value equality pairs.
	pub fn parse(raw: &Value) -> Result<Self, FilterParseError> {
		let path = "$.filter";
		let terms = match raw {
			Value::Null => Vec::new(),
			Value::Array(items) => {
				if items.len() > MAX_FILTER_TERMS {
					return Err(FilterParseError::new(
						path,
						format!("filter supports at most {MAX_FILTER_TERMS} terms."),
					));
				}

				items
					.iter()
					.enumerate()
					.map(|(idx, item)| parse_term(item, &format!("{path}[{idx}]")))
					.collect::<Result<Vec<_>, _>>()?
			},
			Value::Object(pairs) => {
				if pairs.len() > MAX_FILTER_TERMS {
					return Err(FilterParseError::new(
						path,
						format!("filter supports at most {MAX_FILTER_TERMS} terms."),
					));
				}

				pairs
					.iter()
					.map(|(field, value)| {
						let term_path = format!("{path}.{field}");

						validate_field(field, &term_path)?;
						validate_value(value, &term_path)?;

						Ok(FilterTerm { field: field.clone(), op: FilterOp::Eq, value: value.clone() })
					})
					.collect::<Result<Vec<_>, _>>()?
			},
			_ => {
				return Err(FilterParseError::new(
					path,
					"filter must be null, an array of [field, operator, value] terms, or an object.",
				));
			},
		};

		Ok(Self { terms })
	}

	pub fn terms(&self) -> &[FilterTerm] {
		&self.terms
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn matches(&self, record: &Map<String, Value>) -> bool {
		self.terms.iter().all(|term| term.matches(record))
	}

	pub fn to_value(&self) -> Value {
		Value::Array(
			self.terms
				.iter()
				.map(|term| {
					serde_json::json!([term.field.as_str(), term.op.as_str(), term.value.clone()])
				})
				.collect(),
		)
	}
}

fn parse_term(item: &Value, path: &str) -> Result<FilterTerm, FilterParseError> {
	let Some(parts) = item.as_array() else {
		return Err(FilterParseError::new(path, "term must be a [field, operator, value] array."));
	};
	let [field, op, value] = parts.as_slice() else {
		return Err(FilterParseError::new(path, "term must have exactly three elements."));
	};
	let field = field
		.as_str()
		.ok_or_else(|| FilterParseError::new(format!("{path}[0]"), "field must be a string."))?;
	let op = op
		.as_str()
		.and_then(FilterOp::parse)
		.ok_or_else(|| FilterParseError::new(format!("{path}[1]"), "unsupported operator."))?;

	validate_field(field, &format!("{path}[0]"))?;
	validate_value(value, &format!("{path}[2]"))?;

	if matches!(op, FilterOp::In | FilterOp::NotIn) && !value.is_array() {
		return Err(FilterParseError::new(
			format!("{path}[2]"),
			"in/not in operators require an array value.",
		));
	}
	if matches!(op, FilterOp::Like | FilterOp::ILike) && !value.is_string() {
		return Err(FilterParseError::new(
			format!("{path}[2]"),
			"like/ilike operators require a string value.",
		));
	}

	Ok(FilterTerm { field: field.to_string(), op, value: value.clone() })
}

fn validate_field(field: &str, path: &str) -> Result<(), FilterParseError> {
	if field.is_empty() || field.len() > MAX_STRING_BYTES {
		return Err(FilterParseError::new(path, "field name must be 1-512 bytes."));
	}
	if !field.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.') {
		return Err(FilterParseError::new(path, "field name contains unsupported characters."));
	}

	Ok(())
}

fn validate_value(value: &Value, path: &str) -> Result<(), FilterParseError> {
	match value {
		Value::String(text) if text.len() > MAX_STRING_BYTES => {
			Err(FilterParseError::new(path, "string value is too long."))
		},
		Value::Array(items) => {
			if items.len() > MAX_IN_LIST_ITEMS {
				return Err(FilterParseError::new(path, "value list is too long."));
			}

			for (idx, item) in items.iter().enumerate() {
				if item.is_array() || item.is_object() {
					return Err(FilterParseError::new(
						format!("{path}[{idx}]"),
						"list items must be scalars.",
					));
				}

				validate_value(item, &format!("{path}[{idx}]"))?;
			}

			Ok(())
		},
		Value::Object(_) => Err(FilterParseError::new(path, "value must not be an object.")),
		_ => Ok(()),
	}
}

fn values_equal(a: &Value, b: &Value) -> bool {
	match (a.as_f64(), b.as_f64()) {
		(Some(a), Some(b)) => a == b,
		_ => a == b,
	}
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
	if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
		return a.partial_cmp(&b);
	}
	if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
		return Some(a.cmp(b));
	}

	None
}

fn in_list(actual: &Value, list: &Value) -> bool {
	list.as_array().map(|items| items.iter().any(|item| values_equal(actual, item))).unwrap_or(false)
}
