use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The single tool identifier the executor accepts.
pub const INVOKE_OPERATION_TOOL: &str = "orm_call";

/// A structured request to run one catalog operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
	pub tool: String,
	pub entity: String,
	pub operation: String,
	/// Raw filter predicate as produced by the model. Parsed only after the allowlist check.
	pub filter: Value,
	pub values: Map<String, Value>,
}
impl ActionRequest {
	pub fn new(entity: impl Into<String>, operation: impl Into<String>) -> Self {
		Self {
			tool: INVOKE_OPERATION_TOOL.to_string(),
			entity: entity.into(),
			operation: operation.into(),
			filter: Value::Array(Vec::new()),
			values: Map::new(),
		}
	}

	pub fn with_filter(mut self, filter: Value) -> Self {
		self.filter = filter;

		self
	}

	pub fn with_values(mut self, values: Map<String, Value>) -> Self {
		self.values = values;

		self
	}

	/// Wire form recorded on sessions: `{"tool": .., "args": {"model", "method", "domain", "values"}}`.
	pub fn to_payload(&self) -> Value {
		serde_json::json!({
			"tool": self.tool,
			"args": {
				"model": self.entity,
				"method": self.operation,
				"domain": self.filter,
				"values": self.values,
			},
		})
	}

	fn from_payload(tool: &str, args: Option<&Value>) -> Self {
		let args = args.and_then(Value::as_object);
		let text = |keys: &[&str]| {
			keys.iter()
				.find_map(|key| args.and_then(|args| args.get(*key)).and_then(Value::as_str))
				.unwrap_or_default()
				.trim()
				.to_string()
		};
		let filter = ["domain", "filter"]
			.iter()
			.find_map(|key| args.and_then(|args| args.get(*key)))
			.cloned()
			.unwrap_or_else(|| Value::Array(Vec::new()));
		let values = args
			.and_then(|args| args.get("values"))
			.and_then(Value::as_object)
			.cloned()
			.unwrap_or_default();

		Self {
			tool: tool.to_string(),
			entity: text(&["model", "entity"]),
			operation: text(&["method", "operation"]),
			filter,
			values,
		}
	}
}

/// What a model completion turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
	Action(ActionRequest),
	Message(String),
}

/// Interprets raw completion text. Never fails: anything unrecognized is a plain message.
pub fn parse_model_output(raw: &str) -> ModelOutput {
	let parsed = parse_json_object(raw.trim()).or_else(|| {
		fenced_json_block(raw).and_then(|block| parse_json_object(block.trim()))
	});
	let Some(object) = parsed else {
		return ModelOutput::Message(raw.to_string());
	};
	let tool = object.get("tool").and_then(Value::as_str);

	if tool == Some(INVOKE_OPERATION_TOOL) {
		return ModelOutput::Action(ActionRequest::from_payload(
			INVOKE_OPERATION_TOOL,
			object.get("args"),
		));
	}

	let message = object
		.get("message")
		.and_then(Value::as_str)
		.or_else(|| {
			object.get("args").and_then(|args| args.get("message")).and_then(Value::as_str)
		})
		.map(ToString::to_string)
		.unwrap_or_else(|| raw.to_string());

	ModelOutput::Message(message)
}

fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
	match serde_json::from_str::<Value>(text) {
		Ok(Value::Object(object)) => Some(object),
		_ => None,
	}
}

fn fenced_json_block(text: &str) -> Option<&str> {
	static FENCE: OnceLock<Option<Regex>> = OnceLock::new();

	let fence = FENCE.get_or_init(|| Regex::new(r"(?s)```(?i:json)[ \t]*\r?\n?(.*?)```").ok());

	fence.as_ref()?.captures(text).and_then(|captures| captures.get(1)).map(|m| m.as_str())
}

/// Caller-facing status of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
	#[serde(rename = "ok")]
	Ok,
	#[serde(rename = "message")]
	Message,
	#[serde(rename = "denied")]
	Denied,
	#[serde(rename = "NO_VALID_METHOD")]
	NoValidMethod,
	#[serde(rename = "error")]
	Error,
}
impl ExecutionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Ok => "ok",
			Self::Message => "message",
			Self::Denied => "denied",
			Self::NoValidMethod => "NO_VALID_METHOD",
			Self::Error => "error",
		}
	}
}
