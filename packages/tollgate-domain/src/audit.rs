use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::action::ExecutionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
	#[serde(rename = "success")]
	Success,
	#[serde(rename = "denied")]
	Denied,
	#[serde(rename = "NO_VALID_METHOD")]
	NoValidMethod,
	#[serde(rename = "error")]
	Error,
}
impl AuditStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Denied => "denied",
			Self::NoValidMethod => "NO_VALID_METHOD",
			Self::Error => "error",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"success" => Some(Self::Success),
			"denied" => Some(Self::Denied),
			"NO_VALID_METHOD" => Some(Self::NoValidMethod),
			"error" => Some(Self::Error),
			_ => None,
		}
	}

	/// `message` is never an execution outcome and has no audit counterpart.
	pub fn from_execution(status: ExecutionStatus) -> Option<Self> {
		match status {
			ExecutionStatus::Ok => Some(Self::Success),
			ExecutionStatus::Denied => Some(Self::Denied),
			ExecutionStatus::NoValidMethod => Some(Self::NoValidMethod),
			ExecutionStatus::Error => Some(Self::Error),
			ExecutionStatus::Message => None,
		}
	}
}

/// Append-only record of one execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionAuditRecord {
	pub audit_id: Uuid,
	pub actor: String,
	pub entity: String,
	pub operation: String,
	pub filter: Value,
	pub values: Value,
	pub status: AuditStatus,
	pub message: String,
	/// Serialized result summary. Never a live store object.
	pub result: Option<Value>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

/// Review filter. Unset fields match everything; results are newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
	pub entity: Option<String>,
	pub operation: Option<String>,
	pub status: Option<AuditStatus>,
	pub since: Option<OffsetDateTime>,
	pub until: Option<OffsetDateTime>,
	pub limit: Option<u32>,
}
impl AuditQuery {
	pub fn matches(&self, record: &ExecutionAuditRecord) -> bool {
		self.entity.as_deref().is_none_or(|entity| entity == record.entity)
			&& self.operation.as_deref().is_none_or(|operation| operation == record.operation)
			&& self.status.is_none_or(|status| status == record.status)
			&& self.since.is_none_or(|since| record.created_at >= since)
			&& self.until.is_none_or(|until| record.created_at < until)
	}
}
