use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::action::ExecutionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	Draft,
	Completed,
	Failed,
}
impl SessionState {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Draft => "draft",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"draft" => Some(Self::Draft),
			"completed" => Some(Self::Completed),
			"failed" => Some(Self::Failed),
			_ => None,
		}
	}

	pub fn is_terminal(self) -> bool {
		!matches!(self, Self::Draft)
	}

	/// Only `draft` moves, and only to a terminal state.
	pub fn transition(self, to: Self) -> Result<Self, InvalidTransition> {
		if self == Self::Draft && to.is_terminal() {
			Ok(to)
		} else {
			Err(InvalidTransition { from: self, to })
		}
	}

	/// Terminal state reached by a request that ended with `status`.
	pub fn for_status(status: ExecutionStatus) -> Self {
		match status {
			ExecutionStatus::Ok | ExecutionStatus::Message => Self::Completed,
			ExecutionStatus::Denied | ExecutionStatus::NoValidMethod | ExecutionStatus::Error =>
				Self::Failed,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
	pub from: SessionState,
	pub to: SessionState,
}
impl Display for InvalidTransition {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Session cannot move from {} to {}.", self.from.as_str(), self.to.as_str())
	}
}

impl std::error::Error for InvalidTransition {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
	pub session_id: Uuid,
	pub previous_session_id: Option<Uuid>,
	pub actor: String,
	pub question: String,
	pub answer: Option<String>,
	pub action_payload: Option<Value>,
	pub state: SessionState,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339::option")]
	pub closed_at: Option<OffsetDateTime>,
}
impl ChatSession {
	pub fn draft(actor: &str, question: &str, previous_session_id: Option<Uuid>) -> Self {
		Self {
			session_id: Uuid::new_v4(),
			previous_session_id,
			actor: actor.to_string(),
			question: question.to_string(),
			answer: None,
			action_payload: None,
			state: SessionState::Draft,
			created_at: OffsetDateTime::now_utc(),
			closed_at: None,
		}
	}
}

/// Terminal write for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
	pub state: SessionState,
	pub answer: Option<String>,
	pub action_payload: Option<Value>,
}
