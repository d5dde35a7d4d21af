use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use tollgate_domain::{
	action::{self, ExecutionStatus, ModelOutput},
	prompt::{self, GroundingChunk, PriorTurn},
	retrieval::Namespace,
	session::{ChatSession, SessionOutcome, SessionState},
};

use crate::{Error, Result, TollgateService};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskRequest {
	pub actor: String,
	pub question: String,
	/// Prior session whose exchange becomes conversation context.
	#[serde(default, rename = "sessionRef")]
	pub session_ref: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskResponse {
	pub session_id: Uuid,
	pub status: ExecutionStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
}

struct Reply {
	status: ExecutionStatus,
	message: Option<String>,
	result: Option<Value>,
	action_payload: Option<Value>,
}

impl TollgateService {
	/// One request through retrieval, prompt, completion, parse and execution. The session opened
	/// here is closed exactly once before returning.
	pub async fn ask(&self, req: AskRequest) -> Result<AskResponse> {
		if req.question.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "question must not be empty.".to_string() });
		}
		if req.actor.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "actor must not be empty.".to_string() });
		}

		let prior = match req.session_ref {
			Some(session_id) => Some(self.backends.sessions.find(session_id).await?.ok_or_else(
				|| Error::NotFound { message: format!("Session {session_id}.") },
			)?),
			None => None,
		};
		let session = ChatSession::draft(&req.actor, &req.question, req.session_ref);

		self.backends.sessions.open(&session).await?;

		let prior_turn =
			prior.map(|session| PriorTurn { question: session.question, answer: session.answer });
		let reply = match self.respond(&req, prior_turn.as_ref()).await {
			Ok(reply) => reply,
			Err(err @ (Error::Storage { .. } | Error::Qdrant { .. })) => {
				self.close_quietly(session.session_id, &err).await;

				return Err(err);
			},
			Err(err) => {
				tracing::warn!(session_id = %session.session_id, error = %err, "Request failed.");

				Reply {
					status: err.status(),
					message: Some(err.detail().to_string()),
					result: None,
					action_payload: None,
				}
			},
		};
		let outcome = SessionOutcome {
			state: SessionState::for_status(reply.status),
			answer: reply.message.clone(),
			action_payload: reply.action_payload,
		};

		self.backends.sessions.close(session.session_id, &outcome).await?;

		Ok(AskResponse {
			session_id: session.session_id,
			status: reply.status,
			message: reply.message,
			result: reply.result,
		})
	}

	async fn respond(&self, req: &AskRequest, prior: Option<&PriorTurn>) -> Result<Reply> {
		let chunks = self.search(&req.question, &Namespace::ALL, None).await?;
		let grounding = chunks
			.into_iter()
			.map(|chunk| GroundingChunk {
				namespace: chunk.namespace,
				text: chunk.text,
				score: chunk.score,
			})
			.collect::<Vec<_>>();
		let prompt = prompt::compose_prompt(&req.question, &grounding, prior);
		let raw = self.providers.completion.complete(&self.cfg.providers.gateway, &prompt).await?;

		match action::parse_model_output(&raw) {
			ModelOutput::Message(message) => Ok(Reply {
				status: ExecutionStatus::Message,
				message: Some(message),
				result: None,
				action_payload: None,
			}),
			ModelOutput::Action(request) => {
				let payload = request.to_payload();
				let outcome = self.execute(&req.actor, request).await?;

				Ok(Reply {
					status: outcome.status,
					message: Some(outcome.message),
					result: outcome.result,
					action_payload: Some(payload),
				})
			},
		}
	}

	async fn close_quietly(&self, session_id: Uuid, cause: &Error) {
		let outcome = SessionOutcome {
			state: SessionState::Failed,
			answer: Some(cause.detail().to_string()),
			action_payload: None,
		};

		if let Err(err) = self.backends.sessions.close(session_id, &outcome).await {
			tracing::error!(session_id = %session_id, error = %err, "Failed to close session.");
		}
	}
}
