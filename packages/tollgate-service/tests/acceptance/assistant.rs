use serde_json::json;

use tollgate_domain::{action::ExecutionStatus, session::SessionState};
use tollgate_service::{AskRequest, Error};

use super::{HarnessBuilder, ready};

fn ask(question: &str) -> AskRequest {
	AskRequest { actor: "alice".to_string(), question: question.to_string(), session_ref: None }
}

#[tokio::test]
async fn plain_reply_completes_the_session() {
	let harness =
		ready(HarnessBuilder::new().replies(&["Invoices are confirmed by accounting."])).await;
	let response =
		harness.service.ask(ask("Who confirms invoices?")).await.expect("Ask must succeed.");

	assert_eq!(response.status, ExecutionStatus::Message);
	assert_eq!(response.message.as_deref(), Some("Invoices are confirmed by accounting."));
	assert!(harness.audit.is_empty());

	let sessions = harness.sessions.sessions();

	assert_eq!(sessions.len(), 1);
	assert_eq!(sessions[0].session_id, response.session_id);
	assert_eq!(sessions[0].state, SessionState::Completed);
	assert!(sessions[0].closed_at.is_some());
	assert!(sessions[0].action_payload.is_none());

	let prompts = harness.completion.prompts();

	assert_eq!(prompts.len(), 1);
	assert!(prompts[0].starts_with("System Instructions:\n"));
	assert!(prompts[0].contains("Conversation Context:\n(none)"));
	assert!(prompts[0].ends_with("User Query:\nWho confirms invoices?\n"));
}

#[tokio::test]
async fn action_reply_executes_and_records_the_payload() {
	let reply = r#"```json
{"tool": "orm_call", "args": {"model": "invoice", "method": "confirm", "domain": [["name", "=", "INV-1"]]}}
```"#;
	let harness = ready(HarnessBuilder::new().replies(&[reply])).await;
	let response = harness.service.ask(ask("Confirm INV-1")).await.expect("Ask must succeed.");

	assert_eq!(response.status, ExecutionStatus::Ok);
	assert_eq!(response.result, Some(json!({ "ids": [1], "entity": "invoice" })));
	assert_eq!(harness.store.mutations(), 1);
	assert_eq!(harness.audit.len(), 1);

	let session = &harness.sessions.sessions()[0];

	assert_eq!(session.state, SessionState::Completed);
	assert_eq!(
		session.action_payload.as_ref().and_then(|payload| payload.pointer("/args/method")),
		Some(&json!("confirm"))
	);
}

#[tokio::test]
async fn refused_action_fails_the_session() {
	let reply = r#"{"tool": "orm_call", "args": {"model": "invoice", "method": "delete_all"}}"#;
	let harness = ready(HarnessBuilder::new().replies(&[reply])).await;
	let response =
		harness.service.ask(ask("Delete every invoice")).await.expect("Ask must succeed.");

	assert_eq!(response.status, ExecutionStatus::NoValidMethod);
	assert_eq!(harness.store.mutations(), 0);
	assert_eq!(harness.audit.len(), 1);
	assert_eq!(harness.sessions.sessions()[0].state, SessionState::Failed);
}

#[tokio::test]
async fn chained_session_carries_the_prior_turn() {
	let harness = ready(
		HarnessBuilder::new().replies(&["There are two draft invoices.", "Both are unpaid."]),
	)
	.await;
	let first =
		harness.service.ask(ask("How many draft invoices?")).await.expect("Ask must succeed.");
	let second = harness
		.service
		.ask(AskRequest { session_ref: Some(first.session_id), ..ask("Are they paid?") })
		.await
		.expect("Ask must succeed.");
	let prompts = harness.completion.prompts();

	assert!(prompts[1].contains(
		"Last Query: How many draft invoices?\nLast Response: There are two draft invoices."
	));

	let sessions = harness.sessions.sessions();
	let chained = sessions
		.iter()
		.find(|session| session.session_id == second.session_id)
		.expect("Second session must be recorded.");

	assert_eq!(chained.previous_session_id, Some(first.session_id));
	assert_eq!(chained.state, SessionState::Completed);
}

#[tokio::test]
async fn unknown_session_reference_is_not_found() {
	let harness = ready(HarnessBuilder::new().replies(&["unused"])).await;
	let result = harness
		.service
		.ask(AskRequest { session_ref: Some(uuid::Uuid::new_v4()), ..ask("Continue") })
		.await;

	assert!(matches!(result, Err(Error::NotFound { .. })));
	assert!(harness.sessions.sessions().is_empty());
	assert!(harness.completion.prompts().is_empty());
}

#[tokio::test]
async fn completion_failure_fails_the_session() {
	let harness = ready(HarnessBuilder::new()).await;
	let response = harness.service.ask(ask("Anything")).await.expect("Ask must report failure.");

	assert_eq!(response.status, ExecutionStatus::Error);
	assert!(response.message.is_some_and(|message| message.contains("503")));
	assert_eq!(harness.sessions.sessions()[0].state, SessionState::Failed);
}

#[tokio::test]
async fn blank_input_is_rejected_before_opening_a_session() {
	let harness = ready(HarnessBuilder::new()).await;

	assert!(matches!(harness.service.ask(ask("  ")).await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(
		harness.service.ask(AskRequest { actor: String::new(), ..ask("Hi") }).await,
		Err(Error::InvalidRequest { .. })
	));
	assert!(harness.sessions.sessions().is_empty());
}
