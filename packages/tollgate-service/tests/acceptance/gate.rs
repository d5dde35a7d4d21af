use serde_json::{Map, Value, json};

use tollgate_domain::{
	action::{ActionRequest, ExecutionStatus},
	audit::{AuditQuery, AuditStatus},
};
use tollgate_service::registry::AccessMode;

use super::{Behavior, FakeStore, HarnessBuilder, ready};

fn values(pairs: &[(&str, &str)]) -> Map<String, Value> {
	pairs.iter().map(|(key, value)| (key.to_string(), Value::String(value.to_string()))).collect()
}

#[tokio::test]
async fn listed_safe_operation_runs_and_unlisted_one_is_refused() {
	let harness = ready(HarnessBuilder::new()).await;
	let confirmed = harness
		.service
		.execute(
			"alice",
			ActionRequest::new("invoice", "confirm").with_filter(json!([["name", "=", "INV-1"]])),
		)
		.await
		.expect("Execute must succeed.");

	assert_eq!(confirmed.status, ExecutionStatus::Ok);
	assert_eq!(confirmed.result, Some(json!({ "ids": [1], "entity": "invoice" })));
	assert_eq!(harness.store.mutations(), 1);

	let refused = harness
		.service
		.execute("alice", ActionRequest::new("invoice", "delete_all"))
		.await
		.expect("Execute must succeed.");

	assert_eq!(refused.status, ExecutionStatus::NoValidMethod);
	assert!(refused.result.is_none());
	assert_eq!(harness.store.mutations(), 1);
	assert_eq!(harness.store.rows("invoice").len(), 2);
}

#[tokio::test]
async fn nothing_runs_before_a_catalog_is_published() {
	let harness = HarnessBuilder::new().build();
	let outcome = harness
		.service
		.execute("alice", ActionRequest::new("invoice", "confirm"))
		.await
		.expect("Execute must succeed.");

	assert_eq!(outcome.status, ExecutionStatus::Denied);
	assert_eq!(harness.store.mutations(), 0);
}

#[tokio::test]
async fn refused_requests_never_reach_the_store() {
	let harness = ready(HarnessBuilder::new()).await;
	let cases = [
		(ActionRequest::new("invoice", "delete_all"), ExecutionStatus::NoValidMethod),
		(ActionRequest::new("invoice", "compute_secret"), ExecutionStatus::NoValidMethod),
		(ActionRequest::new("invoice", "action_send"), ExecutionStatus::NoValidMethod),
		(ActionRequest::new("payroll", "action_post"), ExecutionStatus::Denied),
		(
			ActionRequest { tool: "shell".to_string(), ..ActionRequest::new("invoice", "confirm") },
			ExecutionStatus::Denied,
		),
	];

	for (request, expected) in cases {
		let operation = request.operation.clone();
		let outcome = harness.service.execute("mallory", request).await.expect("Execute must succeed.");

		assert_eq!(outcome.status, expected, "operation {operation}");
	}

	assert_eq!(harness.store.mutations(), 0);
	assert_eq!(harness.audit.len(), 5);
}

#[tokio::test]
async fn create_on_unregistered_entity_is_denied() {
	let harness = ready(HarnessBuilder::new()).await;
	let outcome = harness
		.service
		.execute(
			"alice",
			ActionRequest::new("legacy.report", "create").with_values(values(&[("name", "x")])),
		)
		.await
		.expect("Execute must succeed.");

	assert_eq!(outcome.status, ExecutionStatus::Denied);
	assert_eq!(harness.store.mutations(), 0);
	assert!(harness.store.rows("legacy.report").is_empty());
}

#[tokio::test]
async fn structural_operations_follow_the_filter() {
	let harness = ready(HarnessBuilder::new()).await;
	let created = harness
		.service
		.execute(
			"alice",
			ActionRequest::new("partner", "create").with_values(values(&[("name", "Globex")])),
		)
		.await
		.expect("Execute must succeed.");

	assert_eq!(created.status, ExecutionStatus::Ok);
	assert_eq!(created.result, Some(json!({ "ids": [4], "entity": "partner" })));

	let updated = harness
		.service
		.execute(
			"alice",
			ActionRequest::new("invoice", "write")
				.with_filter(json!({ "name": "INV-2" }))
				.with_values(values(&[("state", "posted")])),
		)
		.await
		.expect("Execute must succeed.");

	assert_eq!(updated.status, ExecutionStatus::Ok);
	assert_eq!(updated.result, Some(Value::Bool(true)));

	let states = harness
		.store
		.rows("invoice")
		.into_iter()
		.map(|row| row.get("state").cloned().unwrap_or(Value::Null))
		.collect::<Vec<_>>();

	assert_eq!(states, vec![json!("draft"), json!("posted")]);

	let deleted = harness
		.service
		.execute(
			"alice",
			ActionRequest::new("invoice", "delete").with_filter(json!([["state", "=", "draft"]])),
		)
		.await
		.expect("Execute must succeed.");

	assert_eq!(deleted.status, ExecutionStatus::Ok);
	assert_eq!(harness.store.rows("invoice").len(), 1);
}

#[tokio::test]
async fn every_execution_writes_exactly_one_audit_record() {
	let mut store = FakeStore::invoicing();

	store.operation("invoice", "action_post", Behavior::Fail("Journal is locked.".to_string()));

	let harness = ready(HarnessBuilder::new().store(store)).await;
	let requests = [
		ActionRequest::new("invoice", "confirm"),
		ActionRequest::new("invoice", "delete_all"),
		ActionRequest::new("invoice", "action_post"),
		ActionRequest::new("payroll", "confirm"),
		ActionRequest::new("invoice", "confirm").with_filter(json!("not a filter")),
	];
	let mut outcomes = Vec::new();

	for request in requests {
		let outcome =
			harness.service.execute("auditor", request).await.expect("Execute must succeed.");

		outcomes.push(outcome);
	}

	let records = harness.audit.records();
	let statuses = records.iter().map(|record| record.status).collect::<Vec<_>>();

	assert_eq!(records.len(), 5);
	assert_eq!(
		statuses,
		vec![
			AuditStatus::Success,
			AuditStatus::NoValidMethod,
			AuditStatus::Error,
			AuditStatus::Denied,
			AuditStatus::Error,
		]
	);

	for (outcome, record) in outcomes.iter().zip(&records) {
		assert_eq!(outcome.audit_id, record.audit_id);
		assert_eq!(record.actor, "auditor");
	}

	assert_eq!(records[2].message, "Journal is locked.");
}

#[tokio::test]
async fn audit_log_filters_and_rejects_inverted_windows() {
	let harness = ready(HarnessBuilder::new()).await;

	for operation in ["confirm", "delete_all", "confirm"] {
		harness
			.service
			.execute("alice", ActionRequest::new("invoice", operation))
			.await
			.expect("Execute must succeed.");
	}

	let successes = harness
		.service
		.audit_log(&AuditQuery { status: Some(AuditStatus::Success), ..AuditQuery::default() })
		.await
		.expect("Audit query must succeed.");

	assert_eq!(successes.len(), 2);
	assert!(successes.iter().all(|record| record.operation == "confirm"));

	let now = time::OffsetDateTime::now_utc();
	let inverted = harness
		.service
		.audit_log(&AuditQuery {
			since: Some(now),
			until: Some(now - time::Duration::hours(1)),
			..AuditQuery::default()
		})
		.await;

	assert!(matches!(inverted, Err(tollgate_service::Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn store_access_refusal_is_reported_as_denied() {
	let store = FakeStore::invoicing().deny("invoice", AccessMode::Unlink);
	let harness = ready(HarnessBuilder::new().store(store)).await;
	let outcome = harness
		.service
		.execute("bob", ActionRequest::new("invoice", "unlink"))
		.await
		.expect("Execute must succeed.");

	assert_eq!(outcome.status, ExecutionStatus::Denied);
	assert!(outcome.message.contains("not allowed"));
	assert_eq!(harness.store.rows("invoice").len(), 2);
	assert_eq!(harness.audit.records()[0].status, AuditStatus::Denied);
}

#[tokio::test]
async fn operation_missing_from_live_store_is_not_callable() {
	let store = FakeStore::invoicing().without_operation("invoice", "confirm");
	let harness = ready(HarnessBuilder::new().store(store)).await;
	let outcome = harness
		.service
		.execute("bob", ActionRequest::new("invoice", "confirm"))
		.await
		.expect("Execute must succeed.");

	assert_eq!(outcome.status, ExecutionStatus::NoValidMethod);
	assert_eq!(harness.store.mutations(), 0);
}

#[tokio::test]
async fn unserializable_results_are_rendered_as_text() {
	let mut store = FakeStore::invoicing();

	store.operation("invoice", "action_post", Behavior::Handle("<report invoice,1>".to_string()));

	let harness = ready(HarnessBuilder::new().store(store)).await;
	let outcome = harness
		.service
		.execute("bob", ActionRequest::new("invoice", "action_post"))
		.await
		.expect("Execute must succeed.");

	assert_eq!(outcome.status, ExecutionStatus::Ok);
	assert_eq!(outcome.result, Some(json!("<report invoice,1>")));
}
