use std::{sync::Arc, time::Duration};

use tokio::sync::Notify;

use tollgate_domain::{action::ActionRequest, audit::AuditStatus};

use super::{FakeStore, Gate, HarnessBuilder, ready};

#[tokio::test]
async fn dropped_caller_still_gets_audited() {
	let gate = Arc::new(Gate { entered: Notify::new(), release: Notify::new() });
	let store = FakeStore::invoicing().gated(gate.clone());
	let harness = ready(HarnessBuilder::new().store(store)).await;

	{
		let execution = harness.service.execute("alice", ActionRequest::new("invoice", "confirm"));

		tokio::select! {
			_ = execution => panic!("Execution must wait at the gate."),
			_ = gate.entered.notified() => {},
		}
	}

	assert!(harness.audit.is_empty());

	gate.release.notify_one();

	for _ in 0..200 {
		if !harness.audit.is_empty() {
			break;
		}

		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	let records = harness.audit.records();

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].status, AuditStatus::Success);
	assert_eq!(harness.store.mutations(), 1);
}
