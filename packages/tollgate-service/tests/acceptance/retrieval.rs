use std::sync::{Arc, atomic::AtomicUsize};

use tollgate_domain::retrieval::{KnowledgeDocument, Namespace};
use tollgate_service::{Error, TollgateService};
use tollgate_storage::VectorIndex;

use super::{
	DIMENSIONS, HarnessBuilder, UnreachableEmbedding, WrongDimensionEmbedding, ready, test_config,
};

fn refund_policy() -> KnowledgeDocument {
	KnowledgeDocument {
		document_id: uuid::Uuid::new_v4(),
		name: "Refund policy".to_string(),
		source: "handbook".to_string(),
		body: "Refunds over 500 need approval from finance.".to_string(),
		active: true,
	}
}

#[tokio::test]
async fn rebuild_indexes_catalog_and_active_knowledge() {
	let harness = ready(HarnessBuilder::new().knowledge(vec![refund_policy()])).await;
	let records = harness.index.snapshot();
	let namespaces = records.iter().map(|record| record.namespace).collect::<Vec<_>>();

	assert_eq!(records.len(), 8);
	assert_eq!(namespaces.iter().filter(|ns| **ns == Namespace::Schema).count(), 2);
	assert_eq!(namespaces.iter().filter(|ns| **ns == Namespace::Operation).count(), 5);
	assert_eq!(namespaces.iter().filter(|ns| **ns == Namespace::Knowledge).count(), 1);
	assert!(records.iter().all(|record| record.vector.len() == DIMENSIONS as usize));
	assert!(records.iter().enumerate().all(|(idx, record)| record.position == idx as u64));
	assert_eq!(harness.index.count().await.expect("Count must succeed."), 8);
}

#[tokio::test]
async fn identical_text_ranks_first_with_full_score() {
	let document = refund_policy();
	let query = document.index_text();
	let harness = ready(HarnessBuilder::new().knowledge(vec![document])).await;
	let chunks = harness
		.service
		.search(&query, &Namespace::ALL, Some(3))
		.await
		.expect("Search must succeed.");

	assert_eq!(chunks.len(), 3);
	assert_eq!(chunks[0].namespace, Namespace::Knowledge);
	assert_eq!(chunks[0].text, query);
	assert!((chunks[0].score - 1.0).abs() < 1e-5);
	assert!(chunks.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn search_respects_namespaces_and_limits() {
	let harness = ready(HarnessBuilder::new().knowledge(vec![refund_policy()])).await;
	let operations = harness
		.service
		.search("confirm an invoice", &[Namespace::Operation], Some(10))
		.await
		.expect("Search must succeed.");

	assert_eq!(operations.len(), 5);
	assert!(operations.iter().all(|chunk| chunk.namespace == Namespace::Operation));

	let defaulted = harness
		.service
		.search("confirm an invoice", &Namespace::ALL, None)
		.await
		.expect("Search must succeed.");

	assert_eq!(defaulted.len(), 5);

	let none = harness.service.search("confirm", &[], None).await.expect("Search must succeed.");

	assert!(none.is_empty());
	assert!(matches!(
		harness.service.search("   ", &Namespace::ALL, None).await,
		Err(Error::InvalidRequest { .. })
	));
}

#[tokio::test]
async fn unreachable_provider_falls_back_to_hash_embedding() {
	let embedding = Arc::new(UnreachableEmbedding { calls: AtomicUsize::new(0) });
	let harness = HarnessBuilder::new()
		.knowledge(vec![refund_policy()])
		.embedding(embedding.clone())
		.build();

	harness.service.refresh_catalog().await.expect("Refresh must succeed.");

	let report = harness.service.rebuild_index().await.expect("Rebuild must fall back.");

	assert_eq!(report.fallback_count, 8);
	assert_eq!(report.schema_count + report.operation_count + report.knowledge_count, 8);

	let chunks = harness
		.service
		.search("who approves refunds", &Namespace::ALL, Some(4))
		.await
		.expect("Search must fall back.");

	assert_eq!(chunks.len(), 4);
	assert!(chunks.windows(2).all(|pair| pair[0].score >= pair[1].score));
	assert_eq!(embedding.calls.load(std::sync::atomic::Ordering::SeqCst), 9);
}

#[tokio::test]
async fn provider_failure_surfaces_when_fallback_is_disabled() {
	let mut cfg = test_config();

	cfg.index.fallback_on_provider_error = false;

	let harness = HarnessBuilder::new()
		.config(cfg)
		.embedding(Arc::new(UnreachableEmbedding { calls: AtomicUsize::new(0) }))
		.build();

	harness.service.refresh_catalog().await.expect("Refresh must succeed.");

	assert!(matches!(harness.service.rebuild_index().await, Err(Error::Provider { .. })));
	assert_eq!(harness.index.count().await.expect("Count must succeed."), 0);
}

#[tokio::test]
async fn wrong_dimension_embedding_is_rejected() {
	let harness = HarnessBuilder::new().embedding(Arc::new(WrongDimensionEmbedding)).build();

	harness.service.refresh_catalog().await.expect("Refresh must succeed.");

	let err = harness.service.rebuild_index().await.expect_err("Rebuild must fail.");

	assert!(matches!(err, Error::DataConsistency { .. }), "unexpected error: {err}");
	assert!(harness.index.snapshot().is_empty());
}

#[tokio::test]
async fn rebuild_without_a_published_catalog_keeps_the_shared_index() {
	let harness = ready(HarnessBuilder::new()).await;

	assert_eq!(harness.index.count().await.expect("Count must succeed."), 7);

	// A second process over the same persisted catalog and index, before its first refresh.
	let peer = TollgateService::with_providers(
		test_config(),
		harness.service.backends.clone(),
		harness.service.live.clone(),
		harness.service.providers.clone(),
	);
	let err = peer.rebuild_index().await.expect_err("Rebuild must fail.");

	assert!(matches!(err, Error::DataConsistency { .. }), "unexpected error: {err}");
	assert_eq!(harness.index.count().await.expect("Count must succeed."), 7);

	assert_eq!(peer.reload_catalog().await.expect("Reload must succeed."), 2);

	let report = peer.rebuild_index().await.expect("Rebuild must succeed.");

	assert_eq!(report.schema_count, 2);
	assert_eq!(harness.index.count().await.expect("Count must succeed."), 7);
}
