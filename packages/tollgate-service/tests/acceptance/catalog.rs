use tollgate_storage::CatalogRepository;

use super::{FakeRegistry, HarnessBuilder, entity};

#[tokio::test]
async fn refresh_skips_entities_without_live_counterpart() {
	let harness = HarnessBuilder::new().build();
	let report = harness.service.refresh_catalog().await.expect("Catalog refresh must succeed.");

	assert_eq!(report.entity_count, 2);
	assert_eq!(report.operation_count, 5);
	assert_eq!(report.safe_operation_count, 4);
	assert_eq!(report.skipped, vec!["legacy.report".to_string()]);

	let catalog = harness.service.catalog.snapshot().expect("Refresh must publish a catalog.");

	assert!(catalog.contains("invoice"));
	assert!(!catalog.contains("legacy.report"));

	let invoice = catalog.entity("invoice").expect("Invoice must be cataloged.");

	assert_eq!(invoice.label, "invoice");
	assert!(invoice.operation("confirm").is_some_and(|operation| operation.is_safe_candidate));
	assert!(invoice.operation("delete_all").is_some_and(|operation| !operation.is_safe_candidate));
}

#[tokio::test]
async fn refresh_is_idempotent() {
	let harness = HarnessBuilder::new().build();

	harness.service.refresh_catalog().await.expect("First refresh must succeed.");

	let first = harness.service.backends.catalog.load_catalog().await.expect("Load must succeed.");

	harness.service.refresh_catalog().await.expect("Second refresh must succeed.");

	let second = harness.service.backends.catalog.load_catalog().await.expect("Load must succeed.");
	let strip = |entities: Vec<tollgate_domain::catalog::CatalogEntity>| {
		entities
			.into_iter()
			.map(|mut entity| {
				entity.refreshed_at = time::OffsetDateTime::UNIX_EPOCH;

				entity
			})
			.collect::<Vec<_>>()
	};

	assert_eq!(first.len(), 2);
	assert_eq!(strip(first), strip(second));
}

#[tokio::test]
async fn reload_adopts_the_persisted_catalog() {
	let harness = HarnessBuilder::new().build();

	assert!(harness.service.catalog.snapshot().is_none());

	harness
		.service
		.backends
		.catalog
		.replace_catalog(&[tollgate_service::catalog::build_entity(
			entity("partner", "Business partner", &[("name", "char")], &[]),
			&harness.service.cfg.catalog.safe_prefixes,
			time::OffsetDateTime::now_utc(),
		)])
		.await
		.expect("Replace must succeed.");

	let count = harness.service.reload_catalog().await.expect("Reload must succeed.");

	assert_eq!(count, 1);
	assert!(harness.service.catalog.snapshot().is_some_and(|catalog| catalog.contains("partner")));
}

#[tokio::test]
async fn refresh_drops_entities_the_registry_no_longer_lists() {
	let harness = HarnessBuilder::new().build();

	harness.service.refresh_catalog().await.expect("Refresh must succeed.");

	let shrunk = HarnessBuilder::new()
		.registry(FakeRegistry::new(
			vec![entity("partner", "Business partner", &[("name", "char")], &[])],
			&[],
		))
		.build();
	let shared = tollgate_service::TollgateService::with_providers(
		shrunk.service.cfg.clone(),
		harness.service.backends.clone(),
		shrunk.service.live.clone(),
		shrunk.service.providers.clone(),
	);
	let report = shared.refresh_catalog().await.expect("Refresh must succeed.");
	let persisted = harness.service.backends.catalog.load_catalog().await.expect("Load must succeed.");

	assert_eq!(report.entity_count, 1);
	assert_eq!(persisted.len(), 1);
	assert_eq!(persisted[0].name, "partner");
	assert!(persisted[0].operations.is_empty());
}
