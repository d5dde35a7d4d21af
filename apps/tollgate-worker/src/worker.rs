use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use tollgate_service::TollgateService;

use crate::Result;

const MIN_INTERVAL_SECS: u64 = 1;

/// Refreshes and rebuilds once, then keeps both on their own schedules.
pub async fn run_worker(service: &TollgateService) -> Result<()> {
	publish_startup_catalog(service).await;
	rebuild_once(service).await;

	let mut refresh = interval(service.cfg.catalog.refresh_interval_secs);
	let mut rebuild = interval(service.cfg.index.rebuild_interval_secs);

	loop {
		tokio::select! {
			_ = refresh.tick() => refresh_once(service).await,
			_ = rebuild.tick() => rebuild_once(service).await,
		}
	}
}

/// The first rebuild needs a published catalog. When the registry is unreachable at startup, adopt
/// the persisted one instead.
async fn publish_startup_catalog(service: &TollgateService) {
	let Err(err) = service.refresh_catalog().await else {
		return;
	};

	tracing::warn!(error = %err, "Catalog refresh failed; reloading the persisted catalog.");

	if let Err(err) = service.reload_catalog().await {
		tracing::error!(error = %err, "Catalog reload failed.");
	}
}

async fn refresh_once(service: &TollgateService) {
	if let Err(err) = service.refresh_catalog().await {
		tracing::error!(error = %err, "Catalog refresh failed.");
	}
}

async fn rebuild_once(service: &TollgateService) {
	if let Err(err) = service.rebuild_index().await {
		tracing::error!(error = %err, "Index rebuild failed.");
	}
}

fn interval(secs: u64) -> time::Interval {
	let period = Duration::from_secs(secs.max(MIN_INTERVAL_SECS));
	let mut interval = time::interval_at(Instant::now() + period, period);

	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

	interval
}
