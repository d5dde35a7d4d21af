pub mod manifest;
pub mod worker;

mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tollgate_config::{Config, IndexBackend};
use tollgate_service::{Backends, LiveStore, TollgateService};
use tollgate_storage::{VectorIndex, db::Db, memory::MemoryVectorIndex, qdrant::QdrantVectorIndex};

use crate::manifest::{DetachedStore, ManifestRegistry};

#[derive(Debug, Parser)]
#[command(
	version = tollgate_cli::VERSION,
	rename_all = "kebab",
	styles = tollgate_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON export of the host registry.
	#[arg(long, short = 'm', value_name = "FILE")]
	pub manifest: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Command {
	/// Rebuild the catalog from the registry manifest.
	Refresh,
	/// Re-embed the persisted catalog and active knowledge.
	Rebuild,
	/// Refresh and rebuild on the configured intervals until stopped.
	Run,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = tollgate_config::load(&args.config)?;

	init_tracing(&config);

	let registry = ManifestRegistry::load(&args.manifest)?;
	let backends = connect_backends(&config).await?;
	let live = LiveStore { registry: Arc::new(registry), store: Arc::new(DetachedStore) };
	let service = TollgateService::new(config, backends, live);

	match args.command {
		Command::Refresh => {
			service.refresh_catalog().await?;
		},
		Command::Rebuild => {
			service.reload_catalog().await?;
			service.rebuild_index().await?;
		},
		Command::Run => worker::run_worker(&service).await?,
	}

	Ok(())
}

async fn connect_backends(config: &Config) -> Result<Backends> {
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema(config.providers.gateway.dimensions).await?;

	let index: Arc<dyn VectorIndex> = match config.index.backend {
		IndexBackend::Memory => {
			tracing::warn!("The memory index backend is not shared with other processes.");

			Arc::new(MemoryVectorIndex::new())
		},
		IndexBackend::Postgres => Arc::new(db.clone()),
		IndexBackend::Qdrant => {
			let qdrant = config.storage.qdrant.as_ref().ok_or_else(|| {
				Error::Validation("storage.qdrant is required for the qdrant backend.".to_string())
			})?;

			Arc::new(QdrantVectorIndex::new(qdrant)?)
		},
	};
	let db = Arc::new(db);

	Ok(Backends {
		catalog: db.clone(),
		index,
		audit: db.clone(),
		sessions: db.clone(),
		knowledge: db,
	})
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
