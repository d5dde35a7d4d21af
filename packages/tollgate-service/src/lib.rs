pub mod assistant;
pub mod catalog;
pub mod executor;
pub mod index;
pub mod registry;

mod error;

pub use assistant::{AskRequest, AskResponse};
pub use catalog::{CatalogHandle, RefreshReport};
pub use error::{Error, Result};
pub use executor::ExecutionOutcome;
pub use index::RebuildReport;
pub use tollgate_storage::BoxFuture;

use std::sync::Arc;

use tokio::sync::Mutex;

use tollgate_config::{Config, GatewayConfig};
use tollgate_providers::{completion, embedding};
use tollgate_storage::{AuditSink, CatalogRepository, KnowledgeSource, SessionLedger, VectorIndex};

use crate::registry::{ObjectStore, Registry};

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a GatewayConfig,
		text: &'a str,
	) -> BoxFuture<'a, tollgate_providers::Result<Vec<f32>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a GatewayConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, tollgate_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, completion }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), completion: provider }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a GatewayConfig,
		text: &'a str,
	) -> BoxFuture<'a, tollgate_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a GatewayConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, tollgate_providers::Result<String>> {
		Box::pin(completion::complete(cfg, prompt))
	}
}

/// Persistence the pipeline reads and writes.
#[derive(Clone)]
pub struct Backends {
	pub catalog: Arc<dyn CatalogRepository>,
	pub index: Arc<dyn VectorIndex>,
	pub audit: Arc<dyn AuditSink>,
	pub sessions: Arc<dyn SessionLedger>,
	pub knowledge: Arc<dyn KnowledgeSource>,
}

/// The live object store seen through its two boundaries.
#[derive(Clone)]
pub struct LiveStore {
	pub registry: Arc<dyn Registry>,
	pub store: Arc<dyn ObjectStore>,
}

pub struct TollgateService {
	pub cfg: Config,
	pub backends: Backends,
	pub live: LiveStore,
	pub providers: Providers,
	pub catalog: CatalogHandle,
	maintenance: Mutex<()>,
}
impl TollgateService {
	pub fn new(cfg: Config, backends: Backends, live: LiveStore) -> Self {
		Self::with_providers(cfg, backends, live, Providers::default())
	}

	pub fn with_providers(
		cfg: Config,
		backends: Backends,
		live: LiveStore,
		providers: Providers,
	) -> Self {
		Self {
			cfg,
			backends,
			live,
			providers,
			catalog: CatalogHandle::default(),
			maintenance: Mutex::new(()),
		}
	}
}
