use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tollgate_domain::retrieval::{EmbeddingRecord, Namespace, ScoredChunk};
use tollgate_providers::fallback;

use crate::{Error, Result, TollgateService};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RebuildReport {
	pub schema_count: u64,
	pub operation_count: u64,
	pub knowledge_count: u64,
	/// Records embedded with the hash fallback because the provider failed.
	pub fallback_count: u64,
}

struct Embedded {
	vector: Vec<f32>,
	fallback: bool,
}

impl TollgateService {
	/// Regenerates every embedding record from the current catalog and active knowledge, then
	/// swaps the index contents in one step. Fails without touching the index when this service
	/// has not published a catalog yet.
	pub async fn rebuild_index(&self) -> Result<RebuildReport> {
		let _guard = self.maintenance.lock().await;
		let Some(catalog) = self.catalog.snapshot() else {
			return Err(Error::DataConsistency {
				message: "No catalog has been published; refresh or reload it before rebuilding."
					.to_string(),
			});
		};
		let documents = self.backends.knowledge.active_documents().await?;
		let mut sources = Vec::new();

		for entity in catalog.entities() {
			sources.push((Namespace::Schema, entity.index_text(), None));

			for operation in &entity.operations {
				sources.push((Namespace::Operation, entity.operation_index_text(operation), None));
			}
		}
		for document in &documents {
			sources.push((Namespace::Knowledge, document.index_text(), Some(document.document_id)));
		}

		let mut report = RebuildReport::default();
		let mut records = Vec::with_capacity(sources.len());

		for (position, (namespace, text, document_id)) in sources.into_iter().enumerate() {
			let embedded = self.embed_text(&text).await?;

			match namespace {
				Namespace::Schema => report.schema_count += 1,
				Namespace::Operation => report.operation_count += 1,
				Namespace::Knowledge => report.knowledge_count += 1,
			}

			if embedded.fallback {
				report.fallback_count += 1;
			}

			records.push(EmbeddingRecord {
				record_id: Uuid::new_v4(),
				position: position as u64,
				namespace,
				text,
				vector: embedded.vector,
				document_id,
			});
		}

		self.backends.index.replace_records(records).await?;

		tracing::info!(
			schema = report.schema_count,
			operation = report.operation_count,
			knowledge = report.knowledge_count,
			fallback = report.fallback_count,
			"Embedding index rebuilt."
		);

		Ok(report)
	}

	/// Top `limit` chunks across `namespaces` by cosine similarity to `query`.
	pub async fn search(
		&self,
		query: &str,
		namespaces: &[Namespace],
		limit: Option<u32>,
	) -> Result<Vec<ScoredChunk>> {
		if query.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "Search query must not be empty.".to_string(),
			});
		}

		let limit = limit.unwrap_or(self.cfg.index.default_limit) as usize;

		if namespaces.is_empty() || limit == 0 {
			return Ok(Vec::new());
		}

		let embedded = self.embed_text(query).await?;

		Ok(self.backends.index.search(&embedded.vector, namespaces, limit).await?)
	}

	async fn embed_text(&self, text: &str) -> Result<Embedded> {
		let cfg = &self.cfg.providers.gateway;
		let embedded = match self.providers.embedding.embed(cfg, text).await {
			Ok(vector) => Embedded { vector, fallback: false },
			Err(err) if self.cfg.index.fallback_on_provider_error => {
				tracing::warn!(
					provider = cfg.kind.as_str(),
					error = %err,
					"Embedding provider failed. Using hash fallback."
				);

				Embedded { vector: fallback::fallback_embedding(text, cfg.dimensions), fallback: true }
			},
			Err(err) => return Err(err.into()),
		};

		if embedded.vector.len() != cfg.dimensions as usize {
			return Err(Error::DataConsistency {
				message: format!(
					"Embedding dimension mismatch: expected {}, got {}.",
					cfg.dimensions,
					embedded.vector.len()
				),
			});
		}

		Ok(embedded)
	}
}
