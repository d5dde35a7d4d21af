use std::collections::HashMap;

use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		AliasOperations, ChangeAliases, Condition, CountPointsBuilder, CreateAlias,
		CreateCollectionBuilder, DeleteAlias, Distance, Filter, PointId, PointStruct, Query,
		QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, Value, Vector, VectorParamsBuilder,
		VectorsConfigBuilder, alias_operations::Action, point_id::PointIdOptions, value::Kind,
	},
};
use uuid::Uuid;

use tollgate_domain::retrieval::{self, EmbeddingRecord, Namespace, ScoredChunk};

use crate::{BoxFuture, Error, Result, VectorIndex};

pub const DENSE_VECTOR_NAME: &str = "dense";

const UPSERT_BATCH: usize = 256;

/// Qdrant-backed index. Readers always query `alias`; a rebuild fills a fresh collection and then
/// repoints the alias in one alias update.
pub struct QdrantVectorIndex {
	pub client: Qdrant,
	pub alias: String,
	pub vector_dim: u32,
	aliases: AliasClient,
}
impl QdrantVectorIndex {
	pub fn new(cfg: &tollgate_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;
		let aliases = AliasClient::new(&cfg.url)?;

		Ok(Self { client, alias: cfg.collection.clone(), vector_dim: cfg.vector_dim, aliases })
	}

	/// Collection the alias currently points at, if any.
	pub async fn current_collection(&self) -> Result<Option<String>> {
		let response = self.client.list_aliases().await?;

		Ok(response
			.aliases
			.into_iter()
			.find(|alias| alias.alias_name == self.alias)
			.map(|alias| alias.collection_name))
	}

	async fn swap_in(&self, records: Vec<EmbeddingRecord>) -> Result<()> {
		for record in &records {
			self.check_dimension(record.vector.len())?;
		}

		let next = format!("{}_{}", self.alias, Uuid::new_v4().simple());
		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
		);

		self.client
			.create_collection(CreateCollectionBuilder::new(next.clone()).vectors_config(vectors_config))
			.await?;

		if let Err(err) = self.fill(&next, records).await {
			if let Err(cleanup) = self.client.delete_collection(next.clone()).await {
				tracing::warn!(
					collection = %next,
					error = %cleanup,
					"Failed to drop partial collection."
				);
			}

			return Err(err);
		}

		let previous = self.current_collection().await?;
		let mut actions = Vec::with_capacity(2);

		if previous.is_some() {
			actions.push(AliasOperations {
				action: Some(Action::DeleteAlias(DeleteAlias { alias_name: self.alias.clone() })),
			});
		}

		actions.push(AliasOperations {
			action: Some(Action::CreateAlias(CreateAlias {
				collection_name: next.clone(),
				alias_name: self.alias.clone(),
			})),
		});

		self.aliases.apply(actions).await?;

		tracing::info!(alias = %self.alias, collection = %next, "Qdrant alias repointed.");

		if let Some(previous) = previous
			&& let Err(err) = self.client.delete_collection(previous.clone()).await
		{
			tracing::warn!(collection = %previous, error = %err, "Failed to drop previous collection.");
		}

		Ok(())
	}

	async fn fill(&self, collection: &str, records: Vec<EmbeddingRecord>) -> Result<()> {
		let mut points = Vec::with_capacity(UPSERT_BATCH);

		for record in records {
			points.push(to_point(record));

			if points.len() == UPSERT_BATCH {
				self.upsert(collection, std::mem::take(&mut points)).await?;
			}
		}

		if !points.is_empty() {
			self.upsert(collection, points).await?;
		}

		Ok(())
	}

	async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<()> {
		self.client
			.upsert_points(UpsertPointsBuilder::new(collection.to_string(), points).wait(true))
			.await?;

		Ok(())
	}

	async fn query(
		&self,
		query: &[f32],
		namespaces: &[Namespace],
		limit: usize,
	) -> Result<Vec<ScoredChunk>> {
		self.check_dimension(query.len())?;

		if namespaces.is_empty() || limit == 0 {
			return Ok(Vec::new());
		}

		let names =
			namespaces.iter().map(|namespace| namespace.as_str().to_string()).collect::<Vec<_>>();
		let search = QueryPointsBuilder::new(self.alias.clone())
			.query(Query::new_nearest(query.to_vec()))
			.using(DENSE_VECTOR_NAME)
			.filter(Filter::must([Condition::matches("namespace", names)]))
			.limit(limit as u64)
			.with_payload(true);
		let response = self.client.query(search).await?;
		let mut chunks =
			response.result.into_iter().map(from_point).collect::<Result<Vec<_>>>()?;

		retrieval::sort_chunks(&mut chunks);

		Ok(chunks)
	}

	fn check_dimension(&self, actual: usize) -> Result<()> {
		if actual != self.vector_dim as usize {
			return Err(Error::DataConsistency(format!(
				"Vector dimension mismatch: expected {}, got {actual}.",
				self.vector_dim
			)));
		}

		Ok(())
	}
}

impl VectorIndex for QdrantVectorIndex {
	fn replace_records(&self, records: Vec<EmbeddingRecord>) -> BoxFuture<'_, Result<()>> {
		Box::pin(self.swap_in(records))
	}

	fn search<'a>(
		&'a self,
		query: &'a [f32],
		namespaces: &'a [Namespace],
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(self.query(query, namespaces, limit))
	}

	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async move {
			let response =
				self.client.count(CountPointsBuilder::new(self.alias.clone()).exact(true)).await?;

			Ok(response.result.map(|result| result.count).unwrap_or_default())
		})
	}
}

/// Alias changes go out as one `ChangeAliases` request, which Qdrant applies atomically. `Qdrant`
/// only exposes single-action alias calls, and a delete followed by a create leaves the alias
/// unresolved in between.
#[allow(deprecated)]
struct AliasClient(qdrant_client::client::QdrantClient);
#[allow(deprecated)]
impl AliasClient {
	fn new(url: &str) -> Result<Self> {
		let client = qdrant_client::client::QdrantClient::from_url(url)
			.build()
			.map_err(|err| Error::QdrantAlias(format!("{err:#}")))?;

		Ok(Self(client))
	}

	async fn apply(&self, actions: Vec<AliasOperations>) -> Result<()> {
		let response = self
			.0
			.update_aliases(ChangeAliases { actions, timeout: None })
			.await
			.map_err(|err| Error::QdrantAlias(format!("{err:#}")))?;

		if !response.result {
			return Err(Error::QdrantAlias("Qdrant rejected the alias change.".to_string()));
		}

		Ok(())
	}
}

fn to_point(record: EmbeddingRecord) -> PointStruct {
	let mut payload = Payload::new();

	payload.insert("namespace", record.namespace.as_str().to_string());
	payload.insert("text", record.text);
	payload.insert("position", serde_json::Value::from(record.position));

	if let Some(document_id) = record.document_id {
		payload.insert("document_id", document_id.to_string());
	}

	let mut vectors = HashMap::new();

	vectors.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(record.vector));

	PointStruct::new(record.record_id.to_string(), vectors, payload)
}

fn from_point(point: ScoredPoint) -> Result<ScoredChunk> {
	let record_id = point
		.id
		.as_ref()
		.and_then(point_id_to_uuid)
		.ok_or_else(|| Error::DataConsistency("Qdrant point has no UUID id.".to_string()))?;
	let namespace = payload_str(&point.payload, "namespace")
		.map(crate::models::parse_namespace)
		.transpose()?
		.ok_or_else(|| Error::DataConsistency(format!("Point {record_id} has no namespace.")))?;
	let text = payload_str(&point.payload, "text").unwrap_or_default().to_string();
	let position = payload_u64(&point.payload, "position").unwrap_or(u64::MAX);
	let document_id =
		payload_str(&point.payload, "document_id").and_then(|raw| Uuid::parse_str(raw).ok());

	Ok(ScoredChunk { record_id, position, namespace, text, document_id, score: point.score })
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

fn payload_str<'a>(payload: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.as_str()),
		_ => None,
	}
}

fn payload_u64(payload: &HashMap<String, Value>, key: &str) -> Option<u64> {
	match &payload.get(key)?.kind {
		Some(Kind::IntegerValue(value)) => u64::try_from(*value).ok(),
		Some(Kind::DoubleValue(value)) if value.fract() == 0.0 && *value >= 0.0 => Some(*value as u64),
		_ => None,
	}
}
