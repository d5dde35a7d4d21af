use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding namespaces, declared in their canonical prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
	Schema,
	Operation,
	Knowledge,
}
impl Namespace {
	pub const ALL: [Self; 3] = [Self::Schema, Self::Operation, Self::Knowledge];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Schema => "schema",
			Self::Operation => "operation",
			Self::Knowledge => "knowledge",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"schema" => Some(Self::Schema),
			"operation" | "method" => Some(Self::Operation),
			"knowledge" => Some(Self::Knowledge),
			_ => None,
		}
	}

	/// Catalog-derived namespaces are regenerated on every catalog rebuild.
	pub fn is_catalog_derived(self) -> bool {
		matches!(self, Self::Schema | Self::Operation)
	}
}

/// One embedded chunk of grounding text. `position` is the insertion order within one rebuild and
/// breaks similarity ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
	pub record_id: Uuid,
	pub position: u64,
	pub namespace: Namespace,
	pub text: String,
	pub vector: Vec<f32>,
	pub document_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
	pub record_id: Uuid,
	pub position: u64,
	pub namespace: Namespace,
	pub text: String,
	pub document_id: Option<Uuid>,
	pub score: f32,
}
impl ScoredChunk {
	pub fn from_record(record: &EmbeddingRecord, score: f32) -> Self {
		Self {
			record_id: record.record_id,
			position: record.position,
			namespace: record.namespace,
			text: record.text.clone(),
			document_id: record.document_id,
			score,
		}
	}
}

/// Auxiliary business text, authored outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
	pub document_id: Uuid,
	pub name: String,
	pub source: String,
	pub body: String,
	pub active: bool,
}
impl KnowledgeDocument {
	pub fn index_text(&self) -> String {
		format!("document={}\nsource={}\n{}", self.name, self.source, self.body)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionMismatch {
	pub expected: usize,
	pub actual: usize,
}
impl Display for DimensionMismatch {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Vector dimension mismatch: expected {}, got {}.", self.expected, self.actual)
	}
}

impl std::error::Error for DimensionMismatch {}

/// Cosine similarity. Zero-norm vectors score zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, DimensionMismatch> {
	if a.len() != b.len() {
		return Err(DimensionMismatch { expected: a.len(), actual: b.len() });
	}

	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b) {
		let (x, y) = (f64::from(*x), f64::from(*y));

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	let denom = norm_a.sqrt() * norm_b.sqrt();

	if denom == 0.0 || !denom.is_finite() {
		return Ok(0.0);
	}

	Ok((dot / denom).clamp(-1.0, 1.0) as f32)
}

/// Exact linear scan. Returns `(position, similarity)` for the `limit` most similar candidates,
/// similarity descending and insertion position ascending on ties.
pub fn rank_by_cosine<'a, I>(
	query: &[f32],
	candidates: I,
	limit: usize,
) -> Result<Vec<(usize, f32)>, DimensionMismatch>
where
	I: IntoIterator<Item = (usize, &'a [f32])>,
{
	let mut scored = Vec::new();

	for (position, vector) in candidates {
		scored.push((position, cosine_similarity(query, vector)?));
	}

	sort_ranked(&mut scored);
	scored.truncate(limit);

	Ok(scored)
}

/// Similarity descending, then position ascending.
pub fn sort_ranked(scored: &mut [(usize, f32)]) {
	scored.sort_by(|(pos_a, score_a), (pos_b, score_b)| {
		rank_order(*score_a, *pos_a, *score_b, *pos_b)
	});
}

/// Same ordering for chunks returned by an external nearest-neighbour query.
pub fn sort_chunks(chunks: &mut [ScoredChunk]) {
	chunks.sort_by(|a, b| rank_order(a.score, a.position, b.score, b.position));
}

fn rank_order<P: Ord>(score_a: f32, pos_a: P, score_b: f32, pos_b: P) -> Ordering {
	score_b.partial_cmp(&score_a).unwrap_or(Ordering::Equal).then_with(|| pos_a.cmp(&pos_b))
}
