use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use tollgate_domain::{
	audit::{AuditStatus, ExecutionAuditRecord},
	catalog::{CatalogField, CatalogOperation},
	retrieval::{EmbeddingRecord, KnowledgeDocument, Namespace},
	session::{ChatSession, SessionState},
};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct CatalogEntityRow {
	pub name: String,
	pub position: i32,
	pub label: String,
	pub description: String,
	pub transient: bool,
	pub refreshed_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CatalogFieldRow {
	pub entity_name: String,
	pub position: i32,
	pub name: String,
	pub field_type: String,
	pub label: String,
	pub required: bool,
	pub readonly: bool,
	pub related_entity: Option<String>,
}
impl From<CatalogFieldRow> for CatalogField {
	fn from(row: CatalogFieldRow) -> Self {
		Self {
			name: row.name,
			field_type: row.field_type,
			label: row.label,
			required: row.required,
			readonly: row.readonly,
			related_entity: row.related_entity,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CatalogOperationRow {
	pub entity_name: String,
	pub position: i32,
	pub name: String,
	pub signature: String,
	pub doc: String,
	pub is_safe_candidate: bool,
}
impl From<CatalogOperationRow> for CatalogOperation {
	fn from(row: CatalogOperationRow) -> Self {
		Self {
			name: row.name,
			signature: row.signature,
			doc: row.doc,
			is_safe_candidate: row.is_safe_candidate,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct KnowledgeDocumentRow {
	pub document_id: Uuid,
	pub name: String,
	pub source: String,
	pub body: String,
	pub active: bool,
}
impl From<KnowledgeDocumentRow> for KnowledgeDocument {
	fn from(row: KnowledgeDocumentRow) -> Self {
		Self {
			document_id: row.document_id,
			name: row.name,
			source: row.source,
			body: row.body,
			active: row.active,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct EmbeddingRow {
	pub record_id: Uuid,
	pub position: i64,
	pub namespace: String,
	pub text: String,
	pub vec: Vec<f32>,
	pub document_id: Option<Uuid>,
}
impl TryFrom<EmbeddingRow> for EmbeddingRecord {
	type Error = Error;

	fn try_from(row: EmbeddingRow) -> Result<Self> {
		Ok(Self {
			record_id: row.record_id,
			position: u64::try_from(row.position).map_err(|_| {
				Error::DataConsistency(format!("Negative embedding position {}.", row.position))
			})?,
			namespace: parse_namespace(&row.namespace)?,
			text: row.text,
			vector: row.vec,
			document_id: row.document_id,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct AuditRow {
	pub audit_id: Uuid,
	pub actor: String,
	pub entity: String,
	pub operation: String,
	pub filter: Value,
	pub values: Value,
	pub status: String,
	pub message: String,
	pub result: Option<Value>,
	pub created_at: OffsetDateTime,
}
impl TryFrom<AuditRow> for ExecutionAuditRecord {
	type Error = Error;

	fn try_from(row: AuditRow) -> Result<Self> {
		let status = AuditStatus::parse(&row.status).ok_or_else(|| {
			Error::DataConsistency(format!("Unknown audit status {:?}.", row.status))
		})?;

		Ok(Self {
			audit_id: row.audit_id,
			actor: row.actor,
			entity: row.entity,
			operation: row.operation,
			filter: row.filter,
			values: row.values,
			status,
			message: row.message,
			result: row.result,
			created_at: row.created_at,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionRow {
	pub session_id: Uuid,
	pub previous_session_id: Option<Uuid>,
	pub actor: String,
	pub question: String,
	pub answer: Option<String>,
	pub action_payload: Option<Value>,
	pub state: String,
	pub created_at: OffsetDateTime,
	pub closed_at: Option<OffsetDateTime>,
}
impl TryFrom<SessionRow> for ChatSession {
	type Error = Error;

	fn try_from(row: SessionRow) -> Result<Self> {
		let state = SessionState::parse(&row.state).ok_or_else(|| {
			Error::DataConsistency(format!("Unknown session state {:?}.", row.state))
		})?;

		Ok(Self {
			session_id: row.session_id,
			previous_session_id: row.previous_session_id,
			actor: row.actor,
			question: row.question,
			answer: row.answer,
			action_payload: row.action_payload,
			state,
			created_at: row.created_at,
			closed_at: row.closed_at,
		})
	}
}

pub(crate) fn parse_namespace(raw: &str) -> Result<Namespace> {
	Namespace::parse(raw)
		.ok_or_else(|| Error::DataConsistency(format!("Unknown embedding namespace {raw:?}.")))
}
