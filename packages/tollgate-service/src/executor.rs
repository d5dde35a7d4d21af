use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use tollgate_domain::{
	action::{ActionRequest, ExecutionStatus},
	audit::{AuditQuery, AuditStatus, ExecutionAuditRecord},
	catalog::{Catalog, StructuralOp},
	filter::Filter,
	policy::{self, Authorized},
	result::{self, StoreOutput},
};
use tollgate_storage::AuditSink;

use crate::{
	Error, Result, TollgateService,
	registry::{AccessMode, ObjectStore},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionOutcome {
	pub status: ExecutionStatus,
	pub message: String,
	/// Serialized result summary. Present only on success.
	pub result: Option<Value>,
	pub audit_id: Uuid,
}

/// Everything one execution needs, owned so it can outlive the caller.
struct Execution {
	catalog: Arc<Catalog>,
	store: Arc<dyn ObjectStore>,
	audit: Arc<dyn AuditSink>,
	actor: String,
	request: ActionRequest,
}
impl Execution {
	async fn run(self) -> Result<ExecutionOutcome> {
		let (status, message, result) = match self.dispatch().await {
			Ok(output) => {
				let summary = result::serialize_output(output.as_ref());

				tracing::info!(
					entity = %self.request.entity,
					operation = %self.request.operation,
					status = ExecutionStatus::Ok.as_str(),
					"Action executed."
				);

				(ExecutionStatus::Ok, "Action executed.".to_string(), Some(summary))
			},
			Err(err) => {
				let status = err.status();

				match &err {
					Error::ValidationDenied { .. } | Error::AccessDenied { .. } => tracing::info!(
						entity = %self.request.entity,
						operation = %self.request.operation,
						status = status.as_str(),
						reason = err.detail(),
						"Action refused."
					),
					_ => tracing::error!(
						entity = %self.request.entity,
						operation = %self.request.operation,
						status = status.as_str(),
						error = %err,
						"Action failed."
					),
				}

				(status, err.detail().to_string(), None)
			},
		};
		let record = ExecutionAuditRecord {
			audit_id: Uuid::new_v4(),
			actor: self.actor.clone(),
			entity: self.request.entity.clone(),
			operation: self.request.operation.clone(),
			filter: self.request.filter.clone(),
			values: Value::Object(self.request.values.clone()),
			status: AuditStatus::from_execution(status).unwrap_or(AuditStatus::Error),
			message: message.clone(),
			result: result.clone(),
			created_at: OffsetDateTime::now_utc(),
		};

		self.audit.append(&record).await?;

		Ok(ExecutionOutcome { status, message, result, audit_id: record.audit_id })
	}

	async fn dispatch(&self) -> Result<Option<StoreOutput>> {
		let route = policy::authorize(&self.catalog, &self.request).map_err(|code| {
			Error::ValidationDenied { status: code.status(), message: code.describe().to_string() }
		})?;
		let filter = Filter::parse(&self.request.filter)
			.map_err(|err| Error::Execution { message: err.to_string() })?;
		let entity = self.request.entity.as_str();
		let records = self.store.search(entity, &filter).await?;

		self.store.check_access(&records, AccessMode::Read).await?;

		match route {
			Authorized::Structural(op) => {
				let mode = match op {
					StructuralOp::Create => AccessMode::Create,
					StructuralOp::Update => AccessMode::Write,
					StructuralOp::Delete => AccessMode::Unlink,
				};

				self.store.check_access(&records, mode).await?;

				let output = match op {
					StructuralOp::Create => self.store.create(entity, &self.request.values).await?,
					StructuralOp::Update => self.store.update(&records, &self.request.values).await?,
					StructuralOp::Delete => self.store.delete(&records).await?,
				};

				Ok(Some(output))
			},
			Authorized::Operation => {
				let operation = self.request.operation.as_str();

				if !self.store.has_operation(entity, operation).await? {
					return Err(Error::ValidationDenied {
						status: ExecutionStatus::NoValidMethod,
						message: format!("Operation {operation} is not callable on {entity}."),
					});
				}

				Ok(self.store.invoke(&records, operation).await?)
			},
		}
	}
}

impl TollgateService {
	/// Validates `request` against the catalog allowlist, runs it if permitted, and writes exactly
	/// one audit record. Denials and store failures come back as statuses; `Err` means the audit
	/// record itself could not be written.
	///
	/// The work runs on its own task, so dropping the returned future does not abandon a started
	/// mutation or its audit record.
	pub async fn execute(&self, actor: &str, request: ActionRequest) -> Result<ExecutionOutcome> {
		let execution = Execution {
			// Before the first publish every entity is unknown.
			catalog: self.catalog.snapshot().unwrap_or_default(),
			store: self.live.store.clone(),
			audit: self.backends.audit.clone(),
			actor: actor.to_string(),
			request: request.clone(),
		};

		match tokio::spawn(execution.run()).await {
			Ok(outcome) => outcome,
			Err(err) => {
				// The task died before writing its record.
				let message = format!("Execution task failed: {err}");
				let record = ExecutionAuditRecord {
					audit_id: Uuid::new_v4(),
					actor: actor.to_string(),
					entity: request.entity,
					operation: request.operation,
					filter: request.filter,
					values: Value::Object(request.values),
					status: AuditStatus::Error,
					message: message.clone(),
					result: None,
					created_at: OffsetDateTime::now_utc(),
				};

				tracing::error!(
					entity = %record.entity,
					operation = %record.operation,
					error = %err,
					"Execution task failed."
				);

				self.backends.audit.append(&record).await?;

				Ok(ExecutionOutcome {
					status: ExecutionStatus::Error,
					message,
					result: None,
					audit_id: record.audit_id,
				})
			},
		}
	}

	/// Audit review, newest first.
	pub async fn audit_log(&self, query: &AuditQuery) -> Result<Vec<ExecutionAuditRecord>> {
		if let (Some(since), Some(until)) = (query.since, query.until)
			&& since > until
		{
			return Err(Error::InvalidRequest {
				message: "Audit window start must not be after its end.".to_string(),
			});
		}

		Ok(self.backends.audit.query(query).await?)
	}
}
