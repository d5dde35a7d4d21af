use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use tollgate_domain::session::{ChatSession, SessionOutcome, SessionState};

use crate::{Error, Result, models::SessionRow};

pub async fn insert_session<'e, E>(executor: E, session: &ChatSession) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO chat_sessions (
\tsession_id,
\tprevious_session_id,
\tactor,
\tquestion,
\tanswer,
\taction_payload,
\tstate,
\tcreated_at,
\tclosed_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(session.session_id)
	.bind(session.previous_session_id)
	.bind(session.actor.as_str())
	.bind(session.question.as_str())
	.bind(session.answer.as_deref())
	.bind(session.action_payload.as_ref())
	.bind(session.state.as_str())
	.bind(session.created_at)
	.bind(session.closed_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_session<'e, E>(executor: E, session_id: Uuid) -> Result<Option<ChatSession>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, SessionRow>(
		"\
SELECT
\tsession_id,
\tprevious_session_id,
\tactor,
\tquestion,
\tanswer,
\taction_payload,
\tstate,
\tcreated_at,
\tclosed_at
FROM chat_sessions
WHERE session_id = $1",
	)
	.bind(session_id)
	.fetch_optional(executor)
	.await?;

	row.map(ChatSession::try_from).transpose()
}

/// Conditional update on `state = 'draft'` so two closers cannot both win.
pub async fn close_session<'e, E>(
	executor: E,
	session_id: Uuid,
	outcome: &SessionOutcome,
	now: OffsetDateTime,
) -> Result<ChatSession>
where
	E: PgExecutor<'e>,
{
	if !outcome.state.is_terminal() {
		return Err(Error::InvalidArgument(format!(
			"Session {session_id} cannot close into {}.",
			outcome.state.as_str()
		)));
	}

	let row = sqlx::query_as::<_, SessionRow>(
		"\
UPDATE chat_sessions
SET state = $2, answer = $3, action_payload = $4, closed_at = $5
WHERE session_id = $1 AND state = $6
RETURNING
\tsession_id,
\tprevious_session_id,
\tactor,
\tquestion,
\tanswer,
\taction_payload,
\tstate,
\tcreated_at,
\tclosed_at",
	)
	.bind(session_id)
	.bind(outcome.state.as_str())
	.bind(outcome.answer.as_deref())
	.bind(outcome.action_payload.as_ref())
	.bind(now)
	.bind(SessionState::Draft.as_str())
	.fetch_optional(executor)
	.await?;

	match row {
		Some(row) => ChatSession::try_from(row),
		None => Err(Error::Conflict(format!("Session {session_id} is not an open draft."))),
	}
}
