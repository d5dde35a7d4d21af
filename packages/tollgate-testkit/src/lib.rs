//! Env-gated fixtures for the storage integration tests: a scratch Postgres database with the
//! tollgate schema applied, a reserved Qdrant alias whose generations are dropped afterwards, and
//! catalog and embedding builders.

mod error;
mod fixtures;
mod postgres;
mod qdrant;

pub use error::{Error, Result};
pub use fixtures::{catalog_entity, embedding_record};
pub use postgres::TestDatabase;
pub use qdrant::TestAlias;

use std::env;

pub fn env_dsn() -> Option<String> {
	env::var("TOLLGATE_PG_DSN").ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("TOLLGATE_QDRANT_URL").ok()
}
