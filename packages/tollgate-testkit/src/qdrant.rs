use std::{thread, time::Duration};

use qdrant_client::Qdrant;
use tokio::{runtime::Builder, time};
use uuid::Uuid;

use crate::{Error, Result};

const DROP_ATTEMPTS: u32 = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A unique Qdrant alias for one test. Index rebuilds create `{alias}_{generation}` collections
/// behind it; all of them are dropped on cleanup, which also removes the alias.
pub struct TestAlias {
	url: String,
	alias: String,
	dropped: bool,
}
impl TestAlias {
	pub fn reserve(url: &str, prefix: &str) -> Self {
		Self {
			url: url.to_string(),
			alias: format!("{prefix}_{}", Uuid::new_v4().simple()),
			dropped: false,
		}
	}

	pub fn alias(&self) -> &str {
		&self.alias
	}

	pub fn config(&self, vector_dim: u32) -> tollgate_config::Qdrant {
		tollgate_config::Qdrant {
			url: self.url.clone(),
			collection: self.alias.clone(),
			vector_dim,
		}
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_generations(&self.url, &self.alias).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestAlias {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let url = self.url.clone();
		let alias = self.alias.clone();
		let handle = thread::spawn(move || {
			let result = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| Error::Message(err.to_string()))
				.and_then(|runtime| runtime.block_on(drop_generations(&url, &alias)));

			if let Err(err) = result {
				eprintln!("Failed to drop Qdrant collections behind {alias}: {err}.");
			}
		});
		let _ = handle.join();
	}
}

async fn drop_generations(url: &str, alias: &str) -> Result<()> {
	let client = Qdrant::from_url(url).build()?;
	let prefix = format!("{alias}_");
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=DROP_ATTEMPTS {
		let listed = time::timeout(REQUEST_TIMEOUT, client.list_collections())
			.await
			.map_err(|_| Error::Message("Listing Qdrant collections timed out.".to_string()))??;
		let generations = listed
			.collections
			.into_iter()
			.map(|collection| collection.name)
			.filter(|name| name.starts_with(&prefix))
			.collect::<Vec<_>>();

		if generations.is_empty() {
			return Ok(());
		}

		for collection in generations {
			let outcome = time::timeout(REQUEST_TIMEOUT, client.delete_collection(collection.clone()))
				.await
				.map_err(|_| Error::Message(format!("Dropping {collection} timed out.")))
				.and_then(|result| result.map_err(Error::from));

			if let Err(err) = outcome
				&& attempt == DROP_ATTEMPTS
			{
				return Err(err);
			}
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2);
	}

	Err(Error::Message(format!("Collections behind {alias} survived {DROP_ATTEMPTS} attempts.")))
}
