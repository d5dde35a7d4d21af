mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, Config, GatewayConfig, Index, IndexBackend, Postgres, ProviderKind, Providers, Qdrant,
	Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		ParseFailure::Toml(source) => Error::ParseConfig { path: path.to_path_buf(), source },
		ParseFailure::Invalid(err) => err,
	})
}

pub fn from_toml_str(raw: &str) -> Result<Config> {
	parse(raw).map_err(|err| match err {
		ParseFailure::Toml(source) =>
			Error::ParseConfig { path: std::path::PathBuf::from("<inline>"), source },
		ParseFailure::Invalid(err) => err,
	})
}

pub fn validate(cfg: &Config) -> Result<()> {
	let gateway = &cfg.providers.gateway;

	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if gateway.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.gateway.dimensions must be greater than zero.".to_string(),
		});
	}
	if gateway.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.gateway.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !gateway.temperature.is_finite() || !(0.0..=2.0).contains(&gateway.temperature) {
		return Err(Error::Validation {
			message: "providers.gateway.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if gateway.kind.requires_api_key() && gateway.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: format!(
				"providers.gateway.api_key must be non-empty for the {} provider.",
				gateway.kind.as_str()
			),
		});
	}
	if gateway.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.gateway.default_headers values must be strings.".to_string(),
		});
	}

	for (label, value) in [
		("providers.gateway.completion_model", &gateway.completion_model),
		("providers.gateway.embedding_model", &gateway.embedding_model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.catalog.safe_prefixes.is_empty() {
		return Err(Error::Validation {
			message: "catalog.safe_prefixes must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.safe_prefixes.iter().any(|prefix| prefix.trim().is_empty()) {
		return Err(Error::Validation {
			message: "catalog.safe_prefixes must not contain blank entries.".to_string(),
		});
	}
	if cfg.index.default_limit == 0 {
		return Err(Error::Validation {
			message: "index.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.index.backend == IndexBackend::Qdrant {
		let Some(qdrant) = cfg.storage.qdrant.as_ref() else {
			return Err(Error::Validation {
				message: "storage.qdrant is required when index.backend is qdrant.".to_string(),
			});
		};

		if qdrant.collection.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.qdrant.collection must be non-empty.".to_string(),
			});
		}
		if qdrant.vector_dim != gateway.dimensions {
			return Err(Error::Validation {
				message: "providers.gateway.dimensions must match storage.qdrant.vector_dim."
					.to_string(),
			});
		}
	}

	Ok(())
}

enum ParseFailure {
	Toml(toml::de::Error),
	Invalid(Error),
}

fn parse(raw: &str) -> std::result::Result<Config, ParseFailure> {
	let mut cfg: Config = toml::from_str(raw).map_err(ParseFailure::Toml)?;

	normalize(&mut cfg);

	validate(&cfg).map_err(ParseFailure::Invalid)?;

	Ok(cfg)
}

fn normalize(cfg: &mut Config) {
	let gateway = &mut cfg.providers.gateway;

	if gateway.api_base.as_deref().map(|base| base.trim().is_empty()).unwrap_or(false) {
		gateway.api_base = None;
	}
	if let Some(base) = gateway.api_base.as_mut() {
		let trimmed = base.trim().trim_end_matches('/').to_string();

		*base = trimmed;
	}

	for prefix in &mut cfg.catalog.safe_prefixes {
		let trimmed = prefix.trim().to_string();

		*prefix = trimmed;
	}
}
