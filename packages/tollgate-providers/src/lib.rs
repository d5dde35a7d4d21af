pub mod completion;
pub mod embedding;
pub mod error;
pub mod fallback;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};

use tollgate_config::{GatewayConfig, ProviderKind};

const GEMINI_KEY_HEADER: &str = "x-goog-api-key";

/// Authentication plus configured default headers. Ollama and the offline kind carry no
/// credentials.
pub fn auth_headers(cfg: &GatewayConfig) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	match cfg.kind {
		ProviderKind::OpenAi => {
			headers.insert(AUTHORIZATION, format!("Bearer {}", cfg.api_key).parse()?);
		},
		ProviderKind::Gemini => {
			headers.insert(HeaderName::from_static(GEMINI_KEY_HEADER), cfg.api_key.parse()?);
		},
		ProviderKind::Ollama | ProviderKind::Fallback => {},
	}

	for (key, value) in &cfg.default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

fn client(cfg: &GatewayConfig) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?)
}

fn invalid_response(message: impl Into<String>) -> Error {
	Error::InvalidResponse { message: message.into() }
}
