use serde_json::Value;

use tollgate_config::{GatewayConfig, ProviderKind};

use crate::{Error, Result};

/// One embedding per call. The offline kind never touches the network.
pub async fn embed(cfg: &GatewayConfig, text: &str) -> Result<Vec<f32>> {
	if cfg.kind == ProviderKind::Fallback {
		return Ok(crate::fallback::fallback_embedding(text, cfg.dimensions));
	}

	let client = crate::client(cfg)?;
	let (url, body) = request(cfg, text);
	let res = client.post(url).headers(crate::auth_headers(cfg)?).json(&body).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(cfg.kind, &json)
}

fn request(cfg: &GatewayConfig, text: &str) -> (String, Value) {
	let base = cfg.api_base();

	match cfg.kind {
		ProviderKind::OpenAi => (
			format!("{base}/embeddings"),
			serde_json::json!({
				"model": cfg.embedding_model,
				"input": text,
				"dimensions": cfg.dimensions,
			}),
		),
		ProviderKind::Gemini => (
			format!("{base}/models/{}:embedContent", cfg.embedding_model),
			serde_json::json!({
				"model": format!("models/{}", cfg.embedding_model),
				"content": { "parts": [{ "text": text }] },
				"outputDimensionality": cfg.dimensions,
			}),
		),
		ProviderKind::Ollama | ProviderKind::Fallback => (
			format!("{base}/embeddings"),
			serde_json::json!({
				"model": cfg.embedding_model,
				"prompt": text,
			}),
		),
	}
}

fn parse_embedding_response(kind: ProviderKind, json: &Value) -> Result<Vec<f32>> {
	let values = match kind {
		ProviderKind::OpenAi => json
			.get("data")
			.and_then(Value::as_array)
			.and_then(|data| data.first())
			.and_then(|item| item.get("embedding")),
		ProviderKind::Gemini => json.get("embedding").and_then(|embedding| embedding.get("values")),
		ProviderKind::Ollama | ProviderKind::Fallback => json.get("embedding"),
	}
	.and_then(Value::as_array)
	.ok_or_else(|| crate::invalid_response("Embedding response is missing the vector."))?;
	let mut vec = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vec.push(number as f32);
	}

	if vec.is_empty() {
		return Err(crate::invalid_response("Embedding response vector is empty."));
	}

	Ok(vec)
}
