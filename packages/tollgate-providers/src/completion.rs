use serde_json::Value;

use tollgate_config::{GatewayConfig, ProviderKind};

use crate::{Error, Result};

/// Single-shot text completion. No retries; callers decide how to degrade.
pub async fn complete(cfg: &GatewayConfig, prompt: &str) -> Result<String> {
	if cfg.kind == ProviderKind::Fallback {
		return Err(Error::Unsupported { kind: cfg.kind.as_str(), capability: "completion" });
	}

	let client = crate::client(cfg)?;
	let (url, body) = request(cfg, prompt);
	let res = client.post(url).headers(crate::auth_headers(cfg)?).json(&body).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_response(cfg.kind, &json)
}

fn request(cfg: &GatewayConfig, prompt: &str) -> (String, Value) {
	let base = cfg.api_base();

	match cfg.kind {
		ProviderKind::OpenAi => (
			format!("{base}/chat/completions"),
			serde_json::json!({
				"model": cfg.completion_model,
				"temperature": cfg.temperature,
				"messages": [{ "role": "user", "content": prompt }],
			}),
		),
		ProviderKind::Gemini => (
			format!("{base}/models/{}:generateContent", cfg.completion_model),
			serde_json::json!({
				"contents": [{ "parts": [{ "text": prompt }] }],
				"generationConfig": { "temperature": cfg.temperature },
			}),
		),
		ProviderKind::Ollama | ProviderKind::Fallback => (
			format!("{base}/generate"),
			serde_json::json!({
				"model": cfg.completion_model,
				"prompt": prompt,
				"stream": false,
				"options": { "temperature": cfg.temperature },
			}),
		),
	}
}

fn parse_completion_response(kind: ProviderKind, json: &Value) -> Result<String> {
	let text = match kind {
		ProviderKind::OpenAi => json
			.get("choices")
			.and_then(Value::as_array)
			.and_then(|choices| choices.first())
			.and_then(|choice| choice.get("message"))
			.and_then(|message| message.get("content")),
		ProviderKind::Gemini => json
			.get("candidates")
			.and_then(Value::as_array)
			.and_then(|candidates| candidates.first())
			.and_then(|candidate| candidate.get("content"))
			.and_then(|content| content.get("parts"))
			.and_then(Value::as_array)
			.and_then(|parts| parts.first())
			.and_then(|part| part.get("text")),
		ProviderKind::Ollama | ProviderKind::Fallback => json.get("response"),
	}
	.and_then(Value::as_str)
	.ok_or_else(|| crate::invalid_response("Completion response is missing text content."))?;

	Ok(text.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_each_provider_shape() {
		let openai = serde_json::json!({
			"choices": [{ "message": { "role": "assistant", "content": "hi" } }]
		});
		let gemini = serde_json::json!({
			"candidates": [{ "content": { "parts": [{ "text": "hello" }] } }]
		});
		let ollama = serde_json::json!({ "response": "hey", "done": true });

		assert_eq!(parse_completion_response(ProviderKind::OpenAi, &openai).expect("OpenAI."), "hi");
		assert_eq!(parse_completion_response(ProviderKind::Gemini, &gemini).expect("Gemini."), "hello");
		assert_eq!(parse_completion_response(ProviderKind::Ollama, &ollama).expect("Ollama."), "hey");
	}

	#[test]
	fn missing_content_is_a_provider_error() {
		let json = serde_json::json!({ "choices": [] });

		assert!(matches!(
			parse_completion_response(ProviderKind::OpenAi, &json),
			Err(Error::InvalidResponse { .. })
		));
	}

	#[test]
	fn ollama_requests_disable_streaming() {
		let cfg = GatewayConfig {
			kind: ProviderKind::Ollama,
			api_base: Some("http://ollama:11434/api".to_string()),
			api_key: String::new(),
			completion_model: "llama3".to_string(),
			embedding_model: "nomic-embed-text".to_string(),
			dimensions: 768,
			temperature: 0.2,
			timeout_ms: 5_000,
			default_headers: Default::default(),
		};
		let (url, body) = request(&cfg, "ping");

		assert_eq!(url, "http://ollama:11434/api/generate");
		assert_eq!(body["stream"], Value::Bool(false));
	}

	#[tokio::test]
	async fn offline_kind_has_no_completion() {
		let cfg = GatewayConfig {
			kind: ProviderKind::Fallback,
			api_base: None,
			api_key: String::new(),
			completion_model: "none".to_string(),
			embedding_model: "none".to_string(),
			dimensions: 8,
			temperature: 0.0,
			timeout_ms: 1_000,
			default_headers: Default::default(),
		};

		assert!(matches!(complete(&cfg, "hi").await, Err(Error::Unsupported { .. })));
		assert_eq!(crate::embedding::embed(&cfg, "hi").await.expect("Offline embed.").len(), 8);
	}
}
