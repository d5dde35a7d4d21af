use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub catalog: Catalog,
	#[serde(default)]
	pub index: Index,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Option<Qdrant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	/// Alias that readers query. Rebuilds write a fresh collection and repoint this alias.
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
	#[serde(rename = "openai")]
	OpenAi,
	Gemini,
	Ollama,
	/// Offline mode. Embeddings are hash derived and completions are unavailable.
	Fallback,
}
impl ProviderKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::OpenAi => "openai",
			Self::Gemini => "gemini",
			Self::Ollama => "ollama",
			Self::Fallback => "fallback",
		}
	}

	pub fn default_api_base(self) -> &'static str {
		match self {
			Self::OpenAi => "https://api.openai.com/v1",
			Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
			Self::Ollama | Self::Fallback => "http://localhost:11434/api",
		}
	}

	pub fn requires_api_key(self) -> bool {
		matches!(self, Self::OpenAi | Self::Gemini)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
	pub kind: ProviderKind,
	#[serde(default)]
	pub api_base: Option<String>,
	#[serde(default)]
	pub api_key: String,
	pub completion_model: String,
	pub embedding_model: String,
	pub dimensions: u32,
	#[serde(default)]
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl GatewayConfig {
	pub fn api_base(&self) -> &str {
		self.api_base.as_deref().unwrap_or_else(|| self.kind.default_api_base())
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Catalog {
	/// Operation name prefixes that mark an operation as a safe candidate.
	pub safe_prefixes: Vec<String>,
	pub refresh_interval_secs: u64,
}
impl Default for Catalog {
	fn default() -> Self {
		Self {
			safe_prefixes: vec!["action_".to_string(), "button_".to_string()],
			refresh_interval_secs: 3_600,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
	/// In-process exact scan. Contents live only as long as the process.
	Memory,
	/// Exact scan over vectors persisted in Postgres.
	Postgres,
	Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Index {
	pub backend: IndexBackend,
	pub default_limit: u32,
	/// Use the hash fallback embedding when the configured provider fails.
	pub fallback_on_provider_error: bool,
	pub rebuild_interval_secs: u64,
}
impl Default for Index {
	fn default() -> Self {
		Self {
			backend: IndexBackend::Memory,
			default_limit: 5,
			fallback_on_provider_error: true,
			rebuild_interval_secs: 3_600,
		}
	}
}
