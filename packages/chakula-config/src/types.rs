use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub recommend: Recommend,
	#[serde(default)]
	pub history: History,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub recommender: ProviderConfig,
	pub corpus: CorpusProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
	pub api_base: String,
	pub path: String,
	/// Optional. Blank keys are treated as absent and no Authorization header is sent.
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CorpusProviderConfig {
	pub api_base: String,
	pub path: String,
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	/// Maximum number of records requested from the corpus endpoint.
	#[serde(default = "default_corpus_limit")]
	pub limit: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Recommend {
	/// Lower bound on the number of items requested from the primary recommender.
	#[serde(default = "default_min_retrieval_k")]
	pub min_retrieval_k: u32,
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	/// Skip the primary recommender and go straight to the local tiers.
	#[serde(default)]
	pub offline_mode: bool,
	/// Region used when the profile carries no region code.
	#[serde(default)]
	pub default_region: Option<String>,
}
impl Default for Recommend {
	fn default() -> Self {
		Self {
			min_retrieval_k: default_min_retrieval_k(),
			default_top_k: default_top_k(),
			offline_mode: false,
			default_region: None,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct History {
	/// Optional. When absent the history lives in memory for the lifetime of the process.
	#[serde(default)]
	pub path: Option<PathBuf>,
	#[serde(default = "default_history_limit")]
	pub limit: u32,
}
impl Default for History {
	fn default() -> Self {
		Self { path: None, limit: default_history_limit() }
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cache {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default = "default_api_max_items")]
	pub api_max_items: u32,
	#[serde(default = "default_dynamic_max_items")]
	pub dynamic_max_items: u32,
}
impl Default for Cache {
	fn default() -> Self {
		Self {
			enabled: true,
			api_max_items: default_api_max_items(),
			dynamic_max_items: default_dynamic_max_items(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_corpus_limit() -> u32 {
	500
}

fn default_min_retrieval_k() -> u32 {
	20
}

fn default_top_k() -> u32 {
	5
}

fn default_history_limit() -> u32 {
	10
}

fn default_true() -> bool {
	true
}

fn default_api_max_items() -> u32 {
	20
}

fn default_dynamic_max_items() -> u32 {
	50
}
