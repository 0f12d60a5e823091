use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub reconcile: Reconcile,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Table holding the records to reconcile. Must be a plain SQL identifier.
	#[serde(default = "default_table")]
	pub table: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_embedding_path")]
	pub path: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	/// Locale sent as `langue` with every unit.
	#[serde(default = "default_locale")]
	pub locale: String,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reconcile {
	#[serde(default = "default_per_unit_delay_ms")]
	pub per_unit_delay_ms: u64,
	#[serde(default = "default_per_record_delay_ms")]
	pub per_record_delay_ms: u64,
	#[serde(default)]
	pub partial_policy: PartialPolicy,
	#[serde(default = "default_reclaim_stale")]
	pub reclaim_stale: bool,
	#[serde(default = "default_lease_seconds")]
	pub lease_seconds: i64,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
}
impl Default for Reconcile {
	fn default() -> Self {
		Self {
			per_unit_delay_ms: default_per_unit_delay_ms(),
			per_record_delay_ms: default_per_record_delay_ms(),
			partial_policy: PartialPolicy::default(),
			reclaim_stale: default_reclaim_stale(),
			lease_seconds: default_lease_seconds(),
			poll_interval_ms: default_poll_interval_ms(),
		}
	}
}

/// How a record whose units only partly succeeded is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialPolicy {
	/// `success` with a `partial: S/T` note.
	#[default]
	Success,
	/// `failed` with the same note.
	Fail,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_table() -> String {
	"services".to_string()
}

fn default_embedding_path() -> String {
	"/add_embedding_pinecone".to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_locale() -> String {
	"fra".to_string()
}

fn default_per_unit_delay_ms() -> u64 {
	500
}

fn default_per_record_delay_ms() -> u64 {
	2_000
}

fn default_reclaim_stale() -> bool {
	true
}

fn default_lease_seconds() -> i64 {
	900
}

fn default_poll_interval_ms() -> u64 {
	60_000
}
