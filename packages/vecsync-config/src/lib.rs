mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, PartialPolicy, Postgres, Providers, Reconcile, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if !is_identifier(&cfg.storage.postgres.table) {
		return Err(Error::Validation {
			message: "storage.postgres.table must be a plain SQL identifier.".to_string(),
		});
	}

	let embedding = &cfg.providers.embedding;

	if embedding.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_base must be non-empty.".to_string(),
		});
	}
	if embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if !embedding.path.starts_with('/') {
		return Err(Error::Validation {
			message: "providers.embedding.path must start with '/'.".to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if embedding.locale.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.locale must be non-empty.".to_string(),
		});
	}

	for (key, value) in &embedding.default_headers {
		if key.eq_ignore_ascii_case("x-api-key") {
			return Err(Error::Validation {
				message: format!(
					"providers.embedding.default_headers.{key} is reserved. Set providers.embedding.api_key instead."
				),
			});
		}
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("providers.embedding.default_headers.{key} must be a string."),
			});
		}
	}

	if cfg.reconcile.lease_seconds <= 0 {
		return Err(Error::Validation {
			message: "reconcile.lease_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.reconcile.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "reconcile.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let api_base = cfg.providers.embedding.api_base.trim().trim_end_matches('/').to_string();

	cfg.providers.embedding.api_base = api_base;
	cfg.storage.postgres.table = cfg.storage.postgres.table.trim().to_string();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	let Some(first) = chars.next() else {
		return false;
	};

	(first.is_ascii_alphabetic() || first == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
		&& name.len() <= 63
}
