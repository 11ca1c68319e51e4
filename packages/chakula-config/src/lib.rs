mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, CorpusProviderConfig, History, ProviderConfig, Providers, Recommend, Service,
};

use std::{fs, path::Path};

/// Region names accepted by `recommend.default_region`, indexed by region code.
pub const KNOWN_REGIONS: [&str; 4] = ["central", "western", "eastern", "northern"];

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
	for (label, base, path, timeout_ms, headers) in [
		(
			"recommender",
			&cfg.providers.recommender.api_base,
			&cfg.providers.recommender.path,
			cfg.providers.recommender.timeout_ms,
			&cfg.providers.recommender.default_headers,
		),
		(
			"corpus",
			&cfg.providers.corpus.api_base,
			&cfg.providers.corpus.path,
			cfg.providers.corpus.timeout_ms,
			&cfg.providers.corpus.default_headers,
		),
	] {
		if base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.api_base must be non-empty."),
			});
		}
		if !path.starts_with('/') {
			return Err(Error::Validation {
				message: format!("providers.{label}.path must start with '/'."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.timeout_ms must be greater than zero."),
			});
		}
		if headers.values().any(|value| !value.is_string()) {
			return Err(Error::Validation {
				message: format!("providers.{label}.default_headers values must be strings."),
			});
		}
	}

	if cfg.providers.corpus.limit == 0 {
		return Err(Error::Validation {
			message: "providers.corpus.limit must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.min_retrieval_k == 0 {
		return Err(Error::Validation {
			message: "recommend.min_retrieval_k must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.default_top_k == 0 {
		return Err(Error::Validation {
			message: "recommend.default_top_k must be greater than zero.".to_string(),
		});
	}

	if let Some(region) = cfg.recommend.default_region.as_deref()
		&& !KNOWN_REGIONS.contains(&region)
	{
		return Err(Error::Validation {
			message: "recommend.default_region must be one of central, western, eastern, or northern."
				.to_string(),
		});
	}

	if cfg.history.limit == 0 {
		return Err(Error::Validation {
			message: "history.limit must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.enabled {
		if cfg.cache.api_max_items == 0 {
			return Err(Error::Validation {
				message: "cache.api_max_items must be greater than zero.".to_string(),
			});
		}
		if cfg.cache.dynamic_max_items == 0 {
			return Err(Error::Validation {
				message: "cache.dynamic_max_items must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for key in [&mut cfg.providers.recommender.api_key, &mut cfg.providers.corpus.api_key] {
		if key.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
			*key = None;
		}
	}

	cfg.recommend.default_region = cfg
		.recommend
		.default_region
		.take()
		.map(|region| region.trim().to_lowercase())
		.filter(|region| !region.is_empty());

	if cfg
		.history
		.path
		.as_deref()
		.map(|path| path.as_os_str().to_string_lossy().trim().is_empty())
		.unwrap_or(false)
	{
		cfg.history.path = None;
	}
}
