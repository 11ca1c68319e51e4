use std::time::Duration;

use serde_json::Value;

use crate::{Error, Result, http::HttpClient};
use chakula_domain::{Candidate, FoodMeta, QueryVector, profile::coerce_number};

/// Asks the primary recommender for up to `top_k` items near `vector`.
pub async fn recommend(
	client: &HttpClient,
	cfg: &chakula_config::ProviderConfig,
	vector: &QueryVector,
	top_k: u32,
) -> Result<Vec<Candidate>> {
	let query = [("vector", join_vector(vector)), ("top_k", top_k.to_string())];
	let url = crate::http::endpoint_url(&cfg.api_base, &cfg.path, &query)?;
	let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
	let json = client.get_json(url, headers, Duration::from_millis(cfg.timeout_ms)).await?;

	parse_recommend_response(json)
}

pub fn join_vector(vector: &QueryVector) -> String {
	vector.iter().map(|value| value.to_string()).collect::<Vec<_>>().join(",")
}

pub fn parse_recommend_response(json: Value) -> Result<Vec<Candidate>> {
	if json.get("success").and_then(Value::as_bool) == Some(false) {
		let message = json
			.get("error")
			.and_then(Value::as_str)
			.unwrap_or("unspecified error")
			.to_string();

		return Err(Error::Rejected { message });
	}
	if json.get("success").and_then(Value::as_bool) != Some(true) {
		return Err(Error::InvalidResponse {
			message: "Recommend response is missing success flag.".to_string(),
		});
	}

	let items = json.get("items").and_then(Value::as_array).ok_or_else(|| Error::InvalidResponse {
		message: "Recommend response is missing items array.".to_string(),
	})?;
	let mut candidates = Vec::with_capacity(items.len());

	for (index, item) in items.iter().enumerate() {
		let Some(id) = item.get("id").and_then(item_id) else {
			tracing::warn!(index, "Skipping recommended item without an id.");

			continue;
		};
		let score = item.get("score").and_then(coerce_number).unwrap_or(0.0);
		let meta = item.get("meta").map(FoodMeta::from_json).unwrap_or_default();

		candidates.push(Candidate::new(id, score, meta));
	}

	Ok(candidates)
}

fn item_id(raw: &Value) -> Option<String> {
	match raw {
		Value::String(id) => {
			let id = id.trim();

			(!id.is_empty()).then(|| id.to_string())
		},
		Value::Number(id) => Some(id.to_string()),
		_ => None,
	}
}
