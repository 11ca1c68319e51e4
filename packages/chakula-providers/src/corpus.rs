//! Reference corpus client.
//!
//! Records are normalized on the way in the same way the foods endpoint normalizes its dataset,
//! so a corpus served raw (straight from the composition table) and one served compact look alike
//! to the ranking code.

use std::{collections::HashSet, time::Duration};

use reqwest::Url;
use serde_json::{Map, Value};

use crate::{Error, Result, http::HttpClient};
use chakula_domain::{ReferenceFoodRecord, profile::coerce_number};

const ALL_REGIONS: &str = "all";
const NATIONWIDE_REGIONS: [&str; 3] = ["national", "all", "countrywide"];
const DEFAULT_CATEGORY: &str = "other";
const AVAILABILITY_THRESHOLD: f64 = 0.5;
const PRICE_KEYS: [&str; 3] = ["pricePerKg", "price_per_kg", "avg_market_price_ugx_per_kg"];

pub async fn fetch_corpus(
	client: &HttpClient,
	cfg: &chakula_config::CorpusProviderConfig,
) -> Result<Vec<ReferenceFoodRecord>> {
	let url = corpus_url(cfg)?;
	let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
	let json = client.get_json(url, headers, Duration::from_millis(cfg.timeout_ms)).await?;

	parse_corpus_response(json)
}

/// Only `limit` is sent. The corpus is never narrowed by region.
pub fn corpus_url(cfg: &chakula_config::CorpusProviderConfig) -> Result<Url> {
	crate::http::endpoint_url(&cfg.api_base, &cfg.path, &[("limit", cfg.limit.to_string())])
}

/// Accepts a bare array of records or an object wrapping one under `foods` or `items`. An object
/// carrying `error` means the corpus is unavailable.
pub fn parse_corpus_response(json: Value) -> Result<Vec<ReferenceFoodRecord>> {
	if let Some(error) = json.get("error") {
		let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());

		return Err(Error::Rejected { message });
	}

	let rows = match &json {
		Value::Array(rows) => rows,
		Value::Object(object) => object
			.get("foods")
			.or_else(|| object.get("items"))
			.and_then(Value::as_array)
			.ok_or_else(|| Error::InvalidResponse {
				message: "Corpus response is missing foods array.".to_string(),
			})?,
		_ =>
			return Err(Error::InvalidResponse {
				message: "Corpus response must be an array or an object.".to_string(),
			}),
	};
	let mut seen = HashSet::new();
	let mut records = Vec::with_capacity(rows.len());

	for (index, row) in rows.iter().enumerate() {
		let Some(object) = row.as_object() else {
			tracing::debug!(index, "Skipping non-object corpus row.");

			continue;
		};
		let Some(record) = normalize_record(index, object) else {
			continue;
		};

		if !seen.insert(record.name.to_lowercase()) {
			continue;
		}

		records.push(record);
	}

	tracing::debug!(rows = rows.len(), records = records.len(), "Parsed reference corpus.");

	Ok(records)
}

pub fn normalize_region(raw: Option<&str>) -> String {
	let Some(region) = raw.map(|region| region.trim().to_lowercase()) else {
		return ALL_REGIONS.to_string();
	};

	if region.is_empty() || NATIONWIDE_REGIONS.contains(&region.as_str()) {
		ALL_REGIONS.to_string()
	} else {
		region
	}
}

pub fn normalize_category(raw: Option<&str>) -> String {
	match raw.map(str::trim) {
		Some(category) if !category.is_empty() => category.to_lowercase(),
		_ => DEFAULT_CATEGORY.to_string(),
	}
}

fn normalize_record(index: usize, object: &Map<String, Value>) -> Option<ReferenceFoodRecord> {
	let name = first_str(object, &["name", "food_name_english", "food_name"])?.to_string();
	let id = match object.get("id") {
		Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
		Some(Value::Number(id)) => id.to_string(),
		_ => format!("food_{index}"),
	};
	let available = object
		.get("available")
		.and_then(Value::as_bool)
		.or_else(|| {
			number(object, &["availability_score"]).map(|score| score >= AVAILABILITY_THRESHOLD)
		});

	Some(ReferenceFoodRecord {
		id,
		name,
		category: Some(normalize_category(first_str(object, &["category", "food_category"]))),
		region: Some(normalize_region(object.get("region").and_then(Value::as_str))),
		energy: number(object, &["energy", "energy_kcal_per_100g"]),
		protein: number(object, &["protein", "protein_g_per_100g"]),
		fat: number(object, &["fat", "fat_g_per_100g"]),
		carbs: number(object, &["carbs", "carbohydrate_g_per_100g"]),
		fiber: number(object, &["fiber", "fiber_g_per_100g"]),
		calcium: number(object, &["calcium", "calcium_mg_per_100g"]),
		iron: number(object, &["iron", "iron_mg_per_100g"]),
		price_per_kg: number(object, &PRICE_KEYS),
		available,
	})
}

fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
	keys.iter()
		.filter_map(|key| object.get(*key).and_then(Value::as_str))
		.map(str::trim)
		.find(|value| !value.is_empty())
}

fn number(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
	keys.iter().find_map(|key| object.get(*key).and_then(coerce_number))
}
