//! Recommendation candidates and the typed metadata they carry.
//!
//! Retrieval responses and corpus records spell the same facts under several keys (`name` or
//! `title`, `price` or `pricePerKg`, ...). [`FoodMeta::from_json`] and [`FoodMeta::from_record`]
//! are the only places those spellings are read; everything downstream reads typed fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
	food::ReferenceFoodRecord,
	profile::{Nutrient, coerce_number},
};

const NAME_KEYS: [&str; 4] = ["name", "title", "food_name", "food_name_english"];
const PRICE_KEYS: [&str; 5] =
	["price", "pricePerKg", "price_per_kg", "avg_market_price_ugx_per_kg", "price_ugx"];
const AVAILABLE_KEYS: [&str; 2] = ["available", "availability"];
const AVAILABILITY_SCORE_KEY: &str = "availability_score";
const AVAILABILITY_SCORE_THRESHOLD: f64 = 0.5;
/// Keys owned by the typed fields. They never land in `extra`, parsed or not, so the flattened
/// form cannot repeat a key.
const TYPED_KEYS: [&str; 7] =
	["name", "category", "region", "price", "available", "corpus_id", "nutrients"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub id: String,
	/// Relevance in `[0, 1]`.
	pub score: f64,
	pub meta: FoodMeta,
}
impl Candidate {
	/// Builds a candidate, clamping the score into `[0, 1]`. Non-finite scores become zero.
	pub fn new(id: impl Into<String>, score: f64, meta: FoodMeta) -> Self {
		Self { id: id.into(), score: clamp_score(score), meta }
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodMeta {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<String>,
	/// Price per kg. Zero or negative prices are treated as unknown.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub price: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub available: Option<bool>,
	/// Identifier of the corpus record merged into this metadata, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub corpus_id: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub nutrients: BTreeMap<Nutrient, f64>,
	/// Retrieval fields with no typed counterpart, kept verbatim.
	#[serde(default, flatten)]
	pub extra: Map<String, Value>,
}
impl FoodMeta {
	pub fn from_json(raw: &Value) -> Self {
		let mut meta = Self::default();
		let Some(object) = raw.as_object() else {
			return meta;
		};
		let mut title_is_name = false;

		if let Some((key, name)) = first_string(object, &NAME_KEYS) {
			meta.name = Some(name);
			title_is_name = key == "title";
		}

		meta.region = object.get("region").and_then(Value::as_str).and_then(non_blank);
		meta.category = object.get("category").and_then(Value::as_str).and_then(non_blank);
		meta.price = PRICE_KEYS
			.iter()
			.find_map(|key| object.get(*key).and_then(coerce_number))
			.and_then(positive);
		meta.available = AVAILABLE_KEYS
			.iter()
			.find_map(|key| object.get(*key).and_then(Value::as_bool))
			.or_else(|| {
				object
					.get(AVAILABILITY_SCORE_KEY)
					.and_then(coerce_number)
					.map(|score| score >= AVAILABILITY_SCORE_THRESHOLD)
			});

		for (key, value) in object {
			if is_reserved(key) || (title_is_name && key == "title") {
				continue;
			}
			if let Some(nutrient) = Nutrient::from_key(key)
				&& let Some(amount) = coerce_number(value).filter(|amount| *amount >= 0.0)
			{
				meta.nutrients.insert(nutrient, amount);

				continue;
			}

			meta.extra.insert(key.clone(), value.clone());
		}

		meta
	}

	pub fn from_record(record: &ReferenceFoodRecord) -> Self {
		let mut nutrients = BTreeMap::new();

		for nutrient in Nutrient::CORPUS {
			if let Some(amount) = record.nutrient(nutrient).filter(|amount| amount.is_finite()) {
				nutrients.insert(nutrient, amount);
			}
		}

		Self {
			name: non_blank(&record.name),
			category: record.category.clone(),
			region: record.region.clone(),
			price: record.price_per_kg.and_then(positive),
			available: record.available,
			corpus_id: Some(record.id.clone()),
			nutrients,
			extra: Map::new(),
		}
	}

	/// Merges `corpus` on top of `self`: every field the corpus knows wins, retrieval-only fields
	/// survive.
	pub fn overlay(&mut self, corpus: &Self) {
		overlay_field(&mut self.name, &corpus.name);
		overlay_field(&mut self.category, &corpus.category);
		overlay_field(&mut self.region, &corpus.region);
		overlay_field(&mut self.price, &corpus.price);
		overlay_field(&mut self.available, &corpus.available);
		overlay_field(&mut self.corpus_id, &corpus.corpus_id);

		for (nutrient, amount) in &corpus.nutrients {
			self.nutrients.insert(*nutrient, *amount);
		}
		for (key, value) in &corpus.extra {
			self.extra.insert(key.clone(), value.clone());
		}
	}

	/// A secondary display label (`title`) kept in the untyped fields.
	pub fn title(&self) -> Option<&str> {
		self.extra.get("title").and_then(Value::as_str)
	}

	pub fn region_matches(&self, region: &str) -> bool {
		self.region
			.as_deref()
			.map(|own| own.trim().eq_ignore_ascii_case(region.trim()))
			.unwrap_or(false)
	}
}

pub(crate) fn clamp_score(score: f64) -> f64 {
	if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
}

fn overlay_field<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
	if let Some(value) = source {
		*target = Some(value.clone());
	}
}

fn is_reserved(key: &str) -> bool {
	TYPED_KEYS.contains(&key)
		|| PRICE_KEYS.contains(&key)
		|| AVAILABLE_KEYS.contains(&key)
		|| (key != "title" && NAME_KEYS.contains(&key))
}

fn first_string<'a>(object: &Map<String, Value>, keys: &[&'a str]) -> Option<(&'a str, String)> {
	keys.iter().find_map(|key| {
		object.get(*key).and_then(Value::as_str).and_then(non_blank).map(|value| (*key, value))
	})
}

fn non_blank(raw: &str) -> Option<String> {
	let trimmed = raw.trim();

	(!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn positive(price: f64) -> Option<f64> {
	(price.is_finite() && price > 0.0).then_some(price)
}
