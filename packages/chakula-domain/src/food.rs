use serde::{Deserialize, Serialize};

use crate::profile::{Nutrient, QueryVector, VECTOR_DIM};

/// One entry of the local reference corpus, as served by the foods endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFoodRecord {
	pub id: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<String>,
	#[serde(default)]
	pub energy: Option<f64>,
	#[serde(default)]
	pub protein: Option<f64>,
	#[serde(default)]
	pub fat: Option<f64>,
	#[serde(default)]
	pub carbs: Option<f64>,
	#[serde(default)]
	pub fiber: Option<f64>,
	#[serde(default)]
	pub calcium: Option<f64>,
	#[serde(default)]
	pub iron: Option<f64>,
	#[serde(rename = "pricePerKg", alias = "price_per_kg", default)]
	pub price_per_kg: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub available: Option<bool>,
}
impl ReferenceFoodRecord {
	pub fn nutrient(&self, nutrient: Nutrient) -> Option<f64> {
		match nutrient {
			Nutrient::Energy => self.energy,
			Nutrient::Protein => self.protein,
			Nutrient::Fat => self.fat,
			Nutrient::Carbohydrate => self.carbs,
			Nutrient::Fiber => self.fiber,
			Nutrient::Calcium => self.calcium,
			Nutrient::Iron => self.iron,
			_ => None,
		}
	}

	/// Derived vector in the same order as the query side. Only the corpus nutrients can be
	/// non-zero.
	pub fn vector(&self) -> QueryVector {
		let mut vector = [0.0; VECTOR_DIM];

		for nutrient in Nutrient::CORPUS {
			vector[nutrient.index()] = self
				.nutrient(nutrient)
				.filter(|amount| amount.is_finite() && *amount >= 0.0)
				.unwrap_or(0.0);
		}

		vector
	}

	/// Explicitly marked unavailable. Records without a flag are not.
	pub fn is_unavailable(&self) -> bool {
		self.available == Some(false)
	}
}

#[cfg(test)]
pub(crate) fn record(id: &str, name: &str) -> ReferenceFoodRecord {
	ReferenceFoodRecord {
		id: id.to_string(),
		name: name.to_string(),
		category: None,
		region: None,
		energy: None,
		protein: None,
		fat: None,
		carbs: None,
		fiber: None,
		calcium: None,
		iron: None,
		price_per_kg: None,
		available: None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_only_fills_corpus_slots() {
		let mut food = record("food_0", "Matooke");

		food.energy = Some(122.0);
		food.carbs = Some(31.9);
		food.iron = Some(0.6);

		let vector = food.vector();

		assert_eq!(vector[Nutrient::Energy.index()], 122.0);
		assert_eq!(vector[Nutrient::Carbohydrate.index()], 31.9);
		assert_eq!(vector[Nutrient::Iron.index()], 0.6);
		assert!(vector[7..].iter().all(|slot| *slot == 0.0));
	}

	#[test]
	fn deserializes_endpoint_shape() {
		let food: ReferenceFoodRecord = serde_json::from_value(serde_json::json!({
			"id": "food_3",
			"name": "Beans",
			"category": "legumes",
			"region": "western",
			"energy": 333.0,
			"protein": 23.6,
			"pricePerKg": 4500,
			"available": true,
		}))
		.expect("record must deserialize");

		assert_eq!(food.price_per_kg, Some(4500.0));
		assert_eq!(food.fat, None);
		assert!(!food.is_unavailable());
	}
}
