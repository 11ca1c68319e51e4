//! Nutrient profiles and the fixed-order query vector derived from them.

use std::fmt::{self, Formatter};

use serde::{
	Deserialize, Deserializer, Serialize, Serializer,
	de::{MapAccess, Visitor},
	ser::SerializeMap,
};
use serde_json::{Map, Value};

/// Number of slots in a [`QueryVector`].
pub const VECTOR_DIM: usize = 14;

/// A nutrient vector in [`Nutrient::ALL`] order.
pub type QueryVector = [f64; VECTOR_DIM];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
	Energy,
	Protein,
	Fat,
	Carbohydrate,
	Fiber,
	Calcium,
	Iron,
	Magnesium,
	Phosphorus,
	Potassium,
	Sodium,
	Zinc,
	VitaminA,
	VitaminC,
}
impl Nutrient {
	/// The globally agreed vector order. Query and corpus vectors are both built from it.
	pub const ALL: [Self; VECTOR_DIM] = [
		Self::Energy,
		Self::Protein,
		Self::Fat,
		Self::Carbohydrate,
		Self::Fiber,
		Self::Calcium,
		Self::Iron,
		Self::Magnesium,
		Self::Phosphorus,
		Self::Potassium,
		Self::Sodium,
		Self::Zinc,
		Self::VitaminA,
		Self::VitaminC,
	];
	/// Nutrients every reference corpus record is expected to carry.
	pub const CORPUS: [Self; 7] = [
		Self::Energy,
		Self::Protein,
		Self::Fat,
		Self::Carbohydrate,
		Self::Fiber,
		Self::Calcium,
		Self::Iron,
	];

	pub fn index(self) -> usize {
		self as usize
	}

	pub fn key(self) -> &'static str {
		match self {
			Self::Energy => "energy",
			Self::Protein => "protein",
			Self::Fat => "fat",
			Self::Carbohydrate => "carbohydrate",
			Self::Fiber => "fiber",
			Self::Calcium => "calcium",
			Self::Iron => "iron",
			Self::Magnesium => "magnesium",
			Self::Phosphorus => "phosphorus",
			Self::Potassium => "potassium",
			Self::Sodium => "sodium",
			Self::Zinc => "zinc",
			Self::VitaminA => "vitamin_a",
			Self::VitaminC => "vitamin_c",
		}
	}

	/// Key used by the per-serving prediction form.
	pub fn serving_key(self) -> &'static str {
		match self {
			Self::Energy => "Energy_kcal_per_serving",
			Self::Protein => "Protein_g_per_serving",
			Self::Fat => "Fat_g_per_serving",
			Self::Carbohydrate => "Carbohydrates_g_per_serving",
			Self::Fiber => "Fiber_g_per_serving",
			Self::Calcium => "Calcium_mg_per_serving",
			Self::Iron => "Iron_mg_per_serving",
			Self::Magnesium => "Magnesium_mg_per_serving",
			Self::Phosphorus => "Phosphorus_mg_per_serving",
			Self::Potassium => "Potassium_mg_per_serving",
			Self::Sodium => "Sodium_mg_per_serving",
			Self::Zinc => "Zinc_mg_per_serving",
			Self::VitaminA => "VitaminA_ug_per_serving",
			Self::VitaminC => "VitaminC_mg_per_serving",
		}
	}

	pub fn from_key(raw: &str) -> Option<Self> {
		Self::ALL
			.into_iter()
			.find(|nutrient| nutrient.key() == raw || nutrient.serving_key() == raw)
			.or(match raw {
				"carbs" | "carbohydrates" => Some(Self::Carbohydrate),
				_ => None,
			})
	}
}

/// A caller-supplied nutrient intake profile.
///
/// Amounts are non-negative; absent fields read as zero. The profile also carries the inputs of
/// the ranking context: a region code (0=central, 1=western, 2=eastern, 3=northern) and an
/// optional budget.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NutrientProfile {
	amounts: [Option<f64>; VECTOR_DIM],
	pub region_code: Option<i64>,
	pub budget: Option<f64>,
}
impl NutrientProfile {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, nutrient: Nutrient, amount: f64) -> Self {
		self.set(nutrient, amount);

		self
	}

	/// Sets an amount. Negative or non-finite amounts clear the field.
	pub fn set(&mut self, nutrient: Nutrient, amount: f64) {
		self.amounts[nutrient.index()] = sanitize_amount(amount);
	}

	pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
		self.amounts[nutrient.index()]
	}

	/// Coerces a loosely typed JSON object into a profile. Unknown keys are ignored and values
	/// that cannot be read as a non-negative number are treated as absent, so this never fails.
	pub fn from_json(value: &Value) -> Self {
		let mut profile = Self::default();
		let Some(object) = value.as_object() else {
			return profile;
		};

		for (key, raw) in object {
			if let Some(nutrient) = Nutrient::from_key(key) {
				if let Some(amount) = coerce_number(raw) {
					profile.set(nutrient, amount);
				}

				continue;
			}

			match key.as_str() {
				"region_encoded" | "region_code" => {
					profile.region_code = coerce_number(raw)
						.filter(|code| code.fract() == 0.0)
						.map(|code| code as i64);
				},
				"budget" | "estimated_cost_ugx" => {
					profile.budget = coerce_number(raw).and_then(sanitize_amount);
				},
				_ => {},
			}
		}

		profile
	}

	/// Builds the query vector. Total: every slot is a finite, non-negative number.
	pub fn vectorize(&self) -> QueryVector {
		let mut vector = [0.0; VECTOR_DIM];

		for nutrient in Nutrient::ALL {
			vector[nutrient.index()] = self.get(nutrient).unwrap_or(0.0);
		}

		vector
	}

	fn to_map(&self) -> Map<String, Value> {
		let mut map = Map::new();

		for nutrient in Nutrient::ALL {
			if let Some(amount) = self.get(nutrient) {
				map.insert(nutrient.key().to_string(), Value::from(amount));
			}
		}
		if let Some(code) = self.region_code {
			map.insert("region_code".to_string(), Value::from(code));
		}
		if let Some(budget) = self.budget {
			map.insert("budget".to_string(), Value::from(budget));
		}

		map
	}
}

impl Serialize for NutrientProfile {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let map = self.to_map();
		let mut out = serializer.serialize_map(Some(map.len()))?;

		for (key, value) in &map {
			out.serialize_entry(key, value)?;
		}

		out.end()
	}
}

impl<'de> Deserialize<'de> for NutrientProfile {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct ProfileVisitor;
		impl<'de> Visitor<'de> for ProfileVisitor {
			type Value = NutrientProfile;

			fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
				f.write_str("a nutrient profile object")
			}

			fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut object = Map::new();

				while let Some((key, value)) = access.next_entry::<String, Value>()? {
					object.insert(key, value);
				}

				Ok(NutrientProfile::from_json(&Value::Object(object)))
			}
		}

		deserializer.deserialize_map(ProfileVisitor)
	}
}

/// Reads a JSON number or numeric string. Non-finite values are rejected.
pub fn coerce_number(raw: &Value) -> Option<f64> {
	let number = match raw {
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().parse::<f64>().ok(),
		_ => None,
	}?;

	number.is_finite().then_some(number)
}

fn sanitize_amount(amount: f64) -> Option<f64> {
	(amount.is_finite() && amount >= 0.0).then_some(amount)
}
