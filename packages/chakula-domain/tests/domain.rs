use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};

use chakula_domain::{
	Candidate, FoodMeta, Nutrient, NutrientProfile, RankingContext, ReferenceFoodRecord,
	VECTOR_DIM, cosine_similarity, rank, score_corpus,
};

fn unit(rng: &mut StdRng) -> f64 {
	rng.gen_range(0.0..1.0)
}

fn amount(rng: &mut StdRng) -> f64 {
	match rng.gen_range(0..5) {
		0 => 0.0,
		1 => unit(rng) * 1e6,
		_ => unit(rng) * 500.0,
	}
}

fn junk_value(rng: &mut StdRng) -> Value {
	match rng.gen_range(0..7) {
		0 => Value::Null,
		1 => json!("not a number"),
		2 => json!(true),
		3 => json!(-amount(rng)),
		4 => json!(format!("{}", amount(rng))),
		5 => json!([1, 2]),
		_ => json!(amount(rng)),
	}
}

fn food(id: &str, region: &str, price: f64, energy: f64, protein: f64) -> ReferenceFoodRecord {
	ReferenceFoodRecord {
		id: id.to_string(),
		name: id.to_string(),
		category: None,
		region: Some(region.to_string()),
		energy: Some(energy),
		protein: Some(protein),
		fat: None,
		carbs: None,
		fiber: None,
		calcium: None,
		iron: None,
		price_per_kg: Some(price),
		available: Some(true),
	}
}

#[test]
fn vectorizer_always_returns_fourteen_finite_values() {
	let mut rng = StdRng::seed_from_u64(0x5eed);

	for _ in 0..500 {
		let mut object = serde_json::Map::new();

		for nutrient in Nutrient::ALL {
			if rng.gen_bool(1.0 / 3.0) {
				continue;
			}

			let key = if rng.gen_bool(0.5) { nutrient.key() } else { nutrient.serving_key() };

			object.insert(key.to_string(), junk_value(&mut rng));
		}

		let vector = NutrientProfile::from_json(&Value::Object(object)).vectorize();

		assert_eq!(vector.len(), VECTOR_DIM);
		assert!(vector.iter().all(|slot| slot.is_finite() && *slot >= 0.0), "{vector:?}");
	}
}

#[test]
fn cosine_scores_stay_in_unit_range() {
	let mut rng = StdRng::seed_from_u64(0xc0ffee);

	for _ in 0..1_000 {
		let mut q = [0.0; VECTOR_DIM];
		let mut f = [0.0; VECTOR_DIM];

		for slot in 0..VECTOR_DIM {
			q[slot] = amount(&mut rng);
			f[slot] = if slot < 7 { amount(&mut rng) } else { 0.0 };
		}

		let score = cosine_similarity(&q, &f);

		assert!(score.is_finite() && (0.0..=1.0).contains(&score), "score {score}");
	}
}

#[test]
fn local_scores_order_by_similarity() {
	let profile =
		NutrientProfile::new().with(Nutrient::Energy, 300.0).with(Nutrient::Protein, 12.0);
	let records = vec![
		food("sugar", "central", 3000.0, 390.0, 0.0),
		food("beans", "central", 4500.0, 330.0, 22.0),
	];
	let scored = score_corpus(&profile.vectorize(), &records);
	let ranked = rank(scored, &RankingContext::default(), 5);

	assert_eq!(ranked[0].id, "beans");
	assert_eq!(ranked[1].id, "sugar");
	assert!(ranked[0].score > ranked[1].score);
}

#[test]
fn over_budget_preferred_region_is_demoted_below_affordable_items() {
	let mut candidates = Vec::new();

	for (index, region) in ["western", "western", "western"].iter().enumerate() {
		candidates.push(Candidate::new(
			format!("dear_west_{index}"),
			0.99,
			FoodMeta {
				region: Some(region.to_string()),
				price: Some(12_000.0 + index as f64),
				..FoodMeta::default()
			},
		));
	}
	for index in 0..7 {
		let region = if index % 2 == 0 { "eastern" } else { "Western" };

		candidates.push(Candidate::new(
			format!("affordable_{index}"),
			0.5 - index as f64 * 0.01,
			FoodMeta {
				region: Some(region.to_string()),
				price: Some(2_000.0 + index as f64 * 100.0),
				..FoodMeta::default()
			},
		));
	}

	let ctx =
		RankingContext { preferred_region: Some("western".to_string()), budget: Some(5_000.0) };
	let ranked = rank(candidates, &ctx, 10);
	let first_dear = ranked.iter().position(|candidate| candidate.id.starts_with("dear_"));
	let last_affordable =
		ranked.iter().rposition(|candidate| candidate.id.starts_with("affordable_"));

	assert_eq!(last_affordable, Some(6));
	assert!(first_dear.map(|position| position > 6).unwrap_or(true));
	assert_eq!(ranked[0].id, "affordable_1", "western affordable items lead");
}

#[test]
fn affordability_never_drops_everything_when_an_item_is_unpriced() {
	let mut rng = StdRng::seed_from_u64(42);

	for _ in 0..200 {
		let count = rng.gen_range(1..=8);
		let mut candidates: Vec<Candidate> = (0..count)
			.map(|index| {
				Candidate::new(
					format!("c{index}"),
					unit(&mut rng),
					FoodMeta { price: Some(50_000.0 + amount(&mut rng)), ..FoodMeta::default() },
				)
			})
			.collect();

		candidates.push(Candidate::new("unpriced", unit(&mut rng), FoodMeta::default()));

		let ctx = RankingContext { preferred_region: None, budget: Some(1.0) };
		let ranked = rank(candidates, &ctx, 100);

		assert!(!ranked.is_empty());
		assert!(ranked.iter().any(|candidate| candidate.id == "unpriced"));
	}
}

#[test]
fn availability_never_empties_when_a_flag_is_missing() {
	let mut rng = StdRng::seed_from_u64(7);

	for _ in 0..200 {
		let count = rng.gen_range(1..=6);
		let mut candidates: Vec<Candidate> = (0..count)
			.map(|index| {
				Candidate::new(
					format!("c{index}"),
					unit(&mut rng),
					FoodMeta { available: Some(false), ..FoodMeta::default() },
				)
			})
			.collect();

		candidates.push(Candidate::new("unflagged", unit(&mut rng), FoodMeta::default()));

		let ranked = rank(candidates, &RankingContext::default(), 100);

		assert_eq!(ranked.len(), 1);
		assert_eq!(ranked[0].id, "unflagged");
	}
}
