use crate::{
	candidate::{Candidate, FoodMeta, clamp_score},
	food::ReferenceFoodRecord,
	profile::QueryVector,
};

/// Cosine similarity clamped to `[0, 1]`.
///
/// Both norms are floored to 1 when zero, so a zero vector on either side scores 0 instead of
/// dividing by zero. A non-finite intermediate also scores 0.
pub fn cosine_similarity(query: &[f64], food: &[f64]) -> f64 {
	if is_degenerate(query) || is_degenerate(food) {
		return 0.0;
	}

	let dot: f64 = query.iter().zip(food).map(|(q, f)| q * f).sum();
	let query_norm = floor_norm(norm(query));
	let food_norm = floor_norm(norm(food));

	clamp_score(dot / (query_norm * food_norm))
}

/// True when the vector carries no usable signal.
pub fn is_degenerate(vector: &[f64]) -> bool {
	vector.iter().all(|value| *value == 0.0 || !value.is_finite())
}

/// Scores every available corpus record against the query. Records flagged `available = false`
/// are skipped. Order follows the corpus.
pub fn score_corpus(query: &QueryVector, records: &[ReferenceFoodRecord]) -> Vec<Candidate> {
	records
		.iter()
		.filter(|record| !record.is_unavailable())
		.map(|record| {
			let score = cosine_similarity(query, &record.vector());

			Candidate::new(record.id.clone(), score, FoodMeta::from_record(record))
		})
		.collect()
}

fn norm(vector: &[f64]) -> f64 {
	vector.iter().map(|value| value * value).sum::<f64>().sqrt()
}

fn floor_norm(norm: f64) -> f64 {
	if norm == 0.0 { 1.0 } else { norm }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{food::record, profile::VECTOR_DIM};

	#[test]
	fn identical_direction_scores_one() {
		let mut q = [0.0; VECTOR_DIM];
		let mut f = [0.0; VECTOR_DIM];

		q[0] = 2.0;
		q[1] = 4.0;
		f[0] = 1.0;
		f[1] = 2.0;

		assert!((cosine_similarity(&q, &f) - 1.0).abs() < 1e-12);
	}

	#[test]
	fn orthogonal_vectors_score_zero() {
		let mut q = [0.0; VECTOR_DIM];
		let mut f = [0.0; VECTOR_DIM];

		q[0] = 1.0;
		f[1] = 1.0;

		assert_eq!(cosine_similarity(&q, &f), 0.0);
	}

	#[test]
	fn zero_vectors_never_produce_nan() {
		let zero = [0.0; VECTOR_DIM];
		let mut f = [0.0; VECTOR_DIM];

		f[3] = 12.0;

		assert_eq!(cosine_similarity(&zero, &f), 0.0);
		assert_eq!(cosine_similarity(&f, &zero), 0.0);
		assert_eq!(cosine_similarity(&zero, &zero), 0.0);
	}

	#[test]
	fn overflowing_products_are_zeroed() {
		let mut q = [0.0; VECTOR_DIM];

		q[0] = f64::MAX;
		q[1] = f64::MAX;

		let score = cosine_similarity(&q, &q);

		assert!(score.is_finite());
		assert!((0.0..=1.0).contains(&score));
	}

	#[test]
	fn unavailable_records_are_never_scored() {
		let mut open = record("food_0", "Millet");
		let mut closed = record("food_1", "Sorghum");

		open.energy = Some(360.0);
		closed.energy = Some(340.0);
		closed.available = Some(false);

		let mut q = [0.0; VECTOR_DIM];

		q[0] = 1.0;

		let scored = score_corpus(&q, &[open, closed]);

		assert_eq!(scored.len(), 1);
		assert_eq!(scored[0].id, "food_0");
		assert_eq!(scored[0].meta.corpus_id.as_deref(), Some("food_0"));
	}
}
