use std::collections::HashMap;

use crate::{
	candidate::{Candidate, FoodMeta},
	food::ReferenceFoodRecord,
};

/// Lookup tables over the reference corpus. The first record wins on duplicate keys so lookups
/// stay deterministic for a given corpus order.
#[derive(Debug, Default)]
pub struct CorpusIndex<'a> {
	by_id: HashMap<&'a str, &'a ReferenceFoodRecord>,
	by_name: HashMap<String, &'a ReferenceFoodRecord>,
}
impl<'a> CorpusIndex<'a> {
	pub fn build(records: &'a [ReferenceFoodRecord]) -> Self {
		let mut index = Self::default();

		for record in records {
			index.by_id.entry(record.id.as_str()).or_insert(record);

			let name = record.name.trim().to_lowercase();

			if !name.is_empty() {
				index.by_name.entry(name).or_insert(record);
			}
		}

		index
	}

	pub fn is_empty(&self) -> bool {
		self.by_id.is_empty()
	}

	/// Id first, then the candidate's name, then its title, then its id read as a name.
	pub fn lookup(&self, candidate: &Candidate) -> Option<&'a ReferenceFoodRecord> {
		if let Some(record) = self.by_id.get(candidate.id.as_str()) {
			return Some(*record);
		}

		[candidate.meta.name.as_deref(), candidate.meta.title(), Some(candidate.id.as_str())]
			.into_iter()
			.flatten()
			.find_map(|name| self.by_name.get(&name.trim().to_lowercase()).copied())
	}
}

/// Overlays the matched corpus record onto the candidate metadata. Returns whether a record
/// matched; no match leaves the candidate untouched.
pub fn enrich(candidate: &mut Candidate, index: &CorpusIndex<'_>) -> bool {
	let Some(record) = index.lookup(candidate) else {
		return false;
	};

	candidate.meta.overlay(&FoodMeta::from_record(record));

	true
}

/// Enriches every candidate, returning them with the number that matched.
pub fn enrich_all(
	mut candidates: Vec<Candidate>,
	index: &CorpusIndex<'_>,
) -> (Vec<Candidate>, usize) {
	let mut matched = 0;

	for candidate in &mut candidates {
		if enrich(candidate, index) {
			matched += 1;
		}
	}

	(candidates, matched)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::food::record;

	fn candidate(id: &str, meta: serde_json::Value) -> Candidate {
		Candidate::new(id, 0.5, FoodMeta::from_json(&meta))
	}

	#[test]
	fn matches_by_id_before_name() {
		let mut by_id = record("food_1", "Posho");
		let by_name = record("food_2", "Beans");

		by_id.region = Some("central".to_string());

		let records = vec![by_id, by_name];
		let index = CorpusIndex::build(&records);
		let mut item = candidate("food_1", serde_json::json!({ "name": "Beans" }));

		assert!(enrich(&mut item, &index));
		assert_eq!(item.meta.corpus_id.as_deref(), Some("food_1"));
		assert_eq!(item.meta.name.as_deref(), Some("Posho"));
		assert_eq!(item.meta.region.as_deref(), Some("central"));
	}

	#[test]
	fn falls_back_to_lowercased_name_then_title_then_id() {
		let records = vec![record("food_1", "Local Rice"), record("food_2", "Cassava")];
		let index = CorpusIndex::build(&records);
		let mut by_name = candidate("x1", serde_json::json!({ "name": "LOCAL RICE" }));
		let mut by_title =
			candidate("x2", serde_json::json!({ "name": "Unknown", "title": "cassava" }));
		let mut by_own_id = candidate("Cassava", serde_json::json!({}));

		assert!(enrich(&mut by_name, &index));
		assert!(enrich(&mut by_title, &index));
		assert!(enrich(&mut by_own_id, &index));
		assert_eq!(by_name.meta.corpus_id.as_deref(), Some("food_1"));
		assert_eq!(by_title.meta.corpus_id.as_deref(), Some("food_2"));
		assert_eq!(by_own_id.meta.corpus_id.as_deref(), Some("food_2"));
	}

	#[test]
	fn unmatched_candidate_is_unchanged() {
		let records = vec![record("food_1", "Matooke")];
		let index = CorpusIndex::build(&records);
		let original = candidate("rice", serde_json::json!({ "name": "Local Rice" }));
		let (enriched, matched) = enrich_all(vec![original.clone()], &index);

		assert_eq!(matched, 0);
		assert_eq!(enriched, vec![original]);
	}

	#[test]
	fn duplicate_names_keep_the_first_record() {
		let records = vec![record("food_1", "Beans"), record("food_9", "beans")];
		let index = CorpusIndex::build(&records);
		let mut item = candidate("x", serde_json::json!({ "name": "Beans" }));

		enrich(&mut item, &index);

		assert_eq!(item.meta.corpus_id.as_deref(), Some("food_1"));
	}
}
