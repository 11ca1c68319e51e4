use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use chakula_config::KNOWN_REGIONS;

use crate::{
	candidate::{Candidate, FoodMeta},
	food::ReferenceFoodRecord,
	profile::NutrientProfile,
};

/// Candidates priced above this multiple of the budget are filtered out when possible.
pub const BUDGET_CEILING_FACTOR: f64 = 2.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingContext {
	pub preferred_region: Option<String>,
	pub budget: Option<f64>,
}
impl RankingContext {
	/// The profile's region code wins over `default_region`; unknown codes mean no preference.
	pub fn from_profile(profile: &NutrientProfile, default_region: Option<&str>) -> Self {
		let preferred_region = match profile.region_code {
			Some(code) => region_for_code(code).map(str::to_string),
			None => default_region.map(|region| region.trim().to_lowercase()),
		};

		Self { preferred_region, budget: profile.budget.filter(|budget| *budget > 0.0) }
	}
}

pub fn region_for_code(code: i64) -> Option<&'static str> {
	usize::try_from(code).ok().and_then(|index| KNOWN_REGIONS.get(index).copied())
}

/// Availability filter, ordering, affordability filter, then truncation to `top_k`.
pub fn rank(candidates: Vec<Candidate>, ctx: &RankingContext, top_k: usize) -> Vec<Candidate> {
	let mut ranked = filter_available(candidates);

	sort_candidates(&mut ranked, ctx);

	let mut ranked = match ctx.budget {
		Some(budget) => filter_affordable(ranked, budget),
		None => ranked,
	};

	ranked.truncate(top_k);

	ranked
}

/// Drops candidates explicitly flagged unavailable, unless that would drop every candidate.
pub fn filter_available(candidates: Vec<Candidate>) -> Vec<Candidate> {
	if !candidates.iter().any(|candidate| candidate.meta.available.is_some()) {
		return candidates;
	}

	keep_unless_empty(candidates, |candidate| candidate.meta.available != Some(false))
}

/// Keeps candidates priced within [`BUDGET_CEILING_FACTOR`] times the budget. Unpriced candidates
/// always pass. Skipped when nothing would remain.
pub fn filter_affordable(candidates: Vec<Candidate>, budget: f64) -> Vec<Candidate> {
	let ceiling = budget * BUDGET_CEILING_FACTOR;

	keep_unless_empty(candidates, |candidate| {
		candidate.meta.price.map(|price| price <= ceiling).unwrap_or(true)
	})
}

/// Stable sort: preferred region first, then score descending, then price ascending with
/// unpriced candidates last.
pub fn sort_candidates(candidates: &mut [Candidate], ctx: &RankingContext) {
	let region = ctx.preferred_region.as_deref();

	candidates.sort_by(|a, b| compare(a, b, region));
}

/// Last-resort selection straight from the corpus, every score zero. Records flagged unavailable
/// are never selected, so an all-unavailable corpus selects nothing. The rest are restricted to
/// the preferred region when that leaves something, then ordered cheapest first.
pub fn heuristic_select(
	records: &[ReferenceFoodRecord],
	ctx: &RankingContext,
	top_k: usize,
) -> Vec<Candidate> {
	let mut selected: Vec<Candidate> = records
		.iter()
		.filter(|record| !record.is_unavailable())
		.map(|record| Candidate::new(record.id.clone(), 0.0, FoodMeta::from_record(record)))
		.collect();

	if let Some(region) = ctx.preferred_region.as_deref() {
		selected = keep_unless_empty(selected, |candidate| candidate.meta.region_matches(region));
	}

	selected.sort_by(|a, b| cmp_price_asc(&a.meta, &b.meta));
	selected.truncate(top_k);

	selected
}

pub fn cmp_score_desc(a: f64, b: f64) -> Ordering {
	b.total_cmp(&a)
}

fn compare(a: &Candidate, b: &Candidate, region: Option<&str>) -> Ordering {
	if let Some(region) = region {
		let a_match = a.meta.region_matches(region);
		let b_match = b.meta.region_matches(region);
		let by_region = b_match.cmp(&a_match);

		if by_region != Ordering::Equal {
			return by_region;
		}
	}

	cmp_score_desc(a.score, b.score).then_with(|| cmp_price_asc(&a.meta, &b.meta))
}

fn cmp_price_asc(a: &FoodMeta, b: &FoodMeta) -> Ordering {
	let a = a.price.unwrap_or(f64::INFINITY);
	let b = b.price.unwrap_or(f64::INFINITY);

	a.total_cmp(&b)
}

fn keep_unless_empty<F>(candidates: Vec<Candidate>, keep: F) -> Vec<Candidate>
where
	F: Fn(&Candidate) -> bool,
{
	if !candidates.iter().any(&keep) {
		return candidates;
	}

	candidates.into_iter().filter(|candidate| keep(candidate)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::food::record;

	fn priced(id: &str, score: f64, price: Option<f64>) -> Candidate {
		Candidate::new(id, score, FoodMeta { price, ..FoodMeta::default() })
	}

	fn ids(candidates: &[Candidate]) -> Vec<&str> {
		candidates.iter().map(|candidate| candidate.id.as_str()).collect()
	}

	#[test]
	fn region_codes_map_to_names() {
		assert_eq!(region_for_code(0), Some("central"));
		assert_eq!(region_for_code(3), Some("northern"));
		assert_eq!(region_for_code(4), None);
		assert_eq!(region_for_code(-1), None);
	}

	#[test]
	fn context_prefers_profile_code_over_default() {
		let mut profile = NutrientProfile::new();

		assert_eq!(
			RankingContext::from_profile(&profile, Some("Eastern")).preferred_region.as_deref(),
			Some("eastern")
		);

		profile.region_code = Some(1);

		assert_eq!(
			RankingContext::from_profile(&profile, Some("eastern")).preferred_region.as_deref(),
			Some("western")
		);
	}

	#[test]
	fn price_breaks_score_ties_and_unpriced_sort_last() {
		let mut candidates = vec![
			priced("none", 0.5, None),
			priced("dear", 0.5, Some(900.0)),
			priced("cheap", 0.5, Some(100.0)),
			priced("best", 0.9, None),
		];

		sort_candidates(&mut candidates, &RankingContext::default());

		assert_eq!(ids(&candidates), vec!["best", "cheap", "dear", "none"]);
	}

	#[test]
	fn equal_keys_keep_input_order() {
		let mut candidates = vec![
			priced("first", 0.4, Some(10.0)),
			priced("second", 0.4, Some(10.0)),
			priced("third", 0.4, Some(10.0)),
		];

		sort_candidates(&mut candidates, &RankingContext::default());

		assert_eq!(ids(&candidates), vec!["first", "second", "third"]);
	}

	#[test]
	fn availability_filter_is_skipped_when_it_would_empty() {
		let mut gone = priced("gone", 0.9, None);
		let mut also_gone = priced("also_gone", 0.8, None);

		gone.meta.available = Some(false);
		also_gone.meta.available = Some(false);

		let kept = filter_available(vec![gone.clone(), also_gone]);

		assert_eq!(kept.len(), 2);

		let unknown = priced("unknown", 0.1, None);
		let kept = filter_available(vec![gone, unknown]);

		assert_eq!(ids(&kept), vec!["unknown"]);
	}

	#[test]
	fn affordability_filter_keeps_unpriced_and_skips_when_empty() {
		let kept = filter_affordable(
			vec![priced("dear", 0.9, Some(20_000.0)), priced("unpriced", 0.1, None)],
			5_000.0,
		);

		assert_eq!(ids(&kept), vec!["unpriced"]);

		let kept = filter_affordable(vec![priced("dear", 0.9, Some(20_000.0))], 5_000.0);

		assert_eq!(ids(&kept), vec!["dear"]);
	}

	#[test]
	fn heuristic_restricts_region_and_sorts_by_price() {
		let mut a = record("a", "Maize");
		let mut b = record("b", "Millet");
		let mut c = record("c", "Cassava");
		let mut d = record("d", "Yam");

		a.region = Some("western".to_string());
		a.price_per_kg = Some(3000.0);
		b.region = Some("Western".to_string());
		b.price_per_kg = Some(1000.0);
		c.region = Some("central".to_string());
		c.price_per_kg = Some(500.0);
		d.region = Some("western".to_string());
		d.available = Some(false);

		let ctx = RankingContext { preferred_region: Some("western".to_string()), budget: None };
		let selected = heuristic_select(&[a, b, c, d], &ctx, 5);

		assert_eq!(ids(&selected), vec!["b", "a"]);
		assert!(selected.iter().all(|candidate| candidate.score == 0.0));
	}

	#[test]
	fn heuristic_never_selects_unavailable_records() {
		let mut a = record("a", "Maize");
		let mut b = record("b", "Millet");

		a.available = Some(false);
		b.available = Some(false);

		assert!(heuristic_select(&[a, b], &RankingContext::default(), 5).is_empty());
	}

	#[test]
	fn heuristic_ignores_region_with_no_matches() {
		let mut a = record("a", "Maize");

		a.region = Some("central".to_string());

		let ctx = RankingContext { preferred_region: Some("northern".to_string()), budget: None };

		assert_eq!(ids(&heuristic_select(&[a], &ctx, 5)), vec!["a"]);
	}
}
