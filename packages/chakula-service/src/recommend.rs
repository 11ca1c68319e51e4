//! The recommendation pipeline.
//!
//! Primary retrieval and the corpus fetch run concurrently. Their outcomes pick the tier:
//! enriched primary results, then local cosine scoring over the corpus, then the heuristic
//! corpus selection, and finally an explicit empty result. No stage failure escapes.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ChakulaService, history::HistoryEntry};
use chakula_domain::{
	Candidate, CorpusIndex, NutrientProfile, QueryVector, RankingContext, ReferenceFoodRecord,
	enrich_all, heuristic_select, is_degenerate, rank, score_corpus,
};

pub const NO_RECOMMENDATIONS: &str = "no recommendations available";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
	Primary,
	LocalSimilarity,
	Heuristic,
	None,
}

#[derive(Debug)]
pub enum RetrievalOutcome {
	Items(Vec<Candidate>),
	Empty,
	/// Includes the primary call being skipped in offline mode.
	Failed(String),
}

#[derive(Debug)]
pub enum CorpusOutcome {
	Records(Vec<ReferenceFoodRecord>),
	Unavailable(String),
}
impl CorpusOutcome {
	fn records(&self) -> &[ReferenceFoodRecord] {
		match self {
			Self::Records(records) => records,
			Self::Unavailable(_) => &[],
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
	pub items: Vec<Candidate>,
	pub tier: Tier,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}
impl RecommendationResult {
	pub fn empty() -> Self {
		Self { items: Vec::new(), tier: Tier::None, error: Some(NO_RECOMMENDATIONS.to_string()) }
	}
}

impl ChakulaService {
	/// Recommends up to `top_k` foods for `profile`. A `top_k` of zero uses the configured
	/// default. Never fails: when nothing can be produced the result carries
	/// [`NO_RECOMMENDATIONS`].
	pub async fn recommend(&self, profile: &NutrientProfile, top_k: u32) -> RecommendationResult {
		let top_k = if top_k == 0 { self.cfg.recommend.default_top_k } else { top_k };
		let vector = profile.vectorize();
		let ctx = RankingContext::from_profile(
			profile,
			self.cfg.recommend.default_region.as_deref(),
		);
		let (retrieval, corpus) =
			tokio::join!(self.retrieve(&vector, top_k), self.fetch_corpus());
		let result = select(retrieval, &corpus, &vector, &ctx, top_k as usize);

		tracing::info!(
			tier = ?result.tier,
			items = result.items.len(),
			top_k,
			"Recommendation tier selected."
		);

		self.record_history(profile, top_k, &result).await;

		result
	}

	async fn retrieve(&self, vector: &QueryVector, top_k: u32) -> RetrievalOutcome {
		if self.cfg.recommend.offline_mode {
			return RetrievalOutcome::Failed("offline mode".to_string());
		}

		let retrieval_k = self.cfg.recommend.min_retrieval_k.max(top_k);

		match self
			.providers
			.recommender
			.recommend(&self.cfg.providers.recommender, vector, retrieval_k)
			.await
		{
			Ok(items) if items.is_empty() => RetrievalOutcome::Empty,
			Ok(items) => {
				tracing::debug!(items = items.len(), retrieval_k, "Primary retrieval succeeded.");

				RetrievalOutcome::Items(items)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Primary retrieval failed.");

				RetrievalOutcome::Failed(err.to_string())
			},
		}
	}

	async fn fetch_corpus(&self) -> CorpusOutcome {
		match self.providers.corpus.fetch(&self.cfg.providers.corpus).await {
			Ok(records) => {
				tracing::debug!(records = records.len(), "Reference corpus fetched.");

				CorpusOutcome::Records(records)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Reference corpus unavailable.");

				CorpusOutcome::Unavailable(err.to_string())
			},
		}
	}

	async fn record_history(
		&self,
		profile: &NutrientProfile,
		top_k: u32,
		result: &RecommendationResult,
	) {
		let entry = HistoryEntry {
			at: OffsetDateTime::now_utc(),
			profile: profile.clone(),
			top_k,
			tier: result.tier,
			item_ids: result.items.iter().map(|item| item.id.clone()).collect(),
		};

		if let Err(err) = self.history.record(entry).await {
			tracing::warn!(error = %err, "Failed to record recommendation history.");
		}
	}
}

/// Pure tier selection over the two fetch outcomes.
pub fn select(
	retrieval: RetrievalOutcome,
	corpus: &CorpusOutcome,
	vector: &QueryVector,
	ctx: &RankingContext,
	top_k: usize,
) -> RecommendationResult {
	let records = corpus.records();

	if let RetrievalOutcome::Items(items) = retrieval {
		let items = enrich_and_rank(items, records, ctx, top_k);

		if !items.is_empty() {
			return RecommendationResult { items, tier: Tier::Primary, error: None };
		}

		tracing::warn!("Primary results empty after enrichment and filtering.");
	}

	if records.is_empty() {
		if let CorpusOutcome::Unavailable(reason) = corpus {
			tracing::warn!(reason = %reason, "No local fallback available.");
		}

		return RecommendationResult::empty();
	}

	if is_degenerate(vector) {
		tracing::debug!("Query vector is degenerate. Skipping local similarity.");
	} else {
		let items = rank(score_corpus(vector, records), ctx, top_k);

		if !items.is_empty() {
			return RecommendationResult { items, tier: Tier::LocalSimilarity, error: None };
		}
	}

	let items = heuristic_select(records, ctx, top_k);

	if items.is_empty() {
		return RecommendationResult::empty();
	}

	RecommendationResult { items, tier: Tier::Heuristic, error: None }
}

fn enrich_and_rank(
	items: Vec<Candidate>,
	records: &[ReferenceFoodRecord],
	ctx: &RankingContext,
	top_k: usize,
) -> Vec<Candidate> {
	let index = CorpusIndex::build(records);
	let (items, matched) = enrich_all(items, &index);

	tracing::debug!(items = items.len(), matched, "Enriched primary results.");

	rank(items, ctx, top_k)
}
