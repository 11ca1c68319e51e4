pub mod candidate;
pub mod enrich;
pub mod food;
pub mod profile;
pub mod ranking;
pub mod similarity;

pub use candidate::{Candidate, FoodMeta};
pub use enrich::{CorpusIndex, enrich, enrich_all};
pub use food::ReferenceFoodRecord;
pub use profile::{Nutrient, NutrientProfile, QueryVector, VECTOR_DIM};
pub use ranking::{RankingContext, heuristic_select, rank, region_for_code};
pub use similarity::{cosine_similarity, is_degenerate, score_corpus};
