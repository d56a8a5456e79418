use crate::error::RankError;
use crate::models::{
    CandidateVector, FeatureVector, MismatchPolicy, RankedResult, ScoredCandidate, DEFAULT_TOP_K,
};
use tracing::warn;

/// Cosine similarity of two equal-length slices; 0 when either norm is 0.
pub fn cosine_similarity(left: &[f64], right: &[f64]) -> f64 {
    let dot = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| a * b)
        .sum::<f64>();
    let left_norm = left.iter().map(|value| value * value).sum::<f64>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f64>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }

    dot / (left_norm * right_norm)
}

#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    pub top_k: usize,
    pub on_dimension_mismatch: MismatchPolicy,
}

impl Default for Ranker {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            on_dimension_mismatch: MismatchPolicy::Fail,
        }
    }
}

impl Ranker {
    pub fn new(top_k: usize, on_dimension_mismatch: MismatchPolicy) -> Self {
        Self {
            top_k,
            on_dimension_mismatch,
        }
    }

    /// Scores every well-formed candidate against `query` and returns the
    /// best `top_k`, highest first. Candidates holding NaN, or whose score
    /// overflows, are skipped; equal scores keep the order the candidates
    /// arrived in.
    pub fn rank(
        &self,
        query: &FeatureVector,
        candidates: &[CandidateVector],
    ) -> Result<RankedResult, RankError> {
        if query.is_empty() {
            return Err(RankError::InvalidQueryVector("vector is empty".to_string()));
        }
        if query.has_nan() {
            return Err(RankError::InvalidQueryVector("vector contains NaN".to_string()));
        }

        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.vector.has_nan() {
                warn!(candidate = %candidate.id, "skipping candidate vector containing NaN");
                continue;
            }

            if candidate.vector.len() != query.len() {
                match self.on_dimension_mismatch {
                    MismatchPolicy::Fail => {
                        return Err(RankError::DimensionMismatch {
                            id: candidate.id.clone(),
                            expected: query.len(),
                            found: candidate.vector.len(),
                        });
                    }
                    MismatchPolicy::Skip => {
                        warn!(
                            candidate = %candidate.id,
                            expected = query.len(),
                            found = candidate.vector.len(),
                            "skipping candidate with mismatched dimensions"
                        );
                        continue;
                    }
                }
            }

            let score = cosine_similarity(query.as_slice(), candidate.vector.as_slice());
            if !score.is_finite() {
                warn!(candidate = %candidate.id, "skipping candidate with non-finite score");
                continue;
            }

            scored.push(ScoredCandidate {
                id: candidate.id.clone(),
                score,
            });
        }

        // sort_by is stable, so ties keep retrieval order
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(self.top_k);

        Ok(RankedResult(scored))
    }
}

/// Ranks with the default strict dimension policy.
pub fn rank(
    query: &FeatureVector,
    candidates: &[CandidateVector],
    k: usize,
) -> Result<RankedResult, RankError> {
    Ranker::new(k, MismatchPolicy::Fail).rank(query, candidates)
}
