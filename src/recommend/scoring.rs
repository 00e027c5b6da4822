//! Score blending.
//!
//! Every ranked output in the recommender goes through one [`CompositeScorer`];
//! what differs between facades is the [`ScoringPolicy`] it is built with.

use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::RecommendError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub frequency: f64,
    pub novelty: f64,
    pub compatibility: f64,
    pub skill_enrichment: f64,
}

impl Default for ScoreWeights {
    /// Recorded defaults. They sum to 0.90 and are renormalized before use.
    fn default() -> Self {
        Self {
            frequency: 0.30,
            novelty: 0.25,
            compatibility: 0.20,
            skill_enrichment: 0.15,
        }
    }
}

impl ScoreWeights {
    pub const KEYS: [&'static str; 4] = ["frequency", "novelty", "compatibility", "skill_enrichment"];

    pub fn sum(&self) -> f64 {
        self.frequency + self.novelty + self.compatibility + self.skill_enrichment
    }

    /// Merge `overrides` over the defaults and renormalize to sum 1.0.
    pub fn resolve(overrides: &HashMap<String, f64>) -> Result<Self, RecommendError> {
        let mut merged = Self::default();
        for (key, value) in overrides {
            merged.set(key, *value)?;
        }
        Ok(merged.normalized())
    }

    fn set(&mut self, key: &str, value: f64) -> Result<(), RecommendError> {
        if !value.is_finite() || value < 0.0 {
            return Err(RecommendError::InvalidWeight {
                key: key.to_string(),
                value,
            });
        }

        let slot = match key {
            "frequency" => &mut self.frequency,
            "novelty" => &mut self.novelty,
            "compatibility" => &mut self.compatibility,
            "skill_enrichment" => &mut self.skill_enrichment,
            other => return Err(RecommendError::UnknownWeight(other.to_string())),
        };
        *slot = value;
        Ok(())
    }

    /// Scale so the weights sum to 1.0; a zero total falls back to the defaults.
    pub fn normalized(self) -> Self {
        let total = self.sum();
        if total <= 0.0 || !total.is_finite() {
            warn!("score weights sum to zero, using defaults");
            return Self::default().normalized();
        }

        Self {
            frequency: self.frequency / total,
            novelty: self.novelty / total,
            compatibility: self.compatibility / total,
            skill_enrichment: self.skill_enrichment / total,
        }
    }
}

/// Weights of the two-signal blend used for course and elective suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub similarity: f64,
    pub overlap: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            similarity: 0.6,
            overlap: 0.4,
        }
    }
}

impl BlendWeights {
    pub fn normalized(self) -> Self {
        let similarity = if self.similarity.is_finite() { self.similarity.max(0.0) } else { 0.0 };
        let overlap = if self.overlap.is_finite() { self.overlap.max(0.0) } else { 0.0 };
        let total = similarity + overlap;
        if total <= 0.0 {
            return Self::default();
        }

        Self {
            similarity: similarity / total,
            overlap: overlap / total,
        }
    }
}

/// Raw per-candidate signals, each already scaled to `[0, 1]` except
/// `new_skill_count` and `bonus`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub frequency: f64,
    pub similarity: f64,
    pub compatibility: f64,
    pub skill_enrichment: f64,
    pub new_skill_count: usize,
    /// Flat adjustment added after clamping; only similarity ranking reads it.
    pub bonus: f64,
}

impl Signals {
    pub fn novelty(&self) -> f64 {
        (1.0 - self.similarity).clamp(0.0, 1.0)
    }

    pub fn metrics(&self) -> ComponentMetrics {
        ComponentMetrics {
            frequency: round_to(self.frequency, 3),
            novelty: round_to(self.novelty(), 3),
            compatibility: round_to(self.compatibility, 3),
            skill_enrichment: round_to(self.skill_enrichment, 3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentMetrics {
    pub frequency: f64,
    pub novelty: f64,
    pub compatibility: f64,
    pub skill_enrichment: f64,
}

pub trait ScoringPolicy {
    /// `None` discards the candidate before ranking.
    fn score(&self, signals: &Signals) -> Option<f64>;
}

/// Ranks on textual similarity, plus any flat bonus the caller assigned.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityPolicy;

impl ScoringPolicy for SimilarityPolicy {
    fn score(&self, signals: &Signals) -> Option<f64> {
        Some(signals.similarity.clamp(0.0, 1.0) + signals.bonus)
    }
}

/// Linear blend of frequency, novelty, compatibility and enrichment.
#[derive(Debug, Clone, Copy)]
pub struct WeightedPolicy {
    weights: ScoreWeights,
}

impl WeightedPolicy {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights: weights.normalized(),
        }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }
}

impl ScoringPolicy for WeightedPolicy {
    fn score(&self, signals: &Signals) -> Option<f64> {
        let w = &self.weights;
        let total = w.frequency * signals.frequency
            + w.novelty * signals.novelty()
            + w.compatibility * signals.compatibility
            + w.skill_enrichment * signals.skill_enrichment;
        Some(total.clamp(0.0, 1.0))
    }
}

/// How a blend treats candidates with little in common with the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Suppression {
    None,
    /// Multiply the score by `factor` when compatibility is below `threshold`.
    Penalty { threshold: f64, factor: f64 },
    /// Drop the candidate when overlap AND similarity are both below their minimum.
    Cutoff { min_overlap: f64, min_similarity: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewSkillBonus {
    pub step: f64,
    pub cap: usize,
}

impl NewSkillBonus {
    pub fn for_count(&self, count: usize) -> f64 {
        self.step * count.min(self.cap) as f64
    }
}

/// Similarity/overlap blend plus a capped bonus for newly introduced skills.
#[derive(Debug, Clone, Copy)]
pub struct BlendPolicy {
    weights: BlendWeights,
    bonus: NewSkillBonus,
    suppression: Suppression,
}

impl BlendPolicy {
    pub fn new(weights: BlendWeights, bonus: NewSkillBonus, suppression: Suppression) -> Self {
        Self {
            weights: weights.normalized(),
            bonus,
            suppression,
        }
    }

    pub fn weights(&self) -> BlendWeights {
        self.weights
    }
}

impl ScoringPolicy for BlendPolicy {
    fn score(&self, signals: &Signals) -> Option<f64> {
        if let Suppression::Cutoff {
            min_overlap,
            min_similarity,
        } = self.suppression
        {
            if signals.compatibility < min_overlap && signals.similarity < min_similarity {
                return None;
            }
        }

        let raw = self.weights.similarity * signals.similarity
            + self.weights.overlap * signals.compatibility
            + self.bonus.for_count(signals.new_skill_count);
        let mut score = raw.clamp(0.0, 1.0);

        if let Suppression::Penalty { threshold, factor } = self.suppression {
            if signals.compatibility < threshold {
                score *= factor;
            }
        }

        Some(score)
    }
}

#[derive(Debug, Clone)]
pub struct Scored<T> {
    pub item: T,
    pub score: f64,
    pub signals: Signals,
}

pub struct CompositeScorer<P> {
    policy: P,
    precision: i32,
}

impl<P: ScoringPolicy> CompositeScorer<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            precision: 3,
        }
    }

    pub fn with_precision(mut self, places: i32) -> Self {
        self.precision = places;
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Score, drop discarded candidates, sort descending (ties by label) and keep `top_n`.
    pub fn rank<T, F>(&self, candidates: Vec<(T, Signals)>, top_n: usize, label: F) -> Vec<Scored<T>>
    where
        F: Fn(&T) -> &str,
    {
        let mut scored: Vec<Scored<T>> = candidates
            .into_iter()
            .filter_map(|(item, signals)| {
                self.policy.score(&signals).map(|score| Scored {
                    item,
                    score: round_to(score, self.precision),
                    signals,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| label(&a.item).cmp(label(&b.item)))
        });
        scored.truncate(top_n);
        scored
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sums_to_one(w: &ScoreWeights) -> bool {
        (w.sum() - 1.0).abs() < 1e-9
    }

    #[test]
    fn defaults_are_renormalized() {
        let weights = ScoreWeights::resolve(&HashMap::new()).unwrap();
        assert!(sums_to_one(&weights));
        assert!((weights.frequency - 0.30 / 0.90).abs() < 1e-12);
    }

    #[test]
    fn partial_override_is_merged() {
        let overrides = HashMap::from([("novelty".to_string(), 0.0)]);
        let weights = ScoreWeights::resolve(&overrides).unwrap();
        assert!(sums_to_one(&weights));
        assert_eq!(weights.novelty, 0.0);
        assert!((weights.frequency - 0.30 / 0.65).abs() < 1e-12);
    }

    #[test]
    fn all_zero_falls_back_to_defaults() {
        let overrides: HashMap<String, f64> = ScoreWeights::KEYS
            .iter()
            .map(|k| (k.to_string(), 0.0))
            .collect();
        let weights = ScoreWeights::resolve(&overrides).unwrap();
        assert!(sums_to_one(&weights));
        assert_eq!(weights, ScoreWeights::default().normalized());
    }

    #[test]
    fn invalid_weights_are_contract_errors() {
        let negative = HashMap::from([("frequency".to_string(), -1.0)]);
        assert!(matches!(
            ScoreWeights::resolve(&negative),
            Err(RecommendError::InvalidWeight { .. })
        ));

        let unknown = HashMap::from([("popularity".to_string(), 0.5)]);
        assert!(matches!(
            ScoreWeights::resolve(&unknown),
            Err(RecommendError::UnknownWeight(_))
        ));
    }

    #[test]
    fn blend_weights_fall_back_when_zero() {
        let zero = BlendWeights {
            similarity: 0.0,
            overlap: 0.0,
        };
        assert_eq!(zero.normalized(), BlendWeights::default());

        let skewed = BlendWeights {
            similarity: 3.0,
            overlap: 1.0,
        }
        .normalized();
        assert!((skewed.similarity - 0.75).abs() < 1e-12);
    }

    const BONUS: NewSkillBonus = NewSkillBonus { step: 0.02, cap: 5 };

    #[test]
    fn penalty_demotes_without_dropping() {
        let policy = BlendPolicy::new(
            BlendWeights::default(),
            BONUS,
            Suppression::Penalty {
                threshold: 0.1,
                factor: 0.05,
            },
        );
        let weak = Signals {
            similarity: 0.5,
            compatibility: 0.05,
            ..Default::default()
        };
        let score = policy.score(&weak).unwrap();
        assert!((score - 0.05 * (0.6 * 0.5 + 0.4 * 0.05)).abs() < 1e-12);
    }

    #[test]
    fn cutoff_needs_both_signals_low() {
        let policy = BlendPolicy::new(
            BlendWeights::default(),
            BONUS,
            Suppression::Cutoff {
                min_overlap: 0.1,
                min_similarity: 0.01,
            },
        );
        let irrelevant = Signals::default();
        assert!(policy.score(&irrelevant).is_none());

        let similar_only = Signals {
            similarity: 0.2,
            ..Default::default()
        };
        assert!(policy.score(&similar_only).is_some());
    }

    #[test]
    fn bonus_is_capped() {
        assert!((BONUS.for_count(12) - 0.1).abs() < 1e-12);
        assert_eq!(BONUS.for_count(0), 0.0);
    }

    #[test]
    fn rank_sorts_and_truncates() {
        let scorer = CompositeScorer::new(SimilarityPolicy);
        let candidates = vec![
            ("b", Signals { similarity: 0.5, ..Default::default() }),
            ("a", Signals { similarity: 0.5, ..Default::default() }),
            ("c", Signals { similarity: 0.9, ..Default::default() }),
        ];
        let ranked = scorer.rank(candidates, 2, |item: &&str| *item);
        let labels: Vec<_> = ranked.iter().map(|s| s.item).collect();
        assert_eq!(labels, vec!["c", "a"]);
    }

    proptest! {
        #[test]
        fn resolved_weights_always_sum_to_one(
            f in 0.0f64..5.0, n in 0.0f64..5.0, c in 0.0f64..5.0, e in 0.0f64..5.0,
        ) {
            let overrides = HashMap::from([
                ("frequency".to_string(), f),
                ("novelty".to_string(), n),
                ("compatibility".to_string(), c),
                ("skill_enrichment".to_string(), e),
            ]);
            let weights = ScoreWeights::resolve(&overrides).unwrap();
            prop_assert!(sums_to_one(&weights));
        }

        #[test]
        fn novelty_and_scores_stay_in_unit_range(
            similarity in -0.5f64..1.5,
            compatibility in 0.0f64..1.0,
            frequency in 0.0f64..1.0,
            enrichment in 0.0f64..1.0,
        ) {
            let signals = Signals {
                frequency,
                similarity,
                compatibility,
                skill_enrichment: enrichment,
                new_skill_count: 3,
                ..Default::default()
            };
            prop_assert!((0.0..=1.0).contains(&signals.novelty()));
            let weighted = WeightedPolicy::new(ScoreWeights::default()).score(&signals).unwrap();
            prop_assert!((0.0..=1.0).contains(&weighted));
        }
    }
}
