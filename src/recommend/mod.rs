//! Recommendation engine.
//!
//! A [`Recommender`] borrows a [`DataAccess`] snapshot and exposes the ranked
//! facades. Each facade call builds its own [`ProfileCache`], so nothing
//! outlives the call that produced it.

pub mod classify;
pub mod courses;
pub mod degrees;
pub mod electives;
pub mod overlap;
pub mod personalized;
pub mod profile;
pub mod scoring;
pub mod similar;
pub mod vectorize;

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::DataAccess;

use self::{
    profile::ProfileCache,
    scoring::{BlendWeights, NewSkillBonus},
};

pub use self::{
    courses::{CourseRecommendations, CourseSuggestion},
    degrees::{DegreeSuggestion, SkillScore},
    electives::{ElectiveMeta, ElectiveOutcome, ElectiveSuggestion},
    personalized::{CourseMatch, PersonalizedOutcome, Preferences, ProgramMatch},
    similar::SimilarEntity,
};

#[derive(Debug, Error, PartialEq)]
pub enum RecommendError {
    #[error("unknown weight key: {0}")]
    UnknownWeight(String),
    #[error("invalid weight for {key}: {value}")]
    InvalidWeight { key: String, value: f64 },
}

/// Tunables of the engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Overrides merged over the default frequency/novelty/compatibility/enrichment weights.
    pub weights: HashMap<String, f64>,
    pub blend: BlendWeights,
    pub similar_peer_count: usize,
    pub similar_degree_count: usize,
    pub top_skill_count: usize,
    pub penalty_threshold: f64,
    pub penalty_factor: f64,
    pub min_similarity: f64,
    pub bonus_step: f64,
    pub bonus_cap: usize,
    pub profile_cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weights: HashMap::new(),
            blend: BlendWeights::default(),
            similar_peer_count: 10,
            similar_degree_count: 5,
            top_skill_count: 5,
            penalty_threshold: 0.1,
            penalty_factor: 0.05,
            min_similarity: 0.01,
            bonus_step: 0.02,
            bonus_cap: 5,
            profile_cache_capacity: 1024,
        }
    }
}

pub struct Recommender<'a, D: ?Sized> {
    data: &'a D,
    settings: &'a Settings,
}

impl<'a, D> Recommender<'a, D>
where
    D: DataAccess + ?Sized,
{
    pub fn new(data: &'a D, settings: &'a Settings) -> Self {
        Self { data, settings }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    fn cache(&self) -> ProfileCache {
        ProfileCache::new(self.settings.profile_cache_capacity)
    }

    fn new_skill_bonus(&self) -> NewSkillBonus {
        NewSkillBonus {
            step: self.settings.bonus_step,
            cap: self.settings.bonus_cap,
        }
    }
}
