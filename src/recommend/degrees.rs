//! Gap analysis: degrees offered by similar universities that the target lacks.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::{
    catalog::{DataAccess, EntityId},
    util::title::fold_key,
};

use super::{
    classify::{classify, DegreeLevel},
    overlap::compatibility,
    profile::ProfileCache,
    scoring::{round_to, ComponentMetrics, CompositeScorer, ScoreWeights, Signals, WeightedPolicy},
    vectorize::{similarities, term_weights},
    RecommendError, Recommender,
};

/// Weight given to a skill the presentation vocabulary doesn't cover.
const MISSING_TERM_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillScore {
    pub skill: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeSuggestion {
    pub title: String,
    pub score: f64,
    pub degree_type: DegreeLevel,
    pub metrics: ComponentMetrics,
    pub new_skill_count: usize,
    pub top_skills: Vec<SkillScore>,
}

struct TitleStats {
    title: String,
    frequency: usize,
    documents: Vec<String>,
    compatibility_sum: f64,
    new_skills: usize,
}

impl<'a, D> Recommender<'a, D>
where
    D: DataAccess + ?Sized,
{
    /// Degrees the target could add, scored on frequency among peers, novelty,
    /// compatibility and skill enrichment.
    pub fn suggest_degrees(
        &self,
        target_id: EntityId,
        top_n: usize,
        overrides: &HashMap<String, f64>,
    ) -> Result<Vec<DegreeSuggestion>, RecommendError> {
        let mut merged = self.settings.weights.clone();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        let weights = ScoreWeights::resolve(&merged)?;

        let mut cache = self.cache();
        let Some(target) = cache.get_or_build(self.data, target_id) else {
            return Ok(Vec::new());
        };
        let peers = self.similar_with(&mut cache, target_id, self.settings.similar_peer_count);
        if peers.is_empty() {
            return Ok(Vec::new());
        }

        let target_degrees = target.degree_keys();
        let target_skills = target.skill_keys();
        let mut by_title: BTreeMap<String, TitleStats> = BTreeMap::new();

        for peer in &peers {
            let Some(profile) = cache.get_or_build(self.data, peer.id) else {
                continue;
            };
            let peer_skills = profile.skill_keys();
            let new_skills = peer_skills.difference(&target_skills).count();
            let compat = compatibility(&peer_skills, &target_skills);
            let document = profile.document(false);

            for degree in &profile.degrees {
                let key = fold_key(degree);
                if target_degrees.contains(&key) {
                    continue;
                }
                let stats = by_title.entry(key).or_insert_with(|| TitleStats {
                    title: degree.clone(),
                    frequency: 0,
                    documents: Vec::new(),
                    compatibility_sum: 0.0,
                    new_skills: 0,
                });
                stats.frequency += 1;
                stats.documents.push(document.clone());
                stats.compatibility_sum += compat;
                stats.new_skills += new_skills;
            }
        }

        if by_title.is_empty() {
            debug!(target_id, "peers offer no degree missing from target");
            return Ok(Vec::new());
        }

        let documents: Vec<String> = by_title.values().map(|s| s.documents.join(" ")).collect();
        let sims = similarities(&target.document(true), &documents);

        let max_frequency = by_title.values().map(|s| s.frequency).max().unwrap_or(1).max(1);
        let max_new_skills = by_title.values().map(|s| s.new_skills).max().unwrap_or(0);

        let candidates: Vec<(&TitleStats, Signals)> = by_title
            .values()
            .zip(sims)
            .map(|(stats, similarity)| {
                let enrichment = if max_new_skills == 0 {
                    0.0
                } else {
                    stats.new_skills as f64 / max_new_skills as f64
                };
                let signals = Signals {
                    frequency: stats.frequency as f64 / max_frequency as f64,
                    similarity,
                    compatibility: stats.compatibility_sum / stats.frequency as f64,
                    skill_enrichment: enrichment,
                    new_skill_count: stats.new_skills,
                    ..Default::default()
                };
                (stats, signals)
            })
            .collect();

        let ranked = CompositeScorer::new(WeightedPolicy::new(weights))
            .rank(candidates, top_n, |s: &&TitleStats| s.title.as_str());

        let peer_ids: Vec<EntityId> = peers.iter().map(|p| p.id).collect();
        let suggestions = ranked
            .into_iter()
            .map(|scored| DegreeSuggestion {
                title: scored.item.title.clone(),
                score: scored.score,
                degree_type: classify(&scored.item.title),
                metrics: scored.signals.metrics(),
                new_skill_count: scored.item.new_skills,
                top_skills: self.top_skills(&mut cache, &peer_ids, &scored.item.title, &target_skills),
            })
            .collect::<Vec<_>>();

        debug!(target_id, returned = suggestions.len(), "degree suggestions ranked");
        Ok(suggestions)
    }

    /// Skills that peers offering `title` teach and the target lacks, ranked by
    /// how many peers teach them blended with their presentation term weight.
    fn top_skills(
        &self,
        cache: &mut ProfileCache,
        peer_ids: &[EntityId],
        title: &str,
        target_skills: &BTreeSet<String>,
    ) -> Vec<SkillScore> {
        let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
        let mut vocabulary: Vec<String> = Vec::new();

        for id in peer_ids {
            let Some(profile) = cache.get_or_build(self.data, *id) else {
                continue;
            };
            if !profile.offers_degree(title) {
                continue;
            }
            for skill in &profile.skills_raw {
                let key = fold_key(skill);
                if target_skills.contains(&key) {
                    continue;
                }
                vocabulary.push(skill.clone());
                counts.entry(key).or_insert_with(|| (skill.clone(), 0)).1 += 1;
            }
        }

        if counts.is_empty() {
            return Vec::new();
        }

        let weights = term_weights(&vocabulary.join(" "));
        let max_count = counts.values().map(|(_, c)| *c).max().unwrap_or(1) as f64;

        let raw: Vec<(String, f64)> = counts
            .into_iter()
            .map(|(key, (skill, count))| {
                let term_weight = weights.get(&key).copied().unwrap_or(MISSING_TERM_WEIGHT);
                (skill, 0.6 * (count as f64 / max_count) + 0.4 * term_weight)
            })
            .collect();

        let min = raw.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
        let max = raw.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
        let spread = (max - min).max(1.0);

        let mut ranked: Vec<SkillScore> = raw
            .into_iter()
            .map(|(skill, value)| {
                let boosted = ((value - min) / spread).powf(0.8);
                SkillScore {
                    skill,
                    score: round_to(0.7 + 0.25 * boosted, 3),
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.skill.cmp(&b.skill))
        });
        ranked.truncate(self.settings.top_skill_count);
        ranked
    }
}
