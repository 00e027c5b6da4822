//! Elective suggestions for a learner enrolled in a program.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::{
    catalog::{Course, DataAccess, EntityId, Skill},
    util::title::normalize_skill,
};

use super::{
    overlap::compatibility,
    profile::dedup_sorted,
    scoring::{round_to, BlendPolicy, CompositeScorer, Signals, Suppression},
    vectorize::similarities,
    Recommender,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectiveSuggestion {
    pub course_id: EntityId,
    pub course_name: String,
    pub score: f64,
    pub similarity: f64,
    pub overlap_ratio: f64,
    pub skills: Vec<String>,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectiveMeta {
    pub considered: usize,
    pub returned: usize,
    pub similarity_weight: f64,
    pub overlap_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElectiveOutcome {
    Recommended {
        electives: Vec<ElectiveSuggestion>,
        meta: ElectiveMeta,
    },
    NoResults {
        message: String,
    },
}

impl ElectiveOutcome {
    fn no_results(message: &str) -> Self {
        ElectiveOutcome::NoResults {
            message: message.to_string(),
        }
    }
}

struct ElectiveCandidate<'c> {
    course: &'c Course,
    display: Vec<String>,
    normalized: BTreeSet<String>,
}

fn normalized_set<'s>(skills: impl IntoIterator<Item = &'s str>) -> BTreeSet<String> {
    skills
        .into_iter()
        .map(normalize_skill)
        .filter(|s| !s.is_empty())
        .collect()
}

fn reason(matched: &[String], similarity: f64) -> String {
    let mut parts = Vec::new();
    if !matched.is_empty() {
        let listed: Vec<&str> = matched.iter().take(5).map(String::as_str).collect();
        parts.push(format!("Common skills: {} ({})", matched.len(), listed.join(", ")));
    }
    if similarity > 0.0 {
        parts.push(format!("Semantic similarity: {}", round_to(similarity, 3)));
    }
    if parts.is_empty() {
        "Low relevance.".to_string()
    } else {
        parts.join("; ")
    }
}

impl<'a, D> Recommender<'a, D>
where
    D: DataAccess + ?Sized,
{
    /// Rank the program's electives against the learner's skills, with a capped
    /// bonus per skill the learner does not have yet. Electives with too little
    /// overlap and negligible similarity are dropped.
    pub fn suggest_electives(
        &self,
        university_id: EntityId,
        program_id: EntityId,
        target_skills: &[String],
        top_n: usize,
        min_overlap_ratio: f64,
    ) -> ElectiveOutcome {
        let learner = normalized_set(target_skills.iter().map(String::as_str));
        if learner.is_empty() {
            return ElectiveOutcome::no_results("Please provide at least one valid skill.");
        }

        let Some(university) = self.data.university(university_id) else {
            return ElectiveOutcome::no_results("Degree program not found for this university.");
        };
        if university.program(program_id).is_none() {
            return ElectiveOutcome::no_results("Degree program not found for this university.");
        }

        let electives: Vec<&Course> = university
            .program_courses(program_id)
            .filter(|c| c.is_elective)
            .collect();
        if electives.is_empty() {
            return ElectiveOutcome::no_results("No elective courses were found for this program.");
        }

        let candidates: Vec<ElectiveCandidate<'_>> = electives
            .into_iter()
            .filter_map(|course| {
                let names = course.skills.iter().map(|s| s.name.as_str());
                let normalized = normalized_set(names.clone());
                if normalized.is_empty() {
                    return None;
                }
                Some(ElectiveCandidate {
                    course,
                    display: dedup_sorted(names),
                    normalized,
                })
            })
            .collect();
        if candidates.is_empty() {
            return ElectiveOutcome::no_results(
                "No skills found on the elective courses of this program.",
            );
        }

        let learner_text = learner.iter().cloned().collect::<Vec<_>>().join(" ");
        let documents: Vec<String> = candidates
            .iter()
            .map(|c| c.normalized.iter().cloned().collect::<Vec<_>>().join(" "))
            .collect();
        let sims = similarities(&learner_text, &documents);
        let considered = candidates.len();

        let scored: Vec<(ElectiveCandidate<'_>, Signals)> = candidates
            .into_iter()
            .zip(sims)
            .map(|(candidate, similarity)| {
                let signals = Signals {
                    similarity,
                    compatibility: compatibility(&candidate.normalized, &learner),
                    new_skill_count: candidate.normalized.difference(&learner).count(),
                    ..Default::default()
                };
                (candidate, signals)
            })
            .collect();

        let policy = BlendPolicy::new(
            self.settings.blend,
            self.new_skill_bonus(),
            Suppression::Cutoff {
                min_overlap: min_overlap_ratio,
                min_similarity: self.settings.min_similarity,
            },
        );
        let weights = policy.weights();
        let ranked = CompositeScorer::new(policy).rank(scored, top_n.max(1), |c: &ElectiveCandidate<'_>| {
            c.course.name.as_str()
        });

        let electives: Vec<ElectiveSuggestion> = ranked
            .into_iter()
            .map(|scored| {
                let candidate = scored.item;
                let matching: Vec<String> =
                    candidate.normalized.intersection(&learner).cloned().collect();
                let missing: Vec<String> =
                    candidate.normalized.difference(&learner).cloned().collect();
                ElectiveSuggestion {
                    course_id: candidate.course.id,
                    course_name: candidate.course.name.clone(),
                    score: scored.score,
                    similarity: round_to(scored.signals.similarity, 3),
                    overlap_ratio: round_to(scored.signals.compatibility, 3),
                    skills: candidate.display,
                    reason: reason(&matching, scored.signals.similarity),
                    matching_skills: matching,
                    missing_skills: missing,
                }
            })
            .collect();

        debug!(
            university_id,
            program_id,
            considered,
            returned = electives.len(),
            "elective suggestions ranked"
        );

        ElectiveOutcome::Recommended {
            meta: ElectiveMeta {
                considered,
                returned: electives.len(),
                similarity_weight: weights.similarity,
                overlap_weight: weights.overlap,
            },
            electives,
        }
    }

    /// Distinct skills taught by the program's electives, sorted by name.
    /// `None` when the program does not belong to the university.
    pub fn elective_skills(&self, university_id: EntityId, program_id: EntityId) -> Option<Vec<Skill>> {
        let university = self.data.university(university_id)?;
        university.program(program_id)?;

        let mut by_id: BTreeMap<EntityId, &Skill> = BTreeMap::new();
        for course in university.program_courses(program_id).filter(|c| c.is_elective) {
            for skill in &course.skills {
                by_id.entry(skill.id).or_insert(skill);
            }
        }

        let mut skills: Vec<Skill> = by_id.into_values().cloned().collect();
        skills.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Some(skills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_mentions_shared_skills_and_similarity() {
        let matched = vec!["python".to_string(), "sql".to_string()];
        assert_eq!(
            reason(&matched, 0.41234),
            "Common skills: 2 (python, sql); Semantic similarity: 0.412"
        );
        assert_eq!(reason(&[], 0.0), "Low relevance.");
    }

    #[test]
    fn skills_are_normalized_before_comparison() {
        let set = normalized_set(["  Python ", "C++", "!!!"]);
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec!["c++".to_string(), "python".to_string()]
        );
    }
}
