//! Course suggestions for an existing or a new degree, drawn from the courses of
//! similar degrees at other universities.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    catalog::{CourseDetails, DataAccess, EntityId},
    util::title::{canonicalize, fold_key},
};

use super::{
    overlap::{compatibility, key_set, missing, shared},
    profile::{dedup_sorted, degree_profiles, DegreeProfile},
    scoring::{BlendPolicy, CompositeScorer, Signals, SimilarityPolicy, Suppression},
    vectorize::similarities,
    Recommender,
};

const NO_DESCRIPTION: &str = "No description available.";
const NO_OBJECTIVES: &str = "No objectives available.";
const NO_LEARNING_OUTCOMES: &str = "No learning outcomes available.";
const NO_COURSE_CONTENT: &str = "No course content available.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSuggestion {
    pub course_name: String,
    pub score: f64,
    pub new_skills: Vec<String>,
    pub compatible_skills: Vec<String>,
    pub description: String,
    pub objectives: String,
    pub learning_outcomes: String,
    pub course_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecommendations {
    pub university_id: Option<EntityId>,
    pub degree: String,
    pub recommendations: Vec<CourseSuggestion>,
}

struct CourseCandidate {
    name: String,
    skills: Vec<String>,
    specific_skills: Vec<String>,
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback.to_string(),
    }
}

fn detail_strings(details: Option<&CourseDetails>) -> [String; 4] {
    let empty = CourseDetails::default();
    let details = details.unwrap_or(&empty);
    [
        text_or(&details.description, NO_DESCRIPTION),
        text_or(&details.objectives, NO_OBJECTIVES),
        text_or(&details.learning_outcomes, NO_LEARNING_OUTCOMES),
        text_or(&details.course_content, NO_COURSE_CONTENT),
    ]
}

fn owned_strings(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}

/// Profiles of `candidates` whose canonical title equals that of `name`.
fn matching_titles<'p>(candidates: &'p [DegreeProfile], name: &str) -> Vec<&'p DegreeProfile> {
    let wanted = canonicalize(name);
    if wanted.is_empty() {
        return Vec::new();
    }
    candidates
        .iter()
        .filter(|p| canonicalize(&p.title) == wanted)
        .collect()
}

impl<'a, D> Recommender<'a, D>
where
    D: DataAccess + ?Sized,
{
    pub fn degree_profiles(&self, university_id: EntityId) -> Vec<DegreeProfile> {
        self.data
            .university(university_id)
            .map(degree_profiles)
            .unwrap_or_default()
    }

    pub fn all_degree_profiles(&self) -> Vec<DegreeProfile> {
        self.data
            .universities()
            .iter()
            .flat_map(degree_profiles)
            .collect()
    }

    /// Degrees of the same type at other universities, most similar first.
    pub fn find_similar_degrees(
        &self,
        target: &DegreeProfile,
        pool: &[DegreeProfile],
        top_n: usize,
    ) -> Vec<DegreeProfile> {
        let target_document = target.document();
        if target_document.trim().is_empty() {
            return Vec::new();
        }

        let candidates: Vec<&DegreeProfile> = pool
            .iter()
            .filter(|p| p.degree_type == target.degree_type)
            .filter(|p| p.university_id != target.university_id)
            .filter(|p| !p.document().trim().is_empty())
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let documents: Vec<String> = candidates.iter().map(|p| p.document()).collect();
        let sims = similarities(&target_document, &documents);
        let scored = candidates
            .into_iter()
            .zip(sims)
            .map(|(profile, similarity)| {
                (
                    profile,
                    Signals {
                        similarity,
                        ..Default::default()
                    },
                )
            })
            .collect();

        CompositeScorer::new(SimilarityPolicy)
            .with_precision(6)
            .rank(scored, top_n, |p: &&DegreeProfile| p.title.as_str())
            .into_iter()
            .map(|s| s.item.clone())
            .collect()
    }

    /// Courses taught in `peers` that `target` lacks, ranked by a
    /// similarity/overlap blend. Poorly compatible courses are demoted.
    pub fn suggest_courses_for_degree(
        &self,
        target: &DegreeProfile,
        peers: &[DegreeProfile],
        top_n: usize,
    ) -> Vec<CourseSuggestion> {
        self.rank_courses(
            &target.skills,
            &target.course_keys(),
            Some(target.university_id),
            peers,
            top_n,
        )
    }

    /// Course suggestions for the degree titled `name` at `university_id`.
    ///
    /// The target merges every program with that canonical title at any
    /// university, so the university need not offer the degree yet.
    pub fn recommend_courses_for_degree_name(
        &self,
        university_id: EntityId,
        name: &str,
        top_n: usize,
    ) -> CourseRecommendations {
        let pool = self.all_degree_profiles();
        let matches = matching_titles(&pool, name);
        let Some(first) = matches.first() else {
            debug!(university_id, name, "no degree with this title");
            return CourseRecommendations {
                university_id: Some(university_id),
                degree: name.to_string(),
                recommendations: Vec::new(),
            };
        };

        let target = DegreeProfile {
            university_id,
            program_id: None,
            title: first.title.clone(),
            degree_type: first.degree_type,
            skills: dedup_sorted(matches.iter().flat_map(|p| p.skills.iter())),
            courses: dedup_sorted(matches.iter().flat_map(|p| p.courses.iter())),
        };

        let peers = self.find_similar_degrees(&target, &pool, self.settings.similar_degree_count);
        let recommendations = self.suggest_courses_for_degree(&target, &peers, top_n);
        info!(
            university_id,
            degree = %target.title,
            peers = peers.len(),
            returned = recommendations.len(),
            "course suggestions for existing degree"
        );

        CourseRecommendations {
            university_id: Some(university_id),
            degree: target.title,
            recommendations,
        }
    }

    /// Course suggestions for a degree no university needs to offer yet.
    ///
    /// Degrees sharing the canonical title serve as peers; with none, every
    /// degree does. The target skill set is the union of the peers' skills.
    pub fn recommend_courses_for_new_degree(&self, name: &str, top_n: usize) -> CourseRecommendations {
        let pool = self.all_degree_profiles();
        let matches: Vec<DegreeProfile> = matching_titles(&pool, name).into_iter().cloned().collect();
        let peers = if matches.is_empty() { pool } else { matches };

        let target_skills = dedup_sorted(peers.iter().flat_map(|p| p.skills.iter()));
        let recommendations =
            self.rank_courses(&target_skills, &BTreeSet::new(), None, &peers, top_n);
        info!(
            degree = name,
            peers = peers.len(),
            returned = recommendations.len(),
            "course suggestions for new degree"
        );

        CourseRecommendations {
            university_id: None,
            degree: name.to_string(),
            recommendations,
        }
    }

    fn rank_courses(
        &self,
        target_skills: &[String],
        excluded_courses: &BTreeSet<String>,
        details_scope: Option<EntityId>,
        peers: &[DegreeProfile],
        top_n: usize,
    ) -> Vec<CourseSuggestion> {
        let mut by_course: BTreeMap<String, CourseCandidate> = BTreeMap::new();

        for peer in peers {
            for name in &peer.courses {
                let key = fold_key(name);
                if key.is_empty() || excluded_courses.contains(&key) {
                    continue;
                }
                let specific: Vec<&str> = self
                    .data
                    .course_by_name(name, None)
                    .map(|c| c.skills.iter().map(|s| s.name.as_str()).collect())
                    .unwrap_or_default();
                if specific.is_empty() && peer.skills.is_empty() {
                    continue;
                }

                let candidate = by_course.entry(key).or_insert_with(|| CourseCandidate {
                    name: name.clone(),
                    skills: Vec::new(),
                    specific_skills: dedup_sorted(&specific),
                });
                candidate.skills = dedup_sorted(
                    candidate
                        .skills
                        .iter()
                        .map(String::as_str)
                        .chain(peer.skills.iter().map(String::as_str))
                        .chain(specific.iter().copied()),
                );
            }
        }

        if by_course.is_empty() {
            debug!(peers = peers.len(), "no new courses among peers");
            return Vec::new();
        }

        let target_keys = key_set(target_skills);
        let documents: Vec<String> = by_course.values().map(|c| c.skills.join(" ")).collect();
        let sims = similarities(&target_skills.join(" "), &documents);

        let candidates: Vec<(&CourseCandidate, Signals)> = by_course
            .values()
            .zip(sims)
            .map(|(candidate, similarity)| {
                let signals = Signals {
                    similarity,
                    compatibility: compatibility(&key_set(&candidate.skills), &target_keys),
                    new_skill_count: missing(&candidate.specific_skills, &target_keys).len(),
                    ..Default::default()
                };
                (candidate, signals)
            })
            .collect();

        let policy = BlendPolicy::new(
            self.settings.blend,
            self.new_skill_bonus(),
            Suppression::Penalty {
                threshold: self.settings.penalty_threshold,
                factor: self.settings.penalty_factor,
            },
        );

        CompositeScorer::new(policy)
            .rank(candidates, top_n, |c: &&CourseCandidate| c.name.as_str())
            .into_iter()
            .map(|scored| {
                let candidate = scored.item;
                let [description, objectives, learning_outcomes, course_content] =
                    detail_strings(
                        self.data
                            .course_by_name(&candidate.name, details_scope)
                            .map(|c| &c.details),
                    );
                CourseSuggestion {
                    course_name: candidate.name.clone(),
                    score: scored.score,
                    new_skills: owned_strings(missing(&candidate.specific_skills, &target_keys)),
                    compatible_skills: owned_strings(shared(&candidate.skills, &target_keys)),
                    description,
                    objectives,
                    learning_outcomes,
                    course_content,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_fall_back_to_defaults() {
        let details = CourseDetails {
            description: Some("  Relational theory ".into()),
            objectives: Some("   ".into()),
            learning_outcomes: None,
            course_content: None,
        };
        let [description, objectives, outcomes, content] = detail_strings(Some(&details));
        assert_eq!(description, "Relational theory");
        assert_eq!(objectives, NO_OBJECTIVES);
        assert_eq!(outcomes, NO_LEARNING_OUTCOMES);
        assert_eq!(content, NO_COURSE_CONTENT);
        assert_eq!(detail_strings(None)[0], NO_DESCRIPTION);
    }
}
