//! Program and standalone-course matching against a learner's own skills and
//! preferences.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    catalog::{Course, DataAccess, DegreeProgram, EntityId, University},
    util::title::{normalize_skill, parse_titles},
};

use super::{
    scoring::{CompositeScorer, Signals, SimilarityPolicy},
    vectorize::similarities,
    Recommender,
};

const EXACT_MATCH_BONUS: f64 = 0.05;
const UNCATEGORIZED: &str = "Other";

fn default_top_n() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct Preferences {
    pub target_skills: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub degree_type: Option<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramMatch {
    pub program_id: EntityId,
    pub degree_name: String,
    pub university: String,
    pub language: Option<String>,
    pub country: String,
    pub degree_type: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseMatch {
    pub course_id: EntityId,
    pub course_name: String,
    pub university: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PersonalizedOutcome {
    Recommended {
        programs: Vec<ProgramMatch>,
        unlinked_courses: Vec<CourseMatch>,
        skills_by_category: BTreeMap<String, Vec<String>>,
    },
    NoResults {
        message: String,
    },
}

impl PersonalizedOutcome {
    fn no_results(message: &str) -> Self {
        PersonalizedOutcome::NoResults {
            message: message.to_string(),
        }
    }
}

/// Case-insensitive substring filter; an unset filter admits everything.
fn admits(filter: &Option<String>, value: Option<&str>) -> bool {
    match filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        None => true,
        Some(wanted) => value.map_or(false, |v| v.to_lowercase().contains(&wanted.to_lowercase())),
    }
}

fn exact(filter: &Option<String>, value: Option<&str>) -> bool {
    match (filter.as_deref().map(str::trim), value) {
        (Some(wanted), Some(v)) if !wanted.is_empty() => wanted.eq_ignore_ascii_case(v.trim()),
        _ => false,
    }
}

fn skill_document<'s>(names: impl Iterator<Item = &'s str>) -> String {
    names
        .map(normalize_skill)
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
}

struct ProgramCandidate<'c> {
    university: &'c University,
    program: &'c DegreeProgram,
    document: String,
}

impl<'a, D> Recommender<'a, D>
where
    D: DataAccess + ?Sized,
{
    /// Programs whose taught skills best match the learner, with a small bonus
    /// for each preference met exactly, plus the best standalone courses.
    pub fn suggest_programs(&self, preferences: &Preferences) -> PersonalizedOutcome {
        let learner: Vec<String> = preferences
            .target_skills
            .iter()
            .map(|s| normalize_skill(s))
            .filter(|s| !s.is_empty())
            .collect();
        if learner.is_empty() {
            return PersonalizedOutcome::no_results("Please provide at least one skill.");
        }
        let learner_text = learner.join(" ");

        let filtered: Vec<(&University, &DegreeProgram)> = self
            .data
            .universities()
            .iter()
            .flat_map(|u| u.programs.iter().map(move |p| (u, p)))
            .filter(|(u, p)| {
                admits(&preferences.language, p.language.as_deref())
                    && admits(&preferences.country, Some(u.country.as_str()))
                    && admits(&preferences.degree_type, Some(p.degree_type.as_str()))
            })
            .collect();
        if filtered.is_empty() {
            return PersonalizedOutcome::no_results("No matching programs were found.");
        }

        let candidates: Vec<ProgramCandidate<'_>> = filtered
            .into_iter()
            .filter_map(|(university, program)| {
                let names = university
                    .program_courses(program.id)
                    .flat_map(|c| c.skills.iter().map(|s| s.name.as_str()));
                let document = skill_document(names);
                (!document.is_empty()).then_some(ProgramCandidate {
                    university,
                    program,
                    document,
                })
            })
            .collect();
        if candidates.is_empty() {
            return PersonalizedOutcome::no_results(
                "No skills are recorded for any matching program.",
            );
        }

        let documents: Vec<&str> = candidates.iter().map(|c| c.document.as_str()).collect();
        let sims = similarities(&learner_text, &documents);
        let scored: Vec<(ProgramCandidate<'_>, Signals)> = candidates
            .into_iter()
            .zip(sims)
            .map(|(candidate, similarity)| {
                let matches = [
                    exact(&preferences.language, candidate.program.language.as_deref()),
                    exact(&preferences.degree_type, Some(candidate.program.degree_type.as_str())),
                    exact(&preferences.country, Some(candidate.university.country.as_str())),
                ]
                .into_iter()
                .filter(|m| *m)
                .count();
                let signals = Signals {
                    similarity,
                    bonus: EXACT_MATCH_BONUS * matches as f64,
                    ..Default::default()
                };
                (candidate, signals)
            })
            .collect();

        let programs: Vec<ProgramMatch> = CompositeScorer::new(SimilarityPolicy)
            .rank(scored, preferences.top_n, |c: &ProgramCandidate<'_>| {
                c.university.name.as_str()
            })
            .into_iter()
            .map(|scored| {
                let ProgramCandidate {
                    university,
                    program,
                    ..
                } = scored.item;
                ProgramMatch {
                    program_id: program.id,
                    degree_name: parse_titles(&program.titles)
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| "N/A".to_string()),
                    university: university.name.clone(),
                    language: program.language.clone(),
                    country: university.country.clone(),
                    degree_type: program.degree_type.as_str().to_string(),
                    score: scored.score,
                }
            })
            .collect();

        let unlinked_courses = self.unlinked_courses(&learner_text, preferences.top_n);
        debug!(
            programs = programs.len(),
            unlinked = unlinked_courses.len(),
            "personalized matches ranked"
        );

        PersonalizedOutcome::Recommended {
            programs,
            unlinked_courses,
            skills_by_category: self.skills_by_category(&learner),
        }
    }

    /// Courses attached to no program, ranked by skill similarity.
    fn unlinked_courses(&self, learner_text: &str, top_n: usize) -> Vec<CourseMatch> {
        let candidates: Vec<(&University, &Course, String)> = self
            .data
            .universities()
            .iter()
            .flat_map(|u| u.courses.iter().map(move |c| (u, c)))
            .filter(|(_, c)| c.program_id.is_none())
            .filter_map(|(u, c)| {
                let document = skill_document(c.skills.iter().map(|s| s.name.as_str()));
                (!document.is_empty()).then_some((u, c, document))
            })
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let documents: Vec<&str> = candidates.iter().map(|(_, _, d)| d.as_str()).collect();
        let sims = similarities(learner_text, &documents);
        let scored: Vec<((&University, &Course), Signals)> = candidates
            .iter()
            .zip(sims)
            .map(|((u, c, _), similarity)| {
                (
                    (*u, *c),
                    Signals {
                        similarity,
                        ..Default::default()
                    },
                )
            })
            .collect();

        CompositeScorer::new(SimilarityPolicy)
            .rank(scored, top_n, |(_, c): &(&University, &Course)| c.name.as_str())
            .into_iter()
            .map(|scored| {
                let (university, course) = scored.item;
                CourseMatch {
                    course_id: course.id,
                    course_name: course.name.clone(),
                    university: university.name.clone(),
                    score: scored.score,
                }
            })
            .collect()
    }

    /// Learner skills grouped under the first category of the first catalog
    /// skill whose name contains them.
    fn skills_by_category(&self, learner: &[String]) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for skill in learner {
            let category = self
                .data
                .universities()
                .iter()
                .flat_map(|u| u.courses.iter())
                .flat_map(|c| c.skills.iter())
                .find(|s| s.name.to_lowercase().contains(skill.as_str()))
                .and_then(|s| s.categories.first().cloned())
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            grouped.entry(category).or_default().insert(skill.clone());
        }
        grouped
            .into_iter()
            .map(|(category, skills)| (category, skills.into_iter().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_are_substring_and_case_insensitive() {
        let filter = Some("greece".to_string());
        assert!(admits(&filter, Some("Greece")));
        assert!(admits(&Some("eng".into()), Some("English, Greek")));
        assert!(!admits(&filter, None));
        assert!(admits(&None, None));
        assert!(admits(&Some("  ".into()), Some("Italy")));
    }

    #[test]
    fn exact_match_ignores_case_only() {
        assert!(exact(&Some("msc".into()), Some("MSc")));
        assert!(!exact(&Some("ms".into()), Some("MSc")));
        assert!(!exact(&None, Some("MSc")));
    }

    #[test]
    fn preferences_default_top_n() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"target_skills": ["Python"]}"#).unwrap();
        assert_eq!(prefs.top_n, 10);
        assert!(prefs.country.is_none());
    }
}
