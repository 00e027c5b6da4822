use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct UniversityOut {
    pub university_id: i64,
    pub university_name: String,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct ProgramOut {
    pub program_id: i64,
    pub degree_type: String,
    pub degree_titles: Vec<String>,
    pub language: Option<String>,
    pub duration_semesters: Option<String>,
    pub total_ects: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetricsOut {
    pub university_id: i64,
    pub total_programs: i64,
    pub recognized_skills: i64,
}

#[derive(Debug, Serialize)]
pub struct SkillOut {
    pub skill_id: i64,
    pub skill_name: String,
    pub taxonomy_id: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DegreeSuggestionsResp<T> {
    pub university_id: i64,
    pub suggestions: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TopNQuery {
    pub top_n: usize,
}

impl Default for TopNQuery {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CourseQuery {
    pub top_n_courses: usize,
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self { top_n_courses: 10 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ElectiveQuery {
    pub min_overlap_ratio: f64,
}

impl Default for ElectiveQuery {
    fn default() -> Self {
        Self {
            min_overlap_ratio: 0.1,
        }
    }
}

fn default_elective_top_n() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct ElectiveRequest {
    pub program_id: i64,
    pub target_skills: Vec<String>,
    #[serde(default = "default_elective_top_n")]
    pub top_n: usize,
}

/// Optional weight overrides for degree suggestions, keyed by signal name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DegreeWeightsPayload {
    pub weights: HashMap<String, f64>,
}
