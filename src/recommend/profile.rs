//! Profiles: the normalized comparison unit built from an entity's owned
//! courses, skills and programs.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use serde::Serialize;
use tracing::debug;

use crate::{
    catalog::{Course, DataAccess, DegreeType, EntityId, University},
    util::title::{fold_key, parse_titles},
};

use super::overlap::key_set;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub skills: Vec<String>,
    pub skills_raw: Vec<String>,
    pub courses: Vec<String>,
    pub degrees: Vec<String>,
}

impl Profile {
    /// Whitespace-joined skills and courses, followed by degree titles when asked.
    pub fn document(&self, with_degrees: bool) -> String {
        let mut parts: Vec<&str> = self
            .skills
            .iter()
            .chain(self.courses.iter())
            .map(String::as_str)
            .collect();
        if with_degrees {
            parts.extend(self.degrees.iter().map(String::as_str));
        }
        parts.join(" ")
    }

    pub fn skill_keys(&self) -> BTreeSet<String> {
        key_set(&self.skills_raw)
    }

    pub fn degree_keys(&self) -> BTreeSet<String> {
        key_set(&self.degrees)
    }

    pub fn offers_degree(&self, title: &str) -> bool {
        let key = fold_key(title);
        self.degrees.iter().any(|d| fold_key(d) == key)
    }
}

/// Deduplicate case-insensitively (first spelling wins) and sort by folded key.
pub fn dedup_sorted<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut by_key: BTreeMap<String, String> = BTreeMap::new();
    for item in items {
        let display = item.as_ref().trim();
        let key = fold_key(display);
        if key.is_empty() {
            continue;
        }
        by_key.entry(key).or_insert_with(|| display.to_string());
    }
    by_key.into_values().collect()
}

fn course_skill_names<'a>(courses: impl Iterator<Item = &'a Course>) -> Vec<&'a str> {
    courses
        .flat_map(|course| course.skills.iter())
        .map(|skill| skill.name.as_str())
        .collect()
}

pub fn build_profile(university: &University) -> Profile {
    let skill_names = course_skill_names(university.courses.iter());
    let titles = university
        .programs
        .iter()
        .flat_map(|program| parse_titles(&program.titles));

    Profile {
        skills: dedup_sorted(&skill_names),
        skills_raw: dedup_sorted(&skill_names),
        courses: dedup_sorted(university.courses.iter().map(|c| c.name.as_str())),
        degrees: dedup_sorted(titles),
    }
}

/// Profiles memoized for the duration of one recommender call.
///
/// At most `capacity` profiles are retained; beyond that they are still built
/// and returned but not stored.
#[derive(Debug)]
pub struct ProfileCache {
    capacity: usize,
    entries: HashMap<EntityId, Arc<Profile>>,
}

impl ProfileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` when the entity does not exist.
    pub fn get_or_build<D>(&mut self, data: &D, id: EntityId) -> Option<Arc<Profile>>
    where
        D: DataAccess + ?Sized,
    {
        if let Some(profile) = self.entries.get(&id) {
            return Some(Arc::clone(profile));
        }

        let university = data.university(id)?;
        let profile = Arc::new(build_profile(university));
        if self.entries.len() < self.capacity {
            self.entries.insert(id, Arc::clone(&profile));
        } else {
            debug!(id, capacity = self.capacity, "profile cache full, not retaining");
        }
        Some(profile)
    }
}

/// One declared degree title of a program, with the program's courses and skills.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeProfile {
    pub university_id: EntityId,
    /// `None` for a synthetic target assembled from several programs.
    pub program_id: Option<EntityId>,
    pub title: String,
    pub degree_type: DegreeType,
    pub skills: Vec<String>,
    pub courses: Vec<String>,
}

impl DegreeProfile {
    pub fn document(&self) -> String {
        self.skills
            .iter()
            .chain(self.courses.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn skill_keys(&self) -> BTreeSet<String> {
        key_set(&self.skills)
    }

    pub fn course_keys(&self) -> BTreeSet<String> {
        key_set(&self.courses)
    }
}

pub fn degree_profiles(university: &University) -> Vec<DegreeProfile> {
    let mut profiles = Vec::new();

    for program in &university.programs {
        let titles = dedup_sorted(parse_titles(&program.titles));
        if titles.is_empty() {
            continue;
        }

        let courses: Vec<&Course> = university.program_courses(program.id).collect();
        let course_names = dedup_sorted(courses.iter().map(|c| c.name.as_str()));
        let skills = dedup_sorted(course_skill_names(courses.iter().copied()));

        for title in titles {
            profiles.push(DegreeProfile {
                university_id: university.id,
                program_id: Some(program.id),
                title,
                degree_type: program.degree_type,
                skills: skills.clone(),
                courses: course_names.clone(),
            });
        }
    }

    profiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CourseDetails, DegreeProgram, Skill, TitleField};

    fn course(id: EntityId, program_id: Option<EntityId>, name: &str, skills: &[&str]) -> Course {
        Course {
            id,
            university_id: 1,
            program_id,
            name: name.to_string(),
            language: None,
            skills: skills
                .iter()
                .enumerate()
                .map(|(i, s)| Skill::named(i as EntityId, *s))
                .collect(),
            is_elective: false,
            details: CourseDetails::default(),
        }
    }

    fn university() -> University {
        University {
            id: 1,
            name: "Aegean".into(),
            country: "GR".into(),
            courses: vec![
                course(1, Some(7), "Databases", &["SQL", "Python"]),
                course(2, Some(7), "databases ", &["sql", "Data Modeling"]),
                course(3, None, "Algorithms", &["python"]),
            ],
            programs: vec![DegreeProgram {
                id: 7,
                university_id: 1,
                degree_type: DegreeType::Bachelor,
                titles: TitleField::Text(r#"["BSc Computer Science", "bsc computer science"]"#.into()),
                language: None,
            }],
        }
    }

    fn strictly_sorted_by_key(items: &[String]) -> bool {
        items
            .windows(2)
            .all(|pair| fold_key(&pair[0]) < fold_key(&pair[1]))
    }

    #[test]
    fn profile_collections_are_deduplicated_and_sorted() {
        let profile = build_profile(&university());
        assert_eq!(profile.skills, vec!["Data Modeling", "Python", "SQL"]);
        assert_eq!(profile.courses, vec!["Algorithms", "Databases"]);
        assert_eq!(profile.degrees, vec!["BSc Computer Science"]);
        for list in [&profile.skills, &profile.skills_raw, &profile.courses, &profile.degrees] {
            assert!(strictly_sorted_by_key(list));
        }
    }

    #[test]
    fn document_joins_sections() {
        let profile = build_profile(&university());
        assert_eq!(
            profile.document(true),
            "Data Modeling Python SQL Algorithms Databases BSc Computer Science"
        );
        assert!(!profile.document(false).contains("BSc"));
    }

    #[test]
    fn cache_returns_same_profile_within_a_call() {
        let catalog = Catalog::new(vec![university()]);
        let mut cache = ProfileCache::new(8);
        let first = cache.get_or_build(&catalog, 1).unwrap();
        let second = cache.get_or_build(&catalog, 1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert!(cache.get_or_build(&catalog, 99).is_none());
    }

    #[test]
    fn full_cache_still_builds() {
        let catalog = Catalog::new(vec![university()]);
        let mut cache = ProfileCache::new(0);
        let first = cache.get_or_build(&catalog, 1).unwrap();
        let second = cache.get_or_build(&catalog, 1).unwrap();
        assert_eq!(*first, *second);
        assert!(cache.is_empty());
    }

    #[test]
    fn degree_profiles_follow_program_courses() {
        let profiles = degree_profiles(&university());
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].title, "BSc Computer Science");
        assert_eq!(profiles[0].courses, vec!["Databases"]);
        assert_eq!(profiles[0].skills, vec!["Data Modeling", "Python", "SQL"]);
        assert_eq!(profiles[0].program_id, Some(7));
    }
}
