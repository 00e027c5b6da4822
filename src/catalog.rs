//! In-memory snapshot of the academic entity graph and the data-access seam the
//! recommender reads through.

use serde::Serialize;

pub type EntityId = i64;

/// Raw degree-title field as stored upstream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TitleField {
    #[default]
    Missing,
    Text(String),
    List(Vec<String>),
}

impl TitleField {
    /// Interpret a JSON column value. Arrays keep their string elements verbatim;
    /// strings stay textual so the normalizer can still try to decode them.
    pub fn from_json(value: Option<serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => TitleField::Missing,
            Some(serde_json::Value::String(text)) => TitleField::Text(text),
            Some(serde_json::Value::Array(items)) => TitleField::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::Null => None,
                        serde_json::Value::String(s) => Some(s),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            ),
            Some(other) => TitleField::Text(other.to_string()),
        }
    }
}

/// Stored program type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DegreeType {
    #[serde(rename = "BSc")]
    Bachelor,
    #[serde(rename = "MSc")]
    Master,
    #[serde(rename = "PhD")]
    Doctorate,
    Other,
}

impl DegreeType {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "bsc" | "ba" | "bachelor" => DegreeType::Bachelor,
            "msc" | "ma" | "master" => DegreeType::Master,
            "phd" | "doctorate" => DegreeType::Doctorate,
            _ => DegreeType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DegreeType::Bachelor => "BSc",
            DegreeType::Master => "MSc",
            DegreeType::Doctorate => "PhD",
            DegreeType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skill {
    pub id: EntityId,
    pub name: String,
    pub taxonomy_id: Option<String>,
    pub level: Option<String>,
    pub categories: Vec<String>,
}

impl Skill {
    pub fn named(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            taxonomy_id: None,
            level: None,
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseDetails {
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub learning_outcomes: Option<String>,
    pub course_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: EntityId,
    pub university_id: EntityId,
    pub program_id: Option<EntityId>,
    pub name: String,
    pub language: Option<String>,
    pub skills: Vec<Skill>,
    pub is_elective: bool,
    pub details: CourseDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DegreeProgram {
    pub id: EntityId,
    pub university_id: EntityId,
    pub degree_type: DegreeType,
    pub titles: TitleField,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct University {
    pub id: EntityId,
    pub name: String,
    pub country: String,
    pub courses: Vec<Course>,
    pub programs: Vec<DegreeProgram>,
}

impl University {
    pub fn program(&self, program_id: EntityId) -> Option<&DegreeProgram> {
        self.programs.iter().find(|p| p.id == program_id)
    }

    /// Courses owned by one of this university's programs.
    pub fn program_courses(&self, program_id: EntityId) -> impl Iterator<Item = &Course> {
        self.courses
            .iter()
            .filter(move |c| c.program_id == Some(program_id))
    }
}

/// Read access to the entity graph.
pub trait DataAccess {
    fn university(&self, id: EntityId) -> Option<&University>;

    fn universities(&self) -> &[University];

    /// First course carrying exactly `name`, optionally restricted to one university.
    fn course_by_name(&self, name: &str, university_id: Option<EntityId>) -> Option<&Course> {
        self.universities()
            .iter()
            .filter(|u| university_id.map_or(true, |id| u.id == id))
            .flat_map(|u| u.courses.iter())
            .find(|c| c.name == name)
    }
}

/// Point-in-time copy of every university with its owned graph.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    universities: Vec<University>,
}

impl Catalog {
    pub fn new(mut universities: Vec<University>) -> Self {
        universities.sort_by_key(|u| u.id);
        Self { universities }
    }

    pub fn len(&self) -> usize {
        self.universities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universities.is_empty()
    }
}

impl DataAccess for Catalog {
    fn university(&self, id: EntityId) -> Option<&University> {
        self.universities
            .binary_search_by_key(&id, |u| u.id)
            .ok()
            .map(|idx| &self.universities[idx])
    }

    fn universities(&self) -> &[University] {
        &self.universities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_field_from_json_shapes() {
        assert_eq!(TitleField::from_json(None), TitleField::Missing);
        assert_eq!(
            TitleField::from_json(Some(serde_json::json!("BSc Physics"))),
            TitleField::Text("BSc Physics".into())
        );
        assert_eq!(
            TitleField::from_json(Some(serde_json::json!(["MSc AI", null, 7]))),
            TitleField::List(vec!["MSc AI".into(), "7".into()])
        );
    }

    #[test]
    fn degree_type_labels_are_lenient() {
        assert_eq!(DegreeType::from_label(" msc "), DegreeType::Master);
        assert_eq!(DegreeType::from_label("PhD"), DegreeType::Doctorate);
        assert_eq!(DegreeType::from_label("diploma"), DegreeType::Other);
    }

    #[test]
    fn catalog_lookup_and_course_search() {
        let course = Course {
            id: 10,
            university_id: 2,
            program_id: Some(5),
            name: "Databases".into(),
            language: None,
            skills: vec![Skill::named(1, "SQL")],
            is_elective: false,
            details: CourseDetails::default(),
        };
        let catalog = Catalog::new(vec![
            University {
                id: 2,
                name: "North".into(),
                country: "GR".into(),
                courses: vec![course],
                programs: Vec::new(),
            },
            University {
                id: 1,
                name: "South".into(),
                country: "GR".into(),
                courses: Vec::new(),
                programs: Vec::new(),
            },
        ]);

        assert_eq!(catalog.university(2).map(|u| u.name.as_str()), Some("North"));
        assert!(catalog.university(3).is_none());
        assert!(catalog.course_by_name("Databases", None).is_some());
        assert!(catalog.course_by_name("Databases", Some(1)).is_none());
        assert_eq!(
            catalog.university(2).map(|u| u.program_courses(5).count()),
            Some(1)
        );
    }
}
