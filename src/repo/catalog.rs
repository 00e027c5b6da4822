//! Snapshot loader: reads the whole entity graph and converts the loosely typed
//! JSON columns into catalog types.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::{Executor, PgPool};
use tracing::debug;

use crate::catalog::{
    Catalog, Course, CourseDetails, DegreeProgram, DegreeType, EntityId, Skill, TitleField,
    University,
};

#[derive(Debug, sqlx::FromRow)]
struct UniversityRow {
    id: i64,
    name: String,
    country: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProgramRow {
    id: i64,
    university_id: i64,
    degree_type: String,
    degree_titles: Option<Value>,
    language: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: i64,
    university_id: i64,
    program_id: Option<i64>,
    lesson_name: String,
    language: Option<String>,
    mand_opt_list: Option<Value>,
    description: Option<String>,
    objectives: Option<String>,
    learning_outcomes: Option<String>,
    course_content: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct CourseSkillRow {
    course_id: i64,
    skill_id: i64,
    skill_name: String,
    esco_id: Option<String>,
    esco_level: Option<String>,
    categories: Option<Value>,
}

/// A course is elective when its mandatory/optional marker mentions "optional".
pub(crate) fn is_elective(mand_opt: Option<&Value>) -> bool {
    match mand_opt {
        Some(Value::String(text)) => text.to_lowercase().contains("optional"),
        Some(Value::Array(items)) => items.iter().any(|item| {
            let text = match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            text.to_lowercase().contains("optional")
        }),
        _ => false,
    }
}

/// Category labels from a link row: strings verbatim, objects by `preferredLabel`.
pub(crate) fn categories(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => map
                .get("preferredLabel")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

pub async fn load_snapshot(pool: &PgPool) -> Result<Catalog, sqlx::Error> {
    let mut tx = pool.begin().await?;
    tx.execute("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .await?;

    let universities = sqlx::query_as::<_, UniversityRow>(
        r#"
        SELECT id, name, country
        FROM academic.universities
        ORDER BY id
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let programs = sqlx::query_as::<_, ProgramRow>(
        r#"
        SELECT id, university_id, degree_type, degree_titles, language
        FROM academic.degree_programs
        ORDER BY id
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let courses = sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT id,
               university_id,
               program_id,
               lesson_name,
               language,
               mand_opt_list,
               description,
               objectives,
               learning_outcomes,
               course_content
        FROM academic.courses
        ORDER BY id
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let links = sqlx::query_as::<_, CourseSkillRow>(
        r#"
        SELECT cs.course_id,
               cs.skill_id,
               s.skill_name,
               s.esco_id,
               s.esco_level,
               cs.categories
        FROM academic.course_skills cs
        JOIN academic.skills s ON s.id = cs.skill_id
        ORDER BY cs.course_id, s.skill_name
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(
        universities = universities.len(),
        programs = programs.len(),
        courses = courses.len(),
        links = links.len(),
        "catalog snapshot loaded"
    );

    Ok(assemble(universities, programs, courses, links))
}

fn assemble(
    universities: Vec<UniversityRow>,
    programs: Vec<ProgramRow>,
    courses: Vec<CourseRow>,
    links: Vec<CourseSkillRow>,
) -> Catalog {
    let mut skills_by_course: HashMap<EntityId, Vec<Skill>> = HashMap::new();
    for link in links {
        skills_by_course.entry(link.course_id).or_default().push(Skill {
            id: link.skill_id,
            name: link.skill_name,
            taxonomy_id: link.esco_id,
            level: link.esco_level,
            categories: categories(link.categories.as_ref()),
        });
    }

    let mut programs_by_university: HashMap<EntityId, Vec<DegreeProgram>> = HashMap::new();
    for row in programs {
        programs_by_university
            .entry(row.university_id)
            .or_default()
            .push(DegreeProgram {
                id: row.id,
                university_id: row.university_id,
                degree_type: DegreeType::from_label(&row.degree_type),
                titles: TitleField::from_json(row.degree_titles),
                language: row.language,
            });
    }

    let mut courses_by_university: HashMap<EntityId, Vec<Course>> = HashMap::new();
    for row in courses {
        courses_by_university
            .entry(row.university_id)
            .or_default()
            .push(Course {
                id: row.id,
                university_id: row.university_id,
                program_id: row.program_id,
                is_elective: is_elective(row.mand_opt_list.as_ref()),
                skills: skills_by_course.remove(&row.id).unwrap_or_default(),
                name: row.lesson_name,
                language: row.language,
                details: CourseDetails {
                    description: row.description,
                    objectives: row.objectives,
                    learning_outcomes: row.learning_outcomes,
                    course_content: row.course_content,
                },
            });
    }

    Catalog::new(
        universities
            .into_iter()
            .map(|row| University {
                courses: courses_by_university.remove(&row.id).unwrap_or_default(),
                programs: programs_by_university.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                country: row.country,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataAccess;
    use serde_json::json;

    #[test]
    fn elective_marker_shapes() {
        assert!(is_elective(Some(&json!("Optional"))));
        assert!(is_elective(Some(&json!(["Compulsory", "optional (B)"]))));
        assert!(!is_elective(Some(&json!(["Compulsory"]))));
        assert!(!is_elective(Some(&Value::Null)));
        assert!(!is_elective(None));
    }

    #[test]
    fn category_labels() {
        let value = json!(["ICT", {"preferredLabel": "Data"}, 3, "  "]);
        assert_eq!(categories(Some(&value)), vec!["ICT", "Data"]);
        assert!(categories(Some(&json!("ICT"))).is_empty());
    }

    #[test]
    fn rows_assemble_into_owned_graph() {
        let catalog = assemble(
            vec![UniversityRow {
                id: 3,
                name: "Patras".into(),
                country: "Greece".into(),
            }],
            vec![ProgramRow {
                id: 30,
                university_id: 3,
                degree_type: "MSc".into(),
                degree_titles: Some(json!("[\"MSc Data Science\"]")),
                language: Some("English".into()),
            }],
            vec![CourseRow {
                id: 300,
                university_id: 3,
                program_id: Some(30),
                lesson_name: "Machine Learning".into(),
                language: None,
                mand_opt_list: Some(json!(["Optional"])),
                description: Some("Supervised learning".into()),
                objectives: None,
                learning_outcomes: None,
                course_content: None,
            }],
            vec![CourseSkillRow {
                course_id: 300,
                skill_id: 9,
                skill_name: "Python".into(),
                esco_id: None,
                esco_level: None,
                categories: Some(json!(["ICT"])),
            }],
        );

        let university = catalog.university(3).unwrap();
        assert_eq!(university.programs[0].degree_type, DegreeType::Master);
        assert_eq!(
            university.programs[0].titles,
            TitleField::Text("[\"MSc Data Science\"]".into())
        );
        let course = &university.courses[0];
        assert!(course.is_elective);
        assert_eq!(course.skills[0].name, "Python");
        assert_eq!(course.skills[0].categories, vec!["ICT"]);
    }
}
