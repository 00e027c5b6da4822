use crate::catalog::TitleField;

fn is_greek(ch: char) -> bool {
    matches!(ch, '\u{0370}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}')
}

/// Strip a degree title down to ASCII letters, digits, space, `-`, `&` and Greek letters.
pub fn clean_title(title: &str) -> String {
    title
        .chars()
        .filter(|ch| {
            ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '&') || is_greek(*ch)
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Expand a raw title field into cleaned, non-empty titles.
///
/// A textual field holding a JSON array contributes each element; a JSON scalar
/// contributes itself; anything that fails to parse is taken as one literal title.
pub fn parse_titles(field: &TitleField) -> Vec<String> {
    let candidates: Vec<String> = match field {
        TitleField::Missing => Vec::new(),
        TitleField::List(items) => items.clone(),
        TitleField::Text(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(items)) => {
                items.iter().filter_map(json_scalar_to_string).collect()
            }
            Ok(value) => json_scalar_to_string(&value).into_iter().collect(),
            Err(_) => vec![raw.clone()],
        },
    };

    candidates
        .iter()
        .map(|title| clean_title(title))
        .filter(|title| !title.is_empty())
        .collect()
}

fn json_scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Canonical form for equality checks across entities. Never shown to users.
pub fn canonicalize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || ch.is_whitespace() || is_greek(*ch))
        .collect();

    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Normalize a learner-supplied or course skill token.
pub fn normalize_skill(skill: &str) -> String {
    skill
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| {
            ch.is_ascii_lowercase()
                || ch.is_ascii_digit()
                || ch.is_whitespace()
                || matches!(ch, '-' | '+' | '.' | '#')
                || is_greek(*ch)
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Case-folded key used to deduplicate and compare display strings:
/// lowercase with whitespace runs collapsed.
pub fn fold_key(value: &str) -> String {
    let mut folded = String::with_capacity(value.len());
    let mut space_pending = false;

    for ch in value.trim().chars() {
        if ch.is_whitespace() {
            if !space_pending {
                folded.push(' ');
                space_pending = true;
            }
        } else {
            for lower in ch.to_lowercase() {
                folded.push(lower);
            }
            space_pending = false;
        }
    }

    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn json_encoded_list_yields_each_title() {
        let field = TitleField::Text(r#"["MSc Data Science"]"#.to_string());
        assert_eq!(parse_titles(&field), vec!["MSc Data Science".to_string()]);
    }

    #[test]
    fn unparseable_text_is_one_literal_title() {
        let field = TitleField::Text("BSc Computer Science (Hons.)".to_string());
        assert_eq!(
            parse_titles(&field),
            vec!["BSc Computer Science Hons".to_string()]
        );
    }

    #[test]
    fn json_scalar_and_nulls() {
        let scalar = TitleField::Text(r#""PhD Physics""#.to_string());
        assert_eq!(parse_titles(&scalar), vec!["PhD Physics".to_string()]);

        let mixed = TitleField::Text(r#"[null, "", "!!", "BA History"]"#.to_string());
        assert_eq!(parse_titles(&mixed), vec!["BA History".to_string()]);
    }

    #[test]
    fn list_and_missing() {
        let list = TitleField::List(vec!["Μηχανική Λογισμικού".into(), "R&D - Ops".into()]);
        assert_eq!(
            parse_titles(&list),
            vec!["Μηχανική Λογισμικού".to_string(), "R&D - Ops".to_string()]
        );
        assert!(parse_titles(&TitleField::Missing).is_empty());
    }

    #[test]
    fn diacritics_are_stripped_from_latin_titles() {
        assert_eq!(clean_title("  Génie Civil  "), "Gnie Civil");
    }

    #[test]
    fn canonical_form_ignores_case_and_punctuation() {
        assert_eq!(
            canonicalize("BSc. Computer   Science!"),
            canonicalize("bsc computer science")
        );
        assert_eq!(canonicalize("bsc computer science"), "BSC COMPUTER SCIENCE");
    }

    #[test]
    fn skill_normalization_keeps_language_symbols() {
        assert_eq!(normalize_skill("  C++ "), "c++");
        assert_eq!(normalize_skill("C#"), "c#");
        assert_eq!(normalize_skill("Node.js (Advanced)"), "node.js advanced");
        assert_eq!(normalize_skill("***"), "");
    }

    #[test]
    fn fold_key_collapses_whitespace() {
        assert_eq!(fold_key("  Machine   Learning "), "machine learning");
    }

    proptest! {
        #[test]
        fn clean_title_is_idempotent(title in "\\PC{0,40}") {
            let once = clean_title(&title);
            prop_assert_eq!(clean_title(&once), once);
        }

        #[test]
        fn fold_key_is_idempotent(value in "\\PC{0,40}") {
            let once = fold_key(&value);
            prop_assert_eq!(fold_key(&once), once);
        }
    }
}
