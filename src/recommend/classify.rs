use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static MASTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(masters?|msc|m\.sc|ma)\b").expect("valid master pattern"));
static DOCTORATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(phd|ph\.d|doctorate|doctoral)\b").expect("valid doctorate pattern")
});

/// Level of a degree as inferred from its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DegreeLevel {
    #[serde(rename = "BSc/BA")]
    Bachelor,
    #[serde(rename = "MSc/MA")]
    Master,
    #[serde(rename = "PhD")]
    Doctorate,
}

impl DegreeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegreeLevel::Bachelor => "BSc/BA",
            DegreeLevel::Master => "MSc/MA",
            DegreeLevel::Doctorate => "PhD",
        }
    }
}

/// Whole-word keyword match; titles that name no level are treated as bachelor's.
pub fn classify(title: &str) -> DegreeLevel {
    let lowered = title.to_lowercase();
    if MASTER.is_match(&lowered) {
        DegreeLevel::Master
    } else if DOCTORATE.is_match(&lowered) {
        DegreeLevel::Doctorate
    } else {
        DegreeLevel::Bachelor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_map_to_levels() {
        assert_eq!(classify("MSc Data Science"), DegreeLevel::Master);
        assert_eq!(classify("Master of Arts in History"), DegreeLevel::Master);
        assert_eq!(classify("Masters in Finance"), DegreeLevel::Master);
        assert_eq!(classify("MA Philosophy"), DegreeLevel::Master);
        assert_eq!(classify("PhD in Physics"), DegreeLevel::Doctorate);
        assert_eq!(classify("Doctoral Programme in Law"), DegreeLevel::Doctorate);
        assert_eq!(classify("BSc Computer Science"), DegreeLevel::Bachelor);
    }

    #[test]
    fn substrings_do_not_match() {
        assert_eq!(classify("Pharmacy"), DegreeLevel::Bachelor);
        assert_eq!(classify("BSc Pharma Sciences"), DegreeLevel::Bachelor);
        assert_eq!(classify("Mathematics"), DegreeLevel::Bachelor);
    }

    #[test]
    fn labels() {
        assert_eq!(DegreeLevel::Master.as_str(), "MSc/MA");
        assert_eq!(
            serde_json::to_string(&DegreeLevel::Bachelor).unwrap(),
            "\"BSc/BA\""
        );
    }
}
