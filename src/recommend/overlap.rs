use std::collections::BTreeSet;

use crate::util::title::fold_key;

/// Case-folded key set of `items`.
pub fn key_set<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| fold_key(item.as_ref()))
        .filter(|key| !key.is_empty())
        .collect()
}

/// Smoothed overlap `|A ∩ B| / (|A ∪ B| + 1)`.
///
/// The `+1` keeps tiny sets from reaching a perfect score and makes two empty
/// sets score 0.
pub fn compatibility(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / (union + 1.0)
}

/// Items of `items` whose key is in `keys`, keeping display form and order.
pub fn shared<'a, S: AsRef<str>>(items: &'a [S], keys: &BTreeSet<String>) -> Vec<&'a str> {
    items
        .iter()
        .map(|item| item.as_ref())
        .filter(|item| keys.contains(&fold_key(item)))
        .collect()
}

/// Items of `items` whose key is NOT in `keys`, keeping display form and order.
pub fn missing<'a, S: AsRef<str>>(items: &'a [S], keys: &BTreeSet<String>) -> Vec<&'a str> {
    items
        .iter()
        .map(|item| item.as_ref())
        .filter(|item| !keys.contains(&fold_key(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn smoothing_keeps_identical_small_sets_below_one() {
        let a = key_set(["Python"]);
        let b = key_set(["python"]);
        assert!((compatibility(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn three_of_four_shared() {
        let target = key_set(["Python", "SQL", "Statistics"]);
        let course = key_set(["python", "sql", "statistics", "data visualization"]);
        assert!((compatibility(&target, &course) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn empty_sets_score_zero() {
        let empty = BTreeSet::new();
        assert_eq!(compatibility(&empty, &empty), 0.0);
    }

    #[test]
    fn shared_and_missing_keep_display_form() {
        let keys = key_set(["sql"]);
        let items = vec!["SQL".to_string(), "Python".to_string()];
        assert_eq!(shared(&items, &keys), vec!["SQL"]);
        assert_eq!(missing(&items, &keys), vec!["Python"]);
    }

    proptest! {
        #[test]
        fn compatibility_stays_in_unit_range(
            a in proptest::collection::btree_set("[a-e]{1,2}", 0..8),
            b in proptest::collection::btree_set("[a-e]{1,2}", 0..8),
        ) {
            let score = compatibility(&a, &b);
            prop_assert!((0.0..1.0).contains(&score));
        }
    }
}
