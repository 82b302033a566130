//! Content hashes used as cache keys.

use blockade_core::Issue;

use crate::graph::build::short_hex;

/// Key separator between the content half and the config half.
const KEY_SEPARATOR: char = '|';

/// Hash of everything about the issues that can change analysis output.
///
/// Order-independent: issues are hashed sorted by ID, labels and
/// dependencies sorted within each issue. Returns `"empty"` for no issues.
#[must_use]
pub fn data_hash(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return "empty".to_string();
    }

    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = blake3::Hasher::new();
    for issue in sorted {
        for field in [issue.id.as_str(), issue.title.as_str(), issue.status.as_str()] {
            hasher.update(field.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(issue.priority.to_string().as_bytes());
        hasher.update(b"\0");

        let mut labels: Vec<&str> = issue.labels.iter().map(String::as_str).collect();
        labels.sort_unstable();
        for label in labels {
            hasher.update(label.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(b"\x01");

        let mut deps: Vec<(&str, &str)> = issue
            .dependencies
            .iter()
            .map(|d| (d.depends_on_id.as_str(), d.dep_type.as_str()))
            .collect();
        deps.sort_unstable();
        for (target, kind) in deps {
            hasher.update(target.as_bytes());
            hasher.update(b"\0");
            hasher.update(kind.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(b"\x02");
    }

    short_hex(&hasher.finalize())
}

/// Combine a content hash and a config hash into one cache key.
#[must_use]
pub fn cache_key(content_hash: &str, config_hash: &str) -> String {
    format!("{content_hash}{KEY_SEPARATOR}{config_hash}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockade_core::{DependencyType, Status};

    fn sample() -> Vec<Issue> {
        vec![
            Issue::new("a", "Alpha").blocked_by("b").with_label("x").with_label("y"),
            Issue::new("b", "Beta"),
        ]
    }

    #[test]
    fn empty_input_has_fixed_hash() {
        assert_eq!(data_hash(&[]), "empty");
    }

    #[test]
    fn order_does_not_matter() {
        let mut reversed = sample();
        reversed.reverse();
        reversed[1].labels.reverse();
        assert_eq!(data_hash(&sample()), data_hash(&reversed));
    }

    #[test]
    fn content_changes_change_the_hash() {
        let base = data_hash(&sample());

        let mut retitled = sample();
        retitled[1].title = "Gamma".to_string();
        assert_ne!(base, data_hash(&retitled));

        let mut closed = sample();
        closed[1].status = Status::Closed;
        assert_ne!(base, data_hash(&closed));

        let mut retyped = sample();
        retyped[0].dependencies[0].dep_type = DependencyType::Related;
        assert_ne!(base, data_hash(&retyped));
    }

    #[test]
    fn key_joins_both_halves() {
        assert_eq!(cache_key("abc", "def"), "abc|def");
        assert_eq!(data_hash(&sample()).len(), 16);
    }
}
