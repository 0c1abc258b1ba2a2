//! # Error Suggestions
//!
//! Helpers that turn bare failures into messages that also say how to fix
//! them: a misspelt metadata key gets the closest valid key, a missing
//! startup parameter gets the flag and environment variable that provide it.

use crate::config::{GROUP_KEYS, OPTIONAL_KEYS, REQUIRED_KEYS};

/// Hint for an unrecognized key in a repository record.
pub fn unknown_record_key(key: &str) -> String {
    let candidates: Vec<&str> = REQUIRED_KEYS.iter().chain(OPTIONAL_KEYS).copied().collect();
    unknown_key(key, &candidates)
}

/// Hint for an unrecognized key in a group's `default` block.
pub fn unknown_default_key(key: &str) -> String {
    let candidates: Vec<&str> = REQUIRED_KEYS
        .iter()
        .chain(OPTIONAL_KEYS)
        .chain(GROUP_KEYS)
        .copied()
        .collect();
    unknown_key(key, &candidates)
}

fn unknown_key(key: &str, candidates: &[&str]) -> String {
    match find_similar(key, candidates) {
        Some(similar) => format!("Did you mean '{}'?", similar),
        None => format!("Valid keys are: {}", candidates.join(", ")),
    }
}

/// Hint for a startup parameter that was not supplied.
pub fn missing_setting(flag: &str, env: &str) -> String {
    format!("Pass {} or set the {} environment variable", flag, env)
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance, two rows at a time.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_record_key_suggests_similar() {
        let hint = unknown_record_key("relases");
        assert_eq!(hint, "Did you mean 'releases'?");
    }

    #[test]
    fn test_unknown_record_key_lists_valid_keys() {
        let hint = unknown_record_key("maintainer");
        assert!(hint.starts_with("Valid keys are:"));
        assert!(hint.contains("packaging_url"));
        assert!(hint.contains("cascade"));
        assert!(!hint.contains("parent"));
    }

    #[test]
    fn test_unknown_default_key_includes_group_keys() {
        assert_eq!(unknown_default_key("parnt"), "Did you mean 'parent'?");
        assert_eq!(unknown_default_key("tpe"), "Did you mean 'type'?");
    }

    #[test]
    fn test_missing_setting() {
        let hint = missing_setting("--jenkins-url", "JENKINS_URL");
        assert!(hint.contains("--jenkins-url"));
        assert!(hint.contains("JENKINS_URL"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("name", "name"), 0);
        assert_eq!(edit_distance("nam", "name"), 1);
        assert_eq!(edit_distance("", "type"), 4);
        assert_eq!(edit_distance("cascade", "cascades"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_find_similar() {
        let candidates = ["releases", "cascade", "name"];
        assert_eq!(find_similar("cascad", &candidates), Some("cascade"));
        assert_eq!(find_similar("nme", &candidates), Some("name"));
        assert_eq!(find_similar("upload", &candidates), None);
    }
}
