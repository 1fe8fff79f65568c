//! Plain string matchers: exact, glob and negation.

use crate::models::MatcherValue;

pub(super) fn exact_match(value: &MatcherValue, candidate: &str) -> bool {
    value.as_str().is_some_and(|expected| expected == candidate)
}

/// Succeeds when the candidate differs from the value. A missing or non-string
/// value negates nothing and always succeeds.
pub(super) fn negation_match(value: &MatcherValue, candidate: &str) -> bool {
    match value.as_str() {
        Some(expected) => expected != candidate,
        None => true,
    }
}

pub(super) fn glob_match(value: &MatcherValue, candidate: &str) -> bool {
    value
        .as_str()
        .is_some_and(|pattern| glob(pattern, candidate))
}

/// Case-sensitive glob where `*` matches any run of characters.
pub fn glob(pattern: &str, subject: &str) -> bool {
    if pattern.is_empty() {
        return subject == pattern;
    }
    if pattern == "*" {
        return true;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return subject == pattern;
    }

    let leading = !pattern.starts_with('*');
    let trailing = !pattern.ends_with('*');
    let last = parts.len() - 1;
    let mut subject = subject;

    for (i, part) in parts.iter().enumerate() {
        if i == 0 && leading {
            match subject.strip_prefix(part) {
                Some(rest) => subject = rest,
                None => return false,
            }
        } else if i == last && trailing {
            return subject.ends_with(part);
        } else if !part.is_empty() {
            match subject.find(part) {
                Some(idx) => subject = &subject[idx + part.len()..],
                None => return false,
            }
        }
    }

    true
}
