//! XML tree matching with `{{ ignore }}` and `{{ regex:... }}` leaf directives.

use super::xml::{parse_tree, XmlNode};
use crate::models::MatcherValue;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static IGNORE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{\{\s*ignore\s*\}\}\s*$").expect("valid ignore directive regex"));

static REGEX_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{\{\s*regex:(.*)\}\}\s*$").expect("valid regex directive regex"));

/// Compare the candidate against an XML template.
///
/// Sibling elements are matched unordered, each actual child consumed at most
/// once. Leaf text is compared literally unless the whole text node is a
/// directive.
pub fn xml_templated_match(value: &MatcherValue, candidate: &str) -> bool {
    let Some(template) = value.as_str() else {
        return false;
    };
    match (parse_tree(template), parse_tree(candidate)) {
        (Some(expected), Some(actual)) => compare_tree(&expected, &actual),
        _ => false,
    }
}

fn compare_tree(expected: &XmlNode, actual: &XmlNode) -> bool {
    if expected.tag != actual.tag {
        return false;
    }
    if expected.is_leaf() {
        return compare_value(&expected.text, &actual.text);
    }

    let mut remaining: Vec<&XmlNode> = actual.children.iter().collect();
    for child in &expected.children {
        match remaining.iter().position(|candidate| compare_tree(child, candidate)) {
            Some(idx) => {
                remaining.remove(idx);
            }
            None => return false,
        }
    }
    remaining.is_empty()
}

fn compare_value(expected: &str, actual: &str) -> bool {
    if IGNORE_DIRECTIVE.is_match(expected) {
        return true;
    }
    if let Some(captures) = REGEX_DIRECTIVE.captures(expected) {
        let pattern = captures.get(1).map_or("", |m| m.as_str().trim());
        return match Regex::new(pattern) {
            Ok(regex) => regex.is_match(actual),
            Err(e) => {
                debug!("Invalid regex directive '{}': {}", pattern, e);
                false
            }
        };
    }
    expected == actual
}
