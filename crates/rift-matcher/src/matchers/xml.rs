//! XML equality and XPath matching.

use crate::models::MatcherValue;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;
use sxd_xpath::{evaluate_xpath, Value};
use tracing::debug;

/// Owned element tree used for structural comparisons.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct XmlNode {
    pub tag: String,
    /// Sorted by name
    pub attributes: Vec<(String, String)>,
    /// Concatenated direct text content
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn from_element(element: Element<'_>) -> Self {
        let name = element.name();
        let tag = match name.namespace_uri() {
            Some(ns) => format!("{{{ns}}}{}", name.local_part()),
            None => name.local_part().to_string(),
        };

        let mut attributes: Vec<(String, String)> = element
            .attributes()
            .into_iter()
            .map(|attr| (attr.name().local_part().to_string(), attr.value().to_string()))
            .collect();
        attributes.sort();

        let mut text = String::new();
        let mut children = Vec::new();
        for child in element.children() {
            match child {
                ChildOfElement::Element(e) => children.push(XmlNode::from_element(e)),
                ChildOfElement::Text(t) => text.push_str(t.text()),
                _ => {}
            }
        }

        Self {
            tag,
            attributes,
            text,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Canonical equality: tag, attributes, trimmed text and ordered children.
    fn canonical_eq(&self, other: &XmlNode) -> bool {
        self.tag == other.tag
            && self.attributes == other.attributes
            && self.text.trim() == other.text.trim()
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.canonical_eq(b))
    }
}

/// Parse a document and return its root element as an owned tree.
pub(super) fn parse_tree(xml: &str) -> Option<XmlNode> {
    let package = match parser::parse(xml) {
        Ok(package) => package,
        Err(_) => {
            debug!("Failed to parse XML document");
            return None;
        }
    };
    let document = package.as_document();
    let root = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(e) => Some(e),
            _ => None,
        })?;
    Some(XmlNode::from_element(root))
}

/// Structural XML equality, insensitive to formatting whitespace and attribute order.
pub fn xml_match(value: &MatcherValue, candidate: &str) -> bool {
    let Some(expected) = value.as_str() else {
        return false;
    };
    match (parse_tree(expected), parse_tree(candidate)) {
        (Some(expected), Some(actual)) => expected.canonical_eq(&actual),
        _ => false,
    }
}

/// Evaluate an XPath expression; a non-empty node set, `true`, a non-empty
/// string or any number is a match.
pub fn xpath_match(value: &MatcherValue, candidate: &str) -> Option<String> {
    let expression = value.as_str()?;
    let package = parser::parse(candidate).ok()?;
    let document = package.as_document();

    let result = match evaluate_xpath(&document, expression) {
        Ok(result) => result,
        Err(e) => {
            debug!("Failed to evaluate XPath '{}': {}", expression, e);
            return None;
        }
    };

    let extracted = match result {
        Value::Nodeset(nodes) => nodes.document_order_first().map(|node| node.string_value()),
        Value::Boolean(true) => Some("true".to_string()),
        Value::Boolean(false) => None,
        Value::String(s) if !s.is_empty() => Some(s),
        Value::String(_) => None,
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(format!("{}", n as i64)),
        Value::Number(n) => Some(n.to_string()),
    };
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<library>
    <book id="1" lang="en"><title>Rust</title><price>30</price></book>
    <book id="2"><title>Go</title><price>25</price></book>
</library>"#;

    #[test]
    fn test_xml_match_ignores_formatting() {
        let compact = r#"<a x="1" y="2"><b>text</b><c/></a>"#;
        let spaced = "<a y=\"2\" x=\"1\">\n  <b>text</b>\n  <c></c>\n</a>";
        assert!(xml_match(&compact.into(), spaced));
    }

    #[test]
    fn test_xml_match_differences() {
        assert!(!xml_match(&"<a><b>1</b></a>".into(), "<a><b>2</b></a>"));
        assert!(!xml_match(&"<a><b/><c/></a>".into(), "<a><c/><b/></a>"));
        assert!(!xml_match(&"<a x=\"1\"/>".into(), "<a/>"));
        assert!(!xml_match(&"<a>".into(), "<a/>"));
        assert!(!xml_match(&vec!["<a/>"].into(), "<a/>"));
    }

    #[test]
    fn test_xpath_nodeset() {
        assert_eq!(
            xpath_match(&"/library/book[@id='2']/title".into(), DOC),
            Some("Go".to_string())
        );
        assert_eq!(xpath_match(&"/library/magazine".into(), DOC), None);
    }

    #[test]
    fn test_xpath_scalar_results() {
        assert_eq!(
            xpath_match(&"count(//book)".into(), DOC),
            Some("2".to_string())
        );
        assert!(xpath_match(&"//book/price > 26".into(), DOC).is_some());
        assert!(xpath_match(&"//book/price > 100".into(), DOC).is_none());
        assert_eq!(
            xpath_match(&"string(//book[@lang='en']/title)".into(), DOC),
            Some("Rust".to_string())
        );
    }

    #[test]
    fn test_xpath_invalid_input() {
        assert_eq!(xpath_match(&"//book".into(), "<broken"), None);
        assert_eq!(xpath_match(&"//[".into(), DOC), None);
    }
}
