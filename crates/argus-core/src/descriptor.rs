//! Element descriptors: how a step names the element it cares about.
//!
//! A descriptor is resolved against the live UI tree on every poll; it never
//! pins a particular DOM node. The matching rules below are shared by every
//! transport (the Chromium locator script mirrors them, the mock page calls
//! them directly):
//!
//! - whitespace is collapsed and trimmed before comparing,
//! - `exact` means equality, otherwise a case-insensitive substring match,
//! - `Text` resolves to the deepest element whose text matches,
//! - several matches resolve to the first in document order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies zero or one element in the current UI tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ElementDescriptor {
    /// Structural CSS query.
    Selector { value: String },
    /// Accessible role, optionally narrowed by accessible name.
    Role {
        role: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        exact: bool,
    },
    /// Visible text content.
    Text {
        value: String,
        #[serde(default)]
        exact: bool,
    },
    /// Form control labelled by `<label>`, `aria-label` or `aria-labelledby`.
    Label {
        value: String,
        #[serde(default)]
        exact: bool,
    },
    /// `inner` resolved inside the element matched by `scope`.
    Within {
        scope: Box<ElementDescriptor>,
        inner: Box<ElementDescriptor>,
    },
}

impl ElementDescriptor {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Selector {
            value: selector.into(),
        }
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
            exact: false,
        }
    }

    pub fn label(value: impl Into<String>) -> Self {
        Self::Label {
            value: value.into(),
            exact: false,
        }
    }

    /// Require exact (whitespace-normalised) equality instead of substring.
    pub fn exact(self) -> Self {
        match self {
            Self::Role { role, name, .. } => Self::Role {
                role,
                name,
                exact: true,
            },
            Self::Text { value, .. } => Self::Text { value, exact: true },
            Self::Label { value, .. } => Self::Label { value, exact: true },
            other => other,
        }
    }

    /// Scope this descriptor to the inside of `scope`.
    pub fn within(self, scope: ElementDescriptor) -> Self {
        Self::Within {
            scope: Box::new(scope),
            inner: Box::new(self),
        }
    }
}

impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector { value } => write!(f, "{value}"),
            Self::Role { role, name, .. } => match name {
                Some(name) => write!(f, "{role} \"{name}\""),
                None => write!(f, "{role}"),
            },
            Self::Text { value, .. } => write!(f, "text \"{value}\""),
            Self::Label { value, .. } => write!(f, "element labelled \"{value}\""),
            Self::Within { scope, inner } => write!(f, "{inner} in {scope}"),
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply the shared text matching rule.
pub fn text_matches(actual: &str, expected: &str, exact: bool) -> bool {
    let actual = normalize_whitespace(actual);
    let expected = normalize_whitespace(expected);
    if exact {
        actual == expected
    } else {
        actual.to_lowercase().contains(&expected.to_lowercase())
    }
}

/// One read of a live element, as returned by the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Accessible name.
    #[serde(default)]
    pub name: String,
    /// Rendered text, whitespace-normalised.
    #[serde(default)]
    pub text: String,
    /// Current value of form controls.
    #[serde(default)]
    pub value: Option<String>,
    pub visible: bool,
    /// `aria-checked` or the native checked state, when the element has one.
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementSnapshot {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The raw `class` attribute, empty when absent.
    pub fn class_list(&self) -> &str {
        self.attribute("class").unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_matching_rules() {
        assert!(text_matches("  6   words ", "6 words", true));
        assert!(text_matches("Total: 6 Words today", "6 words", false));
        assert!(!text_matches("Total: 6 words", "6 words", true));
        assert!(!text_matches("5 words", "6 words", false));
    }

    #[test]
    fn test_descriptor_display() {
        assert_eq!(ElementDescriptor::css("#input-text").to_string(), "#input-text");
        assert_eq!(
            ElementDescriptor::role("button", "Clear input").to_string(),
            "button \"Clear input\""
        );
        let scoped = ElementDescriptor::role("radio", "RSVP (Speed)")
            .within(ElementDescriptor::role("radiogroup", "Reading Mode"));
        assert_eq!(
            scoped.to_string(),
            "radio \"RSVP (Speed)\" in radiogroup \"Reading Mode\""
        );
    }

    #[test]
    fn test_descriptor_json_shape() {
        let desc: ElementDescriptor =
            serde_json::from_str(r#"{"by": "role", "role": "button", "name": "Toggle Zen Mode"}"#)
                .unwrap();
        assert_eq!(desc, ElementDescriptor::role("button", "Toggle Zen Mode"));

        let exact = ElementDescriptor::text("Reader Settings").exact();
        let json = serde_json::to_value(&exact).unwrap();
        assert_eq!(json["by"], "text");
        assert_eq!(json["exact"], true);
    }

    #[test]
    fn test_snapshot_attributes() {
        let mut snap = ElementSnapshot {
            tag: "button".into(),
            visible: true,
            ..Default::default()
        };
        assert_eq!(snap.class_list(), "");
        snap.attributes
            .insert("class".into(), "px-2 bg-blue-600".into());
        assert_eq!(snap.class_list(), "px-2 bg-blue-600");
        assert_eq!(snap.attribute("aria-pressed"), None);
    }
}
