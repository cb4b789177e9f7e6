//! Expectation predicates over observed UI state.
//!
//! A [`Condition`] is split in two halves: what to observe (an element, the
//! document, a script result) and a pure check over that observation. The
//! evaluator re-observes on every poll and only ever checks the fresh value.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::descriptor::{ElementDescriptor, ElementSnapshot, text_matches};
use crate::error::AppError;

/// A regular expression matched against an element's `class` attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassPattern(Regex);

impl ClassPattern {
    pub fn new(pattern: &str) -> Result<Self, AppError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| AppError::ScenarioError(format!("Invalid class pattern '{pattern}': {e}")))
    }

    pub fn is_match(&self, class_list: &str) -> bool {
        self.0.is_match(class_list)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for ClassPattern {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ClassPattern> for String {
    fn from(pattern: ClassPattern) -> Self {
        pattern.0.as_str().to_string()
    }
}

impl PartialEq for ClassPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// A boolean condition over the current UI state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expect", rename_all = "snake_case")]
pub enum Condition {
    /// `document.readyState` is `complete`.
    PageReady,
    Visible {
        target: ElementDescriptor,
    },
    /// Not visible, or not present at all.
    Hidden {
        target: ElementDescriptor,
    },
    HasValue {
        target: ElementDescriptor,
        value: String,
    },
    HasAttribute {
        target: ElementDescriptor,
        name: String,
        value: String,
    },
    HasClass {
        target: ElementDescriptor,
        pattern: ClassPattern,
    },
    ContainsText {
        target: ElementDescriptor,
        text: String,
    },
    Checked {
        target: ElementDescriptor,
        #[serde(default = "default_true")]
        checked: bool,
    },
    /// A JavaScript expression evaluates to a truthy value.
    Script {
        script: String,
    },
}

fn default_true() -> bool {
    true
}

impl Condition {
    /// The element this condition reads, if it reads one.
    pub fn target(&self) -> Option<&ElementDescriptor> {
        match self {
            Condition::PageReady | Condition::Script { .. } => None,
            Condition::Visible { target }
            | Condition::Hidden { target }
            | Condition::HasValue { target, .. }
            | Condition::HasAttribute { target, .. }
            | Condition::HasClass { target, .. }
            | Condition::ContainsText { target, .. }
            | Condition::Checked { target, .. } => Some(target),
        }
    }

    /// Evaluate against one observation. Pure: no I/O, no state.
    ///
    /// An observation of the wrong shape never satisfies the condition.
    pub fn holds(&self, observation: &Observation) -> bool {
        match (self, observation) {
            (Condition::PageReady, Observation::Document { ready_state }) => {
                ready_state.as_deref() == Some("complete")
            }
            (Condition::Script { .. }, Observation::Script { result }) => is_truthy(result),
            (condition, Observation::Element { element, .. }) => {
                condition.holds_for(element.as_ref())
            }
            _ => false,
        }
    }

    fn holds_for(&self, element: Option<&ElementSnapshot>) -> bool {
        match self {
            Condition::Hidden { .. } => element.is_none_or(|el| !el.visible),
            Condition::Visible { .. } => element.is_some_and(|el| el.visible),
            Condition::HasValue { value, .. } => {
                element.is_some_and(|el| el.value.as_deref() == Some(value.as_str()))
            }
            Condition::HasAttribute { name, value, .. } => {
                element.is_some_and(|el| el.attribute(name) == Some(value.as_str()))
            }
            Condition::HasClass { pattern, .. } => {
                element.is_some_and(|el| pattern.is_match(el.class_list()))
            }
            Condition::ContainsText { text, .. } => {
                element.is_some_and(|el| text_matches(&el.text, text, false))
            }
            Condition::Checked { checked, .. } => {
                element.is_some_and(|el| el.checked.unwrap_or(false) == *checked)
            }
            Condition::PageReady | Condition::Script { .. } => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::PageReady => write!(f, "page to finish loading"),
            Condition::Visible { target } => write!(f, "{target} to be visible"),
            Condition::Hidden { target } => write!(f, "{target} to be hidden"),
            Condition::HasValue { target, value } => {
                write!(f, "{target} to have value \"{value}\"")
            }
            Condition::HasAttribute {
                target,
                name,
                value,
            } => write!(f, "{target} to have {name}=\"{value}\""),
            Condition::HasClass { target, pattern } => {
                write!(f, "{target} to have class matching /{}/", pattern.as_str())
            }
            Condition::ContainsText { target, text } => {
                write!(f, "{target} to contain text \"{text}\"")
            }
            Condition::Checked { target, checked } => {
                if *checked {
                    write!(f, "{target} to be checked")
                } else {
                    write!(f, "{target} to be unchecked")
                }
            }
            Condition::Script { script } => write!(f, "script `{script}` to be truthy"),
        }
    }
}

/// JavaScript truthiness for a JSON value.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// A condition plus an optional human-readable override for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    #[serde(flatten)]
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Expectation {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            description: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn describe(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.condition.to_string())
    }

    pub fn page_ready() -> Self {
        Self::new(Condition::PageReady)
    }

    pub fn visible(target: ElementDescriptor) -> Self {
        Self::new(Condition::Visible { target })
    }

    pub fn hidden(target: ElementDescriptor) -> Self {
        Self::new(Condition::Hidden { target })
    }

    pub fn value(target: ElementDescriptor, value: impl Into<String>) -> Self {
        Self::new(Condition::HasValue {
            target,
            value: value.into(),
        })
    }

    pub fn attribute(
        target: ElementDescriptor,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(Condition::HasAttribute {
            target,
            name: name.into(),
            value: value.into(),
        })
    }

    pub fn class(target: ElementDescriptor, pattern: &str) -> Result<Self, AppError> {
        Ok(Self::new(Condition::HasClass {
            target,
            pattern: ClassPattern::new(pattern)?,
        }))
    }

    pub fn contains_text(target: ElementDescriptor, text: impl Into<String>) -> Self {
        Self::new(Condition::ContainsText {
            target,
            text: text.into(),
        })
    }

    pub fn checked(target: ElementDescriptor, checked: bool) -> Self {
        Self::new(Condition::Checked { target, checked })
    }

    pub fn script(script: impl Into<String>) -> Self {
        Self::new(Condition::Script {
            script: script.into(),
        })
    }
}

/// What a single poll saw. Serialized into timeout diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Element {
        target: String,
        element: Option<ElementSnapshot>,
    },
    Document {
        ready_state: Option<String>,
    },
    Script {
        result: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(visible: bool) -> ElementSnapshot {
        ElementSnapshot {
            tag: "button".into(),
            role: Some("button".into()),
            name: "Toggle Zen Mode".into(),
            visible,
            ..Default::default()
        }
    }

    fn seen(element: Option<ElementSnapshot>) -> Observation {
        Observation::Element {
            target: "button \"Toggle Zen Mode\"".into(),
            element,
        }
    }

    fn target() -> ElementDescriptor {
        ElementDescriptor::role("button", "Toggle Zen Mode")
    }

    #[test]
    fn test_visibility_conditions() {
        let visible = Condition::Visible { target: target() };
        let hidden = Condition::Hidden { target: target() };

        assert!(visible.holds(&seen(Some(button(true)))));
        assert!(!visible.holds(&seen(Some(button(false)))));
        assert!(!visible.holds(&seen(None)));

        assert!(hidden.holds(&seen(None)));
        assert!(hidden.holds(&seen(Some(button(false)))));
        assert!(!hidden.holds(&seen(Some(button(true)))));
    }

    #[test]
    fn test_attribute_and_class_conditions() {
        let mut el = button(true);
        el.attributes.insert("aria-pressed".into(), "true".into());
        el.attributes
            .insert("class".into(), "p-2 rounded bg-blue-600 text-white".into());

        let pressed = Expectation::attribute(target(), "aria-pressed", "true");
        let unpressed = Expectation::attribute(target(), "aria-pressed", "false");
        let blue = Expectation::class(target(), r"bg-blue-600").unwrap();

        assert!(pressed.condition.holds(&seen(Some(el.clone()))));
        assert!(!unpressed.condition.holds(&seen(Some(el.clone()))));
        assert!(blue.condition.holds(&seen(Some(el))));
        assert!(!blue.condition.holds(&seen(None)));
    }

    #[test]
    fn test_value_and_checked_conditions() {
        let mut input = ElementSnapshot {
            tag: "textarea".into(),
            value: Some(String::new()),
            visible: true,
            ..Default::default()
        };
        assert!(Expectation::value(ElementDescriptor::css("#input-text"), "")
            .condition
            .holds(&seen(Some(input.clone()))));
        input.value = Some("Hello".into());
        assert!(!Expectation::value(ElementDescriptor::css("#input-text"), "")
            .condition
            .holds(&seen(Some(input))));

        let mut radio = button(true);
        radio.checked = Some(true);
        assert!(Expectation::checked(target(), true).condition.holds(&seen(Some(radio.clone()))));
        assert!(!Expectation::checked(target(), false).condition.holds(&seen(Some(radio))));
        // No checked state at all reads as unchecked.
        assert!(Expectation::checked(target(), false).condition.holds(&seen(Some(button(true)))));
    }

    #[test]
    fn test_mismatched_observation_never_holds() {
        let visible = Condition::Visible { target: target() };
        assert!(!visible.holds(&Observation::Document {
            ready_state: Some("complete".into())
        }));
        assert!(!Condition::PageReady.holds(&seen(Some(button(true)))));
    }

    #[test]
    fn test_document_and_script_conditions() {
        assert!(Condition::PageReady.holds(&Observation::Document {
            ready_state: Some("complete".into())
        }));
        assert!(!Condition::PageReady.holds(&Observation::Document {
            ready_state: Some("loading".into())
        }));

        let script = Condition::Script {
            script: "1".into(),
        };
        assert!(script.holds(&Observation::Script {
            result: serde_json::json!(3)
        }));
        assert!(!script.holds(&Observation::Script {
            result: serde_json::json!("")
        }));
    }

    #[test]
    fn test_descriptions() {
        let exp = Expectation::visible(ElementDescriptor::role("button", "Clear input"));
        assert_eq!(exp.describe(), "button \"Clear input\" to be visible");
        let exp = exp.described("clear button appears");
        assert_eq!(exp.describe(), "clear button appears");
    }

    #[test]
    fn test_expectation_json_roundtrip_shape() {
        let json = r#"{
            "expect": "has_class",
            "target": {"by": "role", "role": "button", "name": "Toggle Zen Mode"},
            "pattern": "bg-blue-600"
        }"#;
        let exp: Expectation = serde_json::from_str(json).unwrap();
        assert_eq!(exp, Expectation::class(target(), "bg-blue-600").unwrap());

        let bad = r#"{"expect": "has_class", "target": {"by": "selector", "value": "b"}, "pattern": "("}"#;
        assert!(serde_json::from_str::<Expectation>(bad).is_err());
    }
}
