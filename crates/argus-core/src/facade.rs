//! UI query/action facade over a [`Page`] transport.
//!
//! Reads never fail: a missing element or a transient transport hiccup both
//! read as "nothing there", which the evaluator treats as "not yet". Actions
//! fail hard and are never retried here.

use std::path::Path;

use url::Url;

use crate::descriptor::{ElementDescriptor, ElementSnapshot};
use crate::error::{ActionError, AppError};
use crate::expectation::{ClassPattern, Condition, Observation};
use crate::scenario::Action;
use crate::traits::Page;

/// A live element as seen by one `resolve` call.
///
/// Handles are not kept across polls: the UI may re-render at any time, so
/// callers resolve again instead of caching.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementHandle {
    descriptor: ElementDescriptor,
    snapshot: ElementSnapshot,
}

impl ElementHandle {
    pub fn new(descriptor: ElementDescriptor, snapshot: ElementSnapshot) -> Self {
        Self {
            descriptor,
            snapshot,
        }
    }

    pub fn descriptor(&self) -> &ElementDescriptor {
        &self.descriptor
    }

    pub fn snapshot(&self) -> &ElementSnapshot {
        &self.snapshot
    }

    pub fn is_visible(&self) -> bool {
        self.snapshot.visible
    }

    pub fn text(&self) -> &str {
        &self.snapshot.text
    }

    pub fn value(&self) -> Option<&str> {
        self.snapshot.value.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.snapshot.attribute(name)
    }

    pub fn has_class(&self, pattern: &ClassPattern) -> bool {
        pattern.is_match(self.snapshot.class_list())
    }

    pub fn is_checked(&self) -> bool {
        self.snapshot.checked.unwrap_or(false)
    }
}

/// Thin query/action layer between scenarios and the transport.
pub struct Ui<P: Page> {
    page: P,
    base_url: Option<Url>,
}

impl<P: Page> Ui<P> {
    pub fn new(page: P) -> Self {
        Self {
            page,
            base_url: None,
        }
    }

    /// Relative `Navigate` URLs are joined against `base_url`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Resolve `descriptor` to at most one element. Never errors.
    pub async fn resolve(&self, descriptor: &ElementDescriptor) -> Option<ElementHandle> {
        match self.page.query(descriptor).await {
            Ok(found) => found.map(|snapshot| ElementHandle::new(descriptor.clone(), snapshot)),
            Err(e) => {
                tracing::debug!(target = %descriptor, error = %e, "Query failed, treating as absent");
                None
            }
        }
    }

    /// Take a fresh observation for `condition`. Read-only.
    pub async fn observe(&self, condition: &Condition) -> Observation {
        match condition {
            Condition::PageReady => {
                let ready_state = self
                    .page
                    .evaluate("document.readyState")
                    .await
                    .ok()
                    .and_then(|v| v.as_str().map(String::from));
                Observation::Document { ready_state }
            }
            Condition::Script { script } => {
                let result = self
                    .page
                    .evaluate(script)
                    .await
                    .unwrap_or(serde_json::Value::Null);
                Observation::Script { result }
            }
            Condition::Visible { target }
            | Condition::Hidden { target }
            | Condition::HasValue { target, .. }
            | Condition::HasAttribute { target, .. }
            | Condition::HasClass { target, .. }
            | Condition::ContainsText { target, .. }
            | Condition::Checked { target, .. } => {
                let element = self.resolve(target).await.map(|h| h.snapshot);
                Observation::Element {
                    target: target.to_string(),
                    element,
                }
            }
        }
    }

    /// Dispatch exactly one action and wait for the transport to acknowledge it.
    ///
    /// Setup actions (navigate, storage, reload) fail with
    /// [`AppError::PreconditionError`]; user input fails with [`AppError::ActionError`].
    pub async fn perform(&self, action: &Action) -> Result<(), AppError> {
        let kind = action.kind();
        tracing::debug!(action = %action.label(), "Performing action");

        let result = match action {
            Action::Navigate { url } => {
                let url = self.resolve_url(url)?;
                self.page.goto(&url).await
            }
            Action::SetStorageFlag { key, value } => self.page.set_storage_item(key, value).await,
            Action::Fill { target, text } => self.page.fill(target, text).await,
            Action::Click { target } => self.page.click(target).await,
            Action::Reload => self.page.reload().await,
            Action::Evaluate { script } => self.page.evaluate(script).await.map(|_| ()),
        };

        result.map_err(|e| match e {
            e if kind.is_setup() => AppError::PreconditionError(format!("{kind} failed: {e}")),
            AppError::ActionError(action_error) => AppError::ActionError(action_error),
            other => AppError::ActionError(ActionError::new(kind, other.to_string())),
        })
    }

    /// Capture a screenshot of the current page.
    pub async fn capture(&self, path: &Path) -> Result<(), AppError> {
        self.page.screenshot(path).await
    }

    /// Join a relative URL against the base URL; absolute URLs pass through.
    pub fn resolve_url(&self, url: &str) -> Result<String, AppError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute.to_string());
        }
        let base = self.base_url.as_ref().ok_or_else(|| {
            AppError::ConfigError(format!("Relative URL '{url}' requires a base URL"))
        })?;
        base.join(url)
            .map(|u| u.to_string())
            .map_err(|e| AppError::ConfigError(format!("Invalid URL '{url}': {e}")))
    }
}
