//! Test utilities: mock implementations of the transport traits.
//!
//! Handwritten mocks for dependency injection in unit and integration tests.
//! `MockPage` simulates a small DOM whose state changes asynchronously after
//! actions (on the tokio clock), and records every action it receives.
//! All mocks use `Arc<Mutex<_>>` for interior mutability.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::descriptor::{ElementDescriptor, ElementSnapshot, text_matches};
use crate::error::{ActionError, ActionKind, AppError};
use crate::runner::{RunEvent, RunReporter};
use crate::traits::{Page, Session};

// ---------------------------------------------------------------------------
// MockElement / MockDom
// ---------------------------------------------------------------------------

/// One element of the simulated UI tree.
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub key: String,
    pub parent: Option<String>,
    pub tag: String,
    pub id: Option<String>,
    pub role: Option<String>,
    pub name: String,
    /// `<label>` text for form controls.
    pub label: Option<String>,
    pub text: String,
    pub value: Option<String>,
    pub visible: bool,
    pub checked: Option<bool>,
    pub attributes: BTreeMap<String, String>,
}

impl MockElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn parent(mut self, key: &str) -> Self {
        self.parent = Some(key.to_string());
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        if self.key.is_empty() {
            self.key = id.to_string();
        }
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(String::as_str)
            .unwrap_or("")
            .split_whitespace()
    }

    /// Minimal CSS support: `tag`, `#id`, `.class` and their concatenations.
    fn matches_selector(&self, selector: &str) -> bool {
        let selector = selector.trim();
        let tag_end = selector.find(['#', '.']).unwrap_or(selector.len());
        let (tag, mut rest) = selector.split_at(tag_end);
        if !tag.is_empty() && tag != "*" && tag != self.tag {
            return false;
        }
        while !rest.is_empty() {
            let marker = &rest[..1];
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let part = &body[..end];
            let ok = match marker {
                "#" => self.id.as_deref() == Some(part),
                _ => self.classes().any(|c| c == part),
            };
            if !ok {
                return false;
            }
            rest = &body[end..];
        }
        true
    }

    pub fn snapshot(&self) -> ElementSnapshot {
        let mut attributes = self.attributes.clone();
        if let Some(id) = &self.id {
            attributes.insert("id".to_string(), id.clone());
        }
        ElementSnapshot {
            tag: self.tag.clone(),
            role: self.role.clone(),
            name: self.name.clone(),
            text: self.text.clone(),
            value: self.value.clone(),
            visible: self.visible,
            checked: self.checked,
            attributes,
        }
    }
}

/// The simulated UI tree, in document order.
#[derive(Debug, Clone, Default)]
pub struct MockDom {
    elements: Vec<MockElement>,
}

impl MockDom {
    pub fn insert(&mut self, mut element: MockElement) {
        if element.key.is_empty() {
            element.key = format!("{}-{}", element.tag, self.elements.len());
        }
        self.elements.push(element);
    }

    pub fn remove(&mut self, target: &ElementDescriptor) -> bool {
        match self.find_index(target) {
            Some(i) => {
                self.elements.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, target: &ElementDescriptor) -> Option<&MockElement> {
        self.find_index(target).map(|i| &self.elements[i])
    }

    /// Apply `f` to the element matching `target`. Returns false if absent.
    pub fn update(&mut self, target: &ElementDescriptor, f: impl FnOnce(&mut MockElement)) -> bool {
        match self.find_index(target) {
            Some(i) => {
                f(&mut self.elements[i]);
                true
            }
            None => false,
        }
    }

    fn find_index(&self, target: &ElementDescriptor) -> Option<usize> {
        self.find_in(target, None)
    }

    fn find_in(&self, target: &ElementDescriptor, scope: Option<&str>) -> Option<usize> {
        if let ElementDescriptor::Within { scope: outer, inner } = target {
            let outer = self.find_in(outer, scope)?;
            let key = self.elements[outer].key.clone();
            return self.find_in(inner, Some(key.as_str()));
        }
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| scope.is_none_or(|key| self.descends_from(el, key)))
            .find(|(_, el)| self.matches(el, target))
            .map(|(i, _)| i)
    }

    fn descends_from(&self, element: &MockElement, ancestor: &str) -> bool {
        let mut parent = element.parent.as_deref();
        while let Some(key) = parent {
            if key == ancestor {
                return true;
            }
            parent = self
                .elements
                .iter()
                .find(|el| el.key == key)
                .and_then(|el| el.parent.as_deref());
        }
        false
    }

    /// `<label>` text, `aria-label`, and the joined text of `aria-labelledby` targets.
    fn labels_of(&self, element: &MockElement) -> Vec<String> {
        let mut labels: Vec<String> = element.label.iter().cloned().collect();
        labels.extend(element.attributes.get("aria-label").cloned());
        if let Some(ids) = element.attributes.get("aria-labelledby") {
            let text = ids
                .split_whitespace()
                .filter_map(|id| self.elements.iter().find(|el| el.id.as_deref() == Some(id)))
                .map(|el| el.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.trim().is_empty() {
                labels.push(text);
            }
        }
        labels
    }

    fn matches(&self, element: &MockElement, target: &ElementDescriptor) -> bool {
        match target {
            ElementDescriptor::Selector { value } => element.matches_selector(value),
            ElementDescriptor::Role { role, name, exact } => {
                element.role.as_deref() == Some(role.as_str())
                    && name
                        .as_deref()
                        .is_none_or(|name| text_matches(&element.name, name, *exact))
            }
            ElementDescriptor::Text { value, exact } => {
                !element.text.is_empty() && text_matches(&element.text, value, *exact)
            }
            ElementDescriptor::Label { value, exact } => self
                .labels_of(element)
                .iter()
                .any(|label| text_matches(label, value, *exact)),
            ElementDescriptor::Within { .. } => false,
        }
    }
}

// ---------------------------------------------------------------------------
// MockPage
// ---------------------------------------------------------------------------

/// What a reaction sees when it fires.
#[derive(Debug, Clone, Default)]
pub struct ReactionInput {
    /// Text passed to the triggering `fill`, empty otherwise.
    pub text: String,
    pub storage: BTreeMap<String, String>,
}

type ReactionFn = Arc<dyn Fn(&mut MockDom, &ReactionInput) + Send + Sync>;
type Mutation = Box<dyn FnOnce(&mut MockDom) + Send>;

#[derive(Clone)]
enum Trigger {
    Fill(ElementDescriptor),
    Click(ElementDescriptor),
    Load,
}

#[derive(Clone)]
struct Reaction {
    trigger: Trigger,
    delay: Duration,
    apply: ReactionFn,
}

struct Scheduled {
    due: Instant,
    mutation: Mutation,
}

#[derive(Default)]
struct MockPageState {
    dom: MockDom,
    reactions: Vec<Reaction>,
    pending: Vec<Scheduled>,
    actions: Vec<String>,
    queries: usize,
    storage: BTreeMap<String, String>,
    url: Option<String>,
    script_results: BTreeMap<String, serde_json::Value>,
    screenshots: Vec<PathBuf>,
    query_error: Option<String>,
    navigation_error: Option<String>,
    screenshot_error: Option<String>,
    action_latency: Duration,
}

impl MockPageState {
    /// Apply every scheduled mutation whose time has come, in due order.
    fn settle(&mut self) {
        let now = Instant::now();
        self.pending.sort_by_key(|s| s.due);
        while self.pending.first().is_some_and(|s| s.due <= now) {
            let scheduled = self.pending.remove(0);
            (scheduled.mutation)(&mut self.dom);
        }
    }

    fn key_of(&self, target: &ElementDescriptor) -> Option<String> {
        self.dom.find(target).map(|el| el.key.clone())
    }

    /// Queue reactions whose trigger matches the element that was acted on.
    fn fire(&mut self, acted_on: Option<&str>, kind: ActionKind, text: &str) {
        let input = ReactionInput {
            text: text.to_string(),
            storage: self.storage.clone(),
        };
        let now = Instant::now();
        let fired: Vec<Reaction> = self
            .reactions
            .iter()
            .filter(|r| match (&r.trigger, kind) {
                (Trigger::Fill(target), ActionKind::Fill)
                | (Trigger::Click(target), ActionKind::Click) => {
                    acted_on.is_some() && self.key_of(target).as_deref() == acted_on
                }
                (Trigger::Load, ActionKind::Navigate | ActionKind::Reload) => true,
                _ => false,
            })
            .cloned()
            .collect();

        for reaction in fired {
            let apply = Arc::clone(&reaction.apply);
            let input = input.clone();
            let mutation: Mutation = Box::new(move |dom| apply(dom, &input));
            if reaction.delay.is_zero() {
                mutation(&mut self.dom);
            } else {
                self.pending.push(Scheduled {
                    due: now + reaction.delay,
                    mutation,
                });
            }
        }
    }
}

/// Mock page backed by an in-memory DOM.
#[derive(Clone, Default)]
pub struct MockPage {
    state: Arc<Mutex<MockPageState>>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, element: MockElement) -> Self {
        self.state.lock().unwrap().dom.insert(element);
        self
    }

    /// After a `fill` on `target`, apply `f` once `delay` has passed.
    pub fn on_fill(
        self,
        target: ElementDescriptor,
        delay: Duration,
        f: impl Fn(&mut MockDom, &ReactionInput) + Send + Sync + 'static,
    ) -> Self {
        self.react(Trigger::Fill(target), delay, f)
    }

    /// After a `click` on `target`, apply `f` once `delay` has passed.
    pub fn on_click(
        self,
        target: ElementDescriptor,
        delay: Duration,
        f: impl Fn(&mut MockDom, &ReactionInput) + Send + Sync + 'static,
    ) -> Self {
        self.react(Trigger::Click(target), delay, f)
    }

    /// After every navigation or reload, apply `f` once `delay` has passed.
    pub fn on_load(
        self,
        delay: Duration,
        f: impl Fn(&mut MockDom, &ReactionInput) + Send + Sync + 'static,
    ) -> Self {
        self.react(Trigger::Load, delay, f)
    }

    fn react(
        self,
        trigger: Trigger,
        delay: Duration,
        f: impl Fn(&mut MockDom, &ReactionInput) + Send + Sync + 'static,
    ) -> Self {
        self.state.lock().unwrap().reactions.push(Reaction {
            trigger,
            delay,
            apply: Arc::new(f),
        });
        self
    }

    /// Apply `f` to the DOM once `delay` has passed, independent of actions.
    pub fn schedule(&self, delay: Duration, f: impl FnOnce(&mut MockDom) + Send + 'static) {
        let mut state = self.state.lock().unwrap();
        let due = Instant::now() + delay;
        state.pending.push(Scheduled {
            due,
            mutation: Box::new(f),
        });
    }

    pub fn with_script_result(self, script: &str, result: serde_json::Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .script_results
            .insert(script.to_string(), result);
        self
    }

    /// Make every subsequent query fail at the transport level.
    pub fn fail_queries(&self, message: impl Into<String>) {
        self.state.lock().unwrap().query_error = Some(message.into());
    }

    pub fn fail_navigation(&self, message: impl Into<String>) {
        self.state.lock().unwrap().navigation_error = Some(message.into());
    }

    pub fn fail_screenshots(&self, message: impl Into<String>) {
        self.state.lock().unwrap().screenshot_error = Some(message.into());
    }

    /// Delay every fill and click by `latency` before it reaches the DOM.
    pub fn with_action_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().action_latency = latency;
        self
    }

    async fn round_trip(&self) {
        let latency = self.state.lock().unwrap().action_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    /// Labels of every action performed, in order.
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn query_count(&self) -> usize {
        self.state.lock().unwrap().queries
    }

    pub fn storage(&self) -> BTreeMap<String, String> {
        self.state.lock().unwrap().storage.clone()
    }

    pub fn url(&self) -> Option<String> {
        self.state.lock().unwrap().url.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().screenshots.clone()
    }

    fn load(&self, label: String, kind: ActionKind) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(label);
        if let Some(message) = state.navigation_error.clone() {
            return Err(AppError::TransportError(message));
        }
        state.settle();
        state.fire(None, kind, "");
        Ok(())
    }
}

impl Page for MockPage {
    async fn goto(&self, url: &str) -> Result<(), AppError> {
        self.load(format!("navigate:{url}"), ActionKind::Navigate)?;
        self.state.lock().unwrap().url = Some(url.to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<(), AppError> {
        self.load("reload".to_string(), ActionKind::Reload)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, AppError> {
        let state = self.state.lock().unwrap();
        if script == "document.readyState" {
            return Ok(serde_json::json!("complete"));
        }
        Ok(state
            .script_results
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn set_storage_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("storage:{key}={value}"));
        state.storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn query(&self, target: &ElementDescriptor) -> Result<Option<ElementSnapshot>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.queries += 1;
        if let Some(message) = state.query_error.clone() {
            return Err(AppError::TransportError(message));
        }
        state.settle();
        Ok(state.dom.find(target).map(MockElement::snapshot))
    }

    async fn fill(&self, target: &ElementDescriptor, text: &str) -> Result<(), AppError> {
        self.round_trip().await;
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("fill:{target}:{text}"));
        state.settle();

        let key = state
            .key_of(target)
            .ok_or_else(|| ActionError::new(ActionKind::Fill, format!("no element matches {target}")))?;
        let editable = state.dom.update(target, |el| {
            if el.value.is_some() {
                el.value = Some(text.to_string());
            }
        }) && state.dom.find(target).is_some_and(|el| el.value.is_some());
        if !editable {
            return Err(ActionError::new(ActionKind::Fill, format!("{target} is not editable")).into());
        }

        state.fire(Some(key.as_str()), ActionKind::Fill, text);
        Ok(())
    }

    async fn click(&self, target: &ElementDescriptor) -> Result<(), AppError> {
        self.round_trip().await;
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("click:{target}"));
        state.settle();

        let (key, visible) = state
            .dom
            .find(target)
            .map(|el| (el.key.clone(), el.visible))
            .ok_or_else(|| ActionError::new(ActionKind::Click, format!("no element matches {target}")))?;
        if !visible {
            return Err(ActionError::new(ActionKind::Click, format!("{target} is not visible")).into());
        }

        state.fire(Some(key.as_str()), ActionKind::Click, "");
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.screenshot_error.clone() {
            return Err(AppError::TransportError(message));
        }
        std::fs::write(path, b"\x89PNG\r\n\x1a\nmock")?;
        state.screenshots.push(path.to_path_buf());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// Mock session that builds a brand-new page for every isolated context.
#[derive(Clone)]
pub struct MockSession {
    build: Arc<dyn Fn() -> MockPage + Send + Sync>,
    pub contexts: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockSession {
    pub fn new(build: impl Fn() -> MockPage + Send + Sync + 'static) -> Self {
        Self {
            build: Arc::new(build),
            contexts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Session for MockSession {
    type Page = MockPage;

    async fn isolated_page(&self, init_scripts: &[String]) -> Result<MockPage, AppError> {
        self.contexts.lock().unwrap().push(init_scripts.to_vec());
        Ok((self.build)())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock run reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RunReporter for MockReporter {
    fn report(&self, event: RunEvent<'_>) {
        let label = match &event {
            RunEvent::Started { .. } => "Started".to_string(),
            RunEvent::StepStarted { index, .. } => format!("StepStarted:{index}"),
            RunEvent::ActionPerformed { index, .. } => format!("ActionPerformed:{index}"),
            RunEvent::ExpectationMet { index, .. } => format!("ExpectationMet:{index}"),
            RunEvent::StepFailed { index, .. } => format!("StepFailed:{index}"),
            RunEvent::EvidenceCaptured { .. } => "EvidenceCaptured".to_string(),
            RunEvent::Finished { passed, .. } => format!("Finished:{passed}"),
        };
        self.events.lock().unwrap().push(label);
    }
}
