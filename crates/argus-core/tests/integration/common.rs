use std::path::Path;
use std::time::Duration;

use argus_core::ArgusConfig;
use argus_core::catalog::TUTORIAL_SEEN_KEY;
use argus_core::descriptor::ElementDescriptor;
use argus_core::testutil::{MockDom, MockElement, MockPage};

/// How long the simulated app takes to re-render after an event.
pub const RENDER_DELAY: Duration = Duration::from_millis(40);

/// Config with the default poll policy, only the artifacts dir overridden.
pub fn default_config(artifacts_dir: &Path) -> ArgusConfig {
    let dir = artifacts_dir.display().to_string();
    ArgusConfig::from_lookup(move |key| (key == "ARGUS_ARTIFACTS_DIR").then(|| dir.clone())).unwrap()
}

pub fn config(artifacts_dir: &Path) -> ArgusConfig {
    let dir = artifacts_dir.display().to_string();
    ArgusConfig::from_lookup(move |key| match key {
        "ARGUS_ARTIFACTS_DIR" => Some(dir.clone()),
        "ARGUS_TIMEOUT_MS" => Some("2000".to_string()),
        _ => None,
    })
    .unwrap()
}

fn input() -> ElementDescriptor {
    ElementDescriptor::css("#input-text")
}

fn button(name: &str) -> ElementDescriptor {
    ElementDescriptor::role("button", name).exact()
}

fn set_counts(dom: &mut MockDom, text: &str) {
    let words = text.split_whitespace().count();
    let chars = text.chars().count();
    dom.update(&ElementDescriptor::css("#word-count"), |el| {
        el.text = format!("{words} words");
    });
    dom.update(&ElementDescriptor::css("#char-count"), |el| {
        el.text = format!("{chars} / 100,000 characters");
    });
}

/// Behaviour knobs for the simulated reader app.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppFlaws {
    /// The clear button hides itself but leaves the text in place.
    pub clear_keeps_text: bool,
    /// The zen toggle never updates `aria-pressed`.
    pub zen_ignores_clicks: bool,
    /// The clear button appears this long after typing instead of after one render.
    pub clear_button_lag: Option<Duration>,
}

/// A correct reader app.
pub fn reader_app() -> MockPage {
    reader_app_with(AppFlaws::default())
}

/// A simulated reader app: text input with counters and a clear button,
/// a reading view with a control panel, and a settings dialog.
/// Everything re-renders [`RENDER_DELAY`] after the event that caused it.
pub fn reader_app_with(flaws: AppFlaws) -> MockPage {
    MockPage::new()
        .with_element(
            MockElement::new("div")
                .id("tutorial")
                .role("dialog")
                .name("Welcome to Hypersonic")
                .hidden(),
        )
        .with_element(
            MockElement::new("textarea")
                .id("input-text")
                .label("Text to read")
                .value("")
                .hidden(),
        )
        .with_element(MockElement::new("span").id("word-count").text("0 words").hidden())
        .with_element(
            MockElement::new("span")
                .id("char-count")
                .text("0 / 100,000 characters")
                .hidden(),
        )
        .with_element(MockElement::new("button").role("button").name("Clear input").hidden())
        .with_element(MockElement::new("button").role("button").name("Start Reading").hidden())
        .with_element(
            MockElement::new("button")
                .role("button")
                .name("Toggle Zen Mode")
                .attr("aria-pressed", "false")
                .attr("class", "p-2 rounded bg-gray-800")
                .hidden(),
        )
        .with_element(
            MockElement::new("button")
                .role("button")
                .name("Open AI Summary")
                .attr("aria-haspopup", "dialog")
                .hidden(),
        )
        .with_element(
            MockElement::new("button")
                .role("button")
                .name("Open settings")
                .attr("aria-label", "Open settings")
                .hidden(),
        )
        .with_element(
            MockElement::new("div")
                .key("settings")
                .role("dialog")
                .name("Reader Settings")
                .hidden(),
        )
        .with_element(
            MockElement::new("h2")
                .parent("settings")
                .role("heading")
                .name("Reader Settings")
                .text("Reader Settings")
                .hidden(),
        )
        .with_element(
            MockElement::new("div")
                .key("mode")
                .parent("settings")
                .role("radiogroup")
                .name("Reading Mode")
                .hidden(),
        )
        .with_element(
            MockElement::new("button")
                .parent("mode")
                .role("radio")
                .name("RSVP (Speed)")
                .checked(true)
                .hidden(),
        )
        .with_element(
            MockElement::new("button")
                .parent("mode")
                .role("radio")
                .name("Highlighter (Pacer)")
                .checked(false)
                .hidden(),
        )
        .with_element(
            MockElement::new("div")
                .key("theme")
                .parent("settings")
                .role("radiogroup")
                .name("Color Theme")
                .hidden(),
        )
        .with_element(
            MockElement::new("button")
                .parent("theme")
                .role("radio")
                .name("Select Midnight theme")
                .checked(true)
                .hidden(),
        )
        .with_element(
            MockElement::new("button")
                .parent("theme")
                .role("radio")
                .name("Select Paper theme")
                .checked(false)
                .hidden(),
        )
        .on_load(RENDER_DELAY, |dom, fired| {
            let tutorial_seen = fired.storage.get(TUTORIAL_SEEN_KEY).map(String::as_str) == Some("true");
            dom.update(&ElementDescriptor::css("#tutorial"), |el| el.visible = !tutorial_seen);
            for selector in ["#input-text", "#word-count", "#char-count"] {
                dom.update(&ElementDescriptor::css(selector), |el| el.visible = true);
            }
        })
        .on_fill(input(), RENDER_DELAY, |dom, fired| {
            let has_text = !fired.text.trim().is_empty();
            set_counts(dom, &fired.text);
            dom.update(&button("Start Reading"), |el| el.visible = has_text);
        })
        .on_fill(
            input(),
            flaws.clear_button_lag.unwrap_or(RENDER_DELAY),
            |dom, fired| {
                let has_text = !fired.text.trim().is_empty();
                dom.update(&button("Clear input"), |el| el.visible = has_text);
            },
        )
        .on_click(button("Clear input"), RENDER_DELAY, move |dom, _| {
            if !flaws.clear_keeps_text {
                dom.update(&input(), |el| el.value = Some(String::new()));
                set_counts(dom, "");
            }
            dom.update(&button("Clear input"), |el| el.visible = false);
            dom.update(&button("Start Reading"), |el| el.visible = false);
        })
        .on_click(button("Start Reading"), RENDER_DELAY, |dom, _| {
            for name in ["Toggle Zen Mode", "Open AI Summary", "Open settings"] {
                dom.update(&button(name), |el| el.visible = true);
            }
            dom.update(&input(), |el| el.visible = false);
        })
        .on_click(button("Toggle Zen Mode"), RENDER_DELAY, move |dom, _| {
            if flaws.zen_ignores_clicks {
                return;
            }
            dom.update(&button("Toggle Zen Mode"), |el| {
                let pressed = el.attributes.get("aria-pressed").map(String::as_str) == Some("true");
                if pressed {
                    el.set_attr("aria-pressed", "false");
                    el.set_attr("class", "p-2 rounded bg-gray-800");
                } else {
                    el.set_attr("aria-pressed", "true");
                    el.set_attr("class", "p-2 rounded bg-blue-600 text-white");
                }
            });
        })
        .on_click(button("Open settings"), RENDER_DELAY, |dom, _| {
            show_settings(dom);
        })
}

fn show_settings(dom: &mut MockDom) {
    let dialog = ElementDescriptor::role("dialog", "Reader Settings");
    let parts = [
        dialog.clone(),
        ElementDescriptor::role("heading", "Reader Settings").within(dialog.clone()),
        ElementDescriptor::role("radiogroup", "Reading Mode"),
        ElementDescriptor::role("radio", "RSVP (Speed)"),
        ElementDescriptor::role("radio", "Highlighter (Pacer)"),
        ElementDescriptor::role("radiogroup", "Color Theme"),
        ElementDescriptor::role("radio", "Select Midnight theme"),
        ElementDescriptor::role("radio", "Select Paper theme"),
    ];
    for part in &parts {
        dom.update(part, |el| el.visible = true);
    }
}
