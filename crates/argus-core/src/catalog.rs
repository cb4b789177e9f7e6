//! Built-in scenarios for the reader application.
//!
//! Every scenario takes its base URL and input selector from [`ArgusConfig`];
//! nothing here hard-codes a port.

use crate::config::ArgusConfig;
use crate::descriptor::ElementDescriptor;
use crate::error::AppError;
use crate::expectation::Expectation;
use crate::policy::PollPolicy;
use crate::scenario::{Action, Scenario, ScenarioStep};

/// Local-storage key that suppresses the onboarding tutorial.
pub const TUTORIAL_SEEN_KEY: &str = "hypersonic-tutorial-seen";

pub const CLEAR_BUTTON: &str = "clear-button";
pub const ZEN_MODE: &str = "zen-mode";
pub const SETTINGS_ACCESSIBILITY: &str = "settings-a11y";
pub const CHARACTER_COUNT: &str = "character-count";

/// Names of all built-in scenarios, in catalog order.
pub fn names() -> &'static [&'static str] {
    &[CLEAR_BUTTON, ZEN_MODE, SETTINGS_ACCESSIBILITY, CHARACTER_COUNT]
}

pub fn all(config: &ArgusConfig) -> Result<Vec<Scenario>, AppError> {
    names()
        .iter()
        .map(|name| {
            find(name, config)?
                .ok_or_else(|| AppError::Generic(format!("catalog entry '{name}' is missing")))
        })
        .collect()
}

pub fn find(name: &str, config: &ArgusConfig) -> Result<Option<Scenario>, AppError> {
    let scenario = match name {
        CLEAR_BUTTON => clear_button(config)?,
        ZEN_MODE => zen_mode(config)?,
        SETTINGS_ACCESSIBILITY => settings_accessibility(config),
        CHARACTER_COUNT => character_count(config),
        _ => return Ok(None),
    };
    Ok(Some(scenario))
}

fn input(config: &ArgusConfig) -> ElementDescriptor {
    ElementDescriptor::css(&config.input_selector)
}

fn navigate_home() -> Action {
    Action::Navigate { url: "/".into() }
}

fn seed_tutorial_flag() -> Action {
    Action::SetStorageFlag {
        key: TUTORIAL_SEEN_KEY.into(),
        value: "true".into(),
    }
}

/// Load the app, mark the tutorial as seen, reload, and wait for the input.
fn open_without_tutorial(config: &ArgusConfig) -> [ScenarioStep; 3] {
    [
        ScenarioStep::setup(navigate_home()),
        ScenarioStep::setup(seed_tutorial_flag()),
        ScenarioStep::expect(Expectation::visible(input(config))).after(Action::Reload),
    ]
}

/// Typing shows a clear button and a word count; clearing empties the
/// input and hides the button again. The button must react within 2s
/// whatever the configured default.
pub fn clear_button(config: &ArgusConfig) -> Result<Scenario, AppError> {
    let clear = ElementDescriptor::role("button", "Clear input");
    let two_seconds = PollPolicy::new(100, 2000)?;

    let scenario = Scenario::new(CLEAR_BUTTON, "Clear button empties the input and hides itself")
        .step(ScenarioStep::setup(seed_tutorial_flag()))
        .step(
            ScenarioStep::expect(Expectation::visible(input(config)))
                .after(navigate_home())
                .capture("debug_state"),
        )
        .step(
            ScenarioStep::expect(Expectation::visible(clear.clone()))
                .after(Action::Fill {
                    target: input(config),
                    text: "Hello world, this is a test.".into(),
                })
                .within(two_seconds),
        )
        .step(
            ScenarioStep::expect(Expectation::visible(ElementDescriptor::text("6 words")))
                .capture("1_with_text"),
        )
        .step(
            ScenarioStep::expect(Expectation::value(input(config), ""))
                .after(Action::Click {
                    target: clear.clone(),
                })
                .within(two_seconds),
        )
        .step(ScenarioStep::expect(Expectation::hidden(clear)).capture("2_cleared"));
    Ok(scenario)
}

/// The zen toggle exposes its pressed state and the summary button
/// announces its dialog.
pub fn zen_mode(config: &ArgusConfig) -> Result<Scenario, AppError> {
    let zen = ElementDescriptor::role("button", "Toggle Zen Mode");
    let summary = ElementDescriptor::role("button", "Open AI Summary");

    let scenario = Scenario::new(ZEN_MODE, "Zen mode toggle reflects its pressed state")
        .with_final_evidence("zen_mode_active");
    let scenario = open_without_tutorial(config)
        .into_iter()
        .fold(scenario, Scenario::step)
        .step(
            ScenarioStep::expect(Expectation::visible(ElementDescriptor::role(
                "button",
                "Start Reading",
            )))
            .after(Action::Fill {
                target: input(config),
                text: "This is a test sentence for verifying Zen Mode accessibility.".into(),
            }),
        )
        .step(
            ScenarioStep::expect(Expectation::visible(zen.clone())).after(Action::Click {
                target: ElementDescriptor::role("button", "Start Reading"),
            }),
        )
        .step(ScenarioStep::expect(Expectation::attribute(
            zen.clone(),
            "aria-pressed",
            "false",
        )))
        .step(
            ScenarioStep::expect(Expectation::attribute(zen.clone(), "aria-pressed", "true"))
                .after(Action::Click { target: zen.clone() }),
        )
        .step(ScenarioStep::expect(Expectation::class(zen, "bg-blue-600")?))
        .step(ScenarioStep::expect(Expectation::attribute(
            summary,
            "aria-haspopup",
            "dialog",
        )));
    Ok(scenario)
}

/// The settings dialog groups its choices into labelled radiogroups with
/// correct checked states.
pub fn settings_accessibility(config: &ArgusConfig) -> Scenario {
    let reading_mode = ElementDescriptor::role("radiogroup", "Reading Mode");
    let color_theme = ElementDescriptor::role("radiogroup", "Color Theme");
    let rsvp = ElementDescriptor::role("radio", "RSVP (Speed)").within(reading_mode.clone());
    let highlighter =
        ElementDescriptor::role("radio", "Highlighter (Pacer)").within(reading_mode.clone());
    let midnight =
        ElementDescriptor::role("radio", "Select Midnight theme").within(color_theme.clone());
    let open_settings = ElementDescriptor::label("Open settings");

    let scenario = Scenario::new(
        SETTINGS_ACCESSIBILITY,
        "Settings radiogroups expose names and checked state",
    )
    .with_final_evidence("settings_a11y");
    open_without_tutorial(config)
        .into_iter()
        .fold(scenario, Scenario::step)
        .step(
            ScenarioStep::expect(Expectation::visible(ElementDescriptor::role(
                "button",
                "Start Reading",
            )))
            .after(Action::Fill {
                target: input(config),
                text: "This is some sample text for testing accessibility.".into(),
            }),
        )
        .step(
            ScenarioStep::expect(Expectation::visible(open_settings.clone())).after(
                Action::Click {
                    target: ElementDescriptor::role("button", "Start Reading"),
                },
            ),
        )
        .step(
            ScenarioStep::expect(Expectation::visible(ElementDescriptor::text(
                "Reader Settings",
            )))
            .after(Action::Click {
                target: open_settings,
            }),
        )
        .step(ScenarioStep::expect(Expectation::visible(reading_mode)))
        .step(ScenarioStep::expect(Expectation::visible(rsvp.clone())))
        .step(ScenarioStep::expect(Expectation::checked(rsvp, true)))
        .step(ScenarioStep::expect(Expectation::visible(highlighter.clone())))
        .step(ScenarioStep::expect(Expectation::checked(highlighter, false)))
        .step(ScenarioStep::expect(Expectation::visible(color_theme)))
        .step(ScenarioStep::expect(Expectation::visible(midnight.clone())))
        .step(ScenarioStep::expect(Expectation::checked(midnight, true)))
}

/// Typing updates the character counter.
pub fn character_count(config: &ArgusConfig) -> Scenario {
    Scenario::new(CHARACTER_COUNT, "Character counter follows the input")
        .step(ScenarioStep::expect(Expectation::visible(input(config))).after(navigate_home()))
        .step(
            ScenarioStep::expect(Expectation::visible(ElementDescriptor::text(
                "11 / 100,000 characters",
            )))
            .after(Action::Fill {
                target: input(config),
                text: "Hello World".into(),
            }),
        )
        .with_final_evidence("character_count")
}
