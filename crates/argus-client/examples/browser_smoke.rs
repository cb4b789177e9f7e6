/// Smoke-test for `ChromeSession`.
///
/// Launches a headless Chromium, opens <https://example.com> in an isolated
/// context, and waits for the page heading through the regular evaluator.
///
/// Run with:
///   cargo run -p argus-client --example browser_smoke
use argus_client::{ChromeConfig, ChromeSession};
use argus_core::descriptor::ElementDescriptor;
use argus_core::evaluator::satisfy;
use argus_core::expectation::Expectation;
use argus_core::facade::Ui;
use argus_core::policy::PollPolicy;
use argus_core::scenario::Action;
use argus_core::traits::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Launching headless browser…");
    let session = ChromeSession::launch(ChromeConfig::default()).await?;
    let ui = Ui::new(session.isolated_page(&[]).await?);

    let url = "https://example.com";
    println!("Navigating to {url} …");
    ui.perform(&Action::Navigate { url: url.into() }).await?;

    let heading = ElementDescriptor::role("heading", "Example Domain");
    let policy = PollPolicy::new(100, 10_000)?;
    let met = satisfy(&ui, &Expectation::visible(heading.clone()), &policy).await?;
    println!("OK: heading visible after {} polls", met.attempts);

    let handle = ui
        .resolve(&heading)
        .await
        .ok_or_else(|| anyhow::anyhow!("heading vanished"))?;
    assert_eq!(handle.snapshot().tag, "h1");

    session.close().await?;
    Ok(())
}
