use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use argus_core::config::Viewport;
use argus_core::descriptor::{ElementDescriptor, ElementSnapshot};
use argus_core::error::{ActionError, ActionKind, AppError};
use argus_core::traits::{Page, Session};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::layout::Point;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::locator::{LocatorOp, LocatorOutcome, locator_script, storage_script};

/// Launch options for headless Chromium.
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    pub viewport: Viewport,
    /// Upper bound for a single CDP command.
    pub request_timeout: Duration,
    /// Explicit browser binary; discovered automatically when `None`.
    pub executable: Option<PathBuf>,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            request_timeout: Duration::from_secs(30),
            executable: None,
        }
    }
}

impl ChromeConfig {
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

/// A headless Chromium process driven over the Chrome DevTools Protocol.
///
/// One process serves every run; each [`Session::isolated_page`] call gets a
/// fresh browser context, so runs never share cookies, storage or DOM.
pub struct ChromeSession {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
    contexts: Mutex<Vec<BrowserContextId>>,
}

impl ChromeSession {
    pub async fn launch(config: ChromeConfig) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder();
        builder = builder.no_sandbox().disable_default_args();

        // Snap-packaged Chromium exposes a wrapper that rejects standard
        // Chrome CLI flags, so prefer the real binary when we can find it.
        if let Some(bin) = config.executable.clone().or_else(find_chrome_binary) {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let Viewport { width, height } = config.viewport;
        let browser_config = builder
            .window_size(width, height)
            .viewport(CdpViewport {
                width,
                height,
                ..Default::default()
            })
            .request_timeout(config.request_timeout)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::ConfigError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| AppError::PreconditionError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
            contexts: Mutex::new(Vec::new()),
        })
    }

    /// Dispose every context this session created and shut the browser down.
    pub async fn close(self) -> Result<(), AppError> {
        let mut browser = self.browser.lock().await;
        for id in self.contexts.lock().await.drain(..) {
            if let Err(e) = browser.dispose_browser_context(id).await {
                tracing::debug!(error = %e, "Failed to dispose browser context");
            }
        }
        browser
            .close()
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to close browser: {e}")))?;
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

impl Session for ChromeSession {
    type Page = ChromePage;

    async fn isolated_page(&self, init_scripts: &[String]) -> Result<ChromePage, AppError> {
        let page = {
            let mut browser = self.browser.lock().await;
            let context_id = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(|e| AppError::TransportError(format!("Failed to create browser context: {e}")))?;
            self.contexts.lock().await.push(context_id.clone());

            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id)
                .build()
                .map_err(AppError::TransportError)?;
            browser
                .new_page(target)
                .await
                .map_err(|e| AppError::TransportError(format!("Failed to open page: {e}")))?
        };

        let page = ChromePage { page };
        for script in init_scripts {
            page.add_init_script(script).await?;
        }
        Ok(page)
    }
}

/// One Chromium tab implementing the [`Page`] transport.
#[derive(Clone)]
pub struct ChromePage {
    page: chromiumoxide::Page,
}

impl ChromePage {
    /// Run `script` before any page script on every document loaded from now on.
    pub async fn add_init_script(&self, script: &str) -> Result<(), AppError> {
        self.page
            .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to register init script: {e}")))?;
        Ok(())
    }

    async fn eval(&self, expression: String) -> Result<serde_json::Value, AppError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(AppError::TransportError)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| AppError::TransportError(format!("Script evaluation failed: {e}")))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn locate(
        &self,
        kind: ActionKind,
        target: &ElementDescriptor,
        op: LocatorOp,
    ) -> Result<LocatorOutcome, AppError> {
        let value = self.eval(locator_script(target, &op)?).await?;
        let outcome: LocatorOutcome = serde_json::from_value(value)?;
        if !outcome.ok {
            let cause = outcome.error.unwrap_or_else(|| "unknown error".into());
            return Err(ActionError::new(kind, format!("{target}: {cause}")).into());
        }
        Ok(outcome)
    }
}

impl Page for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), AppError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to navigate to {url}: {e}")))?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), AppError> {
        self.page
            .reload()
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to reload: {e}")))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, AppError> {
        self.eval(script.to_string()).await
    }

    async fn set_storage_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        let script = storage_script(key, value)?;
        // Covers documents loaded later, including before the first navigation.
        self.add_init_script(&script).await?;
        let written = self.eval(script).await?;
        tracing::debug!(%key, written = %written, "Seeded local storage");
        Ok(())
    }

    async fn query(&self, target: &ElementDescriptor) -> Result<Option<ElementSnapshot>, AppError> {
        let value = self.eval(locator_script(target, &LocatorOp::Inspect)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn fill(&self, target: &ElementDescriptor, text: &str) -> Result<(), AppError> {
        self.locate(
            ActionKind::Fill,
            target,
            LocatorOp::Fill {
                text: text.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    async fn click(&self, target: &ElementDescriptor) -> Result<(), AppError> {
        let outcome = self.locate(ActionKind::Click, target, LocatorOp::Point).await?;
        let (Some(x), Some(y)) = (outcome.x, outcome.y) else {
            return Err(ActionError::new(ActionKind::Click, format!("{target}: no click point")).into());
        };
        self.page
            .click(Point::new(x, y))
            .await
            .map_err(|e| ActionError::new(ActionKind::Click, format!("{target}: {e}")))?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AppError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to capture screenshot: {e}")))?;
        Ok(())
    }
}

/// Tries to locate the real Chrome/Chromium binary.
///
/// On systems where Chromium is installed via **snap**, the wrapper at
/// `/snap/bin/chromium` strips unknown CLI flags, breaking headless mode.
/// We look for the real binary inside the snap first, then fall back to
/// well-known system paths. If nothing is found we return `None` and let
/// `chromiumoxide` do its own lookup.
pub fn find_chrome_binary() -> Option<PathBuf> {
    let candidates: &[&str] = &[
        // Snap (Ubuntu default)
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        // Flatpak
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        // Common apt / manual installs
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}
