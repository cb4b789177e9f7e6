use std::future::Future;
use std::path::Path;

use crate::descriptor::{ElementDescriptor, ElementSnapshot};
use crate::error::AppError;

/// The automation transport for one open page.
///
/// Every method waits only for the transport's own acknowledgement
/// (navigation settled, event dispatched); none of them waits for the UI to
/// react. Observing the reaction is the evaluator's job.
pub trait Page: Send + Sync {
    fn goto(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    fn reload(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Evaluate a JavaScript expression and return its JSON value.
    fn evaluate(
        &self,
        script: &str,
    ) -> impl Future<Output = Result<serde_json::Value, AppError>> + Send;

    /// Persist a local-storage entry for the page's origin, including
    /// documents loaded later in this page.
    fn set_storage_item(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Read the element matching `target`, or `None` when nothing matches.
    fn query(
        &self,
        target: &ElementDescriptor,
    ) -> impl Future<Output = Result<Option<ElementSnapshot>, AppError>> + Send;

    /// Replace the value of an editable element.
    fn fill(
        &self,
        target: &ElementDescriptor,
        text: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn click(&self, target: &ElementDescriptor)
    -> impl Future<Output = Result<(), AppError>> + Send;

    /// Write a PNG of the current viewport to `path`.
    fn screenshot(&self, path: &Path) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A launched browser able to hand out isolated pages.
pub trait Session: Send + Sync {
    type Page: Page;

    /// Open a page in a fresh browser context (own storage, own DOM).
    ///
    /// `init_scripts` run before any page script on every document the
    /// page loads.
    fn isolated_page(
        &self,
        init_scripts: &[String],
    ) -> impl Future<Output = Result<Self::Page, AppError>> + Send;
}
