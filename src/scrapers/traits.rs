use crate::error::Result;
use crate::scrapers::types::NavigateOptions;
use async_trait::async_trait;

/// Capability that renders result pages for the crawler.
///
/// Implementations own the underlying engine (headless Chrome, plain HTTP,
/// an in-memory stub in tests). A session is opened once per crawl run and
/// handed back to `close` on every exit path.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    type Session: Send;

    /// Acquire a page session
    async fn open(&self) -> Result<Self::Session>;

    /// Load `url` into the session, failing with `ScoutError::Navigation`
    async fn navigate(
        &self,
        session: &mut Self::Session,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<()>;

    /// Serialized DOM of the currently loaded page
    async fn rendered_html(&self, session: &mut Self::Session) -> Result<String>;

    /// Release the session
    async fn close(&self, session: Self::Session);

    /// Get the name of the rendering engine
    fn engine_name(&self) -> &'static str;
}
