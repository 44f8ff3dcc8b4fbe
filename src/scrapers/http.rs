use crate::error::{Result, ScoutError};
use crate::scrapers::traits::PageRenderer;
use crate::scrapers::types::NavigateOptions;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Renderer for server-rendered pages: plain GET, no JavaScript
#[derive(Default)]
pub struct HttpRenderer;

pub struct HttpSession {
    client: Client,
    html: Option<String>,
}

impl HttpRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScoutError::navigation("about:blank", e))?;

        Ok(HttpSession { client, html: None })
    }

    async fn navigate(
        &self,
        session: &mut HttpSession,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<()> {
        debug!(url, "Fetching URL");
        session.html = None;

        let response = session
            .client
            .get(url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| ScoutError::navigation(url, e))?;

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "Site returned error status");
            return Err(ScoutError::navigation(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ScoutError::navigation(url, e))?;
        debug!(bytes = html.len(), "Downloaded HTML");

        session.html = Some(html);
        Ok(())
    }

    async fn rendered_html(&self, session: &mut HttpSession) -> Result<String> {
        session
            .html
            .take()
            .ok_or_else(|| ScoutError::extraction("document", "no page loaded"))
    }

    async fn close(&self, _session: HttpSession) {}

    fn engine_name(&self) -> &'static str {
        "http"
    }
}
