use crate::error::{Result, ScoutError};
use crate::scrapers::traits::PageRenderer;
use crate::scrapers::types::{NavigateOptions, WaitCondition};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Extra settle time after load for client-rendered listing grids
const NETWORK_IDLE_SETTLE: Duration = Duration::from_secs(3);

/// Always tried after the site-specific consent selectors
const GENERIC_CONSENT_BUTTON: &str = "button[mode=\"primary\"]";

/// Headless Chrome page renderer
pub struct ChromeRenderer {
    headless: bool,
    consent_buttons: Vec<String>,
}

/// One browser process plus the tab the crawl runs in. Dropping it kills the
/// browser.
pub struct ChromeSession {
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeRenderer {
    pub fn new(headless: bool, consent_buttons: Vec<String>) -> Self {
        Self {
            headless,
            consent_buttons,
        }
    }

    fn launch(headless: bool) -> anyhow::Result<ChromeSession> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .window_size(Some((1280, 800)))
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--no-first-run"),
                OsStr::new("--no-default-browser-check"),
            ])
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build launch options: {e}"))?;

        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        tab.set_user_agent(USER_AGENT, Some("fr-FR,fr;q=0.9,en;q=0.8"), None)?;

        Ok(ChromeSession { browser, tab })
    }

    fn load(tab: &Tab, url: &str, options: NavigateOptions) -> anyhow::Result<()> {
        tab.set_default_timeout(options.timeout);
        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;
        if options.wait_until == WaitCondition::NetworkIdle {
            std::thread::sleep(NETWORK_IDLE_SETTLE);
        }
        Ok(())
    }

    /// Click the first consent button present. Absence is not an error.
    fn dismiss_consent(tab: &Tab, buttons: &[String]) -> Result<bool> {
        let candidates: Vec<&str> = buttons
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(GENERIC_CONSENT_BUTTON))
            .collect();
        let list = serde_json::to_string(&candidates)?;

        let script = format!(
            r#"(() => {{
                for (const sel of {list}) {{
                    const button = document.querySelector(sel);
                    if (button) {{ button.click(); return true; }}
                }}
                return false;
            }})()"#
        );

        let result = tab
            .evaluate(&script, false)
            .map_err(|e| ScoutError::Consent(e.to_string()))?;
        let clicked = result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if clicked {
            std::thread::sleep(Duration::from_secs(2));
        }
        Ok(clicked)
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    type Session = ChromeSession;

    async fn open(&self) -> Result<ChromeSession> {
        info!(headless = self.headless, "Launching headless Chrome...");
        let headless = self.headless;

        tokio::task::spawn_blocking(move || Self::launch(headless))
            .await
            .map_err(|e| ScoutError::navigation("about:blank", e))?
            .map_err(|e| ScoutError::navigation("about:blank", e))
    }

    async fn navigate(
        &self,
        session: &mut ChromeSession,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<()> {
        let tab = Arc::clone(&session.tab);
        let target = url.to_string();
        let options = *options;
        let buttons = self.consent_buttons.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            Self::load(&tab, &target, options).map_err(|e| ScoutError::navigation(&target, e))?;

            match Self::dismiss_consent(&tab, &buttons) {
                Ok(true) => info!("Cookie consent popup dismissed"),
                Ok(false) => debug!("No cookie consent popup detected"),
                Err(e) => warn!(error = %e, "Proceeding without dismissing consent popup"),
            }
            Ok(())
        })
        .await
        .map_err(|e| ScoutError::navigation(url, e))?
    }

    async fn rendered_html(&self, session: &mut ChromeSession) -> Result<String> {
        let tab = Arc::clone(&session.tab);

        tokio::task::spawn_blocking(move || tab.get_content())
            .await
            .map_err(|e| ScoutError::extraction("document", e))?
            .map_err(|e| ScoutError::extraction("document", e))
    }

    async fn close(&self, session: ChromeSession) {
        let ChromeSession { browser, tab } = session;
        let closed = tokio::task::spawn_blocking(move || {
            let result = tab.close(true);
            drop(browser);
            result
        })
        .await;

        match closed {
            Ok(Ok(_)) => info!("Browser closed"),
            Ok(Err(e)) => warn!(error = %e, "Tab did not close cleanly, browser dropped"),
            Err(e) => warn!(error = %e, "Browser shutdown task failed"),
        }
    }

    fn engine_name(&self) -> &'static str {
        "chrome"
    }
}
