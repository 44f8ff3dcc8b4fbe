use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use crate::config::CrawlConfig;
use crate::error::Result;
use crate::models::ListingRecord;
use crate::scrapers::extractor::PageExtractor;
use crate::scrapers::traits::PageRenderer;
use crate::scrapers::types::NavigateOptions;

/// Why pagination stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Page yielded no listings; it contributes nothing
    Exhausted { page: u32 },
    /// Page carried the recency sentinel; its other listings were kept
    BoundaryReached { page: u32 },
    /// Navigation or extraction failed; earlier pages were kept
    TransientFailure {
        page: u32,
        url: String,
        message: String,
    },
    /// Configured page limit hit
    LimitReached { pages: u32 },
    /// The rendering session could not be opened
    SessionFailed { message: String },
}

impl Termination {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Termination::Exhausted { .. } => "exhausted",
            Termination::BoundaryReached { .. } => "boundary_reached",
            Termination::TransientFailure { .. } => "transient_failure",
            Termination::LimitReached { .. } => "limit_reached",
            Termination::SessionFailed { .. } => "session_failed",
        }
    }

    /// Whether the run stopped on an error rather than a normal condition
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Termination::TransientFailure { .. } | Termination::SessionFailed { .. }
        )
    }
}

/// Best-effort result of a crawl run, before deduplication
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub records: Vec<ListingRecord>,
    pub termination: Termination,
    pub pages_visited: u32,
    pub total_wait: Duration,
}

/// Outcome of evaluating one successfully extracted page
enum PageVerdict {
    Exhausted,
    Boundary(Vec<ListingRecord>),
    Continue(Vec<ListingRecord>),
}

/// Walks result pages one at a time until a stop condition fires
pub struct CrawlController<R: PageRenderer> {
    renderer: R,
    extractor: PageExtractor,
    config: CrawlConfig,
}

impl<R: PageRenderer> CrawlController<R> {
    pub fn new(renderer: R, extractor: PageExtractor, config: CrawlConfig) -> Self {
        Self {
            renderer,
            extractor,
            config,
        }
    }

    /// Page 1 is the base URL, later pages add the page parameter
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            return self.config.base_url.to_string();
        }

        let param = self.config.page_param.as_str();
        let mut url = self.config.base_url.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(param, &page.to_string());
        url.to_string()
    }

    /// Run the crawl. Never fails: errors end pagination and are reported
    /// through `CrawlOutcome::termination`.
    pub async fn run(&self) -> CrawlOutcome {
        info!(
            engine = self.renderer.engine_name(),
            base_url = %self.config.base_url,
            max_pages = self.config.max_pages,
            "Starting crawl"
        );

        let mut session = match self.renderer.open().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Could not open rendering session");
                return CrawlOutcome {
                    records: Vec::new(),
                    termination: Termination::SessionFailed {
                        message: e.to_string(),
                    },
                    pages_visited: 0,
                    total_wait: Duration::ZERO,
                };
            }
        };

        let outcome = self.paginate(&mut session).await;
        self.renderer.close(session).await;

        info!(
            records = outcome.records.len(),
            pages = outcome.pages_visited,
            reason = outcome.termination.reason_code(),
            waited_ms = outcome.total_wait.as_millis() as u64,
            "Crawl finished"
        );
        outcome
    }

    async fn paginate(&self, session: &mut R::Session) -> CrawlOutcome {
        let options = NavigateOptions {
            timeout: self.config.navigation_timeout,
            wait_until: self.config.wait_until,
        };

        let mut records = Vec::new();
        let mut total_wait = Duration::ZERO;
        let mut page = 1;

        let termination = loop {
            let url = self.page_url(page);
            info!(page, url = %url, "Fetching result page");

            let extracted = match self.fetch_page(session, &url, &options).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!(page, url = %url, error = %e, "Page failed, keeping earlier results");
                    break Termination::TransientFailure {
                        page,
                        url,
                        message: e.to_string(),
                    };
                }
            };

            match self.evaluate(page, extracted) {
                PageVerdict::Exhausted => break Termination::Exhausted { page },
                PageVerdict::Boundary(kept) => {
                    records.extend(kept);
                    break Termination::BoundaryReached { page };
                }
                PageVerdict::Continue(page_records) => records.extend(page_records),
            }

            if page >= self.config.max_pages {
                break Termination::LimitReached { pages: page };
            }

            total_wait += self.pause(page).await;
            page += 1;
        };

        let pages_visited = match &termination {
            Termination::Exhausted { page }
            | Termination::BoundaryReached { page }
            | Termination::TransientFailure { page, .. } => *page,
            Termination::LimitReached { pages } => *pages,
            Termination::SessionFailed { .. } => 0,
        };

        CrawlOutcome {
            records,
            termination,
            pages_visited,
            total_wait,
        }
    }

    async fn fetch_page(
        &self,
        session: &mut R::Session,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<Vec<ListingRecord>> {
        self.renderer.navigate(session, url, options).await?;
        let html = self.renderer.rendered_html(session).await?;
        self.extractor.extract(&html)
    }

    fn evaluate(&self, page: u32, extracted: Vec<ListingRecord>) -> PageVerdict {
        if extracted.is_empty() {
            info!(page, "No listings on page, stopping");
            return PageVerdict::Exhausted;
        }

        let sentinel = self.config.recency_sentinel.as_str();
        if !extracted.iter().any(|r| r.has_recency_label(sentinel)) {
            info!(page, count = extracted.len(), "Page extracted");
            return PageVerdict::Continue(extracted);
        }

        let total = extracted.len();
        let kept: Vec<ListingRecord> = extracted
            .into_iter()
            .filter(|r| !r.has_recency_label(sentinel))
            .collect();
        info!(
            page,
            kept = kept.len(),
            dropped = total - kept.len(),
            "Reached listings older than the cutoff, stopping"
        );
        PageVerdict::Boundary(kept)
    }

    /// Random pause between two page fetches
    async fn pause(&self, page: u32) -> Duration {
        let wait = random_delay(self.config.min_delay, self.config.max_delay);
        info!(page, wait_ms = wait.as_millis() as u64, "Waiting before next page");
        tokio::time::sleep(wait).await;
        wait
    }
}

/// Uniform duration in `[min, max]` at millisecond resolution
pub fn random_delay(min: Duration, max: Duration) -> Duration {
    let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
    if lo >= hi {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::rng().random_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_delay_stays_in_window() {
        let min = Duration::from_millis(100);
        let max = Duration::from_millis(250);
        for _ in 0..200 {
            let d = random_delay(min, max);
            assert!(d >= min && d <= max, "{d:?}");
        }
        assert_eq!(random_delay(max, max), max);
    }
}
