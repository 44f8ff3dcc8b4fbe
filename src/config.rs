use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{Result, ScoutError};
use crate::scrapers::types::{SelectorMap, WaitCondition};

pub const DEFAULT_TARGET_URL: &str = "https://www.avito.ma/fr/agadir/voitures";

/// Label the site gives listings posted a day ago
pub const DEFAULT_RECENCY_SENTINEL: &str = "il y a 1 jour";

/// Parameters of one crawl run. Never mutated once built.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: Url,
    pub navigation_timeout: Duration,
    /// When a page counts as loaded
    pub wait_until: WaitCondition,
    pub max_pages: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Query parameter carrying the page number for pages after the first
    pub page_param: String,
    pub recency_sentinel: String,
}

impl CrawlConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            navigation_timeout: Duration::from_millis(60_000),
            wait_until: WaitCondition::NetworkIdle,
            max_pages: 5,
            min_delay: Duration::from_millis(2_000),
            max_delay: Duration::from_millis(5_000),
            page_param: "o".to_string(),
            recency_sentinel: DEFAULT_RECENCY_SENTINEL.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(ScoutError::Config("MAX_PAGES must be at least 1".to_string()));
        }
        if self.min_delay > self.max_delay {
            return Err(ScoutError::Config(format!(
                "MIN_DELAY_MS ({}) exceeds MAX_DELAY_MS ({})",
                self.min_delay.as_millis(),
                self.max_delay.as_millis()
            )));
        }
        Ok(())
    }
}

pub struct Config {
    pub crawl: CrawlConfig,
    pub headless: bool,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub snapshot_prefix: String,
    pub selectors_file: Option<PathBuf>,
    pub report_source: String,
    pub report_region: String,
    pub report_currency: String,
}

impl Config {
    /// Read configuration from the environment (and `.env` when present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let target = var_or("TARGET_URL", DEFAULT_TARGET_URL);
        let base_url = Url::parse(&target)
            .map_err(|e| ScoutError::Config(format!("TARGET_URL `{target}`: {e}")))?;

        let crawl = CrawlConfig {
            base_url,
            navigation_timeout: Duration::from_millis(parse_var("NAVIGATION_TIMEOUT", 60_000)?),
            wait_until: parse_var("WAIT_UNTIL", WaitCondition::NetworkIdle)?,
            max_pages: parse_var("MAX_PAGES", 5)?,
            min_delay: Duration::from_millis(parse_var("MIN_DELAY_MS", 2_000)?),
            max_delay: Duration::from_millis(parse_var("MAX_DELAY_MS", 5_000)?),
            page_param: var_or("PAGE_PARAM", "o"),
            recency_sentinel: var_or("RECENCY_SENTINEL", DEFAULT_RECENCY_SENTINEL),
        };
        crawl.validate()?;

        Ok(Self {
            crawl,
            headless: env::var("HEADLESS").map(|v| v != "false").unwrap_or(true),
            data_dir: PathBuf::from(var_or("DATA_DIR", "./data")),
            reports_dir: PathBuf::from(var_or("REPORTS_DIR", "./reports")),
            snapshot_prefix: var_or("SNAPSHOT_PREFIX", "avito_cars"),
            selectors_file: env::var("SELECTORS_FILE").ok().map(PathBuf::from),
            report_source: var_or("REPORT_SOURCE", "Avito.ma"),
            report_region: var_or("REPORT_REGION", "Agadir"),
            report_currency: var_or("REPORT_CURRENCY", "MAD"),
        })
    }

    pub fn selectors(&self) -> Result<SelectorMap> {
        match &self.selectors_file {
            Some(path) => SelectorMap::from_file(path),
            None => Ok(SelectorMap::default()),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ScoutError::Config(format!("{key} `{raw}`: {e}"))),
        Err(_) => Ok(default),
    }
}
