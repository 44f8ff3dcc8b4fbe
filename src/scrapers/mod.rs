pub mod browser;
pub mod crawler;
pub mod extractor;
pub mod http;
pub mod traits;
pub mod types;

pub use browser::ChromeRenderer;
pub use crawler::{CrawlController, CrawlOutcome, Termination};
pub use extractor::PageExtractor;
pub use http::HttpRenderer;
pub use traits::PageRenderer;
pub use types::{NavigateOptions, SelectorMap, WaitCondition};
