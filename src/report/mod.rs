pub mod render;
pub mod stats;

pub use render::{Language, ReportDocument, ReportRenderer};
pub use stats::{MarketStats, PriceBand, ReportAggregator, ReportWindow};
