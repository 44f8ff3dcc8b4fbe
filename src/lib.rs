//! Harvests vehicle listings from a classifieds site and turns the latest
//! snapshot into bilingual market reports.

pub mod config;
pub mod dedup;
pub mod error;
pub mod models;
pub mod report;
pub mod scrapers;
pub mod storage;

pub use error::{Result, ScoutError};
