use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One advertised vehicle scraped from a result page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub title: String,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub fuel: Option<String>,
    #[serde(default)]
    pub image: String,
    /// Absolute URL; identifies the listing within one crawl run
    pub link: String,
    /// Free-text recency label such as "il y a 3 heures"
    #[serde(default)]
    pub posted_at: Option<String>,
}

impl ListingRecord {
    /// Whether the recency label equals `sentinel`, ignoring case and
    /// surrounding whitespace. Substrings do not count.
    pub fn has_recency_label(&self, sentinel: &str) -> bool {
        self.posted_at
            .as_deref()
            .map(|label| label.trim().to_lowercase() == sentinel.trim().to_lowercase())
            .unwrap_or(false)
    }

    /// First whitespace-delimited token of the title
    pub fn brand(&self) -> &str {
        self.title.split_whitespace().next().unwrap_or("")
    }

    /// Heuristic for professional sellers: "auto" in title or location, or
    /// "garage" in location.
    pub fn is_reseller(&self) -> bool {
        let title = self.title.to_lowercase();
        let location = self
            .location
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        title.contains("auto") || location.contains("auto") || location.contains("garage")
    }
}

/// Immutable capture of all listings from one crawl run
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub path: PathBuf,
    pub captured_at: DateTime<Utc>,
    pub records: Vec<ListingRecord>,
}

#[cfg(test)]
pub(crate) fn record(title: &str, link: &str) -> ListingRecord {
    ListingRecord {
        title: title.to_string(),
        price: None,
        location: None,
        year: None,
        transmission: None,
        fuel: None,
        image: String::new(),
        link: link.to_string(),
        posted_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recency_label_is_whole_string_case_insensitive() {
        let mut listing = record("Dacia Logan", "https://x/1");
        listing.posted_at = Some("  ONE DAY OLD ".to_string());
        assert!(listing.has_recency_label("one day old"));

        listing.posted_at = Some("more than one day old".to_string());
        assert!(!listing.has_recency_label("one day old"));

        listing.posted_at = None;
        assert!(!listing.has_recency_label("one day old"));
    }

    #[test]
    fn reseller_heuristic() {
        let dealer = record("Auto Plus SARL", "https://x/1");
        assert!(dealer.is_reseller());

        let mut garage = record("Renault Clio", "https://x/2");
        garage.location = Some("Garage Al Inara".to_string());
        assert!(garage.is_reseller());

        let mut private = record("Peugeot 208", "https://x/3");
        private.location = Some("Hay Mohammadi".to_string());
        assert!(!private.is_reseller());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut listing = record("Dacia Logan", "https://x/1");
        listing.posted_at = Some("il y a 2 heures".to_string());
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["postedAt"], "il y a 2 heures");
        assert!(json["price"].is_null());
    }
}
