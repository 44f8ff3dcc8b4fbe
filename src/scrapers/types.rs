use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// CSS selectors describing one site's result-page layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectorMap {
    /// One match per listing card
    pub listing_container: String,
    pub title: String,
    pub price: String,
    pub location: String,
    /// Model year ("Année-Modèle")
    pub year: String,
    pub transmission: String,
    pub fuel: String,
    pub image: String,
    /// Relative posting time, e.g. "il y a 3 heures"
    pub recency_label: String,
    /// Tried in order to dismiss the cookie-consent popup
    #[serde(default)]
    pub consent_buttons: Vec<String>,
}

impl SelectorMap {
    /// Load a selector map from a JSON file, replacing the built-in one
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ScoutError::persistence(path, source))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Default for SelectorMap {
    fn default() -> Self {
        Self {
            listing_container: ".sc-1nre5ec-1.crKvIr.listing a.sc-1jge648-0".to_string(),
            title: ".sc-1x0vz2r-0.iHApav".to_string(),
            price: ".sc-1x0vz2r-0.dJAfqm".to_string(),
            location: ".sc-b57yxx-11.kclCPb p.sc-1x0vz2r-0.layWaX".to_string(),
            year: "[title=\"Année-Modèle\"] span".to_string(),
            transmission: "[title=\"Boite de vitesses\"] span".to_string(),
            fuel: "[title=\"Type de carburant\"] span".to_string(),
            image: "img.sc-bsm2tm-3".to_string(),
            recency_label: ".sc-1x0vz2r-0.layWaX.sc-b57yxx-10".to_string(),
            consent_buttons: vec![
                "button.fc-cta-consent.fc-primary-button".to_string(),
                "button[aria-label=\"Autoriser\"]".to_string(),
                "button.fc-button".to_string(),
            ],
        }
    }
}

/// When a navigation is considered complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// Document load event
    Load,
    /// Load plus a short settle period for client-side rendering
    NetworkIdle,
}

impl FromStr for WaitCondition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" => Ok(WaitCondition::Load),
            "networkidle" | "network_idle" => Ok(WaitCondition::NetworkIdle),
            other => Err(format!("expected `load` or `networkidle`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
    pub timeout: Duration,
    pub wait_until: WaitCondition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_map_loads_from_json() {
        let json = r#"{
            "listingContainer": "div.card",
            "title": "h2",
            "price": ".price",
            "location": ".loc",
            "year": ".year",
            "transmission": ".gear",
            "fuel": ".fuel",
            "image": "img",
            "recencyLabel": ".age"
        }"#;
        let map: SelectorMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.listing_container, "div.card");
        assert!(map.consent_buttons.is_empty());
    }

    #[test]
    fn wait_condition_parses_config_values() {
        assert_eq!("load".parse::<WaitCondition>(), Ok(WaitCondition::Load));
        assert_eq!(" NetworkIdle ".parse::<WaitCondition>(), Ok(WaitCondition::NetworkIdle));
        assert!("domcontentloaded".parse::<WaitCondition>().is_err());
    }
}
