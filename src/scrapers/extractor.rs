use crate::error::{Result, ScoutError};
use crate::models::ListingRecord;
use crate::scrapers::types::SelectorMap;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Oldest model year accepted as genuine
pub const MIN_YEAR: i32 = 1900;

/// Field values the site uses for "not provided"
const MISSING_VALUE_SENTINELS: &[&str] = &["N/A", "-", "Unknown", "Indisponible", ""];

/// Price texts meaning "ask the seller"
const PRICE_UNSPECIFIED_MARKERS: &[&str] = &["prix non spécifié", "price not specified"];

/// Boilerplate the site puts before the neighbourhood name
const LOCATION_PREFIXES: &[&str] = &["Voitures d'occasion dans ", "Voitures dans ", "dans "];

/// Turns a rendered result page into normalized listing records
#[derive(Debug, Clone)]
pub struct PageExtractor {
    selectors: SelectorMap,
    /// Scheme and host of the site; relative hrefs resolve against its root
    origin: Url,
    current_year: i32,
}

/// Field selectors compiled once per page. `None` means the selector did not
/// parse and the field is always null.
struct CompiledFields {
    title: Option<Selector>,
    price: Option<Selector>,
    location: Option<Selector>,
    year: Option<Selector>,
    transmission: Option<Selector>,
    fuel: Option<Selector>,
    image: Option<Selector>,
    recency_label: Option<Selector>,
    anchor: Option<Selector>,
}

impl PageExtractor {
    /// `site_url` may be any page of the site, only its origin is kept
    pub fn new(selectors: SelectorMap, site_url: Url, current_year: i32) -> Self {
        let origin = site_url.join("/").unwrap_or(site_url);
        Self {
            selectors,
            origin,
            current_year,
        }
    }

    /// Extract every genuine listing on the page, in rendering order.
    ///
    /// Only an unusable listing-container selector fails the page; field
    /// problems null out the field and are logged.
    pub fn extract(&self, html: &str) -> Result<Vec<ListingRecord>> {
        let container = Selector::parse(&self.selectors.listing_container)
            .map_err(|e| ScoutError::extraction("listingContainer", format!("{e:?}")))?;
        let fields = self.compile_fields();

        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for (idx, card) in document.select(&container).enumerate() {
            match self.extract_card(card, &fields) {
                Some(record) => records.push(record),
                None => debug!(card = idx, "Skipped container without title or link"),
            }
        }

        debug!(count = records.len(), "Extracted listings from page");
        Ok(records)
    }

    fn compile_fields(&self) -> CompiledFields {
        let s = &self.selectors;
        CompiledFields {
            title: compile("title", &s.title),
            price: compile("price", &s.price),
            location: compile("location", &s.location),
            year: compile("year", &s.year),
            transmission: compile("transmission", &s.transmission),
            fuel: compile("fuel", &s.fuel),
            image: compile("image", &s.image),
            recency_label: compile("recencyLabel", &s.recency_label),
            anchor: compile("link", "a[href]"),
        }
    }

    fn extract_card(&self, card: ElementRef<'_>, fields: &CompiledFields) -> Option<ListingRecord> {
        let title = field_text(card, fields.title.as_ref())?;
        let link = self.card_link(card, fields.anchor.as_ref())?;

        Some(ListingRecord {
            title,
            price: field_text(card, fields.price.as_ref()).and_then(|t| normalize_price(&t)),
            location: field_text(card, fields.location.as_ref())
                .and_then(|t| strip_location_prefix(&t)),
            year: field_text(card, fields.year.as_ref())
                .and_then(|t| normalize_year(&t, self.current_year)),
            transmission: field_text(card, fields.transmission.as_ref())
                .and_then(|t| normalize_spec_value(&t)),
            fuel: field_text(card, fields.fuel.as_ref()).and_then(|t| normalize_spec_value(&t)),
            image: self.card_image(card, fields.image.as_ref()).unwrap_or_default(),
            link,
            posted_at: field_text(card, fields.recency_label.as_ref()),
        })
    }

    /// The card's own `href`, else the first anchor inside it, made absolute
    fn card_link(&self, card: ElementRef<'_>, anchor: Option<&Selector>) -> Option<String> {
        let href = card.value().attr("href").or_else(|| {
            anchor
                .and_then(|sel| card.select(sel).next())
                .and_then(|a| a.value().attr("href"))
        })?;

        self.resolve(href, "link")
    }

    fn card_image(&self, card: ElementRef<'_>, image: Option<&Selector>) -> Option<String> {
        let img = card.select(image?).next()?;
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .map(str::trim)
            .filter(|s| !s.is_empty())?;

        self.resolve(src, "image")
    }

    fn resolve(&self, raw: &str, field: &str) -> Option<String> {
        match self.origin.join(raw.trim()) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!(field, value = raw, error = %e, "Could not resolve URL");
                None
            }
        }
    }
}

fn compile(field: &str, css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            let err = ScoutError::extraction(field, format!("{e:?}"));
            warn!(
                field,
                selector = css,
                error = %err,
                "Field selector rejected, field will be null"
            );
            None
        }
    }
}

/// Whitespace-collapsed text of the first match, `None` when missing or blank
fn field_text(card: ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
    let el = card.select(selector?).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// "125 000 DH" -> 125000. Unspecified, empty or zero prices are `None`.
pub fn normalize_price(raw: &str) -> Option<u64> {
    let lowered = raw.trim().to_lowercase();
    if PRICE_UNSPECIFIED_MARKERS.iter().any(|m| lowered.contains(m)) {
        return None;
    }

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok().filter(|p| *p > 0)
}

pub fn normalize_year(raw: &str, current_year: i32) -> Option<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (MIN_YEAR..=current_year).contains(y))
}

/// Transmission and fuel values, with "not provided" sentinels mapped to `None`
pub fn normalize_spec_value(raw: &str) -> Option<String> {
    let value = raw.trim();
    if MISSING_VALUE_SENTINELS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(value))
    {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn strip_location_prefix(raw: &str) -> Option<String> {
    let mut location = raw.trim_start();
    for prefix in LOCATION_PREFIXES {
        let matches = location
            .get(..prefix.len())
            .map(|head| head.eq_ignore_ascii_case(prefix))
            .unwrap_or(false);
        if matches {
            location = &location[prefix.len()..];
            break;
        }
    }

    let location = location.trim();
    (!location.is_empty()).then(|| location.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_selectors() -> SelectorMap {
        SelectorMap {
            listing_container: "div.listing a.card".to_string(),
            title: "h3".to_string(),
            price: ".price".to_string(),
            location: ".loc".to_string(),
            year: ".year".to_string(),
            transmission: ".gear".to_string(),
            fuel: ".fuel".to_string(),
            image: "img".to_string(),
            recency_label: ".age".to_string(),
            consent_buttons: vec![],
        }
    }

    fn extractor() -> PageExtractor {
        PageExtractor::new(
            test_selectors(),
            Url::parse("https://www.avito.ma").unwrap(),
            2026,
        )
    }

    const PAGE: &str = r#"
        <html><body><div class="listing">
          <a class="card" href="/fr/agadir/voitures/dacia_logan_1.htm">
            <img src="https://content.avito.ma/1.jpg">
            <h3> Dacia Logan  2019 </h3>
            <span class="price">85 000 DH</span>
            <p class="loc">Voitures dans Agadir, Talborjt</p>
            <span class="year">2019</span>
            <span class="gear">Manuelle</span>
            <span class="fuel">Diesel</span>
            <span class="age">il y a 3 heures</span>
          </a>
          <a class="card" href="https://www.avito.ma/fr/agadir/voitures/peugeot_2.htm">
            <img data-src="/img/2.jpg">
            <h3>Peugeot 208</h3>
            <span class="price">Prix non spécifié</span>
            <span class="year">1850</span>
            <span class="gear">N/A</span>
            <span class="fuel">-</span>
          </a>
          <a class="card" href="/fr/banner.htm"><span class="price">100 DH</span></a>
        </div></body></html>
    "#;

    #[test]
    fn extracts_and_normalizes_cards() {
        let records = extractor().extract(PAGE).unwrap();
        assert_eq!(records.len(), 2, "card without title is dropped");

        let dacia = &records[0];
        assert_eq!(dacia.title, "Dacia Logan 2019");
        assert_eq!(dacia.price, Some(85_000));
        assert_eq!(dacia.location.as_deref(), Some("Agadir, Talborjt"));
        assert_eq!(dacia.year, Some(2019));
        assert_eq!(dacia.transmission.as_deref(), Some("Manuelle"));
        assert_eq!(dacia.fuel.as_deref(), Some("Diesel"));
        assert_eq!(dacia.image, "https://content.avito.ma/1.jpg");
        assert_eq!(
            dacia.link,
            "https://www.avito.ma/fr/agadir/voitures/dacia_logan_1.htm"
        );
        assert_eq!(dacia.posted_at.as_deref(), Some("il y a 3 heures"));

        let peugeot = &records[1];
        assert_eq!(peugeot.price, None);
        assert_eq!(peugeot.year, None);
        assert_eq!(peugeot.transmission, None);
        assert_eq!(peugeot.fuel, None);
        assert_eq!(peugeot.location, None);
        assert_eq!(peugeot.image, "https://www.avito.ma/img/2.jpg");
        assert_eq!(peugeot.posted_at, None);
    }

    #[test]
    fn bad_field_selector_only_nulls_that_field() {
        let mut selectors = test_selectors();
        selectors.price = "[[[".to_string();
        let extractor = PageExtractor::new(
            selectors,
            Url::parse("https://www.avito.ma").unwrap(),
            2026,
        );

        let records = extractor.extract(PAGE).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.price.is_none()));
        assert_eq!(records[0].year, Some(2019));
    }

    #[test]
    fn bad_container_selector_fails_the_page() {
        let mut selectors = test_selectors();
        selectors.listing_container = "div..".to_string();
        let extractor = PageExtractor::new(
            selectors,
            Url::parse("https://www.avito.ma").unwrap(),
            2026,
        );

        let err = extractor.extract(PAGE).unwrap_err();
        assert!(matches!(err, ScoutError::Extraction { .. }));
    }

    #[test]
    fn relative_links_resolve_against_site_root() {
        let extractor = PageExtractor::new(
            test_selectors(),
            Url::parse("https://www.avito.ma/fr/agadir/voitures?o=3").unwrap(),
            2026,
        );
        let page = r#"<div class="listing">
            <a class="card" href="fr/agadir/voitures/clio_9.htm"><h3>Renault Clio</h3></a>
        </div>"#;

        let records = extractor.extract(page).unwrap();
        assert_eq!(
            records[0].link,
            "https://www.avito.ma/fr/agadir/voitures/clio_9.htm"
        );
    }

    #[test]
    fn empty_page_yields_no_records() {
        let records = extractor().extract("<html><body></body></html>").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn price_normalization() {
        assert_eq!(normalize_price("125 000 DH"), Some(125_000));
        assert_eq!(normalize_price("DH"), None);
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("0 DH"), None);
        assert_eq!(normalize_price("Prix non spécifié"), None);
    }

    #[test]
    fn year_bounds() {
        assert_eq!(normalize_year("1900", 2026), Some(1900));
        assert_eq!(normalize_year("2026", 2026), Some(2026));
        assert_eq!(normalize_year("2027", 2026), None);
        assert_eq!(normalize_year("1899", 2026), None);
        assert_eq!(normalize_year("recent", 2026), None);
    }

    #[test]
    fn spec_value_sentinels() {
        for sentinel in ["N/A", "-", "Unknown", "Indisponible", "", "  "] {
            assert_eq!(normalize_spec_value(sentinel), None, "{sentinel:?}");
        }
        assert_eq!(normalize_spec_value(" Automatique "), Some("Automatique".to_string()));
    }

    #[test]
    fn location_prefixes() {
        assert_eq!(
            strip_location_prefix("Voitures d'occasion dans Agadir, Dakhla").as_deref(),
            Some("Agadir, Dakhla")
        );
        assert_eq!(strip_location_prefix("Hay Mohammadi").as_deref(), Some("Hay Mohammadi"));
        assert_eq!(strip_location_prefix("dans "), None);
    }
}
