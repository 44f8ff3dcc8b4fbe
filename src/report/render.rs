use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::report::stats::{MarketStats, Share};

/// Output languages of a report run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    Ar,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    pub fn tag(&self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Ar => "AR",
        }
    }

    fn vocabulary(&self) -> &'static Vocabulary {
        match self {
            Language::En => &EN,
            Language::Ar => &AR,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Every piece of text that differs between languages
struct Vocabulary {
    open: &'static str,
    close: &'static str,
    title: &'static str,
    date: &'static str,
    source: &'static str,
    region: &'static str,
    window: &'static str,
    summary: &'static str,
    total_recent: &'static str,
    frequency: &'static str,
    per_hour: &'static str,
    pricing: &'static str,
    with_price: &'static str,
    price_range: &'static str,
    median: &'static str,
    band: &'static str,
    listings: &'static str,
    percent: &'static str,
    not_specified: &'static str,
    brands: &'static str,
    brand: &'static str,
    models: &'static str,
    model: &'static str,
    count: &'static str,
    years: &'static str,
    year: &'static str,
    transmission_fuel: &'static str,
    transmission: &'static str,
    fuel: &'static str,
    kind: &'static str,
    geography: &'static str,
    neighborhood: &'static str,
    resellers: &'static str,
    without_price: &'static str,
    detected_resellers: &'static str,
    private_owners: &'static str,
    not_available: &'static str,
    model_width: usize,
}

static EN: Vocabulary = Vocabulary {
    open: "",
    close: "",
    title: "AutoVision Market Intelligence Report",
    date: "Date",
    source: "Source",
    region: "Region",
    window: "Reporting Window",
    summary: "Listings Summary",
    total_recent: "Total recent listings",
    frequency: "Average listing frequency",
    per_hour: "listings/hour",
    pricing: "Pricing Intelligence",
    with_price: "Listings with price",
    price_range: "Price range",
    median: "Median price",
    band: "Price Range",
    listings: "Listings",
    percent: "%",
    not_specified: "Not Specified",
    brands: "Top Brands",
    brand: "Brand",
    models: "Most Listed Models",
    model: "Model",
    count: "Count",
    years: "Year of Manufacture",
    year: "Year",
    transmission_fuel: "Transmission & Fuel",
    transmission: "Transmission",
    fuel: "Fuel",
    kind: "Type",
    geography: "Geographic Breakdown",
    neighborhood: "Neighborhood",
    resellers: "Reseller Indicators",
    without_price: "Listings without price",
    detected_resellers: "Detected resellers (garage/auto)",
    private_owners: "Estimated private owners",
    not_available: "N/A",
    model_width: 20,
};

static AR: Vocabulary = Vocabulary {
    open: "<div dir=\"rtl\">\n\n",
    close: "</div>\n",
    title: "تقرير السوق",
    date: "التاريخ",
    source: "المصدر",
    region: "المنطقة",
    window: "الفترة",
    summary: "ملخص الإعلانات",
    total_recent: "عدد الإعلانات الحديثة",
    frequency: "متوسط عدد الإعلانات بالساعة",
    per_hour: "إعلان/ساعة",
    pricing: "تحليل الأسعار",
    with_price: "إعلانات مع السعر",
    price_range: "نطاق السعر",
    median: "السعر الوسيط",
    band: "الفئة السعرية",
    listings: "العدد",
    percent: "النسبة",
    not_specified: "غير محدد",
    brands: "العلامات التجارية الأكثر تكراراً",
    brand: "العلامة",
    models: "أكثر الموديلات تكراراً",
    model: "الموديل",
    count: "العدد",
    years: "سنة الصنع",
    year: "السنة",
    transmission_fuel: "ناقل الحركة والوقود",
    transmission: "ناقل الحركة",
    fuel: "نوع الوقود",
    kind: "النوع",
    geography: "توزيع جغرافي – الأحياء",
    neighborhood: "الحي",
    resellers: "مؤشرات البائعين",
    without_price: "عدد الإعلانات بدون سعر",
    detected_resellers: "بائعون محترفون (garage/auto)",
    private_owners: "بائعون أفراد (تقديري)",
    not_available: "غير متوفر",
    model_width: 22,
};

/// A finished report in one language
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub language: Language,
    pub generated_on: NaiveDate,
    pub body: String,
}

impl ReportDocument {
    /// `Market_Report_<LANG>_<YYYY-MM-DD>.md`
    pub fn file_name(&self) -> String {
        format!(
            "Market_Report_{}_{}.md",
            self.language.tag(),
            self.generated_on.format("%Y-%m-%d")
        )
    }
}

/// Renders `MarketStats` as Markdown. Section order and layout are the same
/// for every language.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    source: String,
    region: String,
    currency: String,
}

impl ReportRenderer {
    pub fn new(
        source: impl Into<String>,
        region: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            region: region.into(),
            currency: currency.into(),
        }
    }

    pub fn render_all(
        &self,
        stats: &MarketStats,
        generated_at: DateTime<Utc>,
    ) -> Vec<ReportDocument> {
        Language::ALL
            .iter()
            .map(|&lang| self.render(stats, lang, generated_at))
            .collect()
    }

    pub fn render(
        &self,
        stats: &MarketStats,
        language: Language,
        generated_at: DateTime<Utc>,
    ) -> ReportDocument {
        let v = language.vocabulary();
        let mut out = String::from(v.open);

        self.header(&mut out, v, stats, generated_at);
        self.summary(&mut out, v, stats);
        self.pricing(&mut out, v, stats);

        section(&mut out, 3, v.brands);
        table(&mut out, v.brand, v.listings, stats.top_brands.iter().map(count_row(usize::MAX)));
        out.push_str("\n---\n\n");

        section(&mut out, 4, v.models);
        table(&mut out, v.model, v.count, stats.top_models.iter().map(count_row(v.model_width)));
        out.push_str("\n---\n\n");

        section(&mut out, 5, v.years);
        table(&mut out, v.year, v.listings, stats.top_years.iter().map(count_row(usize::MAX)));
        out.push_str("\n---\n\n");

        section(&mut out, 6, v.transmission_fuel);
        out.push_str(&format!("**{}**\n\n", v.transmission));
        table(&mut out, v.kind, v.percent, stats.transmission.iter().map(percent_row));
        out.push_str(&format!("\n**{}**\n\n", v.fuel));
        table(&mut out, v.kind, v.percent, stats.fuel.iter().map(percent_row));
        out.push_str("\n---\n\n");

        section(&mut out, 7, v.geography);
        table(
            &mut out,
            v.neighborhood,
            v.listings,
            stats.top_locations.iter().map(count_row(usize::MAX)),
        );
        out.push_str("\n---\n\n");

        section(&mut out, 8, v.resellers);
        out.push_str(&format!("- **{}:** {}\n", v.without_price, stats.unpriced));
        out.push_str(&format!("- **{}:** {}\n", v.detected_resellers, stats.resellers));
        out.push_str(&format!(
            "- **{}:** {} ({})\n",
            v.private_owners,
            stats.private_owners,
            pct(stats.private_percent)
        ));

        if !v.close.is_empty() {
            out.push('\n');
            out.push_str(v.close);
        }

        ReportDocument {
            language,
            generated_on: generated_at.date_naive(),
            body: out,
        }
    }

    fn header(
        &self,
        out: &mut String,
        v: &Vocabulary,
        stats: &MarketStats,
        generated_at: DateTime<Utc>,
    ) {
        out.push_str(&format!("# {} – {}\n\n", v.title, self.region));
        out.push_str(&format!("**{}:** {}  \n", v.date, generated_at.format("%Y-%m-%d")));
        out.push_str(&format!("**{}:** {}  \n", v.source, self.source));
        out.push_str(&format!("**{}:** {}  \n", v.region, self.region));
        out.push_str(&format!(
            "**{}:** {} → {}\n\n---\n\n",
            v.window,
            stats.window.start.format("%Y-%m-%d %H:%M"),
            stats.window.end.format("%Y-%m-%d %H:%M")
        ));
    }

    fn summary(&self, out: &mut String, v: &Vocabulary, stats: &MarketStats) {
        section(out, 1, v.summary);
        out.push_str(&format!("- **{}:** {}\n", v.total_recent, stats.total));
        out.push_str(&format!(
            "- **{}:** ~{:.1} {}\n\n---\n\n",
            v.frequency, stats.listings_per_hour, v.per_hour
        ));
    }

    fn pricing(&self, out: &mut String, v: &Vocabulary, stats: &MarketStats) {
        let (low, high) = match stats.price_range {
            Some((lo, hi)) => (lo.to_string(), hi.to_string()),
            None => (v.not_available.to_string(), v.not_available.to_string()),
        };
        let median = stats
            .median_price
            .map_or_else(|| v.not_available.to_string(), |m| m.to_string());

        section(out, 2, v.pricing);
        out.push_str(&format!(
            "- **{}:** {} / {} ({})\n",
            v.with_price,
            stats.priced,
            stats.total,
            pct(stats.priced_percent)
        ));
        out.push_str(&format!("- **{}:** {} – {} {}\n", v.price_range, low, high, self.currency));
        out.push_str(&format!("- **{}:** ~{} {}\n\n", v.median, median, self.currency));

        out.push_str(&format!(
            "| {} ({}) | {} | {} |\n|---|---|---|\n",
            v.band, self.currency, v.listings, v.percent
        ));
        for band in &stats.price_bands {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                band.band.label(),
                band.count,
                pct(band.percent)
            ));
        }
        out.push_str(&format!(
            "| {} | {} | {} |\n\n---\n\n",
            v.not_specified,
            stats.unpriced,
            pct(stats.unpriced_percent)
        ));
    }
}

fn section(out: &mut String, number: u8, heading: &str) {
    out.push_str(&format!("## {number}. {heading}\n\n"));
}

fn table<I>(out: &mut String, left: &str, right: &str, rows: I)
where
    I: Iterator<Item = (String, String)>,
{
    out.push_str(&format!("| {left} | {right} |\n|---|---|\n"));
    for (label, value) in rows {
        out.push_str(&format!("| {label} | {value} |\n"));
    }
}

fn count_row(width: usize) -> impl Fn(&Share) -> (String, String) {
    move |share| (share.label.chars().take(width).collect(), share.count.to_string())
}

fn percent_row(share: &Share) -> (String, String) {
    (share.label.clone(), pct(share.percent))
}

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}
