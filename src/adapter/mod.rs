//! Document-layout adapters.
//!
//! Each supported catalog layout gets one [`DocumentAdapter`] implementation.
//! The segmentation core only ever talks to this trait, so page boundaries,
//! heading detection and per-page image assignment stay layout-specific.

mod harunobu;
mod numbered;

pub use harunobu::HarunobuAdapter;
pub use numbered::NumberedAdapter;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{AdapterConfig, AdapterKind};
use crate::document::{DocumentTree, PageNode};
use crate::error::{CatalogError, Result};
use crate::logging::CATALOG_ADAPTER;
use crate::model::ImageRef;

/// Integer, optional `-N` range, a period, whitespace, then the first title character.
pub const STANDARD_HEADING: &str = r"^(\d+)(?:-\d+)?\.\s+(\S)";
/// Like [`STANDARD_HEADING`] but the title has to start with an uppercase letter.
pub const STRICT_HEADING: &str = r"^(\d+)(?:-\d+)?\.\s+(\p{Lu})";

static NON_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z]").expect("letters regex"));

pub trait DocumentAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Catalog pages in document order, front matter excluded.
    fn pages<'d>(&self, document: &'d DocumentTree) -> &'d [PageNode];

    fn page_number(&self, page: &PageNode) -> Result<f64>;

    /// Every block on the page that looks like a numbered heading.
    fn headings(&self, page: &PageNode) -> Vec<String>;

    /// Images belonging to the page numbered `page_number`, in listing order.
    fn page_images(&self, page_number: f64, all_images: &[ImageRef]) -> Vec<ImageRef>;

    /// True iff `cur`'s ordinal is strictly greater than `prev`'s.
    fn validate_heading(&self, prev: &str, cur: &str) -> bool;

    fn heading_at_start(&self, page: &PageNode) -> bool;

    fn ordinal(&self, heading: &str) -> Option<u64>;

    /// The `sectionKey` capability. Older layouts do not provide one.
    fn key_rule(&self) -> Option<&KeyRule>;
}

/// Compiled numbered-heading regex. Group 1 is the ordinal, group 2 the first
/// character of the title.
#[derive(Debug, Clone)]
pub struct HeadingPattern {
    regex: Regex,
}

impl HeadingPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        if regex.captures_len() < 3 {
            return Err(CatalogError::AdapterContract(format!(
                "heading pattern `{}` needs an ordinal group and a title group",
                pattern
            )));
        }
        Ok(HeadingPattern { regex })
    }

    pub fn standard() -> Self {
        HeadingPattern {
            regex: Regex::new(STANDARD_HEADING).expect("standard heading regex"),
        }
    }

    pub fn strict() -> Self {
        HeadingPattern {
            regex: Regex::new(STRICT_HEADING).expect("strict heading regex"),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn ordinal(&self, text: &str) -> Option<u64> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Ordinal comparison shared by every adapter.
    pub fn increases(&self, prev: &str, cur: &str) -> bool {
        match (self.ordinal(prev), self.ordinal(cur)) {
            (Some(p), Some(c)) => p < c,
            _ => false,
        }
    }

    /// Drops the numbering, keeping the title from its first character on.
    pub fn strip_numbering(&self, text: &str) -> String {
        self.regex.replace(text, "${2}").into_owned()
    }
}

/// Turns heading text into the default cluster key.
#[derive(Debug, Clone)]
pub struct KeyRule {
    pattern: HeadingPattern,
    series: Option<Regex>,
}

impl KeyRule {
    pub fn new(pattern: HeadingPattern, series_label: Option<&str>) -> Result<Self> {
        let series = series_label
            .map(|label| Regex::new(&format!(r"(?i)^.*?{}(.*)$", regex::escape(label))))
            .transpose()?;
        Ok(KeyRule { pattern, series })
    }

    pub fn section_key(&self, heading: &str) -> String {
        let title = self.pattern.strip_numbering(heading);
        let title = match &self.series {
            Some(series) => series.replace(&title, "${1}").into_owned(),
            None => title,
        };
        NON_LETTERS.replace_all(&title, "").into_owned()
    }
}

/// How a layout names the images extracted from a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageNaming {
    /// `<stem>-<page>_<n>.<ext>`, as written by the converter.
    #[default]
    Infix,
    /// `<page>-<n>.<ext>` or `<page>_<n>.<ext>`.
    Prefix,
}

impl ImageNaming {
    pub fn select(&self, page_number: f64, all_images: &[ImageRef]) -> Vec<ImageRef> {
        let page = format_page(page_number);
        all_images
            .iter()
            .filter(|name| match self {
                ImageNaming::Infix => name.contains(&format!("-{}_", page)),
                ImageNaming::Prefix => {
                    name.starts_with(&format!("{}-", page)) || name.starts_with(&format!("{}_", page))
                }
            })
            .cloned()
            .collect()
    }
}

/// `12.0` prints as `12`, foldouts keep their fraction.
pub fn format_page(number: f64) -> String {
    if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}

/// Parses the first number out of a page id.
pub(crate) fn number_in_id(id: &str, number: &Regex) -> Result<f64> {
    number
        .find(id)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| CatalogError::AdapterContract(format!("page id `{}` carries no number", id)))
}

pub fn build_adapter(config: &AdapterConfig) -> Result<Box<dyn DocumentAdapter>> {
    let adapter: Box<dyn DocumentAdapter> = match config.kind {
        AdapterKind::Harunobu => {
            let mut adapter = HarunobuAdapter::new();
            if let Some(skip) = config.front_matter_pages {
                adapter = adapter.with_front_matter(skip);
            }
            Box::new(adapter)
        }
        AdapterKind::Numbered => Box::new(NumberedAdapter::from_config(config)?),
    };

    tracing::info!(target: CATALOG_ADAPTER, adapter = adapter.name(), "Selected document adapter");
    Ok(adapter)
}

/// Startup check for the `sectionKey` capability.
pub fn require_key_rule(adapter: &dyn DocumentAdapter) -> Result<&KeyRule> {
    adapter
        .key_rule()
        .ok_or_else(|| CatalogError::MissingCapability {
            adapter: adapter.name().to_string(),
            capability: "section_key",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_pattern_reads_ordinals() {
        let pattern = HeadingPattern::standard();
        assert_eq!(pattern.ordinal("12. Night Rain"), Some(12));
        assert_eq!(pattern.ordinal("12-13. Diptych"), Some(12));
        assert_eq!(pattern.ordinal("12.Night Rain"), None);
        assert_eq!(pattern.ordinal("Plate 12. Night Rain"), None);
        assert!(pattern.increases("2. B", "3. C"));
        assert!(!pattern.increases("2. B", "1-2. Dupe"));
        assert!(!pattern.increases("2. B", "2. B again"));
    }

    #[test]
    fn strict_pattern_requires_capitalised_title() {
        let pattern = HeadingPattern::strict();
        assert!(pattern.is_match("4. Crow and Heron"));
        assert!(!pattern.is_match("4. see also plate 9"));
    }

    #[test]
    fn key_rule_strips_numbering_series_and_non_letters() {
        let rule = KeyRule::new(HeadingPattern::standard(), Some("series")).unwrap();
        assert_eq!(rule.section_key("7. Girl on a Veranda"), "GirlonaVeranda");
        assert_eq!(
            rule.section_key("8-9. From the Series: Eight Views, Night Rain"),
            "EightViewsNightRain"
        );
        assert_eq!(rule.section_key("10. SERIES Fūryū"), "Fry");

        let plain = KeyRule::new(HeadingPattern::standard(), None).unwrap();
        assert_eq!(plain.section_key("3. The Series Title"), "TheSeriesTitle");
    }

    #[test]
    fn image_naming_conventions() {
        let images: Vec<ImageRef> = vec![
            "simple-5_1.jpg".into(),
            "simple-5_2.jpg".into(),
            "simple-15_1.jpg".into(),
            "5-1.png".into(),
            "55_1.png".into(),
        ];
        assert_eq!(
            ImageNaming::Infix.select(5.0, &images),
            vec!["simple-5_1.jpg", "simple-5_2.jpg"]
        );
        assert_eq!(ImageNaming::Prefix.select(5.0, &images), vec!["5-1.png"]);
        assert_eq!(format_page(12.5), "12.5");
    }
}
