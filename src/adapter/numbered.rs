use once_cell::sync::Lazy;
use regex::Regex;

use super::{number_in_id, DocumentAdapter, HeadingPattern, ImageNaming, KeyRule};
use crate::config::AdapterConfig;
use crate::document::{DocumentTree, PageNode};
use crate::error::Result;
use crate::model::ImageRef;

static PAGE_ID_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("page id regex"));

/// Generic numbered-entry layout, tuned entirely through [`AdapterConfig`].
///
/// Page ids may carry fractional numbers (`page12.5`) for foldouts. With
/// `section_keys` disabled it behaves like the older layouts that never had a
/// key rule, and the run refuses to start.
#[derive(Debug, Clone)]
pub struct NumberedAdapter {
    front_matter: usize,
    running_header: bool,
    pattern: HeadingPattern,
    key_rule: Option<KeyRule>,
    naming: ImageNaming,
}

impl NumberedAdapter {
    pub fn from_config(config: &AdapterConfig) -> Result<Self> {
        let pattern = match &config.heading_pattern {
            Some(custom) => HeadingPattern::new(custom)?,
            None if config.strict_headings => HeadingPattern::strict(),
            None => HeadingPattern::standard(),
        };
        let key_rule = if config.section_keys {
            Some(KeyRule::new(pattern.clone(), config.series_label.as_deref())?)
        } else {
            None
        };

        Ok(NumberedAdapter {
            front_matter: config.front_matter_pages.unwrap_or(0),
            running_header: config.running_header,
            pattern,
            key_rule,
            naming: config.image_naming,
        })
    }
}

impl DocumentAdapter for NumberedAdapter {
    fn name(&self) -> &str {
        "numbered"
    }

    fn pages<'d>(&self, document: &'d DocumentTree) -> &'d [PageNode] {
        let skip = self.front_matter.min(document.pages.len());
        &document.pages[skip..]
    }

    fn page_number(&self, page: &PageNode) -> Result<f64> {
        number_in_id(&page.id, &PAGE_ID_NUMBER)
    }

    fn headings(&self, page: &PageNode) -> Vec<String> {
        page.blocks
            .iter()
            .filter(|block| self.pattern.is_match(block))
            .cloned()
            .collect()
    }

    fn page_images(&self, page_number: f64, all_images: &[ImageRef]) -> Vec<ImageRef> {
        self.naming.select(page_number, all_images)
    }

    fn validate_heading(&self, prev: &str, cur: &str) -> bool {
        self.pattern.increases(prev, cur)
    }

    fn heading_at_start(&self, page: &PageNode) -> bool {
        let first_content = if self.running_header { 2 } else { 1 };
        page.block(first_content)
            .map_or(true, |block| self.pattern.is_match(block))
    }

    fn ordinal(&self, heading: &str) -> Option<u64> {
        self.pattern.ordinal(heading)
    }

    fn key_rule(&self) -> Option<&KeyRule> {
        self.key_rule.as_ref()
    }
}
