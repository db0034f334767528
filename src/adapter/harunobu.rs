use once_cell::sync::Lazy;
use regex::Regex;

use super::{number_in_id, DocumentAdapter, HeadingPattern, ImageNaming, KeyRule};
use crate::document::{DocumentTree, PageNode};
use crate::error::Result;
use crate::model::ImageRef;

static PAGE_ID_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("page id regex"));

/// The Harunobu catalogue layout.
///
/// Four pages of front matter, a running header as the first block of every
/// page, headings such as `"112-113. Series: Eight Views ..."`, and images named
/// by the converter's `<stem>-<page>_<n>` convention.
#[derive(Debug, Clone)]
pub struct HarunobuAdapter {
    front_matter: usize,
    pattern: HeadingPattern,
    key_rule: KeyRule,
    naming: ImageNaming,
}

impl HarunobuAdapter {
    pub const FRONT_MATTER_PAGES: usize = 4;

    pub fn new() -> Self {
        let pattern = HeadingPattern::standard();
        let key_rule = KeyRule::new(pattern.clone(), Some("series")).expect("series key regex");
        HarunobuAdapter {
            front_matter: Self::FRONT_MATTER_PAGES,
            pattern,
            key_rule,
            naming: ImageNaming::Infix,
        }
    }

    pub fn with_front_matter(mut self, pages: usize) -> Self {
        self.front_matter = pages;
        self
    }
}

impl Default for HarunobuAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAdapter for HarunobuAdapter {
    fn name(&self) -> &str {
        "harunobu"
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

    // Block one is the running header. A page with nothing after it counts as
    // starting fresh.
    fn heading_at_start(&self, page: &PageNode) -> bool {
        page.block(2).map_or(true, |block| self.pattern.is_match(block))
    }

    fn ordinal(&self, heading: &str) -> Option<u64> {
        self.pattern.ordinal(heading)
    }

    fn key_rule(&self) -> Option<&KeyRule> {
        Some(&self.key_rule)
    }
}
