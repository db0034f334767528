#![allow(dead_code)]

use catalog_clusters::adapter::{HeadingPattern, KeyRule};
use catalog_clusters::document::{DocumentTree, PageNode};
use catalog_clusters::model::{Heading, Match, Page, Section};

/// Heading with the key the Harunobu layout would derive.
pub fn heading(text: &str) -> Heading {
    let rule = KeyRule::new(HeadingPattern::standard(), Some("series")).unwrap();
    heading_with_key(text, &rule.section_key(text))
}

pub fn heading_with_key(text: &str, key: &str) -> Heading {
    let ordinal = text
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0);
    Heading {
        text: text.to_string(),
        ordinal,
        key: key.to_string(),
    }
}

pub struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    pub fn new(number: f64) -> Self {
        PageBuilder {
            page: Page {
                number,
                headings: Vec::new(),
                heading_at_start: false,
                images: Vec::new(),
            },
        }
    }

    pub fn headings(mut self, texts: &[&str]) -> Self {
        self.page.headings = texts.iter().map(|t| heading(t)).collect();
        self
    }

    pub fn images(mut self, names: &[&str]) -> Self {
        self.page.images = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn starts_with_heading(mut self) -> Self {
        self.page.heading_at_start = true;
        self
    }

    pub fn build(self) -> Page {
        self.page
    }
}

pub fn sample_match(id: &str, source: &str) -> Match {
    Match {
        id: id.to_string(),
        source: source.to_string(),
        url: format!("/images/{}.jpg", id),
        thumb: format!("/thumbs/{}.jpg", id),
        scaled: format!("/scaled/{}.jpg", id),
        image: format!("{}.jpg", id),
    }
}

/// A section keyed `key` on pages `start..=end` carrying matches with `ids`.
pub fn keyed_section(key: &str, start: f64, end: f64, ids: &[&str]) -> Section {
    let text = format!("{}. {}", start as i64, key);
    let mut section = Section::new("doc", heading_with_key(&text, key), start, end);
    section.related = ids.iter().map(|id| sample_match(id, "museum")).collect();
    section
}

pub fn page_node(id: &str, blocks: &[&str]) -> PageNode {
    PageNode::new(id, blocks.iter().map(|b| b.to_string()).collect())
}

/// Renders pages the way the converter lays them out.
pub fn converter_html(pages: &[(&str, &[&str])]) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>catalog</title></head><body>\n");
    for (id, blocks) in pages {
        html.push_str(&format!("<div id=\"{}\" style=\"position:relative\">\n", id));
        for block in blocks.iter() {
            html.push_str(&format!("<p style=\"position:absolute\">{}</p>\n", block));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</body></html>\n");
    html
}

pub fn tree(pages: &[(&str, &[&str])]) -> DocumentTree {
    DocumentTree::parse_html(&converter_html(pages))
}
