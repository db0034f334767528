//! Page/paragraph tree of a converted catalog document.
//!
//! The converter emits one container per page (`<div id="page12-div">`) holding
//! one `<p>` per positioned text block. Only that much structure is kept.

use std::path::Path;

use scraper::{ElementRef, Html, Selector};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageNode {
    pub id: String,
    /// Text of each paragraph, trimmed, in document order.
    pub blocks: Vec<String>,
}

impl PageNode {
    pub fn new(id: impl Into<String>, blocks: Vec<String>) -> Self {
        PageNode {
            id: id.into(),
            blocks,
        }
    }

    /// The `n`th text block, counting from one.
    pub fn block(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.blocks.get(i))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentTree {
    pub pages: Vec<PageNode>,
}

impl DocumentTree {
    pub fn parse_html(html: &str) -> Self {
        let page_selector = Selector::parse("div[id^='page']").expect("page selector");
        let block_selector = Selector::parse("p").expect("p selector");

        let document = Html::parse_document(html);
        let pages = document
            .select(&page_selector)
            .map(|page| {
                let id = page.value().attr("id").unwrap_or_default().to_string();
                let blocks = page.select(&block_selector).map(block_text).collect();
                PageNode { id, blocks }
            })
            .collect();

        DocumentTree { pages }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Ok(Self::parse_html(&html))
    }
}

fn block_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
