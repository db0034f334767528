use crate::adapter::{DocumentAdapter, KeyRule};
use crate::document::DocumentTree;
use crate::error::{CatalogError, Result};
use crate::logging::{CATALOG_ADAPTER, CATALOG_VALIDATE};
use crate::model::{Heading, ImageRef, Page};

/// Drops heading candidates whose ordinal does not strictly increase over the
/// last accepted heading, across the whole document.
pub struct HeadingValidator<'a> {
    adapter: &'a dyn DocumentAdapter,
    last_accepted: Option<String>,
}

impl<'a> HeadingValidator<'a> {
    pub fn new(adapter: &'a dyn DocumentAdapter) -> Self {
        HeadingValidator {
            adapter,
            last_accepted: None,
        }
    }

    pub fn last_accepted(&self) -> Option<&str> {
        self.last_accepted.as_deref()
    }

    /// The first candidate with a readable ordinal is accepted unconditionally.
    /// A candidate whose ordinal cannot be read is never accepted.
    pub fn accept(&mut self, candidate: &str) -> bool {
        let accepted = match &self.last_accepted {
            None => self.adapter.ordinal(candidate).is_some(),
            Some(prev) => self.adapter.validate_heading(prev, candidate),
        };
        if accepted {
            self.last_accepted = Some(candidate.to_string());
        }
        accepted
    }

    /// Keeps the accepted candidates of one page, in page order.
    pub fn filter(&mut self, candidates: Vec<String>) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|candidate| {
                let accepted = self.accept(candidate);
                if !accepted {
                    tracing::debug!(
                        target: CATALOG_VALIDATE,
                        candidate = %candidate,
                        last = ?self.last_accepted,
                        "Dropped out-of-order or unnumbered heading"
                    );
                }
                accepted
            })
            .collect()
    }
}

/// Adapts every catalog page of `tree` and keeps only validated headings.
pub fn validate_pages(
    adapter: &dyn DocumentAdapter,
    key_rule: &KeyRule,
    tree: &DocumentTree,
    images: &[ImageRef],
) -> Result<Vec<Page>> {
    let mut validator = HeadingValidator::new(adapter);
    let mut pages = Vec::new();

    for node in adapter.pages(tree) {
        let number = adapter.page_number(node)?;
        let candidates = adapter.headings(node);
        let candidate_count = candidates.len();

        let headings = validator
            .filter(candidates)
            .into_iter()
            .map(|text| {
                let ordinal = adapter.ordinal(&text).ok_or_else(|| {
                    CatalogError::AdapterContract(format!(
                        "heading `{}` on page {} has no ordinal",
                        text, number
                    ))
                })?;
                let key = key_rule.section_key(&text);
                Ok(Heading { text, ordinal, key })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::trace!(
            target: CATALOG_ADAPTER,
            page = number,
            candidates = candidate_count,
            accepted = headings.len(),
            "Adapted page"
        );

        pages.push(Page {
            number,
            heading_at_start: adapter.heading_at_start(node),
            images: adapter.page_images(number, images),
            headings,
        });
    }

    Ok(pages)
}
