use crate::allocator::{allocate_images, Allocation, ImageDeficit, ImageSurplus};
use crate::error::{CatalogError, Result};
use crate::logging::CATALOG_SECTIONS;
use crate::model::{Page, Section};

/// Sections of one document plus the image diagnostics gathered on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    pub sections: Vec<Section>,
    pub deficits: Vec<ImageDeficit>,
    pub surpluses: Vec<ImageSurplus>,
}

/// Where the section opened by the last heading on `pages[index]` ends.
///
/// Walks forward from the next page. A page that opens with a heading closes
/// the section on the page before it; a page with a heading further down takes
/// the section onto itself; anything else is a continuation. Running off the end
/// of the document means the adapter broke its contract.
pub fn find_end_page(pages: &[Page], index: usize) -> Result<f64> {
    let page = &pages[index];
    if index + 1 >= pages.len() {
        return Ok(page.number);
    }

    for cursor in index + 1..pages.len() {
        let next = &pages[cursor];
        if next.heading_at_start {
            return Ok(pages[cursor - 1].number);
        }
        if !next.headings.is_empty() {
            return Ok(next.number);
        }
    }

    Err(CatalogError::UnterminatedSection {
        page: page.number,
        heading: page
            .headings
            .last()
            .map(|h| h.text.clone())
            .unwrap_or_default(),
    })
}

/// Cuts validated pages into sections and hands each page's images to them.
pub fn build_sections(document: &str, pages: &[Page]) -> Result<Segmentation> {
    let mut segmentation = Segmentation::default();

    for (index, page) in pages.iter().enumerate() {
        if page.headings.is_empty() {
            if let Allocation::Surplus(surplus) = allocate_images(page.number, &page.images, &mut [])
            {
                segmentation.surpluses.push(surplus);
            }
            continue;
        }

        let last = page.headings.len() - 1;
        let mut page_sections = Vec::with_capacity(page.headings.len());
        for (i, heading) in page.headings.iter().enumerate() {
            let end_page = if i < last {
                page.number
            } else {
                find_end_page(pages, index)?
            };
            tracing::debug!(
                target: CATALOG_SECTIONS,
                heading = %heading.text,
                start = page.number,
                end = end_page,
                "Built section"
            );
            page_sections.push(Section::new(document, heading.clone(), page.number, end_page));
        }

        match allocate_images(page.number, &page.images, &mut page_sections) {
            Allocation::Exact => {}
            Allocation::Surplus(surplus) => segmentation.surpluses.push(surplus),
            Allocation::Deficit(deficit) => segmentation.deficits.push(deficit),
        }
        segmentation.sections.extend(page_sections);
    }

    Ok(segmentation)
}
