use crate::logging::CATALOG_IMAGES;
use crate::model::{ImageRef, Section};

/// A page with fewer images than accepted headings.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDeficit {
    pub page: f64,
    pub headings: usize,
    pub images: usize,
}

/// A page with more images than accepted headings.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSurplus {
    pub page: f64,
    pub headings: usize,
    pub images: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Allocation {
    Exact,
    /// Extra images went to the last section of the page, or nowhere if the page has none.
    Surplus(ImageSurplus),
    Deficit(ImageDeficit),
}

/// Pairs a page's images with the sections created from its headings.
///
/// Section `i` gets image `i`. Extra images all go to the last section, missing
/// ones are reported and never invented.
pub fn allocate_images(page: f64, images: &[ImageRef], sections: &mut [Section]) -> Allocation {
    for (section, image) in sections.iter_mut().zip(images) {
        section.images.push(image.clone());
    }

    let headings = sections.len();
    if images.len() > headings {
        match sections.last_mut() {
            Some(last) => {
                last.images.extend(images[headings..].iter().cloned());
                tracing::debug!(
                    target: CATALOG_IMAGES,
                    page,
                    surplus = images.len() - headings,
                    heading = %last.heading.text,
                    "Attached surplus images to last section on page"
                );
            }
            None => tracing::warn!(
                target: CATALOG_IMAGES,
                page,
                images = images.len(),
                "Page has images but no headings; images left unassigned"
            ),
        }
        Allocation::Surplus(ImageSurplus {
            page,
            headings,
            images: images.len(),
        })
    } else if images.len() < headings {
        tracing::warn!(
            target: CATALOG_IMAGES,
            page,
            headings,
            images = images.len(),
            "Fewer images than headings on page"
        );
        Allocation::Deficit(ImageDeficit {
            page,
            headings,
            images: images.len(),
        })
    } else {
        Allocation::Exact
    }
}
