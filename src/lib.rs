pub mod adapter;
pub mod allocator;
pub mod cluster;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod model;
pub mod sections;
pub mod similarity;
pub mod validator;

use rayon::prelude::*;

use crate::adapter::{build_adapter, require_key_rule, DocumentAdapter, KeyRule};
use crate::cluster::{ClusterMap, RunContext, RunSummary};
use crate::config::{list_images, Manifest, MergePolicy};
use crate::document::DocumentTree;
use crate::error::Result;
use crate::logging::CATALOG_SECTIONS;
use crate::model::ImageRef;
use crate::sections::{build_sections, Segmentation};
use crate::similarity::SimilarityStore;
use crate::validator::validate_pages;

/// A converted document ready for segmentation.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub label: String,
    pub tree: DocumentTree,
    /// Image file names extracted from the document, in listing order.
    pub images: Vec<ImageRef>,
}

impl SourceDocument {
    pub fn new(label: impl Into<String>, tree: DocumentTree, images: Vec<ImageRef>) -> Self {
        SourceDocument {
            label: label.into(),
            tree,
            images,
        }
    }
}

/// Validates headings and cuts one document into sections with their images.
pub fn segment_document(
    adapter: &dyn DocumentAdapter,
    key_rule: &KeyRule,
    document: &SourceDocument,
) -> Result<Segmentation> {
    let pages = validate_pages(adapter, key_rule, &document.tree, &document.images)?;
    let segmentation = build_sections(&document.label, &pages)?;

    tracing::info!(
        target: CATALOG_SECTIONS,
        document = %document.label,
        pages = pages.len(),
        sections = segmentation.sections.len(),
        deficits = segmentation.deficits.len(),
        "Segmented document"
    );
    Ok(segmentation)
}

/// Segments every document and clusters the resulting sections.
///
/// Documents are segmented in parallel but clustered strictly in the order
/// given, so identical inputs always produce the identical map.
pub fn cluster_corpus(
    adapter: &dyn DocumentAdapter,
    policy: MergePolicy,
    documents: &[SourceDocument],
    store: &SimilarityStore,
) -> Result<(ClusterMap, RunSummary)> {
    let key_rule = require_key_rule(adapter)?;

    let segmentations = documents
        .par_iter()
        .map(|document| segment_document(adapter, key_rule, document))
        .collect::<Result<Vec<_>>>()?;

    let mut run = RunContext::new(policy);
    for segmentation in segmentations {
        run.record_deficits(segmentation.deficits.len());
        run.add_document(segmentation.sections, store);
    }

    let (clusters, summary) = run.finish();
    summary.log();
    Ok((clusters, summary))
}

/// Loads everything a manifest names and runs the whole pipeline.
pub fn run_manifest(manifest: &Manifest) -> Result<(ClusterMap, RunSummary)> {
    let adapter = build_adapter(&manifest.adapter)?;
    // Fail before any file is read if the layout cannot key sections.
    require_key_rule(adapter.as_ref())?;

    let store = match &manifest.similarity {
        Some(path) => SimilarityStore::load(path)?,
        None => SimilarityStore::new(),
    };

    let documents = manifest
        .documents
        .iter()
        .map(|entry| {
            Ok(SourceDocument::new(
                entry.label(),
                DocumentTree::load(&entry.html)?,
                list_images(&entry.images)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    cluster_corpus(adapter.as_ref(), manifest.merge_policy, &documents, &store)
}
