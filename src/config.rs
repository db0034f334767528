//! Corpus manifest and adapter settings.
//!
//! A manifest names the adapter, where the similarity results live, and the
//! converted documents in the order they are clustered:
//!
//! ```json
//! {
//!   "adapter": { "kind": "harunobu" },
//!   "similarity": "matches.json",
//!   "documents": [{ "label": "vol1", "html": "vol1/complex.html", "images": "vol1" }]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adapter::ImageNaming;
use crate::error::{CatalogError, Result};
use crate::model::ImageRef;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "ppm", "pbm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    Harunobu,
    Numbered,
}

impl FromStr for AdapterKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "harunobu" => Ok(AdapterKind::Harunobu),
            "numbered" => Ok(AdapterKind::Numbered),
            other => Err(CatalogError::UnknownAdapter(other.to_string())),
        }
    }
}

/// How a section is keyed when its matches point at several existing clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// The last matching cluster in match order takes the section. Clusters never merge.
    #[default]
    LastMatchWins,
    /// Every matching cluster is folded into the last one.
    Merge,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "last-match-wins" => Ok(MergePolicy::LastMatchWins),
            "merge" => Ok(MergePolicy::Merge),
            other => Err(format!(
                "unknown merge policy `{}` (expected `last-match-wins` or `merge`)",
                other
            )),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub kind: AdapterKind,
    /// Overrides the layout's front-matter page count.
    #[serde(default)]
    pub front_matter_pages: Option<usize>,
    /// Whether block one of every page is a running header.
    #[serde(default = "default_true")]
    pub running_header: bool,
    #[serde(default)]
    pub strict_headings: bool,
    /// Custom heading regex; group 1 the ordinal, group 2 the title start.
    #[serde(default)]
    pub heading_pattern: Option<String>,
    #[serde(default)]
    pub image_naming: ImageNaming,
    #[serde(default)]
    pub series_label: Option<String>,
    #[serde(default = "default_true")]
    pub section_keys: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            kind: AdapterKind::default(),
            front_matter_pages: None,
            running_header: true,
            strict_headings: false,
            heading_pattern: None,
            image_naming: ImageNaming::default(),
            series_label: None,
            section_keys: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Defaults to the HTML file stem.
    #[serde(default)]
    pub label: Option<String>,
    pub html: PathBuf,
    /// Directory holding the images extracted from the document.
    pub images: PathBuf,
}

impl DocumentEntry {
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            self.html
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub merge_policy: MergePolicy,
    /// A JSON file of results keyed by image name, or a directory of per-image files.
    pub similarity: Option<PathBuf>,
    pub documents: Vec<DocumentEntry>,
}

impl Manifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a manifest; relative paths inside it resolve against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let manifest = Self::from_json_str(&json)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(manifest.resolve_against(base))
    }

    pub fn resolve_against(mut self, base: &Path) -> Self {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        self.similarity = self.similarity.as_ref().map(resolve);
        for doc in &mut self.documents {
            doc.html = resolve(&doc.html);
            doc.images = resolve(&doc.images);
        }
        self
    }
}

/// Image file names in `dir`, non-images filtered out, sorted by name.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<ImageRef>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CatalogError::io(dir, e))?;
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            images.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    images.sort();
    Ok(images)
}
