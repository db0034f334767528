//! Visual-similarity results, keyed by image file name.
//!
//! The store is always fully loaded before clustering starts. Entries that are
//! missing or do not parse count as "no matches" for that image.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::{CatalogError, Result};
use crate::logging::CATALOG_SIMILARITY;
use crate::model::{Match, Section};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSource {
    id: RawId,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    image_id: RawId,
    source: RawSource,
    #[serde(rename = "localURL", default)]
    local_url: String,
    #[serde(default)]
    thumb: String,
    #[serde(default)]
    scaled: String,
    #[serde(default)]
    file: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    results: Vec<RawResult>,
}

impl From<RawResult> for Match {
    fn from(raw: RawResult) -> Self {
        Match {
            id: raw.image_id.into_string(),
            source: raw.source.id.into_string(),
            url: raw.local_url,
            thumb: raw.thumb,
            scaled: raw.scaled,
            image: raw.file,
        }
    }
}

fn parse_entry(image: &str, value: serde_json::Value) -> Vec<Match> {
    match serde_json::from_value::<RawEntry>(value) {
        Ok(entry) => entry.results.into_iter().map(Match::from).collect(),
        Err(e) => {
            tracing::warn!(
                target: CATALOG_SIMILARITY,
                image,
                error = %e,
                "Malformed similarity entry, treating as no matches"
            );
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityStore {
    entries: HashMap<String, Vec<Match>>,
}

impl SimilarityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: impl Into<String>, matches: Vec<Match>) {
        self.entries.insert(image.into(), matches);
    }

    /// Parses `{ "<image>": { "results": [...] }, ... }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(image, value)| {
                let matches = parse_entry(&image, value);
                (image, matches)
            })
            .collect();
        Ok(SimilarityStore { entries })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Self::load_dir(path);
        }
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Reads a cache directory holding one `<image>.json` file per queried image.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut store = SimilarityStore::new();

        for entry in std::fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))? {
            let path = entry.map_err(|e| CatalogError::io(dir, e))?.path();
            let Some(image) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(".json"))
                .map(str::to_string)
            else {
                continue;
            };

            let text = std::fs::read_to_string(&path).map_err(|e| CatalogError::io(&path, e))?;
            let matches = match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => parse_entry(&image, value),
                Err(e) => {
                    tracing::warn!(
                        target: CATALOG_SIMILARITY,
                        image = %image,
                        error = %e,
                        "Unreadable similarity cache file, treating as no matches"
                    );
                    Vec::new()
                }
            };
            store.insert(image, matches);
        }

        tracing::info!(
            target: CATALOG_SIMILARITY,
            images = store.len(),
            dir = %dir.display(),
            "Loaded similarity cache"
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matches_for(&self, image: &str) -> &[Match] {
        self.entries.get(image).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Run-level counters over the images joined with the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchStats {
    /// Every distinct match identifier seen in the run.
    pub identifiers: BTreeSet<String>,
    /// Match occurrences per source.
    pub by_source: BTreeMap<String, usize>,
    /// Number of images having each match count.
    pub per_image: BTreeMap<usize, usize>,
}

impl MatchStats {
    pub fn record_image(&mut self, matches: &[Match]) {
        *self.per_image.entry(matches.len()).or_default() += 1;
        for m in matches {
            self.identifiers.insert(m.id.clone());
            *self.by_source.entry(m.source.clone()).or_default() += 1;
        }
    }
}

/// Fills `related` of every section from the matches of its images.
pub fn attach_matches(sections: &mut [Section], store: &SimilarityStore, stats: &mut MatchStats) {
    for section in sections.iter_mut() {
        for image in &section.images {
            let matches = store.matches_for(image);
            stats.record_image(matches);
            section.related.extend(matches.iter().cloned());
        }
    }
}

