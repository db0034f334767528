use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// An extracted image file name. Order follows the directory listing unless the
/// adapter re-filters it per page.
pub type ImageRef = String;

/// A heading candidate that survived validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub text: String,
    /// Leading number of the heading (`12` for `"12-13. Title"`).
    pub ordinal: u64,
    /// Normalized heading text, the default cluster key.
    pub key: String,
}

/// One document page after heading validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Fractional for foldouts (`12.5`).
    pub number: f64,
    pub headings: Vec<Heading>,
    /// The first content block after the running header is itself a heading.
    pub heading_at_start: bool,
    pub images: Vec<ImageRef>,
}

/// A visual-similarity hit for one image. Only `id` and `source` carry identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub source: String,
    pub url: String,
    pub thumb: String,
    pub scaled: String,
    pub image: String,
}

/// One catalog entry anchored by a single validated heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Label of the source document the section was cut from.
    pub document: String,
    #[serde(rename = "text", serialize_with = "serialize_heading_text")]
    pub heading: Heading,
    pub images: Vec<ImageRef>,
    pub start_page: f64,
    pub end_page: f64,
    pub related: Vec<Match>,
}

fn serialize_heading_text<S: Serializer>(heading: &Heading, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&heading.text)
}

impl Section {
    pub fn new(document: &str, heading: Heading, start_page: f64, end_page: f64) -> Self {
        Section {
            document: document.to_string(),
            heading,
            images: Vec::new(),
            start_page,
            end_page,
            related: Vec::new(),
        }
    }

    /// Integer pages covered by the section, inclusive on both ends.
    ///
    /// A section lying entirely inside a fractional page (a foldout `12.5`)
    /// still covers `floor(start_page)`.
    pub fn page_span(&self) -> Vec<i64> {
        let first = self.start_page.ceil() as i64;
        let last = self.end_page.floor() as i64;
        if first > last {
            vec![self.start_page.floor() as i64]
        } else {
            (first..=last).collect()
        }
    }
}

/// A group of sections believed to depict the same artwork.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cluster {
    pub key: String,
    /// Unique by match id, in first-seen order.
    pub matches: IndexMap<String, Match>,
    pub sections: Vec<Section>,
    pub pages: BTreeSet<i64>,
}

impl Cluster {
    pub fn new(key: &str) -> Self {
        Cluster {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Adds the match unless one with the same id is already present.
    pub fn add_match(&mut self, m: &Match) {
        if !self.matches.contains_key(&m.id) {
            self.matches.insert(m.id.clone(), m.clone());
        }
    }

    pub fn add_section(&mut self, section: Section) {
        self.pages.extend(section.page_span());
        self.sections.push(section);
    }

    /// Folds another cluster into this one, keeping first-seen match order.
    pub fn absorb(&mut self, other: Cluster) {
        for m in other.matches.values() {
            self.add_match(m);
        }
        self.sections.extend(other.sections);
        self.pages.extend(other.pages);
    }
}

impl Serialize for Cluster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Cluster", 3)?;
        state.serialize_field("matches", &self.matches.values().collect::<Vec<_>>())?;
        state.serialize_field("sections", &self.sections)?;
        state.serialize_field("pages", &self.pages)?;
        state.end()
    }
}
