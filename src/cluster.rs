//! Groups sections that depict the same artwork.
//!
//! A section is keyed by its heading by default. If any of its matches has been
//! seen before, it joins the cluster that match already belongs to. All of this
//! is order-sensitive: the same sections in a different order can cluster
//! differently.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::MergePolicy;
use crate::logging::CATALOG_CLUSTER;
use crate::model::{Cluster, Section};
use crate::similarity::{attach_matches, MatchStats, SimilarityStore};

/// Final `key -> cluster` mapping, in cluster creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterMap {
    pub images: IndexMap<String, Cluster>,
}

impl ClusterMap {
    pub fn get(&self, key: &str) -> Option<&Cluster> {
        self.images.get(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub sections: usize,
    pub clusters: usize,
    pub clusters_with_matches: usize,
    pub distinct_identifiers: usize,
    pub matches_by_source: BTreeMap<String, usize>,
    /// Match count -> number of images with that many matches.
    pub matches_per_image: BTreeMap<usize, usize>,
    pub image_deficits: usize,
}

impl RunSummary {
    pub fn log(&self) {
        tracing::info!(
            target: CATALOG_CLUSTER,
            sections = self.sections,
            clusters = self.clusters,
            clusters_with_matches = self.clusters_with_matches,
            distinct_identifiers = self.distinct_identifiers,
            image_deficits = self.image_deficits,
            "Clustering finished"
        );
        for (source, count) in &self.matches_by_source {
            tracing::info!(target: CATALOG_CLUSTER, source = %source, matches = count, "Matches by source");
        }
        for (matches, images) in &self.matches_per_image {
            tracing::info!(target: CATALOG_CLUSTER, matches, images, "Images by match count");
        }
    }
}

/// State of one clustering run. Create one per run; never share across runs.
#[derive(Debug, Default)]
pub struct RunContext {
    policy: MergePolicy,
    match_clusters: HashMap<String, String>,
    clusters: IndexMap<String, Cluster>,
    stats: MatchStats,
    sections: usize,
    image_deficits: usize,
}

impl RunContext {
    pub fn new(policy: MergePolicy) -> Self {
        RunContext {
            policy,
            ..Default::default()
        }
    }

    /// Cluster key currently recorded for a match identifier.
    pub fn cluster_for(&self, match_id: &str) -> Option<&str> {
        self.match_clusters.get(match_id).map(String::as_str)
    }

    pub fn record_deficits(&mut self, count: usize) {
        self.image_deficits += count;
    }

    /// Joins `sections` with the store, then clusters them in order.
    pub fn add_document(&mut self, mut sections: Vec<Section>, store: &SimilarityStore) {
        attach_matches(&mut sections, store, &mut self.stats);
        for section in sections {
            self.add_section(section);
        }
    }

    /// Clusters one section whose `related` matches are already attached.
    pub fn add_section(&mut self, section: Section) -> String {
        let default_key = section.heading.key.clone();

        // Every match already tied to a cluster overrides the key; the last one wins.
        let mut resolved = default_key.clone();
        let mut linked: Vec<String> = Vec::new();
        for m in &section.related {
            if let Some(key) = self.match_clusters.get(&m.id) {
                resolved = key.clone();
                if !linked.contains(key) {
                    linked.push(key.clone());
                }
            }
        }

        if resolved != default_key {
            tracing::debug!(
                target: CATALOG_CLUSTER,
                heading = %section.heading.text,
                default_key = %default_key,
                key = %resolved,
                "Section joins existing cluster through a shared match"
            );
        }
        if linked.len() > 1 {
            match self.policy {
                MergePolicy::LastMatchWins => tracing::debug!(
                    target: CATALOG_CLUSTER,
                    heading = %section.heading.text,
                    candidates = ?linked,
                    key = %resolved,
                    "Matches point at several clusters, keeping the last"
                ),
                MergePolicy::Merge => self.merge_into(&resolved, &linked),
            }
        }

        let cluster = self
            .clusters
            .entry(resolved.clone())
            .or_insert_with(|| Cluster::new(&resolved));
        for m in &section.related {
            cluster.add_match(m);
            self.match_clusters.insert(m.id.clone(), resolved.clone());
        }
        cluster.add_section(section);
        self.sections += 1;

        resolved
    }

    /// Folds every cluster in `keys` other than `target` into `target`.
    fn merge_into(&mut self, target: &str, keys: &[String]) {
        for key in keys.iter().filter(|k| k.as_str() != target) {
            let Some(absorbed) = self.clusters.shift_remove(key) else {
                continue;
            };
            tracing::info!(
                target: CATALOG_CLUSTER,
                from = %key,
                into = %target,
                sections = absorbed.sections.len(),
                "Merging clusters that share a match"
            );
            for id in absorbed.matches.keys() {
                self.match_clusters.insert(id.clone(), target.to_string());
            }
            self.clusters
                .entry(target.to_string())
                .or_insert_with(|| Cluster::new(target))
                .absorb(absorbed);
        }
        for cluster_key in self.match_clusters.values_mut() {
            if keys.contains(cluster_key) {
                *cluster_key = target.to_string();
            }
        }
    }

    pub fn finish(self) -> (ClusterMap, RunSummary) {
        let summary = RunSummary {
            sections: self.sections,
            clusters: self.clusters.len(),
            clusters_with_matches: self.clusters.values().filter(|c| c.has_matches()).count(),
            distinct_identifiers: self.stats.identifiers.len(),
            matches_by_source: self.stats.by_source,
            matches_per_image: self.stats.per_image,
            image_deficits: self.image_deficits,
        };
        (
            ClusterMap {
                images: self.clusters,
            },
            summary,
        )
    }
}
