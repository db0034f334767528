use std::path::Path;
use std::process::Command;

use catalog_clusters::config::{list_images, Manifest, MergePolicy};
use catalog_clusters::error::CatalogError;
use catalog_clusters::run_manifest;
use pretty_assertions::assert_eq;

mod common;
use common::converter_html;

const HEADER: &str = "HARUNOBU";

const SIMILARITY: &str = r#"{
    "vol1-5_1.jpg": { "results": [{ "image_id": 100, "source": { "id": "mfa" }, "localURL": "/mfa/100.jpg", "thumb": "", "scaled": "", "file": "100.jpg" }] },
    "vol2-5_1.jpg": { "results": [{ "image_id": 100, "source": { "id": "mfa" }, "localURL": "/mfa/100.jpg", "thumb": "", "scaled": "", "file": "100.jpg" }] },
    "vol2-6_1.jpg": "garbage"
}"#;

fn write_document(root: &Path, name: &str, plates: &[(&str, &[&str])], images: &[&str]) {
    let front: Vec<(String, Vec<&str>)> = (1..=4)
        .map(|n| (format!("page{}-div", n), vec!["front matter"]))
        .collect();
    let mut pages: Vec<(&str, &[&str])> = front
        .iter()
        .map(|(id, blocks)| (id.as_str(), blocks.as_slice()))
        .collect();
    pages.extend_from_slice(plates);

    std::fs::write(root.join(format!("{}.html", name)), converter_html(&pages)).unwrap();
    let image_dir = root.join(name);
    std::fs::create_dir_all(&image_dir).unwrap();
    for image in images {
        std::fs::write(image_dir.join(image), b"\xff\xd8").unwrap();
    }
    std::fs::write(image_dir.join(format!("{}.html", name)), "not an image").unwrap();
}

fn write_corpus(root: &Path) -> std::path::PathBuf {
    write_document(
        root,
        "vol1",
        &[
            ("page5-div", &[HEADER, "1. Girl with Fan"][..]),
            ("page6-div", &[HEADER, "2. Crow and Heron"][..]),
        ],
        &["vol1-5_1.jpg", "vol1-6_1.jpg"],
    );
    write_document(
        root,
        "vol2",
        &[
            ("page5-div", &[HEADER, "7. Beauty with a Fan"][..]),
            ("page6-div", &[HEADER, "8. Crow and Heron"][..]),
        ],
        &["vol2-5_1.jpg", "vol2-6_1.jpg"],
    );
    std::fs::write(root.join("similarity.json"), SIMILARITY).unwrap();

    let manifest = r#"{
        "adapter": { "kind": "harunobu" },
        "similarity": "similarity.json",
        "documents": [
            { "html": "vol1.html", "images": "vol1" },
            { "label": "second volume", "html": "vol2.html", "images": "vol2" }
        ]
    }"#;
    let path = root.join("manifest.json");
    std::fs::write(&path, manifest).unwrap();
    path
}

#[test]
fn manifest_paths_resolve_against_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::load(write_corpus(dir.path())).unwrap();

    assert_eq!(manifest.merge_policy, MergePolicy::LastMatchWins);
    assert_eq!(manifest.similarity, Some(dir.path().join("similarity.json")));
    assert_eq!(manifest.documents[0].html, dir.path().join("vol1.html"));
    assert_eq!(manifest.documents[0].label(), "vol1");
    assert_eq!(manifest.documents[1].label(), "second volume");
}

#[test]
fn image_listing_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b-2_1.png", "a-1_1.JPG", "index.html", "a-1_2.jpg"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    assert_eq!(
        list_images(dir.path()).unwrap(),
        vec!["a-1_1.JPG", "a-1_2.jpg", "b-2_1.png"]
    );
}

#[test]
fn sections_across_documents_cluster_through_shared_matches() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::load(write_corpus(dir.path())).unwrap();

    let (clusters, summary) = run_manifest(&manifest).unwrap();

    assert_eq!(
        clusters.images.keys().collect::<Vec<_>>(),
        vec!["GirlwithFan", "CrowandHeron"]
    );
    let fan = clusters.get("GirlwithFan").unwrap();
    let members: Vec<(&str, &str)> = fan
        .sections
        .iter()
        .map(|s| (s.document.as_str(), s.heading.text.as_str()))
        .collect();
    assert_eq!(
        members,
        vec![("vol1", "1. Girl with Fan"), ("second volume", "7. Beauty with a Fan")]
    );
    assert_eq!(fan.pages.iter().copied().collect::<Vec<_>>(), vec![5]);

    // Same heading text, no shared match: still one cluster by key.
    assert_eq!(clusters.get("CrowandHeron").unwrap().sections.len(), 2);

    assert_eq!(summary.sections, 4);
    assert_eq!(summary.clusters, 2);
    assert_eq!(summary.clusters_with_matches, 1);
    assert_eq!(summary.distinct_identifiers, 1);
}

#[test]
fn rerunning_yields_byte_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::load(write_corpus(dir.path())).unwrap();

    let first = run_manifest(&manifest).unwrap().0.to_json(true).unwrap();
    let second = run_manifest(&manifest).unwrap().0.to_json(true).unwrap();
    assert_eq!(first, second);
}

#[test]
fn adapter_without_keys_fails_before_reading_documents() {
    let manifest = Manifest::from_json_str(
        r#"{
            "adapter": { "kind": "numbered", "section_keys": false },
            "documents": [{ "html": "/does/not/exist.html", "images": "/does/not/exist" }]
        }"#,
    )
    .unwrap();

    assert!(matches!(
        run_manifest(&manifest),
        Err(CatalogError::MissingCapability { .. })
    ));
}

#[test]
fn cli_writes_cluster_map() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_corpus(dir.path());
    let output = dir.path().join("clusters.json");

    let status = Command::new(env!("CARGO_BIN_EXE_catalog-clusters"))
        .arg(&manifest)
        .arg("--output")
        .arg(&output)
        .arg("--merge-policy")
        .arg("merge")
        .output()
        .expect("run CLI");

    assert!(
        status.status.success(),
        "cli exited with {}: {}",
        status.status,
        String::from_utf8_lossy(&status.stderr)
    );

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let keys: Vec<&String> = written["images"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["GirlwithFan", "CrowandHeron"]);
    assert_eq!(written["images"]["GirlwithFan"]["matches"][0]["id"], "100");
}
