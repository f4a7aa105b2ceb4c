//! End-to-end tests driving the `embargo` binary against a temporary store:
//! ingest → extract → analyze, plus the inventory commands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

use embargo_core::model::Dataset;
use embargo_core::store::{open_store, query};

fn embargo(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("embargo").expect("binary built");
    cmd.arg("--db").arg(db);
    cmd
}

fn seed_dataset(db: &Path, name: &str, country: &str) {
    let conn = open_store(db).expect("open store");
    query::upsert_dataset(
        &conn,
        &Dataset {
            name: name.to_string(),
            title: name.to_uppercase(),
            url: None,
            index_url: Some(format!("https://example.org/{name}/index.json")),
            summary: None,
            description: None,
            publisher: Some(serde_json::json!({"name": name, "country": country})),
            dataset_type: "source".to_string(),
        },
    )
    .expect("seed dataset");
}

fn entity_line(id: &str, caption: &str, countries: &[&str], datasets: &[&str]) -> String {
    serde_json::json!({
        "id": id,
        "caption": caption,
        "schema": "Company",
        "properties": {"country": countries},
        "referents": [],
        "datasets": datasets,
        "first_seen": "2022-03-01T00:00:00",
        "last_seen": "2023-01-01T00:00:00",
        "last_change": "2022-06-01T00:00:00",
        "target": true
    })
    .to_string()
}

#[test]
fn batch_then_analysis_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("embargo.sqlite3");
    seed_dataset(&db, "de_feed", "de");
    seed_dataset(&db, "us_ofac_sdn", "us");

    let ndjson = dir.path().join("entities.ftm.json");
    std::fs::write(
        &ndjson,
        [
            entity_line("e1", "ACME Trading", &["us"], &["de_feed"]),
            entity_line("e2", "Border Logistics", &["us"], &["de_feed"]),
            entity_line("e3", "Eastern Shipping", &["ru"], &["us_ofac_sdn"]),
        ]
        .join("\n"),
    )
    .expect("write ndjson");

    embargo(&db)
        .arg("ingest")
        .arg(&ndjson)
        .assert()
        .success()
        .stdout(predicate::str::contains("ingested 3 of 3 lines"));

    embargo(&db)
        .arg("extract")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 relation rows"));

    let output = embargo(&db)
        .args(["analyze", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let result: serde_json::Value = serde_json::from_slice(&output).expect("json output");

    let edges = result["edges_render"].as_array().expect("edges array");
    let de_us = edges
        .iter()
        .find(|e| e["source"] == "de" && e["target"] == "us")
        .expect("de→us edge");
    assert_eq!(de_us["weight"], 2, "two distinct entities behind the pair");

    assert_eq!(result["layout"].as_array().expect("layout").len(), 3);
    assert_eq!(
        result["centralities"].as_array().expect("centralities").len(),
        3
    );

    embargo(&db)
        .arg("countries")
        .assert()
        .success()
        .stdout(predicate::str::contains("de").and(predicate::str::contains("ru")));

    embargo(&db)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"relation_rows\": 3"));
}

#[test]
fn analyze_on_an_empty_store_yields_empty_result() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("embargo.sqlite3");

    let output = embargo(&db)
        .args(["analyze", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let result: serde_json::Value = serde_json::from_slice(&output).expect("json output");

    assert_eq!(result["layout"], serde_json::json!([]));
    assert_eq!(result["edges_render"], serde_json::json!([]));
    assert_eq!(result["centralities"], serde_json::json!([]));

    embargo(&db)
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("no relations match"));
}

#[test]
fn fail_fast_ingest_rejects_a_malformed_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("embargo.sqlite3");

    let ndjson = dir.path().join("entities.ftm.json");
    std::fs::write(
        &ndjson,
        format!("{}\nnot json at all\n", entity_line("e1", "One", &["ru"], &[])),
    )
    .expect("write ndjson");

    embargo(&db)
        .arg("ingest")
        .arg(&ndjson)
        .arg("--fail-fast")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));

    // Default policy skips the bad line and keeps going.
    embargo(&db)
        .arg("ingest")
        .arg(&ndjson)
        .assert()
        .success()
        .stdout(predicate::str::contains("malformed (skipped): 1"));
}

#[test]
fn search_finds_ingested_captions() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("embargo.sqlite3");
    seed_dataset(&db, "us_ofac_sdn", "us");

    let ndjson = dir.path().join("entities.ftm.json");
    std::fs::write(
        &ndjson,
        entity_line("e1", "ACME Trading", &["ru"], &["us_ofac_sdn"]),
    )
    .expect("write ndjson");

    embargo(&db).arg("ingest").arg(&ndjson).assert().success();
    embargo(&db).arg("extract").assert().success();

    embargo(&db)
        .args(["search", "trading", "--sanctioned-by", "us"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACME Trading"));

    embargo(&db)
        .args(["country", "ru"])
        .assert()
        .success()
        .stdout(predicate::str::contains("us -> ru"));
}
