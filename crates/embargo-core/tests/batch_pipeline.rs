//! End-to-end batch pipeline test: NDJSON ingest into an on-disk store,
//! then relation extraction, exercised the way the CLI drives it.

use std::io::Cursor;

use embargo_core::extract::extract_relations;
use embargo_core::ingest::{IngestConfig, ingest_entities};
use embargo_core::model::{Dataset, RelationFilter};
use embargo_core::store::query::{
    self, EntitySearchFilter, SanctionDirection,
};
use embargo_core::store::open_store;

fn dataset(name: &str, country: &str) -> Dataset {
    Dataset {
        name: name.to_string(),
        title: name.to_uppercase(),
        url: None,
        index_url: Some(format!("https://example.org/{name}/index.json")),
        summary: None,
        description: None,
        publisher: Some(serde_json::json!({"name": name, "country": country})),
        dataset_type: "source".to_string(),
    }
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
fn ingest_then_extract_builds_relation_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut conn = open_store(&dir.path().join("embargo.sqlite3")).expect("open store");

    query::upsert_dataset(&conn, &dataset("us_ofac_sdn", "us")).expect("dataset");
    query::upsert_dataset(&conn, &dataset("eu_fsf", "eu")).expect("dataset");

    let input = [
        entity_line("e1", "ACME Trading", &["ru"], &["us_ofac_sdn", "eu_fsf"]),
        entity_line("e2", "Border Logistics", &["ru", "by"], &["us_ofac_sdn"]),
        entity_line("e3", "Unrelated Corp", &["cn"], &["unknown_feed"]),
    ]
    .join("\n");

    let report = ingest_entities(&mut conn, Cursor::new(input), &IngestConfig::default())
        .expect("ingest");
    assert_eq!(report.ingested, 3);
    assert_eq!(report.schemas.len(), 1);

    let extract = extract_relations(&mut conn).expect("extract");
    assert_eq!(extract.entities, 3);
    // e1: 2 datasets × 1 country, e2: 1 dataset × 2 countries, e3: none.
    assert_eq!(extract.rows, 4);

    let towards_ru = query::country_relations(
        &conn,
        "ru",
        SanctionDirection::Towards,
        &RelationFilter::default(),
    )
    .expect("towards ru");
    assert_eq!(towards_ru.len(), 3);

    let from_us = query::country_relations(
        &conn,
        "ru",
        SanctionDirection::From,
        &RelationFilter::default(),
    )
    .expect("from ru");
    assert!(from_us.is_empty(), "ru sanctions nobody in this fixture");

    let countries = query::list_countries(&conn).expect("countries");
    assert_eq!(countries, vec!["by", "eu", "ru", "us"]);
}

#[test]
fn extraction_tracks_reingestion() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut conn = open_store(&dir.path().join("embargo.sqlite3")).expect("open store");

    query::upsert_dataset(&conn, &dataset("us_ofac_sdn", "us")).expect("dataset");

    let first = entity_line("e1", "ACME Trading", &["ru"], &["us_ofac_sdn"]);
    ingest_entities(&mut conn, Cursor::new(first), &IngestConfig::default()).expect("ingest");
    let run1 = extract_relations(&mut conn).expect("extract");
    assert_eq!(run1.rows, 1);

    // A later feed adds one more entity; extraction recomputes the full set.
    let second = entity_line("e2", "Border Logistics", &["ru"], &["us_ofac_sdn"]);
    ingest_entities(&mut conn, Cursor::new(second), &IngestConfig::default()).expect("ingest");
    let run2 = extract_relations(&mut conn).expect("extract");
    assert_eq!(run2.rows, 2);

    let counts = query::store_counts(&conn).expect("counts");
    assert_eq!(counts.entities, 2);
    assert_eq!(counts.relation_rows, 2);
}

#[test]
fn search_sees_ingested_entities() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut conn = open_store(&dir.path().join("embargo.sqlite3")).expect("open store");

    query::upsert_dataset(&conn, &dataset("us_ofac_sdn", "us")).expect("dataset");
    let input = entity_line("e1", "ACME Trading", &["ru"], &["us_ofac_sdn"]);
    ingest_entities(&mut conn, Cursor::new(input), &IngestConfig::default()).expect("ingest");
    extract_relations(&mut conn).expect("extract");

    let hits = query::search_entities(
        &conn,
        &EntitySearchFilter {
            query: "trading".to_string(),
            sanctioned_by: Some("us".to_string()),
            ..EntitySearchFilter::default()
        },
    )
    .expect("search");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].caption, "ACME Trading");
}
