//! End-to-end test across both crates: NDJSON ingest and relation
//! extraction via embargo-core, then a full analysis request through
//! graph construction, centrality, and layout.

use std::io::Cursor;

use embargo_core::extract::extract_relations;
use embargo_core::ingest::{IngestConfig, ingest_entities};
use embargo_core::model::{Dataset, RelationFilter};
use embargo_core::store::{open_in_memory, query};
use embargo_graph::report::{AnalysisConfig, analyze};
use rusqlite::Connection;

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

fn entity_line(id: &str, countries: &[&str], datasets: &[&str]) -> String {
    serde_json::json!({
        "id": id,
        "caption": format!("Entity {id}"),
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

fn batch(lines: &[String]) -> Connection {
    let mut conn = open_in_memory().expect("open store");
    query::upsert_dataset(&conn, &dataset("de_feed", "de")).expect("dataset");
    query::upsert_dataset(&conn, &dataset("us_ofac_sdn", "us")).expect("dataset");

    ingest_entities(
        &mut conn,
        Cursor::new(lines.join("\n")),
        &IngestConfig::default(),
    )
    .expect("ingest");
    extract_relations(&mut conn).expect("extract");
    conn
}

#[test]
fn batch_output_feeds_a_full_analysis() {
    // Two distinct entities behind de→us; one behind us→ru.
    let conn = batch(&[
        entity_line("e1", &["us"], &["de_feed"]),
        entity_line("e2", &["us"], &["de_feed"]),
        entity_line("e3", &["ru"], &["us_ofac_sdn"]),
    ]);

    let result = analyze(&conn, &RelationFilter::default(), &AnalysisConfig::default())
        .expect("analyze");

    let de_us = result
        .edges_render
        .iter()
        .find(|e| e.source == "de" && e.target == "us")
        .expect("de→us edge");
    assert_eq!(de_us.weight, 2, "deduplicated by distinct entity id");

    assert_eq!(result.layout.len(), 3);
    assert_eq!(result.centralities.len(), 3);
    assert!(
        result
            .centralities
            .iter()
            .all(|row| row.pagerank > 0.0 && row.betweenness >= 0.0)
    );
    // Rows come back sorted descending by country code.
    let order: Vec<&str> = result
        .centralities
        .iter()
        .map(|row| row.country.as_str())
        .collect();
    assert_eq!(order, vec!["us", "ru", "de"]);
}

#[test]
fn non_matching_filter_yields_empty_result_end_to_end() {
    let conn = batch(&[entity_line("e1", &["us"], &["de_feed"])]);

    let filter = RelationFilter {
        schema: Some("Person".to_string()),
        ..RelationFilter::default()
    };
    let result = analyze(&conn, &filter, &AnalysisConfig::default()).expect("analyze");

    assert!(result.is_empty());
    assert!(result.edges_render.is_empty());
    assert!(result.centralities.is_empty());
}

#[test]
fn uniform_edge_weights_render_at_zero() {
    // Every directed pair carries exactly one entity, so min == max and the
    // normalized visual weight must be 0 for all of them.
    let conn = batch(&[
        entity_line("e1", &["us"], &["de_feed"]),
        entity_line("e2", &["ru"], &["us_ofac_sdn"]),
    ]);

    let result = analyze(&conn, &RelationFilter::default(), &AnalysisConfig::default())
        .expect("analyze");

    assert_eq!(result.edges_render.len(), 2);
    for edge in &result.edges_render {
        assert_eq!(edge.weight, 1);
        assert!(edge.visual_weight.abs() < f64::EPSILON);
    }
    assert_eq!(result.layout.len(), 3, "layout still computed");
}

#[test]
fn allowlist_restricts_the_analysis_subgraph() {
    let conn = batch(&[
        entity_line("e1", &["us"], &["de_feed"]),
        entity_line("e2", &["ru"], &["us_ofac_sdn"]),
    ]);

    let filter = RelationFilter {
        countries: Some(vec!["de".to_string(), "us".to_string()]),
        ..RelationFilter::default()
    };
    let result = analyze(&conn, &filter, &AnalysisConfig::default()).expect("analyze");

    assert_eq!(result.edges_render.len(), 1);
    assert_eq!(result.edges_render[0].source, "de");
    assert_eq!(result.edges_render[0].target, "us");
    assert_eq!(result.layout.len(), 2, "ru is out of the induced subgraph");
}
