//! `SQLite` query helpers for the sanctions store.
//!
//! Provides typed Rust structs and composable query functions for the
//! pipeline's access patterns: dataset upserts, append-only entity inserts,
//! relation-row reads with dynamic filters, entity search, and the
//! country/schema inventories the analysis front ends consume.
//!
//! All functions take a shared `&Connection` reference and return
//! `anyhow::Result<T>` with typed structs (never raw rows).

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params, params_from_iter, types::ToSql};
use std::fmt::Write as _;

use crate::model::{Dataset, Entity, RelationFilter, RelationRow};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A search hit from the entity inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityHit {
    pub id: String,
    pub caption: String,
    pub schema: String,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub last_change: Option<String>,
    pub datasets: Vec<String>,
}

/// Restriction for [`search_entities`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySearchFilter {
    /// Case-insensitive caption substring. A blank query matches nothing.
    pub query: String,
    /// Restrict to one entity schema tag.
    pub schema: Option<String>,
    /// Restrict to entities sanctioned by this country.
    pub sanctioned_by: Option<String>,
    /// Row cap; defaults to 100 when `None`.
    pub limit: Option<usize>,
}

/// Which side of a relation a country query pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanctionDirection {
    /// Relations where the country is the target (`target_country`).
    Towards,
    /// Relations where the country is the sanctioning side (`source_country`).
    From,
}

impl SanctionDirection {
    const fn column(self) -> &'static str {
        match self {
            Self::Towards => "target_country",
            Self::From => "source_country",
        }
    }
}

/// Row counts across the store's three tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub entities: usize,
    pub datasets: usize,
    pub relation_rows: usize,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert or replace a dataset's catalogue metadata.
///
/// Catalogue refreshes overwrite the previous snapshot for the same name.
///
/// # Errors
///
/// Returns an error if the SQLite write fails.
pub fn upsert_dataset(conn: &Connection, dataset: &Dataset) -> Result<()> {
    let publisher = dataset
        .publisher
        .as_ref()
        .map(serde_json::Value::to_string);

    conn.execute(
        "INSERT OR REPLACE INTO datasets
            (name, title, url, index_url, summary, description, publisher, dataset_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            dataset.name,
            dataset.title,
            dataset.url,
            dataset.index_url,
            dataset.summary,
            dataset.description,
            publisher,
            dataset.dataset_type,
        ],
    )
    .with_context(|| format!("upsert dataset {}", dataset.name))?;

    Ok(())
}

/// Append one entity. Returns `false` if an entity with the same id already
/// exists (the store is append-only; re-ingesting a feed skips known ids).
///
/// # Errors
///
/// Returns an error if the SQLite write fails.
pub fn insert_entity(conn: &Connection, entity: &Entity) -> Result<bool> {
    let datasets =
        serde_json::to_string(&entity.datasets).context("serialize entity dataset list")?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO entities
                (id, caption, schema, properties, referents, datasets,
                 first_seen, last_seen, last_change, target, industry)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .context("prepare entity insert")?;

    let changed = stmt
        .execute(params![
            entity.id,
            entity.caption,
            entity.schema,
            entity.properties.to_string(),
            entity.referents.to_string(),
            datasets,
            entity.first_seen,
            entity.last_seen,
            entity.last_change,
            entity.target,
            entity.industry,
        ])
        .with_context(|| format!("insert entity {}", entity.id))?;

    Ok(changed > 0)
}

/// Append one derived relation row.
///
/// # Errors
///
/// Returns an error if the SQLite write fails.
pub fn insert_relation_row(conn: &Connection, row: &RelationRow) -> Result<()> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO relation_rows
                (id, caption, schema, target_country, source_country,
                 first_seen, last_seen, last_change, target, industry)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .context("prepare relation row insert")?;

    stmt.execute(params![
        row.id,
        row.caption,
        row.schema,
        row.target_country,
        row.source_country,
        row.first_seen,
        row.last_seen,
        row.last_change,
        row.target,
        row.industry,
    ])
    .with_context(|| format!("insert relation row for entity {}", row.id))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Load the full dataset catalogue.
///
/// # Errors
///
/// Returns an error if the SQLite query fails or a publisher column holds
/// invalid JSON.
pub fn load_datasets(conn: &Connection) -> Result<Vec<Dataset>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, title, url, index_url, summary, description, publisher, dataset_type
             FROM datasets
             ORDER BY name",
        )
        .context("prepare dataset query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })
        .context("execute dataset query")?;

    let mut datasets = Vec::new();
    for row in rows {
        let (name, title, url, index_url, summary, description, publisher, dataset_type) =
            row.context("read dataset row")?;

        let publisher = publisher
            .map(|raw| {
                serde_json::from_str(&raw)
                    .with_context(|| format!("parse publisher JSON for dataset {name}"))
            })
            .transpose()?;

        datasets.push(Dataset {
            name,
            title,
            url,
            index_url,
            summary,
            description,
            publisher,
            dataset_type,
        });
    }

    Ok(datasets)
}

/// Append the SQL conditions (and their parameters) for a relation filter.
///
/// Shared by every reader of `relation_rows` so that filter semantics stay
/// identical across the country report, the graph builder, and exports.
/// Date bounds compare against `first_seen`: the start bound is inclusive,
/// the end bound covers the whole end day (rows with a `NULL` `first_seen`
/// are excluded once either bound is present).
pub fn push_filter_conditions(
    filter: &RelationFilter,
    conditions: &mut Vec<String>,
    params: &mut Vec<Box<dyn ToSql>>,
) {
    if let Some(ref schema) = filter.schema {
        params.push(Box::new(schema.clone()));
        conditions.push(format!("schema = ?{}", params.len()));
    }

    if let Some(ref industry) = filter.industry {
        params.push(Box::new(industry.clone()));
        conditions.push(format!("industry = ?{}", params.len()));
    }

    if let Some(date_start) = filter.date_start {
        params.push(Box::new(date_start.format("%Y-%m-%d").to_string()));
        conditions.push(format!("first_seen >= ?{}", params.len()));
    }

    if let Some(date_end) = filter.date_end {
        // Exclusive bound on the following day so timestamps anywhere within
        // the end day still match the inclusive date filter.
        let bound = date_end
            .succ_opt()
            .map_or_else(|| "9999-12-31".to_string(), |d| d.format("%Y-%m-%d").to_string());
        params.push(Box::new(bound));
        conditions.push(format!("first_seen < ?{}", params.len()));
    }

    if let Some(ref countries) = filter.countries {
        for column in ["source_country", "target_country"] {
            let mut placeholders = String::new();
            for country in countries {
                params.push(Box::new(country.clone()));
                if !placeholders.is_empty() {
                    placeholders.push_str(", ");
                }
                let _ = write!(placeholders, "?{}", params.len());
            }
            // An empty allow-list matches nothing.
            if placeholders.is_empty() {
                placeholders.push_str("NULL");
            }
            conditions.push(format!("{column} IN ({placeholders})"));
        }
    }
}

/// Relation rows for one country on one side of the relation, under the
/// usual filter semantics.
///
/// # Errors
///
/// Returns an error if the SQLite query fails.
pub fn country_relations(
    conn: &Connection,
    country: &str,
    direction: SanctionDirection,
    filter: &RelationFilter,
) -> Result<Vec<RelationRow>> {
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(country.to_string())];
    let mut conditions = vec![format!("{} = ?1", direction.column())];
    push_filter_conditions(filter, &mut conditions, &mut params);

    let sql = format!(
        "SELECT id, caption, schema, target_country, source_country,
                first_seen, last_seen, last_change, target, industry
         FROM relation_rows
         WHERE {}
         ORDER BY id, target_country, source_country",
        conditions.join(" AND ")
    );

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare country_relations query: {sql}"))?;

    let params_ref: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
    let rows = stmt
        .query_map(params_from_iter(params_ref), row_to_relation_row)
        .context("execute country_relations query")?;

    let mut relations = Vec::new();
    for row in rows {
        relations.push(row.context("read country_relations row")?);
    }
    Ok(relations)
}

/// Case-insensitive caption search over the entity inventory.
///
/// A blank query returns no rows. The optional `sanctioned_by` restriction
/// keeps only entities that appear in a relation row with that sanctioning
/// country.
///
/// # Errors
///
/// Returns an error if the SQLite query fails or a datasets column holds
/// invalid JSON.
pub fn search_entities(conn: &Connection, filter: &EntitySearchFilter) -> Result<Vec<EntityHit>> {
    let query = filter.query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut params: Vec<Box<dyn ToSql>> =
        vec![Box::new(format!("%{}%", query.to_lowercase()))];
    let mut conditions = vec!["LOWER(e.caption) LIKE ?1".to_string()];

    if let Some(ref schema) = filter.schema {
        params.push(Box::new(schema.clone()));
        conditions.push(format!("e.schema = ?{}", params.len()));
    }

    let mut joins = String::new();
    if let Some(ref country) = filter.sanctioned_by {
        params.push(Box::new(country.clone()));
        let _ = write!(
            joins,
            " INNER JOIN (SELECT DISTINCT id FROM relation_rows WHERE source_country = ?{}) rr
              ON rr.id = e.id",
            params.len()
        );
    }

    let limit = filter.limit.unwrap_or(100);
    let sql = format!(
        "SELECT e.id, e.caption, e.schema, e.first_seen, e.last_seen, e.last_change, e.datasets
         FROM entities e{joins}
         WHERE {}
         ORDER BY e.caption, e.id
         LIMIT {limit}",
        conditions.join(" AND ")
    );

    let mut stmt = stmt_with_context(conn, &sql, "search_entities")?;
    let params_ref: Vec<&dyn ToSql> = params.iter().map(AsRef::as_ref).collect();
    let rows = stmt
        .query_map(params_from_iter(params_ref), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .context("execute search_entities query")?;

    let mut hits = Vec::new();
    for row in rows {
        let (id, caption, schema, first_seen, last_seen, last_change, datasets) =
            row.context("read search_entities row")?;
        let datasets: Vec<String> = serde_json::from_str(&datasets)
            .with_context(|| format!("parse datasets JSON for entity {id}"))?;
        hits.push(EntityHit {
            id,
            caption,
            schema,
            first_seen,
            last_seen,
            last_change,
            datasets,
        });
    }
    Ok(hits)
}

/// Distinct country codes appearing on either side of a relation, sorted.
///
/// # Errors
///
/// Returns an error if the SQLite query fails.
pub fn list_countries(conn: &Connection) -> Result<Vec<String>> {
    collect_strings(
        conn,
        "SELECT DISTINCT country FROM (
            SELECT source_country AS country FROM relation_rows
            UNION
            SELECT target_country AS country FROM relation_rows
         )
         ORDER BY country",
        "list_countries",
    )
}

/// Distinct entity schema tags present in the store, sorted.
///
/// # Errors
///
/// Returns an error if the SQLite query fails.
pub fn list_schemas(conn: &Connection) -> Result<Vec<String>> {
    collect_strings(
        conn,
        "SELECT DISTINCT schema FROM entities ORDER BY schema",
        "list_schemas",
    )
}

/// Row counts for the store's three tables.
///
/// # Errors
///
/// Returns an error if any of the count queries fails.
pub fn store_counts(conn: &Connection) -> Result<StoreCounts> {
    let count = |table: &str| -> Result<usize> {
        let n: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("count rows in {table}"))?;
        usize::try_from(n).context("row count out of range")
    };

    Ok(StoreCounts {
        entities: count("entities")?,
        datasets: count("datasets")?,
        relation_rows: count("relation_rows")?,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn stmt_with_context<'c>(
    conn: &'c Connection,
    sql: &str,
    label: &str,
) -> Result<rusqlite::Statement<'c>> {
    conn.prepare(sql)
        .with_context(|| format!("prepare {label} query: {sql}"))
}

fn collect_strings(conn: &Connection, sql: &str, label: &str) -> Result<Vec<String>> {
    let mut stmt = stmt_with_context(conn, sql, label)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .with_context(|| format!("execute {label} query"))?;

    let mut values = Vec::new();
    for row in rows {
        values.push(row.with_context(|| format!("read {label} row"))?);
    }
    Ok(values)
}

fn row_to_relation_row(row: &Row) -> rusqlite::Result<RelationRow> {
    Ok(RelationRow {
        id: row.get(0)?,
        caption: row.get(1)?,
        schema: row.get(2)?,
        target_country: row.get(3)?,
        source_country: row.get(4)?,
        first_seen: row.get(5)?,
        last_seen: row.get(6)?,
        last_change: row.get(7)?,
        target: row.get(8)?,
        industry: row.get(9)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_in_memory;
    use chrono::NaiveDate;

    fn test_db() -> Connection {
        open_in_memory().expect("open in-memory store")
    }

    fn sample_entity(id: &str, caption: &str, schema: &str) -> Entity {
        Entity {
            id: id.to_string(),
            caption: caption.to_string(),
            schema: schema.to_string(),
            properties: serde_json::json!({"country": ["ru"]}),
            referents: serde_json::json!([]),
            datasets: vec!["us_ofac_sdn".to_string()],
            first_seen: Some("2022-03-01T00:00:00".to_string()),
            last_seen: Some("2023-01-01T00:00:00".to_string()),
            last_change: Some("2022-06-01T00:00:00".to_string()),
            target: true,
            industry: None,
        }
    }

    fn sample_relation(id: &str, source: &str, target: &str, first_seen: &str) -> RelationRow {
        RelationRow {
            id: id.to_string(),
            caption: format!("Entity {id}"),
            schema: "Company".to_string(),
            target_country: target.to_string(),
            source_country: source.to_string(),
            first_seen: Some(first_seen.to_string()),
            last_seen: None,
            last_change: None,
            target: true,
            industry: None,
        }
    }

    #[test]
    fn insert_entity_is_append_only() {
        let conn = test_db();
        let entity = sample_entity("e1", "First", "Company");

        assert!(insert_entity(&conn, &entity).expect("first insert"));

        let again = Entity {
            caption: "Changed".to_string(),
            ..entity
        };
        assert!(!insert_entity(&conn, &again).expect("second insert"));

        let caption: String = conn
            .query_row("SELECT caption FROM entities WHERE id = 'e1'", [], |row| {
                row.get(0)
            })
            .expect("read caption");
        assert_eq!(caption, "First");
    }

    #[test]
    fn upsert_dataset_replaces_snapshot() {
        let conn = test_db();
        let mut dataset = Dataset {
            name: "us_ofac_sdn".to_string(),
            title: "US OFAC SDN".to_string(),
            url: None,
            index_url: Some("https://example.org/index.json".to_string()),
            summary: None,
            description: None,
            publisher: Some(serde_json::json!({"country": "us"})),
            dataset_type: "source".to_string(),
        };
        upsert_dataset(&conn, &dataset).expect("first upsert");

        dataset.title = "US OFAC Specially Designated Nationals".to_string();
        upsert_dataset(&conn, &dataset).expect("second upsert");

        let datasets = load_datasets(&conn).expect("load datasets");
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].title, "US OFAC Specially Designated Nationals");
        assert_eq!(datasets[0].publisher_country(), Some("us"));
    }

    #[test]
    fn country_relations_pins_requested_side() {
        let conn = test_db();
        insert_relation_row(&conn, &sample_relation("e1", "us", "ru", "2022-03-01T00:00:00"))
            .expect("insert");
        insert_relation_row(&conn, &sample_relation("e2", "ru", "us", "2022-03-01T00:00:00"))
            .expect("insert");

        let towards = country_relations(
            &conn,
            "ru",
            SanctionDirection::Towards,
            &RelationFilter::default(),
        )
        .expect("towards query");
        assert_eq!(towards.len(), 1);
        assert_eq!(towards[0].id, "e1");

        let from = country_relations(
            &conn,
            "ru",
            SanctionDirection::From,
            &RelationFilter::default(),
        )
        .expect("from query");
        assert_eq!(from.len(), 1);
        assert_eq!(from[0].id, "e2");
    }

    #[test]
    fn date_filter_covers_whole_end_day() {
        let conn = test_db();
        insert_relation_row(&conn, &sample_relation("e1", "us", "ru", "2022-03-15T18:30:00"))
            .expect("insert");
        insert_relation_row(&conn, &sample_relation("e2", "us", "ru", "2022-03-16T00:00:00"))
            .expect("insert");

        let filter = RelationFilter {
            date_start: NaiveDate::from_ymd_opt(2022, 3, 1),
            date_end: NaiveDate::from_ymd_opt(2022, 3, 15),
            ..RelationFilter::default()
        };
        let rows = country_relations(&conn, "ru", SanctionDirection::Towards, &filter)
            .expect("filtered query");

        assert_eq!(rows.len(), 1, "end-day timestamp must match, next day must not");
        assert_eq!(rows[0].id, "e1");
    }

    #[test]
    fn null_first_seen_excluded_under_date_filter() {
        let conn = test_db();
        let mut row = sample_relation("e1", "us", "ru", "2022-03-15T00:00:00");
        row.first_seen = None;
        insert_relation_row(&conn, &row).expect("insert");

        let filter = RelationFilter {
            date_start: NaiveDate::from_ymd_opt(2022, 1, 1),
            ..RelationFilter::default()
        };
        let rows = country_relations(&conn, "ru", SanctionDirection::Towards, &filter)
            .expect("filtered query");
        assert!(rows.is_empty());
    }

    #[test]
    fn search_entities_blank_query_matches_nothing() {
        let conn = test_db();
        insert_entity(&conn, &sample_entity("e1", "ACME Trading", "Company")).expect("insert");

        let hits = search_entities(
            &conn,
            &EntitySearchFilter {
                query: "   ".to_string(),
                ..EntitySearchFilter::default()
            },
        )
        .expect("search");
        assert!(hits.is_empty());
    }

    #[test]
    fn search_entities_caption_is_case_insensitive() {
        let conn = test_db();
        insert_entity(&conn, &sample_entity("e1", "ACME Trading", "Company")).expect("insert");
        insert_entity(&conn, &sample_entity("e2", "Other Corp", "Company")).expect("insert");

        let hits = search_entities(
            &conn,
            &EntitySearchFilter {
                query: "acme".to_string(),
                ..EntitySearchFilter::default()
            },
        )
        .expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "e1");
        assert_eq!(hits[0].datasets, vec!["us_ofac_sdn".to_string()]);
    }

    #[test]
    fn search_entities_restricts_by_sanctioning_country() {
        let conn = test_db();
        insert_entity(&conn, &sample_entity("e1", "ACME Trading", "Company")).expect("insert");
        insert_entity(&conn, &sample_entity("e2", "ACME Shipping", "Company")).expect("insert");
        insert_relation_row(&conn, &sample_relation("e1", "us", "ru", "2022-03-01T00:00:00"))
            .expect("insert relation");

        let hits = search_entities(
            &conn,
            &EntitySearchFilter {
                query: "acme".to_string(),
                sanctioned_by: Some("us".to_string()),
                ..EntitySearchFilter::default()
            },
        )
        .expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "e1");
    }

    #[test]
    fn country_and_schema_inventories() {
        let conn = test_db();
        insert_entity(&conn, &sample_entity("e1", "ACME", "Company")).expect("insert");
        insert_entity(&conn, &sample_entity("e2", "Someone", "Person")).expect("insert");
        insert_relation_row(&conn, &sample_relation("e1", "us", "ru", "2022-03-01T00:00:00"))
            .expect("insert relation");
        insert_relation_row(&conn, &sample_relation("e2", "gb", "ru", "2022-03-01T00:00:00"))
            .expect("insert relation");

        assert_eq!(
            list_countries(&conn).expect("countries"),
            vec!["gb".to_string(), "ru".to_string(), "us".to_string()]
        );
        assert_eq!(
            list_schemas(&conn).expect("schemas"),
            vec!["Company".to_string(), "Person".to_string()]
        );

        let counts = store_counts(&conn).expect("counts");
        assert_eq!(counts.entities, 2);
        assert_eq!(counts.relation_rows, 2);
    }

    #[test]
    fn empty_country_allowlist_matches_nothing() {
        let conn = test_db();
        insert_relation_row(&conn, &sample_relation("e1", "us", "ru", "2022-03-01T00:00:00"))
            .expect("insert");

        let filter = RelationFilter {
            countries: Some(Vec::new()),
            ..RelationFilter::default()
        };
        let rows = country_relations(&conn, "ru", SanctionDirection::Towards, &filter)
            .expect("filtered query");
        assert!(rows.is_empty());
    }
}
