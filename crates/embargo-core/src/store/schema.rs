//! Canonical SQLite schema for the sanctions store.
//!
//! The schema mirrors the pipeline's three record kinds:
//! - `entities` keeps the ingested sanctions-entity records as-is (opaque
//!   JSON columns for properties/referents/datasets)
//! - `datasets` keeps the catalogue metadata, one row per source feed
//! - `relation_rows` is the derived join output, fully recomputed by the
//!   extractor and the only table the analysis side reads

/// Migration v1: core tables.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    id TEXT PRIMARY KEY,
    caption TEXT NOT NULL,
    schema TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}',
    referents TEXT NOT NULL DEFAULT '[]',
    datasets TEXT NOT NULL DEFAULT '[]',
    first_seen TEXT,
    last_seen TEXT,
    last_change TEXT,
    target INTEGER NOT NULL DEFAULT 0 CHECK (target IN (0, 1)),
    industry TEXT
);

CREATE TABLE IF NOT EXISTS datasets (
    name TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    url TEXT,
    index_url TEXT,
    summary TEXT,
    description TEXT,
    publisher TEXT,
    dataset_type TEXT NOT NULL DEFAULT 'source'
);

CREATE TABLE IF NOT EXISTS relation_rows (
    id TEXT NOT NULL,
    caption TEXT NOT NULL,
    schema TEXT NOT NULL,
    target_country TEXT NOT NULL,
    source_country TEXT NOT NULL,
    first_seen TEXT,
    last_seen TEXT,
    last_change TEXT,
    target INTEGER NOT NULL DEFAULT 0 CHECK (target IN (0, 1)),
    industry TEXT
);
"#;

/// Migration v2: read-path indexes for the analysis queries.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_relation_rows_pair
    ON relation_rows(source_country, target_country);

CREATE INDEX IF NOT EXISTS idx_relation_rows_schema
    ON relation_rows(schema);

CREATE INDEX IF NOT EXISTS idx_relation_rows_first_seen
    ON relation_rows(first_seen);

CREATE INDEX IF NOT EXISTS idx_relation_rows_id
    ON relation_rows(id);

CREATE INDEX IF NOT EXISTS idx_entities_schema
    ON entities(schema);
"#;
