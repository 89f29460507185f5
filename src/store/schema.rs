//! DuckDB schema definitions and migration support.

use thiserror::Error;

// ---------------------------------------------------------------------------
// DDL constants
// ---------------------------------------------------------------------------

pub const DDL_SCHEMA_VERSION: &str = "\
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at BIGINT NOT NULL
);";

/// Insertion order tiebreak for generations created in the same millisecond.
pub const DDL_GENERATION_SEQ: &str = "\
CREATE SEQUENCE IF NOT EXISTS generation_seq START 1;";

pub const DDL_GENERATIONS: &str = "\
CREATE TABLE IF NOT EXISTS generations (
    id TEXT PRIMARY KEY,
    seq BIGINT NOT NULL DEFAULT nextval('generation_seq'),
    prompt TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    visibility TEXT NOT NULL,
    created_at BIGINT NOT NULL
);";

pub const DDL_MODEL_RESULTS: &str = "\
CREATE TABLE IF NOT EXISTS model_results (
    id TEXT PRIMARY KEY,
    generation_id TEXT NOT NULL,
    model_id TEXT NOT NULL,
    prompt TEXT NOT NULL,
    generated_payload TEXT NOT NULL,
    execution_time_ms BIGINT NOT NULL,
    cost DOUBLE,
    error TEXT,
    created_at BIGINT NOT NULL,
    FOREIGN KEY (generation_id) REFERENCES generations(id)
);";

pub const DDL_INDEX_GENERATIONS_CREATED: &str = "\
CREATE INDEX IF NOT EXISTS idx_generations_created ON generations(created_at);";

pub const DDL_INDEX_GENERATIONS_OWNER: &str = "\
CREATE INDEX IF NOT EXISTS idx_generations_owner ON generations(owner_id);";

pub const DDL_INDEX_RESULTS_GENERATION: &str = "\
CREATE INDEX IF NOT EXISTS idx_results_generation ON model_results(generation_id);";

/// All DDL statements for schema version 1, in order.
pub const SCHEMA_V1: &[&str] = &[
    DDL_SCHEMA_VERSION,
    DDL_GENERATION_SEQ,
    DDL_GENERATIONS,
    DDL_MODEL_RESULTS,
    DDL_INDEX_GENERATIONS_CREATED,
    DDL_INDEX_GENERATIONS_OWNER,
    DDL_INDEX_RESULTS_GENERATION,
];

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

// ---------------------------------------------------------------------------
// Migration support
// ---------------------------------------------------------------------------

/// Bring `conn` up to [`CURRENT_VERSION`]; returns the version now in place.
/// Safe to call on every open.
pub fn apply_migrations(conn: &duckdb::Connection) -> Result<i32, MigrationError> {
    conn.execute_batch(DDL_SCHEMA_VERSION)?;

    let found: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    if found >= CURRENT_VERSION {
        return Ok(found);
    }

    // Single step today; later versions append their own batch here.
    if found < 1 {
        SCHEMA_V1
            .iter()
            .try_for_each(|ddl| conn.execute_batch(ddl))?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
            duckdb::params![1, crate::model::epoch_ms()],
        )?;
        tracing::debug!(version = 1, "store: schema migrated");
    }

    Ok(CURRENT_VERSION)
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("DuckDB migration error: {0}")]
    Duckdb(#[from] duckdb::Error),
}
