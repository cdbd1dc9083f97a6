//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Top500-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per harvested release (latest crawl wins)
CREATE TABLE IF NOT EXISTS releases (
    id TEXT PRIMARY KEY,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    system_count INTEGER NOT NULL,
    skipped_count INTEGER NOT NULL,
    crawled_at TEXT NOT NULL
);

-- Systems of a release, keyed by their authoritative rank
CREATE TABLE IF NOT EXISTS systems (
    release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
    rank INTEGER NOT NULL,
    PRIMARY KEY (release_id, rank)
);

-- Open attribute schema: one row per label/value pair
CREATE TABLE IF NOT EXISTS attributes (
    release_id TEXT NOT NULL,
    rank INTEGER NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (release_id, rank, name),
    FOREIGN KEY (release_id, rank) REFERENCES systems(release_id, rank) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_attributes_name ON attributes(name);

-- Detail pages skipped because their structure was unusable
CREATE TABLE IF NOT EXISTS skipped_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    page_url TEXT NOT NULL,
    reason TEXT NOT NULL
);

-- Ranks claimed by more than one detail page
CREATE TABLE IF NOT EXISTS rank_collisions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
    rank INTEGER NOT NULL,
    url TEXT NOT NULL
);

-- Releases whose aggregation was aborted
CREATE TABLE IF NOT EXISTS failed_releases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    release_id TEXT NOT NULL,
    stage TEXT NOT NULL,
    url TEXT NOT NULL,
    message TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_failed_releases_run ON failed_releases(run_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
