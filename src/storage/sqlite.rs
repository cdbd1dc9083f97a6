//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{FailedRelease, RankCollision, ReleaseId, ReleaseRecord, SkippedEntry, Stage};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ReleaseSummary, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = init_database(path)?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn read_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
        })
    }
}

fn parse_release_id(raw: String) -> StorageResult<ReleaseId> {
    ReleaseId::parse(&raw).map_err(|_| StorageError::Corrupt(format!("release id {:?}", raw)))
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                Self::read_run,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::read_run,
            )
            .optional()?;

        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Releases =====

    fn save_release(
        &mut self,
        run_id: i64,
        release: &ReleaseId,
        record: &ReleaseRecord,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        // Cascades to systems, attributes, skipped entries and collisions
        tx.execute("DELETE FROM releases WHERE id = ?1", params![release.as_str()])?;

        tx.execute(
            "INSERT INTO releases (id, run_id, system_count, skipped_count, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                release.as_str(),
                run_id,
                record.len() as i64,
                record.skipped.len() as i64,
                now
            ],
        )?;

        {
            let mut insert_system =
                tx.prepare("INSERT INTO systems (release_id, rank) VALUES (?1, ?2)")?;
            let mut insert_attribute = tx.prepare(
                "INSERT INTO attributes (release_id, rank, name, value) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for (rank, system) in record.iter() {
                insert_system.execute(params![release.as_str(), rank])?;
                for (name, value) in system {
                    insert_attribute.execute(params![release.as_str(), rank, name, value])?;
                }
            }

            let mut insert_skipped = tx.prepare(
                "INSERT INTO skipped_entries (release_id, url, page_url, reason)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for entry in &record.skipped {
                insert_skipped.execute(params![
                    release.as_str(),
                    entry.url,
                    entry.page_url,
                    entry.reason
                ])?;
            }

            let mut insert_collision = tx.prepare(
                "INSERT INTO rank_collisions (release_id, rank, url) VALUES (?1, ?2, ?3)",
            )?;
            for collision in &record.rank_collisions {
                insert_collision.execute(params![release.as_str(), collision.rank, collision.url])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            "Stored release {} ({} systems, {} skipped)",
            release,
            record.len(),
            record.skipped.len()
        );
        Ok(())
    }

    fn load_release(&self, release: &ReleaseId) -> StorageResult<ReleaseRecord> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM releases WHERE id = ?1",
                params![release.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        if exists.is_none() {
            return Err(StorageError::ReleaseNotFound(release.to_string()));
        }

        let mut record = ReleaseRecord::new();

        let mut stmt = self
            .conn
            .prepare("SELECT rank FROM systems WHERE release_id = ?1 ORDER BY rank")?;
        let ranks = stmt.query_map(params![release.as_str()], |row| row.get::<_, u32>(0))?;
        for rank in ranks {
            record.systems.insert(rank?, Default::default());
        }

        let mut stmt = self.conn.prepare(
            "SELECT rank, name, value FROM attributes WHERE release_id = ?1 ORDER BY rank, name",
        )?;
        let rows = stmt.query_map(params![release.as_str()], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (rank, name, value) = row?;
            record.systems.entry(rank).or_default().insert(name, value);
        }

        let mut stmt = self.conn.prepare(
            "SELECT url, page_url, reason FROM skipped_entries WHERE release_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![release.as_str()], |row| {
            Ok(SkippedEntry {
                url: row.get(0)?,
                page_url: row.get(1)?,
                reason: row.get(2)?,
            })
        })?;
        for row in rows {
            record.skipped.push(row?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT rank, url FROM rank_collisions WHERE release_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![release.as_str()], |row| {
            Ok(RankCollision {
                rank: row.get(0)?,
                url: row.get(1)?,
            })
        })?;
        for row in rows {
            record.rank_collisions.push(row?);
        }

        Ok(record)
    }

    fn list_releases(&self) -> StorageResult<Vec<ReleaseSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, system_count, skipped_count, crawled_at
             FROM releases ORDER BY id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut releases = Vec::new();
        for row in rows {
            let (id, run_id, system_count, skipped_count, crawled_at) = row?;
            releases.push(ReleaseSummary {
                release: parse_release_id(id)?,
                run_id,
                system_count: system_count as u64,
                skipped_count: skipped_count as u64,
                crawled_at,
            });
        }

        Ok(releases)
    }

    fn record_failed_release(&mut self, run_id: i64, failed: &FailedRelease) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO failed_releases (run_id, release_id, stage, url, message)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                failed.release.as_str(),
                failed.stage.as_str(),
                failed.url,
                failed.message
            ],
        )?;
        Ok(())
    }

    fn get_failed_releases(&self, run_id: i64) -> StorageResult<Vec<FailedRelease>> {
        let mut stmt = self.conn.prepare(
            "SELECT release_id, stage, url, message FROM failed_releases
             WHERE run_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut failed = Vec::new();
        for row in rows {
            let (release, stage, url, message) = row?;
            let stage = Stage::from_db_string(&stage)
                .ok_or_else(|| StorageError::Corrupt(format!("stage {:?}", stage)))?;
            failed.push(FailedRelease {
                release: parse_release_id(release)?,
                stage,
                url,
                message,
            });
        }

        Ok(failed)
    }

    // ===== Statistics =====

    fn count_systems(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM systems", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn attribute_value_counts(&self, attribute: &str) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT value, COUNT(*) AS n FROM attributes WHERE name = ?1
             GROUP BY value ORDER BY n DESC, value ASC",
        )?;

        let rows = stmt.query_map(params![attribute], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

/// Opens a database connection with the pragmas the harvester relies on
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    Ok(conn)
}
