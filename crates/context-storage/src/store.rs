use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter, Connection};

use context_protocol::{Chunk, ChunkMetadata, ContentType, EvalResult, EvalRun, FileHash, Project};

use crate::error::{Result, StoreError, CURRENT_SCHEMA_VERSION};

/// Embedded relational store for projects, chunks and file-hash watermarks.
///
/// Backed by a pooled, WAL-mode SQLite database. Every method takes `&self`
/// and is safe to call from multiple threads; callers on an async runtime
/// should wrap calls in `spawn_blocking` since these methods block on I/O.
pub struct Storage {
    pool: Pool<SqliteConnectionManager>,
}

fn content_type_to_str(ct: ContentType) -> &'static str {
    match ct {
        ContentType::Code => "code",
        ContentType::Docs => "docs",
        ContentType::Config => "config",
        ContentType::Unknown => "unknown",
    }
}

fn content_type_from_str(s: &str) -> ContentType {
    match s {
        "code" => ContentType::Code,
        "docs" => ContentType::Docs,
        "config" => ContentType::Config,
        _ => ContentType::Unknown,
    }
}

impl Storage {
    /// Opens (creating if absent) the database at `path`, running any
    /// pending schema migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(8).build(manager)?;
        let storage = Self { pool };
        storage.migrate()?;
        Ok(storage)
    }

    /// Opens an in-memory database, primarily for tests.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(1).build(manager)?;
        let storage = Self { pool };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute_batch(include_str!("schema.sql"))?;

        let version: i64 = tx
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |r| {
                r.get::<_, Option<i64>>(0)
            })?
            .unwrap_or(0);

        if version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::SchemaNewerThanEngine(version));
        }
        if version < CURRENT_SCHEMA_VERSION {
            tx.execute(
                "INSERT INTO schema_migrations (version) VALUES (?1)",
                params![CURRENT_SCHEMA_VERSION],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    // -- projects ---------------------------------------------------------

    pub fn upsert_project(&self, project: &Project) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO projects (id, name, root_path, model_id, dimensions, file_count,
                chunk_count, last_indexed_at, updated_at, description, tags, ignore_patterns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                root_path = excluded.root_path,
                model_id = excluded.model_id,
                dimensions = excluded.dimensions,
                file_count = excluded.file_count,
                chunk_count = excluded.chunk_count,
                last_indexed_at = excluded.last_indexed_at,
                updated_at = excluded.updated_at,
                description = excluded.description,
                tags = excluded.tags,
                ignore_patterns = excluded.ignore_patterns",
            params![
                project.id,
                project.name,
                project.root_path.to_string_lossy(),
                project.model_id,
                project.dimensions,
                project.file_count,
                project.chunk_count,
                project.last_indexed_at,
                project.updated_at,
                project.description,
                serde_json::to_string(&project.tags)?,
                serde_json::to_string(&project.ignore_patterns)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT id, name, root_path, model_id, dimensions, file_count, chunk_count,
                last_indexed_at, updated_at, description, tags, ignore_patterns
             FROM projects WHERE id = ?1",
            [id],
            row_to_project,
        );
        match row {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, root_path, model_id, dimensions, file_count, chunk_count,
                last_indexed_at, updated_at, description, tags, ignore_patterns
             FROM projects ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], row_to_project)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_project(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
        Ok(())
    }

    // -- staging / chunks ---------------------------------------------------

    /// Clears any leftover staging rows for `project_id` from a previous
    /// aborted run, so a fresh re-index starts from an empty staging area.
    pub fn begin_staging(&self, project_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM chunks_staging WHERE project_id = ?1",
            [project_id],
        )?;
        Ok(())
    }

    /// Appends a batch of chunks to the staging area. Safe to call
    /// repeatedly as a pipeline produces chunks in batches.
    pub fn stage_chunk_batch(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO chunks_staging
                    (id, project_id, content, content_type, language, relative_path,
                     start_line, end_line, vector, symbol_name, metadata_extra, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for chunk in chunks {
                let content_hash = content_hash_of(&chunk.content);
                stmt.execute(params![
                    chunk.id,
                    chunk.project_id,
                    chunk.content,
                    content_type_to_str(chunk.content_type),
                    chunk.language,
                    chunk.relative_path,
                    chunk.start_line,
                    chunk.end_line,
                    crate::encoding::vector_to_bytes(&chunk.vector),
                    chunk.metadata.symbol_name,
                    serde_json::to_string(&chunk.metadata.extra)?,
                    content_hash,
                ])?;
            }
        }
        tx.commit()?;
        Ok(chunks.len())
    }

    /// Atomically replaces `project_id`'s live chunk set with whatever is
    /// currently staged, then clears the staging area. Readers never see a
    /// partially-replaced chunk set.
    pub fn commit_staging(&self, project_id: &str) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks WHERE project_id = ?1", [project_id])?;
        let inserted = tx.execute(
            "INSERT INTO chunks
                (id, project_id, content, content_type, language, relative_path,
                 start_line, end_line, vector, symbol_name, metadata_extra, content_hash)
             SELECT id, project_id, content, content_type, language, relative_path,
                 start_line, end_line, vector, symbol_name, metadata_extra, content_hash
             FROM chunks_staging WHERE project_id = ?1",
            [project_id],
        )?;
        tx.execute(
            "DELETE FROM chunks_staging WHERE project_id = ?1",
            [project_id],
        )?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Drops any staged-but-uncommitted chunks for `project_id`. Called when
    /// an in-flight re-index is cancelled.
    pub fn abort_staging(&self, project_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM chunks_staging WHERE project_id = ?1",
            [project_id],
        )?;
        Ok(())
    }

    pub fn get_chunks_for_project(&self, project_id: &str) -> Result<Vec<Chunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.project_id, c.content, c.content_type, c.language, c.relative_path,
                c.start_line, c.end_line, c.vector, c.symbol_name, c.metadata_extra, p.dimensions
             FROM chunks c JOIN projects p ON p.id = c.project_id
             WHERE c.project_id = ?1",
        )?;
        let raws = stmt
            .query_map([project_id], row_to_raw_chunk)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raws.into_iter().map(raw_into_chunk).collect()
    }

    pub fn get_chunks_by_ids(&self, ids: &[&str]) -> Result<Vec<Chunk>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "SELECT c.id, c.project_id, c.content, c.content_type, c.language, c.relative_path,
                c.start_line, c.end_line, c.vector, c.symbol_name, c.metadata_extra, p.dimensions
             FROM chunks c JOIN projects p ON p.id = c.project_id
             WHERE c.id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
            .query_map(params_from_iter(ids.iter()), row_to_raw_chunk)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raws.into_iter().map(raw_into_chunk).collect()
    }

    pub fn delete_chunks_for_path(&self, project_id: &str, relative_path: &str) -> Result<u64> {
        let conn = self.conn()?;
        let n = conn.execute(
            "DELETE FROM chunks WHERE project_id = ?1 AND relative_path = ?2",
            params![project_id, relative_path],
        )?;
        Ok(n as u64)
    }

    // -- file hashes ---------------------------------------------------------

    pub fn upsert_file_hash(&self, hash: &FileHash) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO file_hashes (project_id, relative_path, content_hash, indexed_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(project_id, relative_path) DO UPDATE SET
                content_hash = excluded.content_hash, indexed_at = excluded.indexed_at",
            params![
                hash.project_id,
                hash.relative_path,
                hash.content_hash,
                hash.indexed_at
            ],
        )?;
        Ok(())
    }

    pub fn get_file_hash(&self, project_id: &str, relative_path: &str) -> Result<Option<FileHash>> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT project_id, relative_path, content_hash, indexed_at
             FROM file_hashes WHERE project_id = ?1 AND relative_path = ?2",
            params![project_id, relative_path],
            |r| {
                Ok(FileHash {
                    project_id: r.get(0)?,
                    relative_path: r.get(1)?,
                    content_hash: r.get(2)?,
                    indexed_at: r.get(3)?,
                })
            },
        );
        match row {
            Ok(h) => Ok(Some(h)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_file_hashes(&self, project_id: &str) -> Result<Vec<FileHash>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, relative_path, content_hash, indexed_at
             FROM file_hashes WHERE project_id = ?1",
        )?;
        let rows = stmt
            .query_map([project_id], |r| {
                Ok(FileHash {
                    project_id: r.get(0)?,
                    relative_path: r.get(1)?,
                    content_hash: r.get(2)?,
                    indexed_at: r.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Deletes file-hash rows whose `relative_path` is not in `keep`, then
    /// their associated chunks. Used after a scan to prune files that were
    /// deleted from the project root.
    pub fn prune_missing_files(&self, project_id: &str, keep: &BTreeSet<String>) -> Result<u64> {
        let existing = self.list_file_hashes(project_id)?;
        let mut pruned = 0u64;
        let conn = self.conn()?;
        for hash in existing {
            if keep.contains(&hash.relative_path) {
                continue;
            }
            conn.execute(
                "DELETE FROM file_hashes WHERE project_id = ?1 AND relative_path = ?2",
                params![project_id, hash.relative_path],
            )?;
            conn.execute(
                "DELETE FROM chunks WHERE project_id = ?1 AND relative_path = ?2",
                params![project_id, hash.relative_path],
            )?;
            pruned += 1;
        }
        Ok(pruned)
    }

    /// Records a run of the evaluation harness. The harness itself computes
    /// metrics externally; storage only keeps the run's identity.
    pub fn insert_eval_run(&self, run: &EvalRun) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO eval_run (id, project_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![run.id, run.project_id, run.name, run.created_at],
        )?;
        Ok(())
    }

    pub fn insert_eval_result(&self, result: &EvalResult) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO eval_result (id, run_id, question, answer, contexts, ground_truths)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                result.id,
                result.run_id,
                result.question,
                result.answer,
                serde_json::to_string(&result.contexts)?,
                serde_json::to_string(&result.ground_truths)?,
            ],
        )?;
        Ok(())
    }

    pub fn list_eval_results(&self, run_id: &str) -> Result<Vec<EvalResult>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, run_id, question, answer, contexts, ground_truths
             FROM eval_result WHERE run_id = ?1",
        )?;
        let rows = stmt
            .query_map([run_id], |r| {
                let contexts_json: String = r.get(4)?;
                let ground_truths_json: String = r.get(5)?;
                Ok(EvalResult {
                    id: r.get(0)?,
                    run_id: r.get(1)?,
                    question: r.get(2)?,
                    answer: r.get(3)?,
                    contexts: serde_json::from_str(&contexts_json).unwrap_or_default(),
                    ground_truths: serde_json::from_str(&ground_truths_json).unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    let tags_json: String = row.get(10)?;
    let ignore_json: String = row.get(11)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        root_path: PathBuf::from(row.get::<_, String>(2)?),
        model_id: row.get(3)?,
        dimensions: row.get(4)?,
        file_count: row.get(5)?,
        chunk_count: row.get(6)?,
        last_indexed_at: row.get(7)?,
        updated_at: row.get(8)?,
        description: row.get(9)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        ignore_patterns: serde_json::from_str(&ignore_json).unwrap_or_default(),
    })
}

/// Column-for-column snapshot of a `chunks` row joined against its
/// project's declared dimensionality. `rusqlite::Row`-mapping closures
/// must return `rusqlite::Result`, so the vector BLOB is decoded in a
/// second pass (`raw_into_chunk`) where a length mismatch can surface as
/// `StoreError::CorruptVector` instead of a generic database error.
struct RawChunkRow {
    id: String,
    project_id: String,
    content: String,
    content_type: ContentType,
    language: Option<String>,
    relative_path: String,
    start_line: u32,
    end_line: u32,
    vector_bytes: Vec<u8>,
    symbol_name: Option<String>,
    extra_json: String,
    dimensions: usize,
}

fn row_to_raw_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawChunkRow> {
    Ok(RawChunkRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        content: row.get(2)?,
        content_type: content_type_from_str(&row.get::<_, String>(3)?),
        language: row.get(4)?,
        relative_path: row.get(5)?,
        start_line: row.get(6)?,
        end_line: row.get(7)?,
        vector_bytes: row.get(8)?,
        symbol_name: row.get(9)?,
        extra_json: row.get(10)?,
        dimensions: row.get::<_, i64>(11)? as usize,
    })
}

fn raw_into_chunk(raw: RawChunkRow) -> Result<Chunk> {
    let vector = crate::encoding::bytes_to_vector(&raw.vector_bytes, raw.dimensions)
        .map_err(|(expected, found)| StoreError::CorruptVector { expected, found })?;
    Ok(Chunk {
        id: raw.id,
        project_id: raw.project_id,
        content: raw.content,
        content_type: raw.content_type,
        language: raw.language,
        relative_path: raw.relative_path,
        start_line: raw.start_line,
        end_line: raw.end_line,
        vector,
        metadata: ChunkMetadata {
            symbol_name: raw.symbol_name,
            extra: serde_json::from_str::<BTreeMap<_, _>>(&raw.extra_json).unwrap_or_default(),
        },
    })
}

/// FNV-1a 64-bit: fast, stable across runs, sufficient for change
/// detection (not used for any security-sensitive purpose). Exposed so
/// callers populating `file_hashes` (the pipeline) hash the same way
/// chunks are hashed here.
pub fn content_hash_of(content: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in content.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")
}

#[allow(dead_code)]
fn open_connection_for_test() -> Connection {
    Connection::open_in_memory().expect("open in-memory sqlite connection")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: "demo".to_string(),
            root_path: PathBuf::from("/tmp/demo"),
            model_id: "test-model".to_string(),
            dimensions: 3,
            file_count: 0,
            chunk_count: 0,
            last_indexed_at: None,
            updated_at: 1,
            description: None,
            tags: BTreeSet::new(),
            ignore_patterns: Vec::new(),
        }
    }

    fn sample_chunk(project_id: &str, id: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            project_id: project_id.to_string(),
            content: "fn main() {}".to_string(),
            content_type: ContentType::Code,
            language: Some("rust".to_string()),
            relative_path: "src/main.rs".to_string(),
            start_line: 1,
            end_line: 1,
            vector: vec![0.1, 0.2, 0.3],
            metadata: ChunkMetadata {
                symbol_name: Some("main".to_string()),
                extra: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn project_round_trips() {
        let storage = Storage::open_in_memory().unwrap();
        let project = sample_project("p1");
        storage.upsert_project(&project).unwrap();
        let fetched = storage.get_project("p1").unwrap().unwrap();
        assert_eq!(fetched.id, project.id);
        assert_eq!(fetched.dimensions, 3);
    }

    #[test]
    fn staging_swap_is_atomic_and_replaces_old_chunks() {
        let storage = Storage::open_in_memory().unwrap();
        storage.upsert_project(&sample_project("p1")).unwrap();

        storage.stage_chunk_batch(&[sample_chunk("p1", "c1")]).unwrap();
        storage.commit_staging("p1").unwrap();
        assert_eq!(storage.get_chunks_for_project("p1").unwrap().len(), 1);

        storage.begin_staging("p1").unwrap();
        storage.stage_chunk_batch(&[sample_chunk("p1", "c2")]).unwrap();
        storage.commit_staging("p1").unwrap();

        let chunks = storage.get_chunks_for_project("p1").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "c2");
    }

    #[test]
    fn abort_staging_leaves_live_chunks_untouched() {
        let storage = Storage::open_in_memory().unwrap();
        storage.upsert_project(&sample_project("p1")).unwrap();
        storage.stage_chunk_batch(&[sample_chunk("p1", "c1")]).unwrap();
        storage.commit_staging("p1").unwrap();

        storage.begin_staging("p1").unwrap();
        storage.stage_chunk_batch(&[sample_chunk("p1", "c2")]).unwrap();
        storage.abort_staging("p1").unwrap();

        let chunks = storage.get_chunks_for_project("p1").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "c1");
    }

    #[test]
    fn prune_missing_files_deletes_hash_and_chunks() {
        let storage = Storage::open_in_memory().unwrap();
        storage.upsert_project(&sample_project("p1")).unwrap();
        storage
            .upsert_file_hash(&FileHash {
                project_id: "p1".into(),
                relative_path: "src/main.rs".into(),
                content_hash: "abc".into(),
                indexed_at: 1,
            })
            .unwrap();
        storage.stage_chunk_batch(&[sample_chunk("p1", "c1")]).unwrap();
        storage.commit_staging("p1").unwrap();

        let keep = BTreeSet::new();
        let pruned = storage.prune_missing_files("p1", &keep).unwrap();
        assert_eq!(pruned, 1);
        assert!(storage.get_chunks_for_project("p1").unwrap().is_empty());
        assert!(storage.get_file_hash("p1", "src/main.rs").unwrap().is_none());
    }

    #[test]
    fn eval_results_round_trip_under_their_run() {
        let storage = Storage::open_in_memory().unwrap();
        storage.upsert_project(&sample_project("p1")).unwrap();
        storage
            .insert_eval_run(&EvalRun {
                id: "run1".into(),
                project_id: "p1".into(),
                name: "smoke".into(),
                created_at: 1,
            })
            .unwrap();
        storage
            .insert_eval_result(&EvalResult {
                id: "r1".into(),
                run_id: "run1".into(),
                question: "what does main do?".into(),
                answer: "prints hello".into(),
                contexts: vec!["fn main() {}".into()],
                ground_truths: vec!["entry point".into()],
            })
            .unwrap();

        let results = storage.list_eval_results("run1").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].question, "what does main do?");
        assert_eq!(results[0].contexts, vec!["fn main() {}".to_string()]);
    }

    #[test]
    fn deleting_a_project_cascades_to_its_dependent_rows() {
        let storage = Storage::open_in_memory().unwrap();
        storage.upsert_project(&sample_project("p1")).unwrap();
        storage.stage_chunk_batch(&[sample_chunk("p1", "c1")]).unwrap();
        storage.commit_staging("p1").unwrap();
        storage
            .upsert_file_hash(&FileHash {
                project_id: "p1".into(),
                relative_path: "src/main.rs".into(),
                content_hash: "abc".into(),
                indexed_at: 1,
            })
            .unwrap();
        storage
            .insert_eval_run(&EvalRun {
                id: "run1".into(),
                project_id: "p1".into(),
                name: "smoke".into(),
                created_at: 1,
            })
            .unwrap();
        storage
            .insert_eval_result(&EvalResult {
                id: "r1".into(),
                run_id: "run1".into(),
                question: "what does main do?".into(),
                answer: "prints hello".into(),
                contexts: Vec::new(),
                ground_truths: Vec::new(),
            })
            .unwrap();

        storage.delete_project("p1").unwrap();

        assert!(storage.get_chunks_for_project("p1").unwrap().is_empty());
        assert!(storage.get_file_hash("p1", "src/main.rs").unwrap().is_none());
        assert!(storage.list_eval_results("run1").unwrap().is_empty());
    }
}
