//! Durable vector index on embedded SQLite.
//!
//! [`SqliteIndex`] persists collections and records to a single database file
//! inside a caller-chosen directory. Every mutating call commits before
//! returning, so indexed records survive a process restart. Vectors are
//! stored as little-endian `f32` blobs and scored with an exhaustive cosine
//! scan at query time; collections here are expected to stay in the range
//! where a linear scan is cheaper than maintaining an ANN graph.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::document::{Metadata, MetadataFilter, QueryMatch};
use crate::error::{RagError, Result};
use crate::index::{check_dimensions, cosine_distance, resolve_batch_ids, VectorIndex};

const BACKEND: &str = "sqlite";

const DB_FILE: &str = "docrag.sqlite3";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS collections (
    id        INTEGER PRIMARY KEY,
    name      TEXT NOT NULL UNIQUE,
    dimension INTEGER
);
CREATE TABLE IF NOT EXISTS records (
    id            TEXT PRIMARY KEY,
    collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    text          TEXT NOT NULL,
    vector        BLOB NOT NULL,
    metadata      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS records_by_collection ON records(collection_id);
";

/// A [`VectorIndex`] persisted to a SQLite database on local disk.
///
/// Addressed by a directory: the database file is created inside it on first
/// open. A single connection behind a mutex serializes all writes, which is
/// the concurrency discipline the orchestrator assumes of its index.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::SqliteIndex;
///
/// let index = SqliteIndex::open("./index_data")?;
/// index.create_collection("docs", false).await?;
/// ```
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (or create) the index inside the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Index`] if the directory cannot be created or the
    /// database cannot be opened.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| RagError::Index {
            backend: BACKEND.to_string(),
            message: format!("failed to create index directory {}: {e}", dir.display()),
        })?;

        let conn = Connection::open(dir.join(DB_FILE)).map_err(Self::map_err)?;
        conn.pragma_update(None, "journal_mode", "WAL").map_err(Self::map_err)?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(Self::map_err)?;
        conn.execute_batch(SCHEMA).map_err(Self::map_err)?;

        debug!(path = %dir.display(), "opened sqlite vector index");
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn map_err(e: rusqlite::Error) -> RagError {
        RagError::Index { backend: BACKEND.to_string(), message: e.to_string() }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RagError::Index {
            backend: BACKEND.to_string(),
            message: "connection mutex poisoned".to_string(),
        })
    }

    fn collection_row(conn: &Connection, name: &str) -> Result<Option<(i64, Option<usize>)>> {
        conn.query_row(
            "SELECT id, dimension FROM collections WHERE name = ?1",
            params![name],
            |row| {
                let id: i64 = row.get(0)?;
                let dimension: Option<i64> = row.get(1)?;
                Ok((id, dimension.map(|d| d as usize)))
            },
        )
        .optional()
        .map_err(Self::map_err)
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn decode_vector(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(RagError::Index {
            backend: BACKEND.to_string(),
            message: format!("corrupt vector blob of {} bytes", blob.len()),
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|raw| f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
        .collect())
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn create_collection(&self, name: &str, reset: bool) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("INSERT OR IGNORE INTO collections (name) VALUES (?1)", params![name])
            .map_err(Self::map_err)?;

        if reset {
            conn.execute(
                "DELETE FROM records WHERE collection_id = \
                 (SELECT id FROM collections WHERE name = ?1)",
                params![name],
            )
            .map_err(Self::map_err)?;
            conn.execute("UPDATE collections SET dimension = NULL WHERE name = ?1", params![name])
                .map_err(Self::map_err)?;
            debug!(collection = name, "reset collection");
        }
        Ok(())
    }

    async fn add_documents(
        &self,
        collection: &str,
        texts: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[Metadata],
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>> {
        let ids = resolve_batch_ids(BACKEND, texts, vectors, metadatas, ids)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(Self::map_err)?;

        tx.execute("INSERT OR IGNORE INTO collections (name) VALUES (?1)", params![collection])
            .map_err(Self::map_err)?;
        let (collection_id, established) = Self::collection_row(&tx, collection)?.ok_or_else(
            || RagError::Index {
                backend: BACKEND.to_string(),
                message: format!("collection '{collection}' missing after insert"),
            },
        )?;

        let dimension = check_dimensions(established, vectors)?;
        if !vectors.is_empty() {
            tx.execute(
                "UPDATE collections SET dimension = ?1 WHERE id = ?2",
                params![dimension as i64, collection_id],
            )
            .map_err(Self::map_err)?;
        }

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO records (id, collection_id, text, vector, metadata) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(Self::map_err)?;

            for (i, id) in ids.iter().enumerate() {
                let metadata_json =
                    serde_json::to_string(&metadatas[i]).map_err(|e| RagError::Index {
                        backend: BACKEND.to_string(),
                        message: format!("failed to serialize metadata for record '{id}': {e}"),
                    })?;
                stmt.execute(params![
                    id,
                    collection_id,
                    texts[i],
                    encode_vector(&vectors[i]),
                    metadata_json
                ])
                .map_err(Self::map_err)?;
            }
        }

        tx.commit().map_err(Self::map_err)?;
        debug!(collection, count = ids.len(), "added records to sqlite index");
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let conn = self.lock()?;
        let Some((collection_id, established)) = Self::collection_row(&conn, collection)? else {
            return Ok(Vec::new());
        };

        if let Some(expected) = established {
            if query_vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
        }

        let mut stmt = conn
            .prepare("SELECT text, vector, metadata FROM records WHERE collection_id = ?1")
            .map_err(Self::map_err)?;
        let rows = stmt
            .query_map(params![collection_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(Self::map_err)?;

        let mut matches = Vec::new();
        for row in rows {
            let (text, blob, metadata_json) = row.map_err(Self::map_err)?;
            let metadata: Metadata =
                serde_json::from_str(&metadata_json).map_err(|e| RagError::Index {
                    backend: BACKEND.to_string(),
                    message: format!("corrupt metadata for a record in '{collection}': {e}"),
                })?;

            if let Some(filter) = filter {
                if !filter.matches(&metadata) {
                    continue;
                }
            }

            let vector = decode_vector(&blob)?;
            matches.push(QueryMatch {
                text,
                metadata,
                distance: cosine_distance(&vector, query_vector),
            });
        }

        matches.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM records \
                 JOIN collections ON records.collection_id = collections.id \
                 WHERE collections.name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(Self::map_err)?;
        Ok(count as usize)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM collections WHERE name = ?1", params![name])
            .map_err(Self::map_err)?;
        debug!(collection = name, "deleted collection");
        Ok(())
    }
}
