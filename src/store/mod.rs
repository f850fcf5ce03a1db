//! Record store — a thin, collection-scoped key/vector/payload adapter over
//! SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec) as the
//! nearest-neighbor index.
//!
//! Each collection is a pair of tables: `<name>_points` holds the JSON payload
//! keyed by the record's display identifier, and `<name>_vec` is a vec0
//! virtual table holding the stored vector at the collection's registered
//! width. The `collections` registry table pins each collection's vector
//! width and distance metric so incompatibilities surface as
//! [`StoreError::SchemaMismatch`] instead of an opaque index error later.
//!
//! Storage keys are the display identifiers themselves. Identifiers must
//! follow the `<prefix>_<int>` format (`soil_007`, `wisdom_012`); the integer
//! ordinal is validated on write but never used as a separate surrogate key.

pub mod error;

pub use error::{StoreError, StoreResult};

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use sqlite_vec::sqlite3_vec_init;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the database at the given path with the vector extension
/// loaded and the collection registry initialized.
pub fn open_database(path: impl AsRef<Path>) -> anyhow::Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    init_registry(&conn).context("failed to initialize collection registry")?;

    tracing::info!(path = %path.display(), "database opened");
    Ok(conn)
}

/// Create the collection registry table. Idempotent.
pub fn init_registry(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            dim INTEGER NOT NULL,
            metric TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// Distance metric used for similarity ranking within a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Cosine distance; search scores are cosine similarity (1 - distance).
    Cosine,
    /// Squared L2 distance; search scores are negated distance.
    L2,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::L2 => "l2",
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(Self::Cosine),
            "l2" => Ok(Self::L2),
            _ => Err(format!("unknown distance metric: {s}")),
        }
    }
}

/// A stored (identifier, vector, payload) triple.
#[derive(Debug, Clone)]
pub struct Point {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// One similarity-search hit, ranked by descending score.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f64,
    pub payload: Value,
}

/// A conjunction of equality predicates on top-level payload fields.
///
/// A predicate against an array field matches by membership, so
/// `must_match("soil_types_applicable", "Sandy")` matches any payload whose
/// `soil_types_applicable` array contains `"Sandy"`.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    must: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_match(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.must.push((field.into(), value.into()));
        self
    }

    /// True when every predicate matches the payload.
    fn matches(&self, payload: &Value) -> bool {
        self.must.iter().all(|(field, expected)| {
            match payload.get(field) {
                Some(Value::Array(items)) => items.contains(expected),
                Some(actual) => actual == expected,
                None => false,
            }
        })
    }
}

/// Create a collection if absent. Re-ensuring an existing collection with the
/// same width and metric is a logged no-op; a divergent width or metric is a
/// [`StoreError::SchemaMismatch`].
pub fn ensure_collection(
    conn: &Connection,
    name: &str,
    dim: usize,
    metric: DistanceMetric,
) -> StoreResult<()> {
    // Collection names are crate-internal constants and double as table name
    // fragments, so anything else is a programming error.
    assert!(
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
        "collection name must be lowercase alphanumeric/underscore: {name}"
    );

    if let Some((existing_dim, existing_metric)) = registered_spec(conn, name)? {
        if existing_dim != dim || existing_metric != metric {
            return Err(StoreError::SchemaMismatch {
                collection: name.to_string(),
                expected: format!("{existing_dim}d/{}", existing_metric.as_str()),
                got: format!("{dim}d/{}", metric.as_str()),
            });
        }
        tracing::debug!(collection = name, "collection already exists");
        return Ok(());
    }

    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {name}_points (
            id TEXT PRIMARY KEY,
            payload TEXT NOT NULL
        );"
    ))?;

    let metric_opt = match metric {
        DistanceMetric::Cosine => " distance_metric=cosine",
        DistanceMetric::L2 => "",
    };
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {name}_vec USING vec0(
            id TEXT PRIMARY KEY,
            embedding FLOAT[{dim}]{metric_opt}
        );"
    ))?;

    conn.execute(
        "INSERT INTO collections (name, dim, metric) VALUES (?1, ?2, ?3)",
        params![name, dim as i64, metric.as_str()],
    )?;

    tracing::info!(collection = name, dim, metric = metric.as_str(), "collection created");
    Ok(())
}

/// Validate a display identifier and extract its ordinal.
pub fn parse_point_id(id: &str) -> StoreResult<(&str, u64)> {
    let invalid = || StoreError::InvalidIdentifier(id.to_string());

    let (prefix, suffix) = id.rsplit_once('_').ok_or_else(invalid)?;
    if prefix.is_empty() || suffix.is_empty() {
        return Err(invalid());
    }
    let ordinal: u64 = suffix.parse().map_err(|_| invalid())?;
    Ok((prefix, ordinal))
}

/// Overwrite-or-insert a batch of points inside one transaction.
pub fn upsert(conn: &mut Connection, collection: &str, points: &[Point]) -> StoreResult<()> {
    let (dim, _) = collection_spec(conn, collection)?;

    let tx = conn.transaction()?;
    for point in points {
        parse_point_id(&point.id)?;
        if point.vector.len() != dim {
            return Err(StoreError::SchemaMismatch {
                collection: collection.to_string(),
                expected: format!("{dim}d"),
                got: format!("{}d", point.vector.len()),
            });
        }

        tx.execute(
            &format!("INSERT OR REPLACE INTO {collection}_points (id, payload) VALUES (?1, ?2)"),
            params![point.id, point.payload.to_string()],
        )?;
        // vec0 has no upsert; replace is delete + insert.
        tx.execute(
            &format!("DELETE FROM {collection}_vec WHERE id = ?1"),
            params![point.id],
        )?;
        tx.execute(
            &format!("INSERT INTO {collection}_vec (id, embedding) VALUES (?1, ?2)"),
            params![point.id, vector_to_bytes(&point.vector)],
        )?;
    }
    tx.commit()?;

    tracing::debug!(collection, count = points.len(), "points upserted");
    Ok(())
}

/// Top-k search ranked by descending similarity to the query vector.
///
/// With a filter present the KNN pass covers the whole collection and the
/// predicates are applied afterwards, so the returned top-k among matching
/// points is exact. An empty result is a valid outcome, not an error.
pub fn search(
    conn: &Connection,
    collection: &str,
    query: &[f32],
    filter: Option<&Filter>,
    limit: usize,
) -> StoreResult<Vec<ScoredPoint>> {
    let (dim, metric) = collection_spec(conn, collection)?;
    if query.len() != dim {
        return Err(StoreError::SchemaMismatch {
            collection: collection.to_string(),
            expected: format!("{dim}d"),
            got: format!("{}d", query.len()),
        });
    }
    if limit == 0 {
        return Ok(Vec::new());
    }

    let knn_limit = match filter {
        Some(_) => point_count(conn, collection)?,
        None => limit,
    };
    if knn_limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT id, distance FROM {collection}_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2"
    ))?;
    let candidates: Vec<(String, f64)> = stmt
        .query_map(params![vector_to_bytes(query), knn_limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let candidate_ids: Vec<&str> = candidates.iter().map(|(id, _)| id.as_str()).collect();
    let mut payloads = fetch_payloads(conn, collection, &candidate_ids)?;

    let mut hits = Vec::with_capacity(limit.min(candidates.len()));
    for (id, distance) in candidates {
        let Some(payload) = payloads.remove(id.as_str()) else {
            continue;
        };
        if let Some(f) = filter {
            if !f.matches(&payload) {
                continue;
            }
        }
        let score = match metric {
            DistanceMetric::Cosine => 1.0 - distance,
            DistanceMetric::L2 => -distance,
        };
        hits.push(ScoredPoint { id, score, payload });
        if hits.len() >= limit {
            break;
        }
    }
    Ok(hits)
}

/// Point lookup by identifier, returning both payload and stored vector.
pub fn retrieve(conn: &Connection, collection: &str, id: &str) -> StoreResult<Point> {
    collection_spec(conn, collection)?;

    let payload_text: Option<String> = conn
        .query_row(
            &format!("SELECT payload FROM {collection}_points WHERE id = ?1"),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    let payload_text = payload_text.ok_or_else(|| StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    })?;
    let payload = parse_payload(id, &payload_text)?;

    let blob: Vec<u8> = conn.query_row(
        &format!("SELECT embedding FROM {collection}_vec WHERE id = ?1"),
        params![id],
        |row| row.get(0),
    )?;

    Ok(Point {
        id: id.to_string(),
        vector: bytes_to_vector(&blob),
        payload,
    })
}

/// Merge named fields into an existing payload, last-write-wins per field.
/// The stored vector is never touched. A patch that is not a JSON object is
/// rejected with [`StoreError::InvalidPatch`].
pub fn update_payload(
    conn: &Connection,
    collection: &str,
    id: &str,
    patch: &Value,
) -> StoreResult<()> {
    collection_spec(conn, collection)?;
    let patch = patch
        .as_object()
        .ok_or_else(|| StoreError::InvalidPatch(id.to_string()))?;

    let existing: Option<String> = conn
        .query_row(
            &format!("SELECT payload FROM {collection}_points WHERE id = ?1"),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    let existing = existing.ok_or_else(|| StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    })?;

    let mut payload = parse_payload(id, &existing)?;
    let fields = payload
        .as_object_mut()
        .expect("stored payloads are JSON objects");
    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }

    conn.execute(
        &format!("UPDATE {collection}_points SET payload = ?1 WHERE id = ?2"),
        params![payload.to_string(), id],
    )?;
    Ok(())
}

/// Return one bounded page of (id, payload) pairs ordered by id.
///
/// Callers aggregating over this page see an approximation once the
/// collection outgrows `page_limit`; that bound is part of the contract.
pub fn scan_all(
    conn: &Connection,
    collection: &str,
    page_limit: usize,
) -> StoreResult<Vec<(String, Value)>> {
    collection_spec(conn, collection)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT id, payload FROM {collection}_points ORDER BY id LIMIT ?1"
    ))?;
    let rows: Vec<(String, String)> = stmt
        .query_map(params![page_limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, text)| {
            let payload = parse_payload(&id, &text)?;
            Ok((id, payload))
        })
        .collect()
}

/// Number of points in a collection.
pub fn point_count(conn: &Connection, collection: &str) -> StoreResult<usize> {
    collection_spec(conn, collection)?;
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {collection}_points"),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Look up a collection's registered width and metric, or fail with
/// `CollectionUnavailable`.
fn collection_spec(conn: &Connection, name: &str) -> StoreResult<(usize, DistanceMetric)> {
    registered_spec(conn, name)?.ok_or_else(|| StoreError::CollectionUnavailable(name.to_string()))
}

fn registered_spec(
    conn: &Connection,
    name: &str,
) -> StoreResult<Option<(usize, DistanceMetric)>> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT dim, metric FROM collections WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((dim, metric)) => {
            let metric = metric
                .parse::<DistanceMetric>()
                .unwrap_or_else(|e| panic!("corrupt collection registry: {e}"));
            Ok(Some((dim as usize, metric)))
        }
        None => Ok(None),
    }
}

/// Batch-fetch payloads by id, preserving nothing about order (map lookup).
fn fetch_payloads(
    conn: &Connection,
    collection: &str,
    ids: &[&str],
) -> StoreResult<HashMap<String, Value>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT id, payload FROM {collection}_points WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let sql_params: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

    let rows: Vec<(String, String)> = stmt
        .query_map(sql_params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map = HashMap::with_capacity(rows.len());
    for (id, text) in rows {
        let payload = parse_payload(&id, &text)?;
        map.insert(id, payload);
    }
    Ok(map)
}

fn parse_payload(id: &str, text: &str) -> StoreResult<Value> {
    serde_json::from_str(text).map_err(|source| StoreError::Payload {
        id: id.to_string(),
        source,
    })
}

/// Convert an f32 vector slice to raw bytes for sqlite-vec.
pub fn vector_to_bytes(vector: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            vector.as_ptr() as *const u8,
            vector.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Inverse of [`vector_to_bytes`] for vectors read back from the index.
pub fn bytes_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
