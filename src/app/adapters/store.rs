//! Persistence collaborator contract and its implementations
//!
//! The hosted backend is reduced to a small contract: store a blob and get
//! its path back, insert a row and get its id back, update a row by id, read
//! rows with equality or containment filters and ordering, and issue signed
//! URLs. Writes report success or failure only; there are no partial writes.

use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Storage operations, used for diagnostics and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Upload,
    Insert,
    Update,
    Read,
    SignUrl,
}

impl StoreOperation {
    pub fn name(&self) -> &'static str {
        match self {
            StoreOperation::Upload => "upload",
            StoreOperation::Insert => "insert",
            StoreOperation::Update => "update",
            StoreOperation::Read => "read",
            StoreOperation::SignUrl => "signed url",
        }
    }
}

/// Sort direction for row reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A single row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    /// Column equals the value
    Eq(String, Value),
    /// Array column holds the value
    Contains(String, Value),
}

impl RowFilter {
    fn matches(&self, row: &Value) -> bool {
        match self {
            RowFilter::Eq(column, value) => row.get(column) == Some(value),
            RowFilter::Contains(column, value) => row
                .get(column)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

/// Row filters plus optional ordering and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    pub filters: Vec<RowFilter>,
    pub order_by: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl RowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` equals `value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(RowFilter::Eq(column.into(), value.into()));
        self
    }

    /// Keep rows whose array `column` holds `value`
    pub fn contains(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters
            .push(RowFilter::Contains(column.into(), value.into()));
        self
    }

    pub fn order(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply the query to an in-memory table
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut selected: Vec<Value> = rows
            .iter()
            .filter(|row| self.filters.iter().all(|filter| filter.matches(row)))
            .cloned()
            .collect();

        if let Some((column, order)) = &self.order_by {
            selected.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Order JSON scalars: missing/null first, then numbers, then strings
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// The external persistence collaborator
#[async_trait]
pub trait SubmissionStore: Send + Sync + Debug {
    /// Store a blob and return its path within the bucket
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String>;

    /// Insert a row and return its id
    async fn insert_row(&self, table: &str, row: Value) -> Result<i64>;

    /// Merge `patch` into the row with the given id
    async fn update_row(&self, table: &str, id: i64, patch: Value) -> Result<()>;

    async fn read_rows(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>>;

    /// Time-limited URL for a stored blob
    async fn signed_url(&self, bucket: &str, path: &str, expires_in: Duration) -> Result<String>;
}

fn row_object(operation: StoreOperation, row: Value) -> Result<Map<String, Value>> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(Error::store(
            operation.name(),
            format!("rows must be JSON objects, got {}", other),
        )),
    }
}

fn merge_patch(table: &str, rows: &mut [Value], id: i64, patch: Value) -> Result<()> {
    let patch = row_object(StoreOperation::Update, patch)?;
    let row = rows
        .iter_mut()
        .find(|row| row.get("id").and_then(Value::as_i64) == Some(id))
        .ok_or_else(|| {
            Error::store(
                StoreOperation::Update.name(),
                format!("no row with id {} in {}", id, table),
            )
        })?;

    if let Value::Object(existing) = row {
        for (key, value) in patch {
            if key != "id" {
                existing.insert(key, value);
            }
        }
    }
    Ok(())
}

fn expiry_timestamp(expires_in: Duration) -> i64 {
    Utc::now().timestamp() + expires_in.as_secs() as i64
}

/// Reject bucket and table names that are not a single plain path segment
fn plain_segment<'a>(operation: StoreOperation, kind: &str, name: &'a str) -> Result<&'a str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(name),
        _ => Err(Error::store(
            operation.name(),
            format!("{} name '{}' is not a plain name", kind, name),
        )),
    }
}

/// Write `bytes` to a temp file beside `target`, then rename it into place
///
/// Readers see either the old content or the new content, never a prefix.
async fn write_atomically(target: PathBuf, bytes: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let context =
            |e: std::io::Error| Error::io(format!("Failed to write {}", target.display()), e);

        let mut file = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(context)?;
        file.write_all(&bytes).map_err(context)?;
        file.as_file().sync_all().map_err(context)?;
        file.persist(&target).map_err(|e| context(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| Error::io("Write task did not complete", std::io::Error::other(e)))?
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    blobs: HashMap<(String, String), Vec<u8>>,
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    failing: HashSet<StoreOperation>,
    writes: usize,
}

/// Process-local store used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `operation` fail until cleared
    pub async fn fail(&self, operation: StoreOperation) {
        self.state.lock().await.failing.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failing.clear();
    }

    /// Number of successful uploads, inserts and updates
    pub async fn write_count(&self) -> usize {
        self.state.lock().await.writes
    }

    /// Raw bytes of a stored blob
    pub async fn blob(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .await
            .blobs
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    fn check(state: &MemoryState, operation: StoreOperation) -> Result<()> {
        if state.failing.contains(&operation) {
            return Err(Error::store(operation.name(), "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String> {
        let mut state = self.state.lock().await;
        Self::check(&state, StoreOperation::Upload)?;
        state
            .blobs
            .insert((bucket.to_string(), path.to_string()), bytes);
        state.writes += 1;
        Ok(path.to_string())
    }

    async fn insert_row(&self, table: &str, row: Value) -> Result<i64> {
        let mut state = self.state.lock().await;
        Self::check(&state, StoreOperation::Insert)?;
        let mut row = row_object(StoreOperation::Insert, row)?;

        state.next_id += 1;
        let id = state.next_id;
        row.insert("id".to_string(), Value::from(id));
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(Value::Object(row));
        state.writes += 1;
        Ok(id)
    }

    async fn update_row(&self, table: &str, id: i64, patch: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::check(&state, StoreOperation::Update)?;
        let rows = state.tables.entry(table.to_string()).or_default();
        merge_patch(table, rows, id, patch)?;
        state.writes += 1;
        Ok(())
    }

    async fn read_rows(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>> {
        let state = self.state.lock().await;
        Self::check(&state, StoreOperation::Read)?;
        Ok(state
            .tables
            .get(table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn signed_url(&self, bucket: &str, path: &str, expires_in: Duration) -> Result<String> {
        let state = self.state.lock().await;
        Self::check(&state, StoreOperation::SignUrl)?;
        if !state
            .blobs
            .contains_key(&(bucket.to_string(), path.to_string()))
        {
            return Err(Error::store(
                StoreOperation::SignUrl.name(),
                format!("no object {}/{}", bucket, path),
            ));
        }
        Ok(format!(
            "memory://{}/{}?expires={}",
            bucket,
            path,
            expiry_timestamp(expires_in)
        ))
    }
}

// =============================================================================
// Local Directory Store
// =============================================================================

/// Store backed by a local directory
///
/// Blobs live under `<root>/<bucket>/<path>`; each table is one JSON array
/// file under `<root>/tables/`.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    // serializes read-modify-write cycles on table files
    lock: Mutex<()>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join("tables"))
            .await
            .map_err(|e| {
                Error::io(
                    format!("Failed to create store directory {}", root.display()),
                    e,
                )
            })?;
        info!("Using local store at {}", root.display());
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, operation: StoreOperation, bucket: &str, path: &str) -> Result<PathBuf> {
        let bucket = plain_segment(operation, "bucket", bucket)?;
        let relative = Path::new(path);
        if path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::store(
                operation.name(),
                format!("object path '{}' escapes the bucket", path),
            ));
        }
        Ok(self.root.join(bucket).join(relative))
    }

    fn table_path(&self, operation: StoreOperation, table: &str) -> Result<PathBuf> {
        let table = plain_segment(operation, "table", table)?;
        Ok(self.root.join("tables").join(format!("{}.json", table)))
    }

    async fn load_table(&self, path: &Path) -> Result<Vec<Value>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::io(
                format!("Failed to read table {}", path.display()),
                e,
            )),
        }
    }

    async fn save_table(&self, path: PathBuf, rows: &[Value]) -> Result<()> {
        let content = serde_json::to_vec_pretty(rows)?;
        write_atomically(path, content).await
    }
}

#[async_trait]
impl SubmissionStore for LocalStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String> {
        let target = self.blob_path(StoreOperation::Upload, bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(format!("Failed to create {}", parent.display()), e))?;
        }
        write_atomically(target.clone(), bytes).await?;
        debug!("Stored object {}", target.display());
        Ok(path.to_string())
    }

    async fn insert_row(&self, table: &str, row: Value) -> Result<i64> {
        let path = self.table_path(StoreOperation::Insert, table)?;
        let mut row = row_object(StoreOperation::Insert, row)?;
        let _guard = self.lock.lock().await;
        let mut rows = self.load_table(&path).await?;

        let id = rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;
        row.insert("id".to_string(), Value::from(id));
        rows.push(Value::Object(row));

        self.save_table(path, &rows).await?;
        debug!("Inserted row {} into {}", id, table);
        Ok(id)
    }

    async fn update_row(&self, table: &str, id: i64, patch: Value) -> Result<()> {
        let path = self.table_path(StoreOperation::Update, table)?;
        let _guard = self.lock.lock().await;
        let mut rows = self.load_table(&path).await?;
        merge_patch(table, &mut rows, id, patch)?;
        self.save_table(path, &rows).await?;
        debug!("Updated row {} in {}", id, table);
        Ok(())
    }

    async fn read_rows(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>> {
        let path = self.table_path(StoreOperation::Read, table)?;
        let _guard = self.lock.lock().await;
        Ok(query.apply(&self.load_table(&path).await?))
    }

    async fn signed_url(&self, bucket: &str, path: &str, expires_in: Duration) -> Result<String> {
        let target = self.blob_path(StoreOperation::SignUrl, bucket, path)?;
        if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(Error::store(
                StoreOperation::SignUrl.name(),
                format!("no object {}/{}", bucket, path),
            ));
        }
        Ok(format!(
            "file://{}?expires={}",
            target.display(),
            expiry_timestamp(expires_in)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_insert_update_read() {
        let store = MemoryStore::new();
        let first = store
            .insert_row("csv_submissions", json!({"name": "a", "num_records": 3}))
            .await
            .unwrap();
        let second = store
            .insert_row("csv_submissions", json!({"name": "b", "num_records": 1}))
            .await
            .unwrap();
        assert_eq!((first, second), (1, 2));

        store
            .update_row("csv_submissions", first, json!({"significance": "shade"}))
            .await
            .unwrap();

        let rows = store
            .read_rows(
                "csv_submissions",
                &RowQuery::new().order("num_records", SortOrder::Ascending),
            )
            .await
            .unwrap();
        assert_eq!(rows[0]["name"], "b");
        assert_eq!(rows[1]["significance"], "shade");

        let filtered = store
            .read_rows("csv_submissions", &RowQuery::new().eq("name", "a"))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(store.write_count().await, 3);
    }

    #[tokio::test]
    async fn test_memory_store_update_missing_row() {
        let store = MemoryStore::new();
        let err = store
            .update_row("csv_submissions", 99, json!({"x": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
    }

    #[tokio::test]
    async fn test_memory_store_injected_failure() {
        let store = MemoryStore::new();
        store.fail(StoreOperation::Insert).await;
        assert!(store.insert_row("t", json!({})).await.is_err());
        assert_eq!(store.write_count().await, 0);

        store.clear_failures().await;
        assert!(store.insert_row("t", json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn test_rows_must_be_objects() {
        let store = MemoryStore::new();
        assert!(store.insert_row("t", json!([1, 2])).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_signed_url_requires_object() {
        let store = MemoryStore::new();
        assert!(
            store
                .signed_url("b", "x.csv", Duration::from_secs(60))
                .await
                .is_err()
        );
        store.upload("b", "x.csv", b"data".to_vec()).await.unwrap();
        let url = store
            .signed_url("b", "x.csv", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("memory://b/x.csv?expires="));
    }

    #[tokio::test]
    async fn test_local_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalStore::open(dir.path()).await.unwrap();
            store
                .upload("submitted-csvs", "trace.csv", b"a,b".to_vec())
                .await
                .unwrap();
            let id = store.insert_row("csv_submissions", json!({"name": "a"})).await.unwrap();
            store
                .update_row("csv_submissions", id, json!({"notes": [1, 2]}))
                .await
                .unwrap();
        }

        let store = LocalStore::open(dir.path()).await.unwrap();
        let rows = store
            .read_rows("csv_submissions", &RowQuery::new().eq("id", 1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["notes"], json!([1, 2]));
        assert!(dir.path().join("submitted-csvs").join("trace.csv").exists());
        assert!(
            store
                .signed_url("submitted-csvs", "trace.csv", Duration::from_secs(60))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_local_store_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let store = LocalStore::open(&root).await.unwrap();

        assert!(store.upload("b", "../evil.csv", vec![]).await.is_err());
        assert!(store.upload("b", "/etc/evil.csv", vec![]).await.is_err());

        let err = store
            .upload("../outside", "evil.csv", b"x".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
        assert!(!dir.path().join("outside").exists());

        assert!(store.insert_row("../escaped", json!({})).await.is_err());
        assert!(store.insert_row("nested/table", json!({})).await.is_err());
        assert!(store.read_rows("..", &RowQuery::new()).await.is_err());
        assert!(
            store
                .signed_url("../outside", "evil.csv", Duration::from_secs(60))
                .await
                .is_err()
        );
        assert!(!root.join("escaped.json").exists());
    }

    #[tokio::test]
    async fn test_local_store_table_writes_replace_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).await.unwrap();
        for name in ["a", "b", "c"] {
            store
                .insert_row("csv_submissions", json!({"name": name}))
                .await
                .unwrap();
        }
        store
            .update_row("csv_submissions", 2, json!({"significance": "shade"}))
            .await
            .unwrap();

        let entries: Vec<String> = std::fs::read_dir(dir.path().join("tables"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["csv_submissions.json"]);

        let content = std::fs::read_to_string(dir.path().join("tables/csv_submissions.json"))
            .unwrap();
        let rows: Vec<Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["significance"], "shade");
    }

    #[test]
    fn test_query_contains_filter() {
        let rows = vec![
            json!({"id": 1, "tags": ["shade", "dawn"]}),
            json!({"id": 2, "tags": ["sun"]}),
            json!({"id": 3, "tags": null}),
            json!({"id": 4, "tags": "shade"}),
        ];
        let matched = RowQuery::new().contains("tags", "shade").apply(&rows);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["id"], 1);
    }

    #[test]
    fn test_query_ordering_and_limit() {
        let rows = vec![
            json!({"id": 1, "t": "b"}),
            json!({"id": 2, "t": "a"}),
            json!({"id": 3}),
        ];
        let ordered = RowQuery::new()
            .order("t", SortOrder::Descending)
            .limit(2)
            .apply(&rows);
        assert_eq!(ordered[0]["id"], 1);
        assert_eq!(ordered[1]["id"], 2);
    }
}
