//! # Document Store
//!
//! The document-store contract on top of one SQLite table.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DocumentStore                                      │
//! │                                                                         │
//! │  get(collection, id)             → Option<T>                            │
//! │  query(collection, filters)      → Vec<T>     (json_extract(...) = ?)   │
//! │  add(collection, doc)            → new id     (uuid v4)                 │
//! │  set(collection, id, doc)        → upsert                               │
//! │  update_merge(collection, id, p) → json_patch, NotFound if missing      │
//! │  delete(collection, id)          → no-op if missing                     │
//! │                                                                         │
//! │  increment(collection, id, f, n) → atomic numeric add, returns new      │
//! │  append(collection, id, f, v)    → atomic array push                    │
//! │  update_where(.., cond, patch)   → compare-and-set, returns applied?    │
//! │  batch()                         → WriteBatch, all-or-nothing commit    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Semantics
//! `update_merge` follows JSON merge patch: nested objects merge, arrays are
//! replaced whole, and a `null` value removes the field. Appending to arrays
//! goes through `append`, never through a merge.

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Field Values & Filters
// =============================================================================

/// A scalar compared against a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Equality condition on a (possibly dotted) document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: FieldValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Filter {
            field: field.into(),
            value: value.into(),
        }
    }

    /// SQL fragment for this filter; `Null` compares with `IS NULL`.
    fn clause(&self) -> &'static str {
        match self.value {
            FieldValue::Null => "json_extract(data, ?) IS NULL",
            _ => "json_extract(data, ?) = ?",
        }
    }
}

/// Turns `supplier.name` into `$.supplier.name`.
fn json_path(field: &str) -> DbResult<String> {
    let valid = !field.is_empty()
        && field
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));

    if !valid {
        return Err(DbError::InvalidField(field.to_string()));
    }
    Ok(format!("$.{}", field))
}

fn now_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serializes a document and stamps its id into it.
fn to_document<T: Serialize>(id: &str, doc: &T) -> DbResult<Value> {
    let mut value = serde_json::to_value(doc)?;
    match value.as_object_mut() {
        Some(map) => {
            map.insert("id".to_string(), Value::String(id.to_string()));
            Ok(value)
        }
        None => Err(DbError::Serialization(
            "document must serialize to a JSON object".to_string(),
        )),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    #[allow(dead_code)]
    id: String,
    data: String,
}

impl DocumentRow {
    fn decode<T: DeserializeOwned>(&self) -> DbResult<T> {
        Ok(serde_json::from_str(&self.data)?)
    }
}

// =============================================================================
// SQL shared by direct calls and batches
// =============================================================================

const INSERT_SQL: &str = "INSERT INTO documents (collection, id, data, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?)";

const UPSERT_SQL: &str = "INSERT INTO documents (collection, id, data, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?) \
     ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at";

const MERGE_SQL: &str = "UPDATE documents SET data = json_patch(data, ?), updated_at = ? \
     WHERE collection = ? AND id = ?";

const INCREMENT_SQL: &str = "UPDATE documents \
     SET data = json_set(data, ?, COALESCE(json_extract(data, ?), 0) + ?), updated_at = ? \
     WHERE collection = ? AND id = ? \
     RETURNING json_extract(data, ?)";

const APPEND_SQL: &str = "UPDATE documents \
     SET data = json_insert(json_set(data, ?, json(COALESCE(json_extract(data, ?), '[]'))), ? || '[#]', json(?)), \
         updated_at = ? \
     WHERE collection = ? AND id = ?";

const DELETE_SQL: &str = "DELETE FROM documents WHERE collection = ? AND id = ?";

async fn insert_in<'e, E>(executor: E, collection: &str, id: &str, data: &Value) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = now_string();
    sqlx::query(INSERT_SQL)
        .bind(collection.to_string())
        .bind(id.to_string())
        .bind(data.to_string())
        .bind(now.clone())
        .bind(now)
        .execute(executor)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate(collection, id),
            other => other,
        })?;
    Ok(())
}

async fn upsert_in<'e, E>(executor: E, collection: &str, id: &str, data: &Value) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = now_string();
    sqlx::query(UPSERT_SQL)
        .bind(collection.to_string())
        .bind(id.to_string())
        .bind(data.to_string())
        .bind(now.clone())
        .bind(now)
        .execute(executor)
        .await?;
    Ok(())
}

async fn merge_in<'e, E>(executor: E, collection: &str, id: &str, patch: &Value) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(MERGE_SQL)
        .bind(patch.to_string())
        .bind(now_string())
        .bind(collection.to_string())
        .bind(id.to_string())
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(collection, id));
    }
    Ok(())
}

async fn increment_in<'e, E>(
    executor: E,
    collection: &str,
    id: &str,
    field: &str,
    by: i64,
) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let path = json_path(field)?;
    let value: Option<i64> = sqlx::query_scalar(INCREMENT_SQL)
        .bind(path.clone())
        .bind(path.clone())
        .bind(by)
        .bind(now_string())
        .bind(collection.to_string())
        .bind(id.to_string())
        .bind(path)
        .fetch_optional(executor)
        .await?;

    value.ok_or_else(|| DbError::not_found(collection, id))
}

async fn append_in<'e, E>(
    executor: E,
    collection: &str,
    id: &str,
    field: &str,
    value: &Value,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let path = json_path(field)?;
    let result = sqlx::query(APPEND_SQL)
        .bind(path.clone())
        .bind(path.clone())
        .bind(path)
        .bind(value.to_string())
        .bind(now_string())
        .bind(collection.to_string())
        .bind(id.to_string())
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(collection, id));
    }
    Ok(())
}

async fn merge_where_in<'e, E>(
    executor: E,
    collection: &str,
    id: &str,
    condition: &Filter,
    patch: &Value,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} AND {}", MERGE_SQL, condition.clause());
    let query = sqlx::query(&sql)
        .bind(patch.to_string())
        .bind(now_string())
        .bind(collection.to_string())
        .bind(id.to_string())
        .bind(json_path(&condition.field)?);

    let query = match &condition.value {
        FieldValue::Text(s) => query.bind(s.clone()),
        FieldValue::Int(i) => query.bind(*i),
        FieldValue::Bool(b) => query.bind(i64::from(*b)),
        FieldValue::Null => query,
    };

    let result = query.execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

async fn delete_in<'e, E>(executor: E, collection: &str, id: &str) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(DELETE_SQL)
        .bind(collection.to_string())
        .bind(id.to_string())
        .execute(executor)
        .await?;
    Ok(())
}

// =============================================================================
// Document Store
// =============================================================================

/// Handle to the document table.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetches one document.
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> DbResult<Option<T>> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.decode()).transpose()
    }

    /// Fetches one document, failing with `NotFound { entity, id }`.
    pub async fn get_required<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        entity: &str,
    ) -> DbResult<T> {
        self.get(collection, id)
            .await?
            .ok_or_else(|| DbError::not_found(entity, id))
    }

    /// Returns every document in `collection` matching all `filters`,
    /// oldest first.
    pub async fn query<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> DbResult<Vec<T>> {
        let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?");
        for filter in filters {
            sql.push_str(" AND ");
            sql.push_str(filter.clause());
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut query = sqlx::query_as::<_, DocumentRow>(&sql).bind(collection.to_string());
        for filter in filters {
            query = query.bind(json_path(&filter.field)?);
            query = match &filter.value {
                FieldValue::Text(s) => query.bind(s.clone()),
                FieldValue::Int(i) => query.bind(*i),
                FieldValue::Bool(b) => query.bind(i64::from(*b)),
                FieldValue::Null => query,
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        debug!(collection, count = rows.len(), "Query");
        rows.iter().map(DocumentRow::decode).collect()
    }

    /// Inserts a document under a fresh id and returns the id.
    pub async fn add<T: Serialize>(&self, collection: &str, doc: &T) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        insert_in(&self.pool, collection, &id, &to_document(&id, doc)?).await?;
        Ok(id)
    }

    /// Inserts a document under `id`, failing if it already exists.
    pub async fn create<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> DbResult<()> {
        insert_in(&self.pool, collection, id, &to_document(id, doc)?).await
    }

    /// Writes a whole document, replacing any existing one.
    pub async fn set<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> DbResult<()> {
        upsert_in(&self.pool, collection, id, &to_document(id, doc)?).await
    }

    /// Merges `patch` into an existing document.
    pub async fn update_merge(&self, collection: &str, id: &str, patch: &Value) -> DbResult<()> {
        merge_in(&self.pool, collection, id, patch).await
    }

    /// Merges `patch` only while `condition` holds. Returns whether it did.
    ///
    /// The check and the write are one statement, so two callers racing on
    /// the same condition cannot both win.
    pub async fn update_where(
        &self,
        collection: &str,
        id: &str,
        condition: &Filter,
        patch: &Value,
    ) -> DbResult<bool> {
        merge_where_in(&self.pool, collection, id, condition, patch).await
    }

    /// Adds `by` to a numeric field (missing counts as 0); returns the new value.
    pub async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> DbResult<i64> {
        increment_in(&self.pool, collection, id, field, by).await
    }

    /// Pushes `value` onto an array field (created if missing).
    pub async fn append(&self, collection: &str, id: &str, field: &str, value: &Value) -> DbResult<()> {
        append_in(&self.pool, collection, id, field, value).await
    }

    /// Deletes a document. Missing documents are not an error.
    pub async fn delete(&self, collection: &str, id: &str) -> DbResult<()> {
        delete_in(&self.pool, collection, id).await
    }

    /// Starts an atomic write batch.
    pub fn batch(&self) -> WriteBatch {
        WriteBatch {
            pool: self.pool.clone(),
            ops: Vec::new(),
        }
    }
}

// =============================================================================
// Write Batch
// =============================================================================

/// One write inside a batch.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Set { collection: String, id: String, data: Value },
    Create { collection: String, id: String, data: Value },
    Merge { collection: String, id: String, patch: Value },
    MergeWhere { collection: String, id: String, condition: Filter, patch: Value },
    Increment { collection: String, id: String, field: String, by: i64 },
    Append { collection: String, id: String, field: String, value: Value },
    Delete { collection: String, id: String },
}

/// A group of writes committed in one transaction.
///
/// ## Failure
/// Any failing op (including `Merge`/`Increment`/`Append` on a missing
/// document, `Create` on an existing one, or `MergeWhere` whose condition
/// does not hold) rolls back every op.
///
/// ## Example
/// ```rust,ignore
/// let mut batch = db.documents().batch();
/// batch.increment(&products, &product_id, "stock", 10);
/// batch.create(&movements, &movement_id, &movement)?;
/// batch.commit().await?;
/// ```
#[derive(Debug)]
pub struct WriteBatch {
    pool: SqlitePool,
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn set<T: Serialize>(&mut self, collection: &str, id: &str, doc: &T) -> DbResult<&mut Self> {
        self.ops.push(BatchOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data: to_document(id, doc)?,
        });
        Ok(self)
    }

    pub fn create<T: Serialize>(&mut self, collection: &str, id: &str, doc: &T) -> DbResult<&mut Self> {
        self.ops.push(BatchOp::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            data: to_document(id, doc)?,
        });
        Ok(self)
    }

    pub fn merge(&mut self, collection: &str, id: &str, patch: Value) -> &mut Self {
        self.ops.push(BatchOp::Merge {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        });
        self
    }

    /// Merges `patch` if `condition` holds at commit time; otherwise the
    /// whole batch fails with `PreconditionFailed`.
    pub fn merge_where(&mut self, collection: &str, id: &str, condition: Filter, patch: Value) -> &mut Self {
        self.ops.push(BatchOp::MergeWhere {
            collection: collection.to_string(),
            id: id.to_string(),
            condition,
            patch,
        });
        self
    }

    pub fn increment(&mut self, collection: &str, id: &str, field: &str, by: i64) -> &mut Self {
        self.ops.push(BatchOp::Increment {
            collection: collection.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            by,
        });
        self
    }

    pub fn append(&mut self, collection: &str, id: &str, field: &str, value: Value) -> &mut Self {
        self.ops.push(BatchOp::Append {
            collection: collection.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            value,
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(BatchOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every op in order inside one transaction.
    pub async fn commit(self) -> DbResult<()> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for op in &self.ops {
            match op {
                BatchOp::Set { collection, id, data } => {
                    upsert_in(&mut *tx, collection, id, data).await?
                }
                BatchOp::Create { collection, id, data } => {
                    insert_in(&mut *tx, collection, id, data).await?
                }
                BatchOp::Merge { collection, id, patch } => {
                    merge_in(&mut *tx, collection, id, patch).await?
                }
                BatchOp::MergeWhere {
                    collection,
                    id,
                    condition,
                    patch,
                } => {
                    if !merge_where_in(&mut *tx, collection, id, condition, patch).await? {
                        return Err(DbError::PreconditionFailed {
                            collection: collection.clone(),
                            id: id.clone(),
                        });
                    }
                }
                BatchOp::Increment {
                    collection,
                    id,
                    field,
                    by,
                } => {
                    increment_in(&mut *tx, collection, id, field, *by).await?;
                }
                BatchOp::Append {
                    collection,
                    id,
                    field,
                    value,
                } => append_in(&mut *tx, collection, id, field, value).await?,
                BatchOp::Delete { collection, id } => delete_in(&mut *tx, collection, id).await?,
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(ops = self.ops.len(), "Write batch committed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
