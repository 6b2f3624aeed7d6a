//! Process-local [`Store`] used for development and tests.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::{instrument, trace};

use super::{Condition, Filter, Query, Row, SortOrder, Store, TableName, WriteBatch, WriteOp};
use crate::db::errors::{DbError, Result};

/// Tables held in memory behind a single lock. A batch is applied to a copy of the tables it
/// touches and swapped in only when every op succeeded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<TableName, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held for `table`.
    pub fn row_count(&self, table: TableName) -> usize {
        self.tables
            .read()
            .map(|tables| tables.get(&table).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    #[instrument(skip(self, query), fields(table = %table), err)]
    async fn select(&self, table: TableName, query: &Query) -> Result<Vec<Row>> {
        query.check(table)?;
        let tables = self.tables.read().map_err(|_| DbError::Other(anyhow!("memory store lock poisoned")))?;

        let mut rows: Vec<Row> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| matches(&query.filter, row)).cloned().collect())
            .unwrap_or_default();

        if !query.order.is_empty() {
            rows.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|o| {
                        let ordering = compare_values(a.get(o.column), b.get(o.column));
                        match o.order {
                            SortOrder::Asc => ordering,
                            SortOrder::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(0));
        }
        trace!(count = rows.len(), "selected rows");
        Ok(rows)
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()), err)]
    async fn apply(&self, batch: WriteBatch) -> Result<Vec<Vec<Row>>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        for op in batch.ops() {
            op.check()?;
        }

        let mut tables = self.tables.write().map_err(|_| DbError::Other(anyhow!("memory store lock poisoned")))?;

        let mut scratch: HashMap<TableName, Vec<Row>> = HashMap::new();
        for op in batch.ops() {
            let table = op.table();
            scratch
                .entry(table)
                .or_insert_with(|| tables.get(&table).cloned().unwrap_or_default());
        }

        let mut results = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            let table = op.table();
            let rows = scratch.get_mut(&table).ok_or_else(|| DbError::Other(anyhow!("missing scratch table")))?;
            results.push(apply_op(rows, op)?);
            check_unique(table, rows)?;
        }

        tables.extend(scratch);
        Ok(results)
    }
}

fn apply_op(rows: &mut Vec<Row>, op: WriteOp) -> Result<Vec<Row>> {
    match op {
        WriteOp::Insert { table, rows: new_rows } => {
            for row in &new_rows {
                require_id(table, row)?;
            }
            rows.extend(new_rows.iter().cloned());
            Ok(new_rows)
        }
        WriteOp::Update { filter, patch, .. } => {
            let mut touched = Vec::new();
            for row in rows.iter_mut().filter(|row| matches(&filter, row)) {
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
                touched.push(row.clone());
            }
            Ok(touched)
        }
        WriteOp::Upsert {
            table,
            rows: new_rows,
            conflict,
        } => {
            let mut touched = Vec::with_capacity(new_rows.len());
            for new_row in new_rows {
                let key = new_row.get(conflict).cloned().unwrap_or(Value::Null);
                let existing = if key.is_null() {
                    None
                } else {
                    rows.iter_mut().find(|row| row.get(conflict) == Some(&key))
                };
                match existing {
                    Some(row) => {
                        for (column, value) in new_row {
                            if column != "id" {
                                row.insert(column, value);
                            }
                        }
                        touched.push(row.clone());
                    }
                    None => {
                        require_id(table, &new_row)?;
                        rows.push(new_row.clone());
                        touched.push(new_row);
                    }
                }
            }
            Ok(touched)
        }
        WriteOp::Delete { filter, .. } => {
            let (removed, kept): (Vec<Row>, Vec<Row>) = rows.drain(..).partition(|row| matches(&filter, row));
            *rows = kept;
            Ok(removed)
        }
    }
}

fn require_id(table: TableName, row: &Row) -> Result<()> {
    match row.get("id") {
        Some(value) if !value.is_null() => Ok(()),
        _ => Err(DbError::CheckViolation {
            constraint: Some(format!("{table}_id_not_null")),
            table: Some(table.to_string()),
            message: format!("null value in column \"id\" of relation \"{table}\""),
        }),
    }
}

fn check_unique(table: TableName, rows: &[Row]) -> Result<()> {
    for column in std::iter::once(&"id").chain(table.unique_columns()) {
        let mut seen = HashSet::new();
        for value in rows.iter().filter_map(|row| row.get(*column)).filter(|v| !v.is_null()) {
            if !seen.insert(value.to_string()) {
                let conflicting = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Err(DbError::UniqueViolation {
                    constraint: Some(format!("{table}_{column}_key")),
                    table: Some(table.to_string()),
                    message: format!("duplicate key value violates unique constraint on {table}.{column}"),
                    conflicting_value: Some(conflicting),
                });
            }
        }
    }
    Ok(())
}

fn matches(filter: &Filter, row: &Row) -> bool {
    filter.conditions.iter().all(|condition| match condition {
        Condition::Eq { column, value } => row.get(*column).unwrap_or(&Value::Null) == value,
        Condition::In { column, values } => row.get(*column).is_some_and(|v| values.contains(v)),
    })
}

/// Order two column values the way the database would: nulls last, timestamps chronologically.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::<FixedOffset>::parse_from_rfc3339(x), DateTime::<FixedOffset>::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => Ordering::Equal,
    }
}
