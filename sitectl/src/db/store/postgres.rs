//! PostgreSQL [`Store`] built on runtime sqlx queries.
//!
//! Rows are selected as `to_jsonb(t.*)` and written through `jsonb_populate_record`, so the JSON
//! values produced by serde are coerced to the column types by PostgreSQL itself. Filter values
//! are bound the same way: `t."col" = (jsonb_populate_record(NULL::"table", $1))."col"`.
//! Identifiers are never taken from user input; every column is checked against
//! [`TableName::columns`] before SQL is built.

use serde_json::Value;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, types::Json};
use tracing::{debug, instrument};

use super::{Condition, Filter, Query, Row, SortOrder, Store, TableName, WriteBatch, WriteOp};
use crate::db::errors::Result;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    #[instrument(skip(self, query), fields(table = %table), err)]
    async fn select(&self, table: TableName, query: &Query) -> Result<Vec<Row>> {
        query.check(table)?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT to_jsonb(t.*) FROM \"{table}\" AS t"));
        push_where(&mut builder, table, &query.filter);
        if !query.order.is_empty() {
            builder.push(" ORDER BY ");
            let mut separated = builder.separated(", ");
            for order in &query.order {
                let direction = match order.order {
                    SortOrder::Asc => "ASC NULLS LAST",
                    SortOrder::Desc => "DESC NULLS LAST",
                };
                separated.push(format!("t.\"{}\" {direction}", order.column));
            }
        }
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let rows = builder
            .build_query_scalar::<Json<Row>>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()), err)]
    async fn apply(&self, batch: WriteBatch) -> Result<Vec<Vec<Row>>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        for op in batch.ops() {
            op.check()?;
        }

        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            results.push(apply_op(&mut *tx, op).await?);
        }
        tx.commit().await?;
        debug!(ops = results.len(), "batch committed");
        Ok(results)
    }
}

async fn apply_op(conn: &mut PgConnection, op: WriteOp) -> Result<Vec<Row>> {
    match op {
        WriteOp::Insert { table, rows } => {
            let mut written = Vec::with_capacity(rows.len());
            for row in rows {
                written.push(insert_row(conn, table, row, None).await?);
            }
            Ok(written)
        }
        WriteOp::Upsert { table, rows, conflict } => {
            let mut written = Vec::with_capacity(rows.len());
            for row in rows {
                written.push(insert_row(conn, table, row, Some(conflict)).await?);
            }
            Ok(written)
        }
        WriteOp::Update { table, filter, patch } => {
            if patch.is_empty() {
                return Ok(Vec::new());
            }
            let mut builder = QueryBuilder::<Postgres>::new(format!("UPDATE \"{table}\" AS t SET "));
            {
                let mut separated = builder.separated(", ");
                for column in patch.keys() {
                    separated.push(format!("\"{column}\" = r.\"{column}\""));
                }
            }
            builder.push(format!(" FROM jsonb_populate_record(NULL::\"{table}\", "));
            builder.push_bind(Json(Value::Object(patch)));
            builder.push("::jsonb) AS r");
            push_where(&mut builder, table, &filter);
            builder.push(" RETURNING to_jsonb(t.*)");

            let rows = builder.build_query_scalar::<Json<Row>>().fetch_all(&mut *conn).await?;
            Ok(rows.into_iter().map(|Json(row)| row).collect())
        }
        WriteOp::Delete { table, filter } => {
            let mut builder = QueryBuilder::<Postgres>::new(format!("DELETE FROM \"{table}\" AS t"));
            push_where(&mut builder, table, &filter);
            builder.push(" RETURNING to_jsonb(t.*)");

            let rows = builder.build_query_scalar::<Json<Row>>().fetch_all(&mut *conn).await?;
            Ok(rows.into_iter().map(|Json(row)| row).collect())
        }
    }
}

/// Insert one row, listing only the columns it carries so column defaults still apply.
async fn insert_row(conn: &mut PgConnection, table: TableName, row: Row, conflict: Option<&'static str>) -> Result<Row> {
    let columns: Vec<String> = row.keys().cloned().collect();
    let column_list = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
    let select_list = columns.iter().map(|c| format!("r.\"{c}\"")).collect::<Vec<_>>().join(", ");

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "INSERT INTO \"{table}\" AS t ({column_list}) SELECT {select_list} FROM jsonb_populate_record(NULL::\"{table}\", "
    ));
    builder.push_bind(Json(Value::Object(row)));
    builder.push("::jsonb) AS r");

    if let Some(conflict) = conflict {
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| c.as_str() != "id" && c.as_str() != conflict)
            .map(|c| format!("\"{c}\" = EXCLUDED.\"{c}\""))
            .collect();
        if updates.is_empty() {
            builder.push(format!(" ON CONFLICT (\"{conflict}\") DO NOTHING"));
        } else {
            builder.push(format!(" ON CONFLICT (\"{conflict}\") DO UPDATE SET {}", updates.join(", ")));
        }
    }
    builder.push(" RETURNING to_jsonb(t.*)");

    let Json(row) = builder.build_query_scalar::<Json<Row>>().fetch_one(&mut *conn).await?;
    Ok(row)
}

fn push_where(builder: &mut QueryBuilder<'_, Postgres>, table: TableName, filter: &Filter) {
    if filter.conditions.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    for (i, condition) in filter.conditions.iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        match condition {
            Condition::Eq { column, value } if value.is_null() => {
                builder.push(format!("t.\"{column}\" IS NULL"));
            }
            Condition::Eq { column, value } => {
                builder.push(format!("t.\"{column}\" = (jsonb_populate_record(NULL::\"{table}\", "));
                builder.push_bind(Json(keyed(column, value.clone())));
                builder.push(format!("::jsonb)).\"{column}\""));
            }
            Condition::In { values, .. } if values.is_empty() => {
                builder.push("FALSE");
            }
            Condition::In { column, values } => {
                let records: Vec<Value> = values.iter().map(|v| keyed(column, v.clone())).collect();
                builder.push(format!(
                    "t.\"{column}\" IN (SELECT r.\"{column}\" FROM jsonb_populate_recordset(NULL::\"{table}\", "
                ));
                builder.push_bind(Json(Value::Array(records)));
                builder.push("::jsonb) AS r)");
            }
        }
    }
}

/// A one-column record for binding a filter value through `jsonb_populate_record`.
fn keyed(column: &str, value: Value) -> Value {
    let mut record = Row::new();
    record.insert(column.to_string(), value);
    Value::Object(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn faq(id: uuid::Uuid, question: &str, order_index: i32) -> Row {
        match json!({"id": id, "question": question, "answer": "a", "order_index": order_index}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn round_trips_rows_through_postgres(pool: PgPool) {
        crate::migrator().run(&pool).await.unwrap();
        let store = PgStore::new(pool);
        let (a, b) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4());

        store
            .apply(WriteBatch::new().insert(TableName::Faqs, vec![faq(b, "B", 1), faq(a, "A", 0)]))
            .await
            .unwrap();

        let rows = store
            .select(TableName::Faqs, &Query::new().order_by("order_index", SortOrder::Asc))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["question"], "A");

        let removed = store
            .apply(WriteBatch::new().delete(TableName::Faqs, Filter::all().is_in("id", [a.to_string()])))
            .await
            .unwrap();
        assert_eq!(removed[0].len(), 1);
    }
}
