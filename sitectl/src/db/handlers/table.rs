//! Typed access to one table of the [`Store`].

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{instrument, trace};
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    store::{Filter, Query, Row, SortOrder, Store, TableName, WriteBatch, WriteOp},
};

/// A typed row of a single table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: TableName;

    fn id(&self) -> Uuid;
}

/// A record whose table defines display order through `order_index`.
pub trait Ordered: Record {
    fn order_index(&self) -> i32;

    fn set_order_index(&mut self, order_index: i32);
}

/// Serialize a record into a store row.
pub fn to_row<T: Serialize>(table: TableName, record: &T) -> Result<Row> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(DbError::MalformedRow {
            table: table.to_string(),
            message: format!("expected an object, got {other}"),
        }),
    }
}

/// Deserialize a store row into a record.
pub fn from_row<T: DeserializeOwned>(table: TableName, row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DbError::MalformedRow {
        table: table.to_string(),
        message: e.to_string(),
    })
}

pub struct Table<'s, T> {
    store: &'s dyn Store,
    _record: PhantomData<fn() -> T>,
}

impl<'s, T: Record> Table<'s, T> {
    pub fn new(store: &'s dyn Store) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn rows_to_records(rows: Vec<Row>) -> Result<Vec<T>> {
        rows.into_iter().map(|row| from_row(T::TABLE, row)).collect()
    }

    #[instrument(skip(self, query), fields(table = %T::TABLE), err)]
    pub async fn select(&self, query: &Query) -> Result<Vec<T>> {
        let rows = self.store.select(T::TABLE, query).await?;
        Self::rows_to_records(rows)
    }

    /// Fetch at most one row. "No row" is `Ok(None)`, never an error.
    #[instrument(skip(self, query), fields(table = %T::TABLE), err)]
    pub async fn fetch_single(&self, query: Query) -> Result<Option<T>> {
        let mut rows = self.store.select(T::TABLE, &query.limit(1)).await?;
        match rows.pop() {
            Some(row) => Ok(Some(from_row(T::TABLE, row)?)),
            None => {
                trace!("no row found");
                Ok(None)
            }
        }
    }

    pub async fn insert(&self, record: &T) -> Result<T> {
        let batch = WriteBatch::new().insert(T::TABLE, vec![to_row(T::TABLE, record)?]);
        self.single_result(batch).await
    }

    /// Insert or update keyed on `conflict` (`id` or a unique column).
    pub async fn upsert(&self, records: &[T], conflict: &'static str) -> Result<Vec<T>> {
        let rows = records.iter().map(|r| to_row(T::TABLE, r)).collect::<Result<Vec<_>>>()?;
        let mut written = self.store.apply(WriteBatch::new().upsert(T::TABLE, rows, conflict)).await?;
        Self::rows_to_records(written.pop().unwrap_or_default())
    }

    /// Overwrite the given columns of the row with `id`.
    pub async fn update_fields(&self, id: Uuid, patch: Row) -> Result<Option<T>> {
        let batch = WriteBatch::new().update(T::TABLE, Filter::all().eq("id", id.to_string()), patch);
        let mut written = self.store.apply(batch).await?;
        let mut rows = written.pop().unwrap_or_default();
        rows.pop().map(|row| from_row(T::TABLE, row)).transpose()
    }

    pub async fn delete_where(&self, filter: Filter) -> Result<Vec<T>> {
        let mut written = self.store.apply(WriteBatch::new().delete(T::TABLE, filter)).await?;
        Self::rows_to_records(written.pop().unwrap_or_default())
    }

    /// An upsert-by-id op for `records`, for callers building a larger batch.
    pub fn upsert_op(records: &[T]) -> Result<WriteOp> {
        Ok(WriteOp::Upsert {
            table: T::TABLE,
            rows: records.iter().map(|r| to_row(T::TABLE, r)).collect::<Result<Vec<_>>>()?,
            conflict: "id",
        })
    }

    pub async fn apply(&self, batch: WriteBatch) -> Result<Vec<Vec<Row>>> {
        self.store.apply(batch).await
    }

    async fn single_result(&self, batch: WriteBatch) -> Result<T> {
        let mut written = self.store.apply(batch).await?;
        let row = written
            .pop()
            .and_then(|mut rows| rows.pop())
            .ok_or(DbError::NotFound)?;
        from_row(T::TABLE, row)
    }
}

impl<'s, T: Ordered> Table<'s, T> {
    /// Every row in display order.
    pub async fn list_ordered(&self) -> Result<Vec<T>> {
        self.select(&Query::new().order_by("order_index", SortOrder::Asc)).await
    }

    /// One past the highest `order_index`, or 0 for an empty table.
    pub async fn next_order_index(&self) -> Result<i32> {
        let last = self
            .fetch_single(Query::new().order_by("order_index", SortOrder::Desc))
            .await?;
        Ok(last.map_or(0, |item| item.order_index() + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::content::Faq;
    use crate::db::store::MemoryStore;

    fn faq(question: &str, order_index: i32) -> Faq {
        Faq {
            id: Uuid::new_v4(),
            question: question.to_string(),
            answer: format!("{question} answer"),
            order_index,
        }
    }

    #[tokio::test]
    async fn insert_update_delete_round() {
        let store = MemoryStore::new();
        let faqs = Table::<Faq>::new(&store);
        let by_id = |id: Uuid| Query::new().eq("id", id.to_string());

        let created = faqs.insert(&faq("What?", 0)).await.unwrap();
        assert_eq!(faqs.fetch_single(by_id(created.id)).await.unwrap(), Some(created.clone()));

        let mut patch = Row::new();
        patch.insert("answer".into(), "Because.".into());
        let updated = faqs.update_fields(created.id, patch.clone()).await.unwrap().unwrap();
        assert_eq!(updated.answer, "Because.");
        assert_eq!(updated.order_index, 0);

        assert_eq!(faqs.delete_where(Filter::all().eq("id", created.id.to_string())).await.unwrap().len(), 1);
        assert_eq!(faqs.fetch_single(by_id(created.id)).await.unwrap(), None);
        assert_eq!(faqs.update_fields(created.id, patch).await.unwrap(), None);
    }

    #[tokio::test]
    async fn next_order_index_follows_the_maximum() {
        let store = MemoryStore::new();
        let faqs = Table::<Faq>::new(&store);
        assert_eq!(faqs.next_order_index().await.unwrap(), 0);

        faqs.insert(&faq("A", 0)).await.unwrap();
        faqs.insert(&faq("B", 7)).await.unwrap();
        assert_eq!(faqs.next_order_index().await.unwrap(), 8);
    }
}
