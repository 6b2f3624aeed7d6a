//! Create, edit, delete and reorder for item-at-a-time collections.

use serde::de::DeserializeOwned;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::models::content::{
    AccordionInput, FaqInput, LogoInput, PainPointInput, ProgressStageInput, ServiceInput,
};
use crate::content::reorder::{Direction, OrderedList};
use crate::db::handlers::{Ordered, Table, table::to_row};
use crate::db::models::content::{AccordionItem, Faq, LogoItem, PainPoint, ProgressStage, Service};
use crate::db::store::{Filter, Query, Store, WriteBatch};
use crate::errors::{Error, Result};
use crate::types::abbrev_uuid;
use crate::validation::Validate;

/// An orderable table edited one item at a time.
pub trait Collection: Ordered {
    type Input: Validate + DeserializeOwned + Send + Sync + 'static;

    /// Human-readable name used in error messages.
    const RESOURCE: &'static str;

    fn from_input(id: Uuid, order_index: i32, input: Self::Input) -> Self;

    /// Position asked for by the input itself, if the collection allows it.
    fn requested_order_index(_input: &Self::Input) -> Option<i32> {
        None
    }
}

pub struct Collections<'s, T> {
    table: Table<'s, T>,
}

impl<'s, T: Collection> Collections<'s, T> {
    pub fn new(store: &'s dyn Store) -> Self {
        Self { table: Table::new(store) }
    }

    fn not_found(id: Uuid) -> Error {
        Error::NotFound {
            resource: T::RESOURCE.to_string(),
            id: id.to_string(),
        }
    }

    /// Reject a requested position another item already holds.
    async fn ensure_position_free(&self, order_index: i32, except: Option<Uuid>) -> Result<()> {
        let holders = self.table.select(&Query::new().eq("order_index", order_index)).await?;
        if holders.iter().any(|item| Some(item.id()) != except) {
            return Err(Error::Conflict {
                message: format!("Position {order_index} is already taken in {}", T::RESOURCE),
            });
        }
        Ok(())
    }

    /// Every item in display order.
    pub async fn list(&self) -> Result<Vec<T>> {
        Ok(self.table.list_ordered().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<T> {
        self.table
            .fetch_single(Query::new().eq("id", id.to_string()))
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Validate and append a new item after the current last one.
    #[instrument(skip(self, input), fields(resource = T::RESOURCE), err)]
    pub async fn create(&self, input: T::Input) -> Result<T> {
        input.validate()?;
        let order_index = match T::requested_order_index(&input) {
            Some(index) => {
                self.ensure_position_free(index, None).await?;
                index
            }
            None => self.table.next_order_index().await?,
        };
        let item = self.table.insert(&T::from_input(Uuid::new_v4(), order_index, input)).await?;
        info!(id = %abbrev_uuid(&item.id()), order_index, "created item");
        Ok(item)
    }

    /// Validate and overwrite an item's content. Its position is kept unless the input asks
    /// for another one.
    #[instrument(skip(self, input), fields(resource = T::RESOURCE, id = %abbrev_uuid(&id)), err)]
    pub async fn update(&self, id: Uuid, input: T::Input) -> Result<T> {
        input.validate()?;
        let existing = self.get(id).await?;
        let order_index = match T::requested_order_index(&input) {
            Some(index) if index != existing.order_index() => {
                self.ensure_position_free(index, Some(id)).await?;
                index
            }
            _ => existing.order_index(),
        };
        let mut patch = to_row(T::TABLE, &T::from_input(id, order_index, input))?;
        patch.remove("id");
        self.table
            .update_fields(id, patch)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Remove an item. The positions of the others are left as they are.
    #[instrument(skip(self), fields(resource = T::RESOURCE, id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self.table.delete_where(Filter::all().eq("id", id.to_string())).await?;
        if removed.is_empty() {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    /// Move an item one position and return the collection in its new order.
    #[instrument(skip(self), fields(resource = T::RESOURCE, id = %abbrev_uuid(&id)), err)]
    pub async fn move_item(&self, id: Uuid, direction: Direction) -> Result<Vec<T>> {
        let mut list = OrderedList::new(self.list().await?);
        list.move_item(id, direction, |pair| async move {
            let mut batch = WriteBatch::new();
            batch.push(Table::<T>::upsert_op(&pair)?);
            self.table.apply(batch).await?;
            Ok::<(), Error>(())
        })
        .await?;
        Ok(list.into_items())
    }
}

impl Collection for Faq {
    type Input = FaqInput;
    const RESOURCE: &'static str = "FAQ";

    fn from_input(id: Uuid, order_index: i32, input: FaqInput) -> Self {
        Self {
            id,
            question: input.question.trim().to_string(),
            answer: input.answer,
            order_index,
        }
    }
}

impl Collection for LogoItem {
    type Input = LogoInput;
    const RESOURCE: &'static str = "Logo";

    fn from_input(id: Uuid, order_index: i32, input: LogoInput) -> Self {
        Self {
            id,
            image_url: input.image_url.trim().to_string(),
            alt_text: input.alt_text.trim().to_string(),
            order_index,
        }
    }
}

impl Collection for PainPoint {
    type Input = PainPointInput;
    const RESOURCE: &'static str = "Pain point";

    fn from_input(id: Uuid, order_index: i32, input: PainPointInput) -> Self {
        Self {
            id,
            icon: input.icon.trim().to_string(),
            title: input.title.trim().to_string(),
            description: input.description,
            order_index,
        }
    }
}

impl Collection for ProgressStage {
    type Input = ProgressStageInput;
    const RESOURCE: &'static str = "Progress stage";

    fn from_input(id: Uuid, order_index: i32, input: ProgressStageInput) -> Self {
        Self {
            id,
            title: input.title.trim().to_string(),
            description: input.description,
            order_index,
        }
    }
}

impl Collection for Service {
    type Input = ServiceInput;
    const RESOURCE: &'static str = "Service";

    fn from_input(id: Uuid, order_index: i32, input: ServiceInput) -> Self {
        Self {
            id,
            slug: input.effective_slug(),
            title: input.title.trim().to_string(),
            description: input.description,
            image_url: input.image_url.trim().to_string(),
            page_content: input.page_content,
            order_index,
        }
    }
}

impl Collection for AccordionItem {
    type Input = AccordionInput;
    const RESOURCE: &'static str = "Accordion item";

    fn from_input(id: Uuid, order_index: i32, input: AccordionInput) -> Self {
        Self {
            id,
            heading: input.heading.trim().to_string(),
            description: input.description,
            image_url: input.image_url.trim().to_string(),
            order_index,
        }
    }

    fn requested_order_index(input: &AccordionInput) -> Option<i32> {
        input.order_index
    }
}

/// Look up a service by its slug.
pub async fn service_by_slug(store: &dyn Store, slug: &str) -> Result<Option<Service>> {
    Ok(Table::<Service>::new(store)
        .fetch_single(Query::new().eq("slug", slug.to_string()))
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::store::{MemoryStore, TableName};
    use crate::test_utils::CountingStore;

    fn faq(question: &str) -> FaqInput {
        FaqInput {
            question: question.into(),
            answer: format!("{question} answered"),
        }
    }

    fn order(items: &[Faq]) -> Vec<(&str, i32)> {
        items.iter().map(|f| (f.question.as_str(), f.order_index)).collect()
    }

    #[tokio::test]
    async fn new_items_are_appended() {
        let store = MemoryStore::new();
        let faqs = Collections::<Faq>::new(&store);
        for q in ["A", "B", "C"] {
            faqs.create(faq(q)).await.unwrap();
        }
        assert_eq!(order(&faqs.list().await.unwrap()), vec![("A", 0), ("B", 1), ("C", 2)]);
    }

    #[tokio::test]
    async fn moves_persist_the_swapped_pair() {
        let store = MemoryStore::new();
        let faqs = Collections::<Faq>::new(&store);
        faqs.create(faq("A")).await.unwrap();
        let b = faqs.create(faq("B")).await.unwrap();
        let c = faqs.create(faq("C")).await.unwrap();

        let after = faqs.move_item(b.id, Direction::Up).await.unwrap();
        assert_eq!(order(&after), vec![("B", 0), ("A", 1), ("C", 2)]);

        faqs.move_item(c.id, Direction::Up).await.unwrap();
        assert_eq!(order(&faqs.list().await.unwrap()), vec![("B", 0), ("C", 1), ("A", 2)]);
    }

    #[tokio::test]
    async fn boundary_move_issues_no_write() {
        let store = CountingStore::default();
        let faqs = Collections::<Faq>::new(&store);
        let a = faqs.create(faq("A")).await.unwrap();
        let b = faqs.create(faq("B")).await.unwrap();
        let writes = store.apply_calls();

        faqs.move_item(a.id, Direction::Up).await.unwrap();
        faqs.move_item(b.id, Direction::Down).await.unwrap();
        assert_eq!(store.apply_calls(), writes);

        faqs.move_item(b.id, Direction::Up).await.unwrap();
        assert_eq!(store.apply_calls(), writes + 1);
    }

    #[tokio::test]
    async fn deletes_leave_holes() {
        let store = MemoryStore::new();
        let faqs = Collections::<Faq>::new(&store);
        faqs.create(faq("A")).await.unwrap();
        let b = faqs.create(faq("B")).await.unwrap();
        faqs.create(faq("C")).await.unwrap();

        faqs.delete(b.id).await.unwrap();
        assert_eq!(order(&faqs.list().await.unwrap()), vec![("A", 0), ("C", 2)]);
        assert_eq!(faqs.create(faq("D")).await.unwrap().order_index, 3);
        assert!(matches!(faqs.delete(b.id).await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_keeps_position() {
        let store = MemoryStore::new();
        let faqs = Collections::<Faq>::new(&store);
        faqs.create(faq("A")).await.unwrap();
        let b = faqs.create(faq("B")).await.unwrap();

        let updated = faqs.update(b.id, faq("B2")).await.unwrap();
        assert_eq!((updated.question.as_str(), updated.order_index), ("B2", 1));
        assert!(matches!(
            faqs.update(Uuid::new_v4(), faq("X")).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_input_is_not_stored() {
        let store = MemoryStore::new();
        let faqs = Collections::<Faq>::new(&store);
        assert!(matches!(faqs.create(faq("  ")).await, Err(Error::Validation { .. })));
        assert_eq!(store.row_count(TableName::Faqs), 0);
    }

    #[tokio::test]
    async fn service_slugs_are_unique() {
        let store = MemoryStore::new();
        let services = Collections::<Service>::new(&store);
        let input = |title: &str| ServiceInput {
            title: title.into(),
            description: "Summary".into(),
            image_url: "https://example.com/s.png".into(),
            page_content: "<p>Body</p>".into(),
            ..Default::default()
        };

        let created = services.create(input("Web Design")).await.unwrap();
        assert_eq!(created.slug, "web-design");
        assert_eq!(
            service_by_slug(&store, "web-design").await.unwrap().map(|s| s.id),
            Some(created.id)
        );

        let err = services.create(input("Web  Design")).await.unwrap_err();
        assert!(matches!(err, Error::Database(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn accordion_honours_requested_position() {
        let store = MemoryStore::new();
        let accordion = Collections::<AccordionItem>::new(&store);
        let input = |heading: &str, order_index| AccordionInput {
            heading: heading.into(),
            description: "Body".into(),
            image_url: "https://example.com/a.png".into(),
            order_index,
        };

        assert_eq!(accordion.create(input("First", None)).await.unwrap().order_index, 0);
        assert_eq!(accordion.create(input("Tenth", Some(10))).await.unwrap().order_index, 10);
        assert_eq!(accordion.create(input("Next", None)).await.unwrap().order_index, 11);
    }

    #[tokio::test]
    async fn accordion_rejects_a_taken_position() {
        let store = MemoryStore::new();
        let accordion = Collections::<AccordionItem>::new(&store);
        let input = |heading: &str, order_index| AccordionInput {
            heading: heading.into(),
            description: "Body".into(),
            image_url: "https://example.com/a.png".into(),
            order_index,
        };
        let first = accordion.create(input("First", None)).await.unwrap();
        let second = accordion.create(input("Second", None)).await.unwrap();

        let err = accordion.create(input("Clash", Some(0))).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(store.row_count(TableName::AccordionContent), 2);

        let err = accordion.update(second.id, input("Second", Some(0))).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        // Re-sending an item's own position is not a clash.
        let kept = accordion.update(first.id, input("First again", Some(0))).await.unwrap();
        assert_eq!(kept.order_index, 0);

        let moved = accordion.update(second.id, input("Second", Some(5))).await.unwrap();
        assert_eq!(moved.order_index, 5);
        let order: Vec<i32> = accordion.list().await.unwrap().iter().map(|a| a.order_index).collect();
        assert_eq!(order, vec![0, 5]);
    }
}
