//! Replace-on-save for collections edited as a whole list (clients, pricing plans, reviews).
//!
//! The edited list is filtered, renumbered `0..N` in list order and diffed against the stored
//! rows. Removed rows are deleted and every kept row is upserted by id in one atomic batch, so
//! the table never passes through an empty state and a failed save leaves it untouched.

use std::collections::HashSet;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::models::content::{ClientDraft, PricingPlanDraft, REVIEW_TEXT_MAX_CHARS, ReviewDraft};
use crate::db::handlers::{Ordered, Table};
use crate::db::models::content::{Client, PricingPlan, Review};
use crate::db::store::{Filter, Store, WriteBatch};
use crate::errors::Result;
use crate::validation::{is_blank, non_blank};

/// A collection saved through [`replace_all`].
pub trait BulkCollection: Ordered {
    type Draft: Send + Sync;

    fn draft_id(draft: &Self::Draft) -> Option<Uuid>;

    /// Incomplete drafts are dropped rather than rejected.
    fn is_complete(draft: &Self::Draft) -> bool;

    fn from_draft(id: Uuid, order_index: i32, draft: Self::Draft) -> Self;
}

/// The rows a save keeps, in display order, and the ids it removes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacePlan<T> {
    pub keep: Vec<T>,
    pub removed: Vec<Uuid>,
}

/// Diff `drafts` against `existing`.
///
/// A draft keeps its id only if that id is stored and not already claimed by an earlier draft;
/// anything else is saved as a new row.
pub fn plan_replace<T: BulkCollection>(existing: &[T], drafts: Vec<T::Draft>) -> ReplacePlan<T> {
    let stored: HashSet<Uuid> = existing.iter().map(|row| row.id()).collect();
    let mut claimed = HashSet::new();

    let keep: Vec<T> = drafts
        .into_iter()
        .filter(T::is_complete)
        .enumerate()
        .map(|(position, draft)| {
            let id = T::draft_id(&draft)
                .filter(|id| stored.contains(id) && claimed.insert(*id))
                .unwrap_or_else(Uuid::new_v4);
            T::from_draft(id, position as i32, draft)
        })
        .collect();

    let kept: HashSet<Uuid> = keep.iter().map(|row| row.id()).collect();
    let removed = existing
        .iter()
        .map(|row| row.id())
        .filter(|id| !kept.contains(id))
        .collect();

    ReplacePlan { keep, removed }
}

impl<T: BulkCollection> ReplacePlan<T> {
    pub fn into_batch(&self) -> Result<WriteBatch> {
        let mut batch = WriteBatch::new();
        if !self.removed.is_empty() {
            batch = batch.delete(
                T::TABLE,
                Filter::all().is_in("id", self.removed.iter().map(|id| id.to_string())),
            );
        }
        if !self.keep.is_empty() {
            batch.push(Table::<T>::upsert_op(&self.keep)?);
        }
        Ok(batch)
    }
}

/// Make the table hold exactly the complete drafts, in order. Returns the saved rows.
#[instrument(skip(store, drafts), fields(table = %T::TABLE), err)]
pub async fn replace_all<T: BulkCollection>(store: &dyn Store, drafts: Vec<T::Draft>) -> Result<Vec<T>> {
    let table = Table::<T>::new(store);
    let existing = table.list_ordered().await?;
    let plan = plan_replace(&existing, drafts);
    let batch = plan.into_batch()?;
    if !batch.is_empty() {
        table.apply(batch).await?;
    }
    info!(kept = plan.keep.len(), removed = plan.removed.len(), "replaced collection");
    Ok(plan.keep)
}

impl BulkCollection for Client {
    type Draft = ClientDraft;

    fn draft_id(draft: &ClientDraft) -> Option<Uuid> {
        draft.id
    }

    fn is_complete(draft: &ClientDraft) -> bool {
        !is_blank(&draft.name) && !is_blank(&draft.logo_url)
    }

    fn from_draft(id: Uuid, order_index: i32, draft: ClientDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            logo_url: draft.logo_url.trim().to_string(),
            description: draft.description,
            order_index,
        }
    }
}

impl BulkCollection for PricingPlan {
    type Draft = PricingPlanDraft;

    fn draft_id(draft: &PricingPlanDraft) -> Option<Uuid> {
        draft.id
    }

    fn is_complete(draft: &PricingPlanDraft) -> bool {
        !is_blank(&draft.name) && !is_blank(&draft.price)
    }

    fn from_draft(id: Uuid, order_index: i32, draft: PricingPlanDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            price: draft.price.trim().to_string(),
            description: draft.description,
            icon: draft.icon,
            is_featured: draft.is_featured,
            choose_plan_link: non_blank(draft.choose_plan_link),
            order_index,
        }
    }
}

impl BulkCollection for Review {
    type Draft = ReviewDraft;

    fn draft_id(draft: &ReviewDraft) -> Option<Uuid> {
        draft.id
    }

    fn is_complete(draft: &ReviewDraft) -> bool {
        !is_blank(&draft.customer_name)
            && !is_blank(&draft.review_text)
            && draft.review_text.chars().count() <= REVIEW_TEXT_MAX_CHARS
    }

    fn from_draft(id: Uuid, order_index: i32, draft: ReviewDraft) -> Self {
        Self {
            id,
            customer_name: draft.customer_name.trim().to_string(),
            designation: draft.designation,
            company_name: draft.company_name,
            review_text: draft.review_text,
            order_index,
        }
    }
}
