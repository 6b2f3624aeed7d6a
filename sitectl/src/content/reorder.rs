//! Moving an item of an ordered collection one position up or down.
//!
//! A move swaps the `order_index` values of the item and its neighbour, never their content.
//! Exactly those two rows are persisted; a move at either end of the list writes nothing.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::handlers::Ordered;
use crate::errors::{Error, Result};
use crate::types::abbrev_uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// The two rows a move rewrites, carrying their swapped `order_index` values.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan<T> {
    pub moved: T,
    pub neighbour: T,
}

impl<T: Clone> MovePlan<T> {
    pub fn rows(&self) -> [T; 2] {
        [self.moved.clone(), self.neighbour.clone()]
    }
}

/// A collection held in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedList<T> {
    items: Vec<T>,
}

impl<T: Ordered> OrderedList<T> {
    pub fn new(mut items: Vec<T>) -> Self {
        items.sort_by_key(Ordered::order_index);
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| Error::NotFound {
                resource: T::TABLE.to_string(),
                id: id.to_string(),
            })
    }

    /// The swap a move would perform, or `None` when the item is already at that end.
    pub fn plan_move(&self, id: Uuid, direction: Direction) -> Result<Option<MovePlan<T>>> {
        let index = self.position(id)?;
        let neighbour_index = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&i| i < self.items.len()),
        };
        let Some(neighbour_index) = neighbour_index else {
            return Ok(None);
        };

        let mut moved = self.items[index].clone();
        let mut neighbour = self.items[neighbour_index].clone();
        let (a, b) = (moved.order_index(), neighbour.order_index());
        moved.set_order_index(b);
        neighbour.set_order_index(a);
        Ok(Some(MovePlan { moved, neighbour }))
    }

    /// Replace the two rows of a persisted plan and restore display order.
    pub fn commit(&mut self, plan: MovePlan<T>) {
        for row in [plan.moved, plan.neighbour] {
            if let Some(slot) = self.items.iter_mut().find(|item| item.id() == row.id()) {
                *slot = row;
            }
        }
        self.items.sort_by_key(Ordered::order_index);
    }

    /// Move `id` one step in `direction`, calling `persist` with the two rewritten rows.
    ///
    /// The list only changes once `persist` succeeds. Returns whether anything moved.
    #[instrument(skip(self, persist), fields(table = %T::TABLE, id = %abbrev_uuid(&id), ?direction), err)]
    pub async fn move_item<F, Fut>(&mut self, id: Uuid, direction: Direction, persist: F) -> Result<bool>
    where
        F: FnOnce([T; 2]) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let Some(plan) = self.plan_move(id, direction)? else {
            debug!("item already at the end of the list");
            return Ok(false);
        };
        persist(plan.rows()).await?;
        self.commit(plan);
        Ok(true)
    }
}
