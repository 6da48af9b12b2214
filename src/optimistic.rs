use crate::error::{ApiError, StoreError};
use crate::models::{TodoId, TodoItem};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum Settlement {
    /// The server's item replaced the speculative one.
    Committed(TodoItem),
    /// The call failed and the previous item was restored.
    RolledBack(ApiError),
    /// Nothing was in flight for this id, the result was dropped.
    Stale,
}

/// Ids with an update on the wire. Owned by the app so it outlives the
/// screen that sent the update.
#[derive(Debug, Default)]
pub struct InFlight(HashSet<TodoId>);

impl InFlight {
    pub fn contains(&self, id: TodoId) -> bool {
        self.0.contains(&id)
    }

    pub fn insert(&mut self, id: TodoId) {
        self.0.insert(id);
    }

    pub fn release(&mut self, id: TodoId) {
        self.0.remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A view's own list of todos with optimistic updates. A mutation shows its
/// speculative value right away and keeps the previous one until the call
/// settles. One mutation per id at a time, counting updates sent by screens
/// that have since been replaced.
#[derive(Debug, Default)]
pub struct TodoStore {
    items: Vec<TodoItem>,
    in_flight: HashMap<TodoId, TodoItem>,
}

impl TodoStore {
    pub fn new(items: Vec<TodoItem>) -> TodoStore {
        TodoStore {
            items,
            in_flight: HashMap::new(),
        }
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn is_pending(&self, id: TodoId) -> bool {
        self.in_flight.contains_key(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    /// Replaces everything with a fresh fetch. Pending mutations are forgotten
    /// and their settlements will be stale.
    pub fn replace_all(&mut self, items: Vec<TodoItem>) {
        self.items = items;
        self.in_flight.clear();
    }

    pub fn prepend(&mut self, item: TodoItem) {
        self.items.insert(0, item);
    }

    pub fn remove(&mut self, id: TodoId) -> Option<TodoItem> {
        self.in_flight.remove(&id);
        let pos = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(pos))
    }

    /// (todo, done) in list order.
    pub fn partition(&self) -> (Vec<&TodoItem>, Vec<&TodoItem>) {
        self.items.iter().partition(|item| !item.is_completed)
    }

    /// Applies `change` to the item locally and returns the speculative value
    /// to send to the service.
    pub fn begin<F>(
        &mut self,
        id: TodoId,
        wire: &InFlight,
        change: F,
    ) -> Result<TodoItem, StoreError>
    where
        F: FnOnce(&mut TodoItem),
    {
        if self.in_flight.contains_key(&id) || wire.contains(id) {
            return Err(StoreError::InFlight(id));
        }
        let slot = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::UnknownItem(id))?;

        let previous = slot.clone();
        change(&mut *slot);
        // id is server-owned
        slot.id = previous.id;
        let speculative = slot.clone();

        debug!(%id, "applied speculative update");
        self.in_flight.insert(id, previous);
        Ok(speculative)
    }

    /// Takes a server-confirmed item that arrived for an earlier screen, unless
    /// this store has its own mutation pending on it.
    pub fn refresh(&mut self, confirmed: TodoItem) -> bool {
        if self.in_flight.contains_key(&confirmed.id) {
            return false;
        }
        match self.items.iter_mut().find(|item| item.id == confirmed.id) {
            Some(slot) => {
                *slot = confirmed;
                true
            }
            None => false,
        }
    }

    pub fn settle(&mut self, id: TodoId, result: Result<TodoItem, ApiError>) -> Settlement {
        let Some(previous) = self.in_flight.remove(&id) else {
            debug!(%id, "dropping settlement with nothing in flight");
            return Settlement::Stale;
        };
        let Some(slot) = self.items.iter_mut().find(|item| item.id == id) else {
            return Settlement::Stale;
        };

        match result {
            Ok(mut confirmed) => {
                if confirmed.tenant_id.is_empty() {
                    confirmed.tenant_id = previous.tenant_id;
                }
                *slot = confirmed.clone();
                Settlement::Committed(confirmed)
            }
            Err(err) => {
                warn!(%id, error = %err, network = err.is_network(), "update failed, rolling back");
                *slot = previous;
                Settlement::RolledBack(err)
            }
        }
    }
}
