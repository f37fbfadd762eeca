//! In-memory Record Store that pushes a [`StoreChange`] after every write.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{new_invoice_id, RecordStore, StoreChange, StoreResult, CHANGE_CHANNEL_CAPACITY};
use crate::error::StoreError;
use crate::model::{Categories, Invoice, InvoicePatch, NotificationPreference, Snapshot};

#[derive(Debug, Default)]
struct MemoryState {
    initialized: bool,
    snapshot: Snapshot,
    preference: NotificationPreference,
}

impl MemoryState {
    fn change(&self) -> StoreChange {
        StoreChange {
            snapshot: self.snapshot.clone(),
            preference: self.preference.clone(),
        }
    }
}

/// Useful for tests and throwaway sessions. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
    changes: broadcast::Sender<StoreChange>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            changes,
        }
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> StoreResult<T> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Poisoned("memory store"))?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> StoreResult<T> {
        let (out, change) = {
            let mut state = self
                .state
                .write()
                .map_err(|_| StoreError::Poisoned("memory store"))?;
            let out = f(&mut state);
            (out, state.change())
        };
        // No subscribers is not an error.
        let _ = self.changes.send(change);
        Ok(out)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn is_initialized(&self) -> StoreResult<bool> {
        self.read(|s| s.initialized)
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        self.read(|s| s.snapshot.invoices.clone())
    }

    async fn get_invoice(&self, id: &str) -> StoreResult<Option<Invoice>> {
        self.read(|s| s.snapshot.invoices.iter().find(|i| i.id == id).cloned())
    }

    async fn create_invoice(&self, record: Invoice) -> StoreResult<String> {
        let created = Invoice {
            id: new_invoice_id(),
            ..record
        };
        let id = created.id.clone();
        self.write(|s| s.snapshot.invoices.insert(0, created))?;
        Ok(id)
    }

    async fn update_invoice(&self, id: &str, patch: InvoicePatch, today: &str) -> StoreResult<Option<Invoice>> {
        self.write(|s| {
            s.snapshot.invoices.iter_mut().find(|i| i.id == id).map(|inv| {
                patch.apply(inv, today);
                inv.clone()
            })
        })
    }

    async fn update_invoices(
        &self,
        patches: Vec<(String, InvoicePatch)>,
        today: &str,
    ) -> StoreResult<Vec<Invoice>> {
        self.write(|s| {
            let mut updated = Vec::with_capacity(patches.len());
            for (id, patch) in &patches {
                if let Some(inv) = s.snapshot.invoices.iter_mut().find(|i| &i.id == id) {
                    patch.apply(inv, today);
                    updated.push(inv.clone());
                }
            }
            updated
        })
    }

    async fn delete_invoice(&self, id: &str) -> StoreResult<bool> {
        self.write(|s| {
            let before = s.snapshot.invoices.len();
            s.snapshot.invoices.retain(|i| i.id != id);
            s.snapshot.invoices.len() != before
        })
    }

    async fn delete_invoices(&self, ids: &[String]) -> StoreResult<usize> {
        self.write(|s| {
            let before = s.snapshot.invoices.len();
            s.snapshot.invoices.retain(|i| !ids.contains(&i.id));
            before - s.snapshot.invoices.len()
        })
    }

    async fn list_categories(&self) -> StoreResult<Categories> {
        self.read(|s| s.snapshot.categories.clone())
    }

    async fn save_categories(&self, categories: Categories) -> StoreResult<()> {
        self.write(|s| s.snapshot.categories = categories)
    }

    async fn get_notification_preference(&self) -> StoreResult<NotificationPreference> {
        self.read(|s| s.preference.clone())
    }

    async fn set_notification_preference(&self, pref: NotificationPreference) -> StoreResult<()> {
        self.write(|s| s.preference = pref)
    }

    async fn replace_all(&self, snapshot: Snapshot) -> StoreResult<()> {
        self.write(|s| {
            s.snapshot = snapshot;
            s.initialized = true;
        })
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChange>> {
        Some(self.changes.subscribe())
    }
}
