//! The Record Store seam: everything the application persists goes through
//! [`RecordStore`]. Two implementations ship with the crate, a SQLite file
//! for local use and an in-memory store that pushes change notifications.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Categories, Invoice, InvoicePatch, NotificationPreference, Snapshot};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Full state after a write, pushed to subscribers. Receivers replace their
/// local mirror wholesale; there is no merging.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub snapshot: Snapshot,
    pub preference: NotificationPreference,
}

pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub(crate) fn new_invoice_id() -> String {
    format!("inv_{}", Uuid::new_v4().simple())
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// False until the first `replace_all` (seed or import) has been written.
    async fn is_initialized(&self) -> StoreResult<bool>;

    /// Invoices in stored order; newest creations first.
    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>>;

    async fn get_invoice(&self, id: &str) -> StoreResult<Option<Invoice>>;

    /// Stores `record` at the front of the collection under a freshly
    /// assigned id, which is returned. The id carried by `record` is ignored.
    async fn create_invoice(&self, record: Invoice) -> StoreResult<String>;

    /// `today` becomes the paid date of a record the patch leaves paid
    /// without one.
    async fn update_invoice(&self, id: &str, patch: InvoicePatch, today: &str) -> StoreResult<Option<Invoice>>;

    /// Applies every patch or none of them. Unknown ids are skipped.
    async fn update_invoices(
        &self,
        patches: Vec<(String, InvoicePatch)>,
        today: &str,
    ) -> StoreResult<Vec<Invoice>>;

    async fn delete_invoice(&self, id: &str) -> StoreResult<bool>;

    async fn delete_invoices(&self, ids: &[String]) -> StoreResult<usize>;

    async fn list_categories(&self) -> StoreResult<Categories>;

    async fn save_categories(&self, categories: Categories) -> StoreResult<()>;

    async fn get_notification_preference(&self) -> StoreResult<NotificationPreference>;

    async fn set_notification_preference(&self, pref: NotificationPreference) -> StoreResult<()>;

    /// Atomically swaps categories and invoices for `snapshot`, keeping the
    /// invoice order given. Used by seeding, import and reset.
    async fn replace_all(&self, snapshot: Snapshot) -> StoreResult<()>;

    /// Push-based stores return a receiver; pull-only stores return `None`.
    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChange>> {
        None
    }

    async fn load_snapshot(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot {
            categories: self.list_categories().await?,
            invoices: self.list_invoices().await?,
        })
    }
}
