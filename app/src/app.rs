//! The application-state object. Every user action is a method here; the
//! front end (CLI today) only renders what it returns.

use crate::dashboard::Dashboard;
use crate::error::{AppError, AppResult};
use crate::filter::{apply_filters, FilterSpec, SortKey};
use crate::gate::DailyNotificationGate;
use crate::model::{Categories, CategoryKind, Invoice, InvoiceDraft, InvoicePatch, NotificationPreference, Snapshot};
use crate::notify::{NotificationPermission, Notifier};
use crate::reminder::{due_to_send_today, in_app_message, native_body, DailyReminder, REMINDER_TITLE};
use crate::seed::demo_snapshot;
use crate::selection::{CheckState, SelectionSet};
use crate::store::{RecordStore, StoreChange};
use crate::transfer::{export_document, parse_import};
use crate::validation::validate_invoice;

/// Owns the store plus a mirror of what it holds. The mirror only changes
/// after the store call it depends on has succeeded.
pub struct InvoiceApp<S: RecordStore> {
    store: S,
    invoices: Vec<Invoice>,
    categories: Categories,
    preference: NotificationPreference,
    filter: FilterSpec,
    sort: SortKey,
    selection: SelectionSet,
    reminder: Option<DailyReminder>,
}

impl<S: RecordStore> InvoiceApp<S> {
    /// Seeds an uninitialized store with the demo data, then loads it.
    pub async fn open(store: S, today: &str) -> AppResult<Self> {
        if !store.is_initialized().await? {
            store.replace_all(demo_snapshot(today)).await?;
            tracing::info!(today, "seeded empty store with demo data");
        }

        let mut app = Self {
            store,
            invoices: Vec::new(),
            categories: Categories::default(),
            preference: NotificationPreference::default(),
            filter: FilterSpec::default(),
            sort: SortKey::default(),
            selection: SelectionSet::new(),
            reminder: None,
        };
        app.refresh().await?;
        Ok(app)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    pub fn preference(&self) -> &NotificationPreference {
        &self.preference
    }

    pub fn last_reminder(&self) -> Option<&DailyReminder> {
        self.reminder.as_ref()
    }

    /// Reloads everything from the store.
    pub async fn refresh(&mut self) -> AppResult<()> {
        let snapshot = self.store.load_snapshot().await?;
        let preference = self.store.get_notification_preference().await?;
        self.replace_mirror(snapshot, preference);
        Ok(())
    }

    /// Takes a pushed store change as the new truth.
    pub fn apply_change(&mut self, change: StoreChange) {
        self.replace_mirror(change.snapshot, change.preference);
    }

    fn replace_mirror(&mut self, snapshot: Snapshot, preference: NotificationPreference) {
        self.invoices = snapshot.invoices;
        self.categories = snapshot.categories;
        self.preference = preference;
        self.selection
            .retain_existing(self.invoices.iter().map(|i| i.id.as_str()));
    }

    // ---- view state ----

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn clear_filters(&mut self) {
        self.filter = FilterSpec::default();
        self.sort = SortKey::default();
    }

    pub fn visible(&self, today: &str) -> Vec<&Invoice> {
        apply_filters(&self.invoices, &self.filter, self.sort, today)
    }

    fn visible_ids(&self, today: &str) -> Vec<String> {
        self.visible(today).into_iter().map(|i| i.id.clone()).collect()
    }

    // ---- selection ----

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Selects `id` if it exists in the collection.
    pub fn select(&mut self, id: &str) -> AppResult<()> {
        if self.invoice(id).is_none() {
            return Err(AppError::InvoiceNotFound(id.to_string()));
        }
        self.selection.add(id);
        Ok(())
    }

    pub fn unselect(&mut self, id: &str) {
        self.selection.remove(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_all_visible(&mut self, today: &str) {
        let ids = self.visible_ids(today);
        self.selection.select_all(ids.iter().map(String::as_str));
    }

    pub fn deselect_all_visible(&mut self, today: &str) {
        let ids = self.visible_ids(today);
        self.selection.deselect_all(ids.iter().map(String::as_str));
    }

    pub fn check_state(&self, today: &str) -> CheckState {
        let visible = self.visible(today);
        self.selection.check_state(visible.iter().map(|i| i.id.as_str()))
    }

    /// Selected ids that are also visible, in visible order.
    pub fn bulk_targets(&self, today: &str) -> Vec<String> {
        let visible = self.visible(today);
        self.selection
            .selected_within_visible(visible.iter().map(|i| i.id.as_str()))
    }

    fn require_targets(&self, today: &str) -> AppResult<Vec<String>> {
        let targets = self.bulk_targets(today);
        if targets.is_empty() {
            return Err(AppError::NothingSelected);
        }
        Ok(targets)
    }

    // ---- invoices ----

    /// A blank entry form for a new invoice.
    pub fn new_draft(&self, today: &str) -> InvoiceDraft {
        InvoiceDraft::new_for_day(today, &self.categories)
    }

    /// Validates `draft` and stores it, creating a record when `existing_id`
    /// is `None`. Returns the record id.
    pub async fn save_invoice(
        &mut self,
        existing_id: Option<&str>,
        draft: InvoiceDraft,
        today: &str,
    ) -> AppResult<String> {
        let draft = draft.trimmed();
        validate_invoice(&draft)?;
        self.ensure_category(CategoryKind::Shop, &draft.shop)?;
        self.ensure_category(CategoryKind::Location, &draft.location)?;

        match existing_id {
            None => {
                let record = draft.into_invoice(String::new(), today);
                let id = self.store.create_invoice(record.clone()).await?;
                tracing::debug!(id = %id, number = %record.number, "invoice created");
                self.invoices.insert(0, Invoice { id: id.clone(), ..record });
                Ok(id)
            }
            Some(id) => {
                let record = draft.into_invoice(id.to_string(), today);
                let updated = self
                    .store
                    .update_invoice(id, InvoicePatch::replace_with(&record), today)
                    .await?
                    .ok_or_else(|| AppError::InvoiceNotFound(id.to_string()))?;
                tracing::debug!(id, "invoice updated");
                self.put_mirror(updated);
                Ok(id.to_string())
            }
        }
    }

    fn ensure_category(&self, kind: CategoryKind, name: &str) -> AppResult<()> {
        if self.categories.contains(kind, name) {
            Ok(())
        } else {
            Err(AppError::UnknownCategory {
                kind,
                name: name.to_string(),
            })
        }
    }

    fn put_mirror(&mut self, updated: Invoice) {
        match self.invoices.iter_mut().find(|i| i.id == updated.id) {
            Some(slot) => *slot = updated,
            None => self.invoices.insert(0, updated),
        }
    }

    /// Deletes one invoice and drops it from the selection.
    pub async fn delete_invoice(&mut self, id: &str) -> AppResult<()> {
        let deleted = self.store.delete_invoice(id).await?;
        self.invoices.retain(|i| i.id != id);
        self.selection.remove(id);
        if !deleted {
            return Err(AppError::InvoiceNotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn toggle_sent(&mut self, id: &str, today: &str) -> AppResult<Invoice> {
        let current = self
            .invoice(id)
            .ok_or_else(|| AppError::InvoiceNotFound(id.to_string()))?;
        let patch = InvoicePatch {
            sent: Some(!current.sent),
            ..InvoicePatch::default()
        };
        self.patch_one(id, patch, today).await
    }

    /// Paying stamps `today` as the paid date; un-paying clears date and reference.
    pub async fn toggle_paid(&mut self, id: &str, today: &str) -> AppResult<Invoice> {
        let current = self
            .invoice(id)
            .ok_or_else(|| AppError::InvoiceNotFound(id.to_string()))?;
        let patch = if current.paid {
            InvoicePatch {
                paid: Some(false),
                paid_date: Some(None),
                paid_ref: Some(None),
                ..InvoicePatch::default()
            }
        } else {
            InvoicePatch {
                paid: Some(true),
                paid_date: Some(Some(today.to_string())),
                ..InvoicePatch::default()
            }
        };
        self.patch_one(id, patch, today).await
    }

    async fn patch_one(&mut self, id: &str, patch: InvoicePatch, today: &str) -> AppResult<Invoice> {
        let updated = self
            .store
            .update_invoice(id, patch, today)
            .await?
            .ok_or_else(|| AppError::InvoiceNotFound(id.to_string()))?;
        self.put_mirror(updated.clone());
        Ok(updated)
    }

    /// Marks the visible selection as sent; an empty send date becomes `today`.
    pub async fn bulk_mark_sent(&mut self, today: &str) -> AppResult<usize> {
        let targets = self.require_targets(today)?;
        let patches: Vec<_> = targets
            .into_iter()
            .map(|id| {
                let fill_send_date = self
                    .invoice(&id)
                    .is_some_and(|i| i.send_date.trim().is_empty());
                let patch = InvoicePatch {
                    sent: Some(true),
                    send_date: fill_send_date.then(|| today.to_string()),
                    ..InvoicePatch::default()
                };
                (id, patch)
            })
            .collect();
        self.patch_many(patches, today).await
    }

    pub async fn bulk_mark_paid(&mut self, today: &str) -> AppResult<usize> {
        let targets = self.require_targets(today)?;
        let patches: Vec<_> = targets
            .into_iter()
            .map(|id| {
                let patch = InvoicePatch {
                    paid: Some(true),
                    paid_date: Some(Some(today.to_string())),
                    ..InvoicePatch::default()
                };
                (id, patch)
            })
            .collect();
        self.patch_many(patches, today).await
    }

    async fn patch_many(&mut self, patches: Vec<(String, InvoicePatch)>, today: &str) -> AppResult<usize> {
        let updated = self.store.update_invoices(patches, today).await?;
        let count = updated.len();
        for inv in updated {
            self.put_mirror(inv);
        }
        tracing::debug!(count, "bulk update applied");
        Ok(count)
    }

    /// Deletes the visible selection; hidden selected records are kept.
    pub async fn bulk_delete(&mut self, today: &str) -> AppResult<usize> {
        let targets = self.require_targets(today)?;
        let removed = self.store.delete_invoices(&targets).await?;
        self.invoices.retain(|i| !targets.contains(&i.id));
        for id in &targets {
            self.selection.remove(id);
        }
        tracing::debug!(removed, "bulk delete applied");
        Ok(removed)
    }

    // ---- categories ----

    pub async fn add_category(&mut self, kind: CategoryKind, name: &str) -> AppResult<String> {
        let mut next = self.categories.clone();
        let stored = next.insert(kind, name)?;
        self.store.save_categories(next.clone()).await?;
        self.categories = next;
        Ok(stored)
    }

    pub async fn delete_category(&mut self, kind: CategoryKind, name: &str) -> AppResult<()> {
        if !self.categories.contains(kind, name) {
            return Err(AppError::UnknownCategory {
                kind,
                name: name.to_string(),
            });
        }
        let mut next = self.categories.clone();
        next.remove_unused(kind, name, &self.invoices)?;
        self.store.save_categories(next.clone()).await?;
        self.categories = next;
        Ok(())
    }

    // ---- transfer ----

    pub async fn export_json(&self, exported_at: &str) -> AppResult<String> {
        let snapshot = self.store.load_snapshot().await?;
        export_document(snapshot, exported_at.to_string())
    }

    /// Replaces the whole collection with the file's content, or changes
    /// nothing. Returns the number of imported invoices.
    pub async fn import_json(&mut self, text: &str, today: &str) -> AppResult<usize> {
        let snapshot = parse_import(text, today)?;
        let count = snapshot.invoices.len();
        self.store.replace_all(snapshot.clone()).await?;
        self.invoices = snapshot.invoices;
        self.categories = snapshot.categories;
        self.selection.clear();
        tracing::info!(count, "import applied");
        Ok(count)
    }

    /// Back to the demo data. The notification preference is kept.
    pub async fn reset(&mut self, today: &str) -> AppResult<()> {
        let snapshot = demo_snapshot(today);
        self.store.replace_all(snapshot.clone()).await?;
        self.invoices = snapshot.invoices;
        self.categories = snapshot.categories;
        self.selection.clear();
        tracing::info!(today, "store reset to demo data");
        Ok(())
    }

    pub fn dashboard(&self, today: &str) -> Dashboard {
        Dashboard::compute(&self.invoices, today)
    }

    // ---- notifications ----

    /// Turns the native channel on if it grants permission, off otherwise.
    pub async fn enable_notifications(&mut self, notifier: &dyn Notifier) -> AppResult<NotificationPermission> {
        let permission = notifier.permission();
        let next = NotificationPreference {
            enabled: permission == NotificationPermission::Granted,
            ..self.preference.clone()
        };
        self.store.set_notification_preference(next.clone()).await?;
        self.preference = next;
        Ok(permission)
    }

    pub async fn disable_notifications(&mut self) -> AppResult<()> {
        let next = NotificationPreference {
            enabled: false,
            ..self.preference.clone()
        };
        self.store.set_notification_preference(next.clone()).await?;
        self.preference = next;
        Ok(())
    }

    /// Runs at most once per `today`. Returns the in-app reminder when there
    /// is something to send today. Native delivery failures are logged only.
    pub async fn run_daily_check(&mut self, today: &str, notifier: &dyn Notifier) -> AppResult<Option<DailyReminder>> {
        let mut gate = DailyNotificationGate::new(self.preference.last_run_day.clone());
        if !gate.should_run_today(today) {
            tracing::debug!(today, "daily check already ran");
            return Ok(None);
        }

        let next = NotificationPreference {
            last_run_day: gate.last_run_day().to_string(),
            ..self.preference.clone()
        };
        self.store.set_notification_preference(next.clone()).await?;
        self.preference = next;

        let due: Vec<String> = due_to_send_today(&self.invoices, today)
            .into_iter()
            .map(|i| i.id.clone())
            .collect();
        if due.is_empty() {
            return Ok(None);
        }

        let count = due.len();
        let message = in_app_message(count);
        tracing::info!(count, "{message}");

        let mut native_delivered = false;
        if self.preference.enabled {
            match notifier.permission() {
                NotificationPermission::Granted => {
                    match notifier.notify(REMINDER_TITLE, &native_body(count)).await {
                        Ok(()) => native_delivered = true,
                        Err(e) => tracing::warn!(error = %e, "native reminder not delivered"),
                    }
                }
                other => tracing::warn!(permission = ?other, "native reminder skipped"),
            }
        }

        let reminder = DailyReminder {
            day: today.to_string(),
            invoice_ids: due,
            message,
            native_delivered,
        };
        self.reminder = Some(reminder.clone());
        Ok(Some(reminder))
    }
}
