//! LuciDataFact core: invoice records, categories, list filtering, bulk
//! selection and the once-a-day "invoices to send today" reminder.

pub mod app;
pub mod categories;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod error;
pub mod filter;
pub mod gate;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod seed;
pub mod selection;
pub mod status;
pub mod store;
pub mod transfer;
pub mod validation;

pub use app::InvoiceApp;
pub use dashboard::{format_money, Dashboard};
pub use error::{AppError, AppResult, NotifyError, StoreError, ValidationError};
pub use filter::{apply_filters, FilterSpec, SortKey, StatusFilter};
pub use gate::DailyNotificationGate;
pub use model::{Categories, CategoryKind, Invoice, InvoiceDraft, InvoicePatch, NotificationPreference, Snapshot};
pub use notify::{DisabledNotifier, NotificationPermission, Notifier, SmtpNotifier, SmtpSettings};
pub use reminder::DailyReminder;
pub use selection::{CheckState, SelectionSet};
pub use status::DerivedStatus;
pub use store::{InMemoryStore, RecordStore, SqliteStore, StoreChange};
pub use validation::validate_invoice;
