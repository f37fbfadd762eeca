use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tokio::sync::broadcast;

use super::{new_invoice_id, RecordStore, StoreChange, StoreResult, CHANGE_CHANNEL_CAPACITY};
use crate::dates::now_iso;
use crate::error::StoreError;
use crate::model::{Categories, CategoryKind, Invoice, InvoicePatch, NotificationPreference, Snapshot};

const SCHEMA_VERSION: i64 = 1;

const META_INITIALIZED_AT: &str = "initializedAt";
const META_NOTIF_ENABLED: &str = "notif.enabled";
const META_NOTIF_LAST_RUN_DAY: &str = "notif.lastRunDay";

pub(crate) fn sqlite_error_string(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(code, msg) => {
            let message = msg.clone().unwrap_or_default();
            format!(
                "sqlite(code={:?}, extended_code={}, msg={})",
                code.code, code.extended_code, message
            )
        }
        other => other.to_string(),
    }
}

fn configure_sqlite(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Apply PRAGMAs on init (outside any transaction).
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;\n\
         PRAGMA synchronous = NORMAL;\n\
         PRAGMA temp_store = MEMORY;\n\
         PRAGMA busy_timeout = 5000;\n",
    )?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS app_meta (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY NOT NULL,
            position INTEGER NOT NULL,
            number TEXT NOT NULL,
            shop TEXT NOT NULL,
            location TEXT NOT NULL,
            sendDate TEXT NOT NULL,
            dueDate TEXT NOT NULL,
            sent INTEGER NOT NULL DEFAULT 0,
            paid INTEGER NOT NULL DEFAULT 0,
            createdAt TEXT NOT NULL,
            updatedAt TEXT NOT NULL,
            data_json TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS categories (
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (kind, name)
        );

        CREATE INDEX IF NOT EXISTS idx_invoices_position ON invoices(position);
        CREATE INDEX IF NOT EXISTS idx_invoices_shop ON invoices(shop);
        CREATE INDEX IF NOT EXISTS idx_invoices_location ON invoices(location);
        "#,
    )?;
    Ok(())
}

fn apply_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let v: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    // v=0 means a fresh DB (init_schema created the latest tables).
    if v == 0 {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        return Ok(());
    }

    if v > SCHEMA_VERSION {
        tracing::warn!(
            found = v,
            supported = SCHEMA_VERSION,
            "database was written by a newer version"
        );
    }

    Ok(())
}

fn app_meta_get(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_meta WHERE key = ?1",
        params![key],
        |r| r.get(0),
    )
    .optional()
}

fn app_meta_set(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO app_meta(key, value) VALUES(?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn read_invoices(conn: &Connection) -> Result<Vec<Invoice>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT id, data_json FROM invoices ORDER BY position ASC")?;
    let mut rows = stmt.query([])?;
    let mut out: Vec<Invoice> = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let json: String = row.get(1)?;
        match serde_json::from_str::<Invoice>(&json) {
            Ok(inv) => out.push(inv),
            Err(e) => tracing::warn!(invoice_id = %id, error = %e, "skipping unreadable invoice row"),
        }
    }
    Ok(out)
}

fn read_invoice(conn: &Connection, id: &str) -> Result<Option<Invoice>, StoreError> {
    let json: Option<String> = conn
        .query_row(
            "SELECT data_json FROM invoices WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    match json {
        Some(j) => Ok(Some(serde_json::from_str::<Invoice>(&j)?)),
        None => Ok(None),
    }
}

fn insert_invoice(conn: &Connection, inv: &Invoice, position: i64, now: &str) -> Result<(), StoreError> {
    let json = serde_json::to_string(inv)?;
    conn.execute(
        r#"INSERT INTO invoices (
            id, position, number, shop, location, sendDate, dueDate, sent, paid, createdAt, updatedAt, data_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, ?11)"#,
        params![
            inv.id,
            position,
            inv.number,
            inv.shop,
            inv.location,
            inv.send_date,
            inv.due_date,
            inv.sent as i32,
            inv.paid as i32,
            now,
            json,
        ],
    )?;
    Ok(())
}

fn write_invoice(conn: &Connection, inv: &Invoice, now: &str) -> Result<(), StoreError> {
    let json = serde_json::to_string(inv)?;
    conn.execute(
        r#"UPDATE invoices SET number=?2, shop=?3, location=?4, sendDate=?5, dueDate=?6, sent=?7, paid=?8, updatedAt=?9, data_json=?10 WHERE id=?1"#,
        params![
            inv.id,
            inv.number,
            inv.shop,
            inv.location,
            inv.send_date,
            inv.due_date,
            inv.sent as i32,
            inv.paid as i32,
            now,
            json,
        ],
    )?;
    Ok(())
}

fn patch_invoice(
    conn: &Connection,
    id: &str,
    patch: &InvoicePatch,
    today: &str,
) -> Result<Option<Invoice>, StoreError> {
    let Some(mut existing) = read_invoice(conn, id)? else {
        return Ok(None);
    };
    patch.apply(&mut existing, today);
    write_invoice(conn, &existing, &now_iso())?;
    Ok(Some(existing))
}

fn read_categories(conn: &Connection) -> Result<Categories, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT kind, name FROM categories ORDER BY kind, position ASC")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;

    let mut out = Categories::default();
    for row in rows {
        let (kind, name) = row?;
        match kind.parse::<CategoryKind>() {
            Ok(CategoryKind::Shop) => out.shops.push(name),
            Ok(CategoryKind::Location) => out.locations.push(name),
            Err(_) => tracing::warn!(kind = %kind, name = %name, "ignoring category of unknown kind"),
        }
    }
    Ok(out)
}

fn write_categories(conn: &Connection, categories: &Categories) -> Result<(), rusqlite::Error> {
    conn.execute("DELETE FROM categories", [])?;
    let mut stmt = conn.prepare("INSERT INTO categories (kind, name, position) VALUES (?1, ?2, ?3)")?;
    for kind in [CategoryKind::Shop, CategoryKind::Location] {
        for (i, name) in categories.list(kind).iter().enumerate() {
            stmt.execute(params![kind.as_str(), name, i as i64])?;
        }
    }
    Ok(())
}

fn read_preference(conn: &Connection) -> Result<NotificationPreference, rusqlite::Error> {
    let enabled = app_meta_get(conn, META_NOTIF_ENABLED)?.is_some_and(|v| v == "1");
    let last_run_day = app_meta_get(conn, META_NOTIF_LAST_RUN_DAY)?.unwrap_or_default();
    Ok(NotificationPreference { enabled, last_run_day })
}

/// Local-only Record Store backed by a single SQLite file.
///
/// Blocking SQLite work runs on the tokio blocking pool. Writers serialize on
/// `write_lock` so a read-modify-write never interleaves with another.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    write_lock: Arc<Mutex<()>>,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened invoice database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        configure_sqlite(&conn)?;
        init_schema(&conn)?;
        apply_migrations(&conn)?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            write_lock: Arc::new(Mutex::new(())),
            changes,
        })
    }

    async fn with_read<T, F>(&self, op_name: &'static str, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned("db"))?;
            f(&guard).inspect_err(|e| {
                tracing::error!(op = op_name, error = %e, "sqlite read failed");
            })
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    async fn with_write<T, F>(&self, op_name: &'static str, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let write_lock = self.write_lock.clone();
        let out = tokio::task::spawn_blocking(move || {
            let _wg = write_lock.lock().map_err(|_| StoreError::Poisoned("write"))?;
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned("db"))?;
            f(&mut guard).inspect_err(|e| {
                tracing::error!(op = op_name, error = %e, "sqlite write failed");
            })
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))??;

        tracing::debug!(op = op_name, "sqlite write committed");
        self.publish_change().await;
        Ok(out)
    }

    async fn publish_change(&self) {
        if self.changes.receiver_count() == 0 {
            return;
        }
        let state = self
            .with_read("publish_change", |conn| {
                Ok(StoreChange {
                    snapshot: Snapshot {
                        categories: read_categories(conn)?,
                        invoices: read_invoices(conn)?,
                    },
                    preference: read_preference(conn)?,
                })
            })
            .await;
        match state {
            Ok(change) => {
                let _ = self.changes.send(change);
            }
            Err(e) => tracing::warn!(error = %e, "could not publish store change"),
        }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn is_initialized(&self) -> StoreResult<bool> {
        self.with_read("is_initialized", |conn| {
            Ok(app_meta_get(conn, META_INITIALIZED_AT)?.is_some())
        })
        .await
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        self.with_read("list_invoices", |conn| Ok(read_invoices(conn)?))
            .await
    }

    async fn get_invoice(&self, id: &str) -> StoreResult<Option<Invoice>> {
        let id = id.to_string();
        self.with_read("get_invoice", move |conn| read_invoice(conn, &id))
            .await
    }

    async fn create_invoice(&self, record: Invoice) -> StoreResult<String> {
        self.with_write("create_invoice", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let front: i64 = tx.query_row(
                "SELECT COALESCE(MIN(position), 0) - 1 FROM invoices",
                [],
                |r| r.get(0),
            )?;
            let created = Invoice {
                id: new_invoice_id(),
                ..record
            };
            insert_invoice(&tx, &created, front, &now_iso())?;
            tx.commit()?;
            Ok(created.id)
        })
        .await
    }

    async fn update_invoice(&self, id: &str, patch: InvoicePatch, today: &str) -> StoreResult<Option<Invoice>> {
        let id = id.to_string();
        let today = today.to_string();
        self.with_write("update_invoice", move |conn| patch_invoice(conn, &id, &patch, &today))
            .await
    }

    async fn update_invoices(
        &self,
        patches: Vec<(String, InvoicePatch)>,
        today: &str,
    ) -> StoreResult<Vec<Invoice>> {
        let today = today.to_string();
        self.with_write("update_invoices", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut updated = Vec::with_capacity(patches.len());
            for (id, patch) in &patches {
                if let Some(inv) = patch_invoice(&tx, id, patch, &today)? {
                    updated.push(inv);
                }
            }
            tx.commit()?;
            Ok(updated)
        })
        .await
    }

    async fn delete_invoice(&self, id: &str) -> StoreResult<bool> {
        let id = id.to_string();
        self.with_write("delete_invoice", move |conn| {
            let n = conn.execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
            Ok(n > 0)
        })
        .await
    }

    async fn delete_invoices(&self, ids: &[String]) -> StoreResult<usize> {
        let ids = ids.to_vec();
        self.with_write("delete_invoices", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut removed = 0usize;
            for id in &ids {
                removed += tx.execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
    }

    async fn list_categories(&self) -> StoreResult<Categories> {
        self.with_read("list_categories", |conn| Ok(read_categories(conn)?))
            .await
    }

    async fn save_categories(&self, categories: Categories) -> StoreResult<()> {
        self.with_write("save_categories", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            write_categories(&tx, &categories)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_notification_preference(&self) -> StoreResult<NotificationPreference> {
        self.with_read("get_notification_preference", |conn| Ok(read_preference(conn)?))
            .await
    }

    async fn set_notification_preference(&self, pref: NotificationPreference) -> StoreResult<()> {
        self.with_write("set_notification_preference", move |conn| {
            let tx = conn.transaction()?;
            app_meta_set(&tx, META_NOTIF_ENABLED, if pref.enabled { "1" } else { "0" })?;
            app_meta_set(&tx, META_NOTIF_LAST_RUN_DAY, &pref.last_run_day)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn replace_all(&self, snapshot: Snapshot) -> StoreResult<()> {
        self.with_write("replace_all", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now = now_iso();
            tx.execute("DELETE FROM invoices", [])?;
            for (i, inv) in snapshot.invoices.iter().enumerate() {
                insert_invoice(&tx, inv, i as i64, &now)?;
            }
            write_categories(&tx, &snapshot.categories)?;
            app_meta_set(&tx, META_INITIALIZED_AT, &now)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<StoreChange>> {
        Some(self.changes.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_gets_current_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        apply_migrations(&conn).unwrap();
        let v: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0)).unwrap();
        assert_eq!(v, SCHEMA_VERSION);
    }

    #[test]
    fn app_meta_upserts() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        app_meta_set(&conn, "k", "1").unwrap();
        app_meta_set(&conn, "k", "2").unwrap();
        assert_eq!(app_meta_get(&conn, "k").unwrap().as_deref(), Some("2"));
        assert_eq!(app_meta_get(&conn, "missing").unwrap(), None);
    }

    #[test]
    fn categories_keep_their_order() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let cats = Categories {
            shops: vec!["Zeta".to_string(), "Alpha".to_string()],
            locations: vec!["Ilfov".to_string()],
        };
        write_categories(&conn, &cats).unwrap();
        assert_eq!(read_categories(&conn).unwrap(), cats);
    }
}
