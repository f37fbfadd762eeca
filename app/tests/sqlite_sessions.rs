use lucidatafact_app_lib::{
    AppError, CategoryKind, DisabledNotifier, FilterSpec, InvoiceApp, RecordStore, SqliteStore, StatusFilter,
};

const DAY_ONE: &str = "2026-01-05";
const DAY_TWO: &str = "2026-01-06";

fn db_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("data").join("lucidatafact.db")
}

#[tokio::test]
async fn gate_state_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);

    {
        let mut app = InvoiceApp::open(SqliteStore::open(&path).unwrap(), DAY_ONE).await.unwrap();
        let reminder = app.run_daily_check(DAY_ONE, &DisabledNotifier).await.unwrap();
        assert_eq!(reminder.map(|r| r.count()), Some(1));
    }

    let mut app = InvoiceApp::open(SqliteStore::open(&path).unwrap(), DAY_ONE).await.unwrap();
    assert_eq!(app.preference().last_run_day, DAY_ONE);
    assert!(app.run_daily_check(DAY_ONE, &DisabledNotifier).await.unwrap().is_none());

    // Nothing is scheduled for the next day, but the gate still advances.
    assert!(app.run_daily_check(DAY_TWO, &DisabledNotifier).await.unwrap().is_none());
    assert_eq!(app.store().get_notification_preference().await.unwrap().last_run_day, DAY_TWO);
}

#[tokio::test]
async fn records_and_order_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);

    let created = {
        let mut app = InvoiceApp::open(SqliteStore::open(&path).unwrap(), DAY_ONE).await.unwrap();
        let draft = lucidatafact_app_lib::InvoiceDraft {
            number: "LDF-2026-004".to_string(),
            client: "SC Nou SRL".to_string(),
            amount: "99.90".to_string(),
            ..app.new_draft(DAY_ONE)
        };
        let id = app.save_invoice(None, draft, DAY_ONE).await.unwrap();
        app.add_category(CategoryKind::Shop, "Magazin Arad").await.unwrap();
        id
    };

    let app = InvoiceApp::open(SqliteStore::open(&path).unwrap(), DAY_TWO).await.unwrap();
    assert_eq!(app.invoices().len(), 4);
    assert_eq!(app.invoices()[0].id, created);
    assert_eq!(app.invoices()[0].amount, 99.9);
    assert!(app.categories().contains(CategoryKind::Shop, "Magazin Arad"));
}

#[tokio::test]
async fn export_then_import_reproduces_the_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = InvoiceApp::open(SqliteStore::open(&db_path(&dir)).unwrap(), DAY_ONE).await.unwrap();
    let id = source.invoices()[1].id.clone();
    source.toggle_paid(&id, DAY_ONE).await.unwrap();
    let exported = source.export_json("2026-01-05T08:00:00Z").await.unwrap();

    let mut target = InvoiceApp::open(SqliteStore::open_in_memory().unwrap(), DAY_TWO).await.unwrap();
    let count = target.import_json(&exported, DAY_TWO).await.unwrap();
    assert_eq!(count, 3);
    assert_eq!(target.invoices(), source.invoices());
    assert_eq!(target.categories(), source.categories());
    assert_eq!(target.store().list_invoices().await.unwrap(), source.invoices());
}

#[tokio::test]
async fn malformed_import_leaves_the_store_untouched() {
    let mut app = InvoiceApp::open(SqliteStore::open_in_memory().unwrap(), DAY_ONE).await.unwrap();
    let before = app.store().load_snapshot().await.unwrap();

    for text in [
        "{ not json",
        r#"{ "categories": { "shops": [], "locations": [] } }"#,
        r#"{ "data": { "categories": { "shops": [], "locations": [] }, "invoices": [ { "id": "x" } ] } }"#,
    ] {
        let err = app.import_json(text, DAY_ONE).await.unwrap_err();
        assert!(matches!(err, AppError::ImportFormat(_)), "{text}: {err}");
    }

    assert_eq!(app.store().load_snapshot().await.unwrap(), before);
    assert_eq!(app.invoices(), before.invoices.as_slice());
}

const LEGACY_FILE: &str = r#"{
    "categories": { "shops": ["Depozit Central"], "locations": ["Ilfov"] },
    "invoices": [
        {
            "id": "inv_a", "number": "LDF-2025-090", "client": "Distribuitor XYZ",
            "shop": "Depozit Central", "location": "Ilfov",
            "issueDate": "2025-12-01", "sendDate": "2025-12-02", "dueDate": "2025-12-20",
            "amount": 120, "currency": "RON", "sent": true, "paid": true,
            "paidDate": "", "paidRef": "", "notes": ""
        },
        {
            "id": "inv_b", "number": "LDF-2025-091", "client": "Distribuitor XYZ",
            "shop": "Depozit Central", "location": "Ilfov",
            "issueDate": "2025-12-01", "sendDate": "2025-12-02", "dueDate": "2025-12-20",
            "amount": 80, "currency": "RON", "sent": true, "paid": false,
            "paidDate": "2026-01-03", "paidRef": "OP 9", "notes": ""
        }
    ]
}"#;

#[tokio::test]
async fn imported_records_satisfy_the_paid_invariant() {
    let mut app = InvoiceApp::open(SqliteStore::open_in_memory().unwrap(), DAY_ONE).await.unwrap();
    assert_eq!(app.import_json(LEGACY_FILE, DAY_TWO).await.unwrap(), 2);

    let stored = app.store().list_invoices().await.unwrap();
    assert!(stored[0].paid);
    assert_eq!(stored[0].paid_date.as_deref(), Some(DAY_TWO));
    assert!(!stored[1].paid);
    assert_eq!(stored[1].paid_date, None);
    assert_eq!(stored[1].paid_ref, None);
    assert_eq!(app.invoices(), stored.as_slice());
}

#[tokio::test]
async fn import_referencing_missing_categories_is_refused() {
    let mut app = InvoiceApp::open(SqliteStore::open_in_memory().unwrap(), DAY_ONE).await.unwrap();
    let before = app.store().load_snapshot().await.unwrap();

    let stray = LEGACY_FILE.replacen(r#""shop": "Depozit Central""#, r#""shop": "Magazin Fantoma""#, 1);
    let err = app.import_json(&stray, DAY_ONE).await.unwrap_err();
    assert!(matches!(err, AppError::ImportFormat(_)), "{err}");
    assert!(!app.categories().contains(CategoryKind::Shop, "Magazin Fantoma"));
    assert_eq!(app.store().load_snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn bulk_paid_skips_hidden_selection() {
    let mut app = InvoiceApp::open(SqliteStore::open_in_memory().unwrap(), DAY_ONE).await.unwrap();
    let overdue = app.invoices().iter().find(|i| i.number == "LDF-2026-002").unwrap().id.clone();
    let unsent = app.invoices().iter().find(|i| i.number == "LDF-2026-001").unwrap().id.clone();
    app.select(&overdue).unwrap();
    app.select(&unsent).unwrap();
    app.set_filter(FilterSpec {
        status: StatusFilter::Overdue,
        ..FilterSpec::default()
    });

    assert_eq!(app.bulk_mark_paid(DAY_ONE).await.unwrap(), 1);

    let stored = app.store().list_invoices().await.unwrap();
    let paid: Vec<_> = stored.iter().filter(|i| i.paid).map(|i| i.number.as_str()).collect();
    assert_eq!(paid, vec!["LDF-2026-002", "LDF-2026-003"]);
    let marked = stored.iter().find(|i| i.id == overdue).unwrap();
    assert_eq!(marked.paid_date.as_deref(), Some(DAY_ONE));
    assert!(app.selection().contains(&unsent));
}

#[tokio::test]
async fn reset_restores_demo_data_and_clears_selection() {
    let mut app = InvoiceApp::open(SqliteStore::open_in_memory().unwrap(), DAY_ONE).await.unwrap();
    app.select_all_visible(DAY_ONE);
    app.bulk_delete(DAY_ONE).await.unwrap();
    assert!(app.invoices().is_empty());

    app.reset(DAY_TWO).await.unwrap();
    assert_eq!(app.invoices().len(), 3);
    assert!(app.selection().is_empty());
    assert_eq!(app.dashboard(DAY_TWO).to_send_today, 1);
}
