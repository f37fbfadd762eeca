use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lucidatafact_app_lib::config::{resolve_db_path, smtp_settings_from_env, ENV_DB};
use lucidatafact_app_lib::dates::{is_canonical_ymd, now_iso, today_ymd};
use lucidatafact_app_lib::reminder::due_to_send_today;
use lucidatafact_app_lib::transfer::export_file_name;
use lucidatafact_app_lib::{
  CategoryKind, DisabledNotifier, FilterSpec, InvoiceApp, InvoiceDraft, Notifier, SmtpNotifier, SortKey,
  SqliteStore, StatusFilter,
};

mod render;

#[derive(Parser, Debug)]
#[command(name = "lucidatafact", about = "Track invoices from issue to payment")]
struct Cli {
  /// SQLite database file.
  #[arg(long, global = true, env = ENV_DB)]
  db: Option<PathBuf>,

  /// Override the current day (YYYY-MM-DD).
  #[arg(long, global = true, value_parser = parse_day)]
  today: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the filtered, sorted invoice list.
  List(ListArgs),

  Show { id: String },

  Add(InvoiceArgs),

  Edit {
    id: String,

    #[command(flatten)]
    fields: InvoiceArgs,
  },

  Delete { id: String },

  ToggleSent { id: String },

  TogglePaid { id: String },

  /// Mark the given invoices as sent, limited to those the filter shows.
  MarkSent(BulkArgs),

  /// Mark the given invoices as paid today, limited to those the filter shows.
  MarkPaid(BulkArgs),

  /// Delete the given invoices, limited to those the filter shows.
  DeleteSelected(BulkArgs),

  Category {
    #[command(subcommand)]
    action: CategoryCommand,
  },

  /// Totals for unpaid, due and overdue invoices.
  Summary,

  /// List unsent invoices scheduled to be sent today.
  Remind,

  Notifications {
    #[command(subcommand)]
    action: NotificationsCommand,
  },

  Export {
    /// Output file; defaults to LuciDataFact_export_<today>.json.
    #[arg(long)]
    out: Option<PathBuf>,
  },

  /// Replace all data with the content of an export file.
  Import { file: PathBuf },

  /// Replace all data with the demo set.
  Reset {
    #[arg(long)]
    yes: bool,
  },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
  List,
  Add {
    #[arg(value_enum)]
    kind: KindArg,
    name: String,
  },
  Delete {
    #[arg(value_enum)]
    kind: KindArg,
    name: String,
  },
}

#[derive(Subcommand, Debug)]
enum NotificationsCommand {
  Enable,
  Disable,
  Status,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
  Shop,
  Location,
}

impl From<KindArg> for CategoryKind {
  fn from(k: KindArg) -> Self {
    match k {
      KindArg::Shop => CategoryKind::Shop,
      KindArg::Location => CategoryKind::Location,
    }
  }
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
  /// Free-text search over number, client, shop, location, notes and payment reference.
  #[arg(long, short, default_value = "")]
  query: String,

  /// all, unpaid, paid, unsent, sent or overdue.
  #[arg(long, default_value = "all")]
  status: StatusFilter,

  /// Shop name, or "all".
  #[arg(long)]
  shop: Option<String>,

  /// Location name, or "all".
  #[arg(long)]
  location: Option<String>,

  /// e.g. sendDate_asc, dueDate_desc, amount_desc.
  #[arg(long, default_value = "sendDate_asc")]
  sort: String,
}

impl ListArgs {
  fn filter_spec(&self) -> FilterSpec {
    FilterSpec {
      query: self.query.clone(),
      status: self.status,
      shop: FilterSpec::category_choice(self.shop.as_deref()),
      location: FilterSpec::category_choice(self.location.as_deref()),
    }
  }

  fn sort_key(&self) -> SortKey {
    SortKey::from_name(&self.sort)
  }
}

#[derive(Args, Debug, Clone)]
struct BulkArgs {
  #[arg(long, value_delimiter = ',', required = true)]
  ids: Vec<String>,

  #[command(flatten)]
  filter: ListArgs,
}

#[derive(Args, Debug, Clone, Default)]
struct InvoiceArgs {
  #[arg(long)]
  number: Option<String>,
  #[arg(long)]
  client: Option<String>,
  #[arg(long)]
  shop: Option<String>,
  #[arg(long)]
  location: Option<String>,
  #[arg(long)]
  issue_date: Option<String>,
  #[arg(long)]
  send_date: Option<String>,
  #[arg(long)]
  due_date: Option<String>,
  #[arg(long)]
  amount: Option<String>,
  #[arg(long)]
  sent: Option<bool>,
  #[arg(long)]
  paid: Option<bool>,
  #[arg(long)]
  paid_date: Option<String>,
  #[arg(long)]
  paid_ref: Option<String>,
  #[arg(long)]
  notes: Option<String>,
}

impl InvoiceArgs {
  /// Overlays the given flags on `base`, the way the entry form edits a record.
  fn apply_to(self, mut base: InvoiceDraft) -> InvoiceDraft {
    macro_rules! overlay {
      ($($field:ident),*) => {
        $(if let Some(v) = self.$field { base.$field = v; })*
      };
    }
    overlay!(
      number, client, shop, location, issue_date, send_date, due_date, amount, sent, paid, paid_date, paid_ref,
      notes
    );
    base
  }
}

fn parse_day(raw: &str) -> Result<String, String> {
  if is_canonical_ymd(raw) {
    Ok(raw.to_string())
  } else {
    Err(format!("expected YYYY-MM-DD, got {raw}"))
  }
}

fn init_tracing() {
  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| "lucidatafact=info".into()),
    ))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn native_notifier() -> Box<dyn Notifier> {
  match smtp_settings_from_env() {
    Some(settings) => Box::new(SmtpNotifier::new(settings)),
    None => Box::new(DisabledNotifier),
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  let cli = Cli::parse();

  let today = cli.today.clone().unwrap_or_else(today_ymd);
  let path = resolve_db_path(cli.db.as_deref()).context("no usable location for the database file")?;
  let store = SqliteStore::open(&path).with_context(|| format!("opening {}", path.display()))?;
  let mut app = InvoiceApp::open(store, &today).await?;

  let notifier = native_notifier();
  let checked_earlier = app.preference().last_run_day == today;
  if let Some(reminder) = app.run_daily_check(&today, notifier.as_ref()).await? {
    eprintln!("! {}", reminder.message);
  }

  run(&mut app, cli.command, &today, checked_earlier).await
}

/// `checked_earlier` is true when an earlier process already ran today's check.
async fn run(
  app: &mut InvoiceApp<SqliteStore>,
  command: Command,
  today: &str,
  checked_earlier: bool,
) -> anyhow::Result<()> {
  match command {
    Command::List(args) => {
      app.set_filter(args.filter_spec());
      app.set_sort(args.sort_key());
      let visible = app.visible(today);
      if visible.is_empty() {
        println!("No invoices match the current filter.");
      } else {
        render::print_table(&visible, today);
      }
    }

    Command::Show { id } => {
      let inv = app.invoice(&id).with_context(|| format!("invoice {id} not found"))?;
      println!("{}", render::invoice_json(inv, today)?);
    }

    Command::Add(fields) => {
      let draft = fields.apply_to(app.new_draft(today));
      let id = app.save_invoice(None, draft, today).await?;
      println!("Created {id}");
    }

    Command::Edit { id, fields } => {
      let base = app
        .invoice(&id)
        .map(InvoiceDraft::from)
        .with_context(|| format!("invoice {id} not found"))?;
      app.save_invoice(Some(&id), fields.apply_to(base), today).await?;
      println!("Updated {id}");
    }

    Command::Delete { id } => {
      app.delete_invoice(&id).await?;
      println!("Deleted {id}");
    }

    Command::ToggleSent { id } => {
      let inv = app.toggle_sent(&id, today).await?;
      println!("{} is now {}", inv.number, if inv.sent { "sent" } else { "not sent" });
    }

    Command::TogglePaid { id } => {
      let inv = app.toggle_paid(&id, today).await?;
      println!("{} is now {}", inv.number, if inv.paid { "paid" } else { "unpaid" });
    }

    Command::MarkSent(args) => {
      select_visible(app, &args);
      let n = app.bulk_mark_sent(today).await?;
      println!("Marked {n} invoice(s) as sent.");
    }

    Command::MarkPaid(args) => {
      select_visible(app, &args);
      let n = app.bulk_mark_paid(today).await?;
      println!("Marked {n} invoice(s) as paid.");
    }

    Command::DeleteSelected(args) => {
      select_visible(app, &args);
      let n = app.bulk_delete(today).await?;
      println!("Deleted {n} invoice(s).");
    }

    Command::Category { action } => match action {
      CategoryCommand::List => {
        let cats = app.categories();
        println!("Shops:");
        for s in &cats.shops {
          println!("  {s}");
        }
        println!("Locations:");
        for l in &cats.locations {
          println!("  {l}");
        }
      }
      CategoryCommand::Add { kind, name } => {
        let stored = app.add_category(kind.into(), &name).await?;
        println!("Added {} \"{stored}\"", CategoryKind::from(kind));
      }
      CategoryCommand::Delete { kind, name } => {
        app.delete_category(kind.into(), &name).await?;
        println!("Deleted {} \"{name}\"", CategoryKind::from(kind));
      }
    },

    Command::Summary => render::print_dashboard(&app.dashboard(today)),

    Command::Remind => {
      let due = due_to_send_today(app.invoices(), today);
      for line in render::remind_report(&due, checked_earlier) {
        println!("{line}");
      }
    }

    Command::Notifications { action } => match action {
      NotificationsCommand::Enable => {
        let notifier = native_notifier();
        let permission = app.enable_notifications(notifier.as_ref()).await?;
        if app.preference().enabled {
          println!("Notifications enabled.");
        } else {
          println!("Notifications stay disabled (permission: {permission:?}).");
        }
      }
      NotificationsCommand::Disable => {
        app.disable_notifications().await?;
        println!("Notifications disabled.");
      }
      NotificationsCommand::Status => {
        let pref = app.preference();
        println!(
          "Notifications are {}; last daily check: {}",
          if pref.enabled { "enabled" } else { "disabled" },
          if pref.last_run_day.is_empty() { "never" } else { pref.last_run_day.as_str() }
        );
      }
    },

    Command::Export { out } => {
      let out = out.unwrap_or_else(|| PathBuf::from(export_file_name(today)));
      let json = app.export_json(&now_iso()).await?;
      tokio::fs::write(&out, json)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
      println!("Exported to {}", out.display());
    }

    Command::Import { file } => {
      let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
      let n = app.import_json(&text, today).await?;
      println!("Imported {n} invoice(s).");
    }

    Command::Reset { yes } => {
      if !yes {
        anyhow::bail!("reset replaces all data with the demo set; pass --yes to confirm");
      }
      app.reset(today).await?;
      println!("Demo data loaded.");
    }
  }

  Ok(())
}

/// Applies the list filter, then selects each requested id that exists.
fn select_visible(app: &mut InvoiceApp<SqliteStore>, args: &BulkArgs) {
  app.set_filter(args.filter.filter_spec());
  app.set_sort(args.filter.sort_key());
  for id in &args.ids {
    if let Err(e) = app.select(id.trim()) {
      tracing::warn!(error = %e, "skipping selection");
    }
  }
}
