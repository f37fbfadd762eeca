use serde::Serialize;

use lucidatafact_app_lib::reminder::in_app_message;
use lucidatafact_app_lib::{format_money, Dashboard, DerivedStatus, Invoice};

fn badges(st: &DerivedStatus) -> String {
  let mut out = Vec::new();
  out.push(if st.is_paid { "paid" } else { "unpaid" });
  out.push(if st.is_sent { "sent" } else { "unsent" });
  if st.is_overdue {
    out.push("OVERDUE");
  }
  if st.is_due_today {
    out.push("SEND TODAY");
  }
  out.join(", ")
}

pub fn print_table(invoices: &[&Invoice], today: &str) {
  println!(
    "{:<38} {:<14} {:<24} {:<10} {:<10} {:>16}  STATUS",
    "ID", "NUMBER", "CLIENT", "SEND", "DUE", "AMOUNT"
  );
  for inv in invoices {
    let st = DerivedStatus::evaluate(inv, today);
    println!(
      "{:<38} {:<14} {:<24} {:<10} {:<10} {:>16}  {}",
      inv.id,
      inv.number,
      truncate(&inv.client, 24),
      inv.send_date,
      inv.due_date,
      format_money(inv.amount),
      badges(&st)
    );
  }
}

fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
  out.push('…');
  out
}

#[derive(Serialize)]
struct InvoiceView<'a> {
  #[serde(flatten)]
  invoice: &'a Invoice,
  status: DerivedStatus,
}

pub fn invoice_json(inv: &Invoice, today: &str) -> anyhow::Result<String> {
  let view = InvoiceView {
    invoice: inv,
    status: DerivedStatus::evaluate(inv, today),
  };
  Ok(serde_json::to_string_pretty(&view)?)
}

pub fn print_dashboard(d: &Dashboard) {
  println!("Unpaid:        {} ({})", d.unpaid_count, format_money(d.unpaid_sum));
  println!("Send today:    {}", d.to_send_today);
  println!("Due in 7 days: {}", d.due_soon);
  println!("Overdue:       {}", d.overdue);
}

/// Lines printed by `remind`. The "already ran" note only appears when an
/// earlier process consumed today's check.
pub fn remind_report(due: &[&Invoice], checked_earlier: bool) -> Vec<String> {
  let mut lines = Vec::new();
  if due.is_empty() {
    lines.push("Nothing to send today.".to_string());
  } else {
    lines.push(in_app_message(due.len()));
    for inv in due {
      lines.push(format!("  {}  {}  {}", inv.id, inv.number, inv.client));
    }
  }
  if checked_earlier {
    lines.push("(the daily reminder already ran earlier today)".to_string());
  }
  lines
}
