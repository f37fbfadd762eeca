use serde::Serialize;

use crate::model::Invoice;
use crate::status::DerivedStatus;

pub const REMINDER_TITLE: &str = "LuciDataFact: invoices to send today";

/// The in-app reminder produced by the daily check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReminder {
    pub day: String,
    pub invoice_ids: Vec<String>,
    pub message: String,
    /// Whether the native channel delivered as well.
    pub native_delivered: bool,
}

impl DailyReminder {
    pub fn count(&self) -> usize {
        self.invoice_ids.len()
    }
}

/// Unsent invoices whose send date is `today`, in collection order.
pub fn due_to_send_today<'a>(invoices: &'a [Invoice], today: &str) -> Vec<&'a Invoice> {
    invoices
        .iter()
        .filter(|inv| DerivedStatus::evaluate(inv, today).is_due_today)
        .collect()
}

pub fn in_app_message(count: usize) -> String {
    match count {
        1 => "You have 1 invoice to send today.".to_string(),
        n => format!("You have {n} invoices to send today."),
    }
}

pub fn native_body(count: usize) -> String {
    match count {
        1 => "1 invoice is scheduled to be sent today.".to_string(),
        n => format!("{n} invoices are scheduled to be sent today."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_snapshot;

    #[test]
    fn picks_unsent_invoices_sending_today() {
        let snap = demo_snapshot("2026-01-05");
        let due = due_to_send_today(&snap.invoices, "2026-01-05");
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].number, "LDF-2026-001");
        assert!(due_to_send_today(&snap.invoices, "2026-01-06").is_empty());
    }

    #[test]
    fn messages_agree_in_number() {
        assert_eq!(in_app_message(1), "You have 1 invoice to send today.");
        assert_eq!(in_app_message(3), "You have 3 invoices to send today.");
        assert_eq!(native_body(2), "2 invoices are scheduled to be sent today.");
    }
}
