use serde::Serialize;

use crate::model::Invoice;

/// Flags derived from an invoice and the current day; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStatus {
    pub is_paid: bool,
    pub is_sent: bool,
    pub is_overdue: bool,
    pub is_due_today: bool,
}

impl DerivedStatus {
    /// `today` is a canonical `YYYY-MM-DD` string; dates compare lexicographically.
    /// An empty due or send date is never overdue and never due today.
    pub fn evaluate(inv: &Invoice, today: &str) -> Self {
        let is_overdue = !inv.paid && !inv.due_date.is_empty() && inv.due_date.as_str() < today;
        let is_due_today = !inv.sent && !inv.send_date.is_empty() && inv.send_date == today;
        Self {
            is_paid: inv.paid,
            is_sent: inv.sent,
            is_overdue,
            is_due_today,
        }
    }
}
