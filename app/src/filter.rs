use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Invoice;
use crate::status::DerivedStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Unpaid,
    Paid,
    Unsent,
    Sent,
    Overdue,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Unpaid => "unpaid",
            StatusFilter::Paid => "paid",
            StatusFilter::Unsent => "unsent",
            StatusFilter::Sent => "sent",
            StatusFilter::Overdue => "overdue",
        }
    }

    fn admits(&self, status: &DerivedStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Unpaid => !status.is_paid,
            StatusFilter::Paid => status.is_paid,
            StatusFilter::Unsent => !status.is_sent,
            StatusFilter::Sent => status.is_sent,
            StatusFilter::Overdue => status.is_overdue,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "unpaid" => Ok(StatusFilter::Unpaid),
            "paid" => Ok(StatusFilter::Paid),
            "unsent" => Ok(StatusFilter::Unsent),
            "sent" => Ok(StatusFilter::Sent),
            "overdue" => Ok(StatusFilter::Overdue),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "sendDate_asc")]
    SendDateAsc,
    #[serde(rename = "sendDate_desc")]
    SendDateDesc,
    #[serde(rename = "dueDate_asc")]
    DueDateAsc,
    #[serde(rename = "dueDate_desc")]
    DueDateDesc,
    #[serde(rename = "issueDate_desc")]
    IssueDateDesc,
    #[serde(rename = "amount_desc")]
    AmountDesc,
    #[serde(rename = "amount_asc")]
    AmountAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::SendDateAsc,
        SortKey::SendDateDesc,
        SortKey::DueDateAsc,
        SortKey::DueDateDesc,
        SortKey::IssueDateDesc,
        SortKey::AmountDesc,
        SortKey::AmountAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::SendDateAsc => "sendDate_asc",
            SortKey::SendDateDesc => "sendDate_desc",
            SortKey::DueDateAsc => "dueDate_asc",
            SortKey::DueDateDesc => "dueDate_desc",
            SortKey::IssueDateDesc => "issueDate_desc",
            SortKey::AmountDesc => "amount_desc",
            SortKey::AmountAsc => "amount_asc",
        }
    }

    /// Unrecognized names sort by send date, ascending.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    fn compare(&self, a: &Invoice, b: &Invoice) -> Ordering {
        match self {
            SortKey::SendDateAsc => a.send_date.cmp(&b.send_date),
            SortKey::SendDateDesc => b.send_date.cmp(&a.send_date),
            SortKey::DueDateAsc => a.due_date.cmp(&b.due_date),
            SortKey::DueDateDesc => b.due_date.cmp(&a.due_date),
            SortKey::IssueDateDesc => b.issue_date.cmp(&a.issue_date),
            SortKey::AmountDesc => b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal),
            SortKey::AmountAsc => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active filter values. `None` for shop or location means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub query: String,
    pub status: StatusFilter,
    pub shop: Option<String>,
    pub location: Option<String>,
}

impl FilterSpec {
    /// Reads a category selector where `"all"` (or nothing) means no restriction.
    pub fn category_choice(raw: Option<&str>) -> Option<String> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty() && *s != "all")
            .map(str::to_string)
    }

    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }
}

/// Produces the visible, ordered subset of `invoices`.
///
/// Filters apply in order: free text, shop and location, status. The sort is
/// stable, so invoices equal under `sort` keep their input order. The result
/// borrows from `invoices`, which is left untouched.
pub fn apply_filters<'a>(
    invoices: &'a [Invoice],
    spec: &FilterSpec,
    sort: SortKey,
    today: &str,
) -> Vec<&'a Invoice> {
    let query = spec.query.trim().to_lowercase();

    let mut list: Vec<&Invoice> = invoices
        .iter()
        .filter(|inv| query.is_empty() || inv.search_blob().contains(&query))
        .filter(|inv| spec.shop.as_deref().is_none_or(|shop| inv.shop == shop))
        .filter(|inv| spec.location.as_deref().is_none_or(|loc| inv.location == loc))
        .filter(|inv| spec.status.admits(&DerivedStatus::evaluate(inv, today)))
        .collect();

    list.sort_by(|a, b| sort.compare(a, b));
    list
}
