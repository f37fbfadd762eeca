use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_CURRENCY: &str = "RON";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Legacy files store an unpaid invoice's payment fields as `""`.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub client: String,
    pub shop: String,
    pub location: String,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub send_date: String,
    #[serde(default)]
    pub due_date: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub sent: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub paid_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub paid_ref: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl Invoice {
    /// paid => paidDate set; unpaid => paidDate and paidRef cleared.
    pub fn enforce_paid_invariant(&mut self, fallback_day: &str) {
        if self.paid {
            if self.paid_date.is_none() {
                self.paid_date = Some(fallback_day.to_string());
            }
        } else {
            self.paid_date = None;
            self.paid_ref = None;
        }
    }

    pub fn references(&self, kind: CategoryKind, name: &str) -> bool {
        match kind {
            CategoryKind::Shop => self.shop == name,
            CategoryKind::Location => self.location == name,
        }
    }

    /// Text searched by the free-text filter.
    pub fn search_blob(&self) -> String {
        [
            self.number.as_str(),
            self.client.as_str(),
            self.shop.as_str(),
            self.location.as_str(),
            self.notes.as_str(),
            self.paid_ref.as_deref().unwrap_or(""),
        ]
        .join(" ")
        .to_lowercase()
    }
}

/// A candidate invoice as the entry form produces it, before validation.
///
/// `amount` stays the raw text so the validation rule can apply its
/// "non-numeric counts as zero" reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub number: String,
    pub client: String,
    pub shop: String,
    pub location: String,
    pub issue_date: String,
    pub send_date: String,
    pub due_date: String,
    pub amount: String,
    pub sent: bool,
    pub paid: bool,
    #[serde(default)]
    pub paid_date: String,
    #[serde(default)]
    pub paid_ref: String,
    #[serde(default)]
    pub notes: String,
}

pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

impl InvoiceDraft {
    /// The "new invoice" form: issued and sent today, due in 14 days.
    pub fn new_for_day(today: &str, categories: &Categories) -> Self {
        Self {
            shop: categories.shops.first().cloned().unwrap_or_default(),
            location: categories.locations.first().cloned().unwrap_or_default(),
            issue_date: today.to_string(),
            send_date: today.to_string(),
            due_date: crate::dates::add_days(today, 14).unwrap_or_else(|| today.to_string()),
            ..Self::default()
        }
    }

    pub fn parsed_amount(&self) -> f64 {
        parse_amount(&self.amount)
    }

    /// Trims the free-text fields the way the entry form does.
    pub fn trimmed(mut self) -> Self {
        self.number = self.number.trim().to_string();
        self.client = self.client.trim().to_string();
        self.paid_ref = self.paid_ref.trim().to_string();
        self.notes = self.notes.trim().to_string();
        self
    }

    pub(crate) fn into_invoice(self, id: String, today: &str) -> Invoice {
        let amount = self.parsed_amount();
        let paid_date = if self.paid && !self.paid_date.trim().is_empty() {
            Some(self.paid_date)
        } else {
            None
        };
        let paid_ref = if self.paid && !self.paid_ref.trim().is_empty() {
            Some(self.paid_ref)
        } else {
            None
        };
        let mut invoice = Invoice {
            id,
            number: self.number,
            client: self.client,
            shop: self.shop,
            location: self.location,
            issue_date: self.issue_date,
            send_date: self.send_date,
            due_date: self.due_date,
            amount,
            currency: default_currency(),
            sent: self.sent,
            paid: self.paid,
            paid_date,
            paid_ref,
            notes: self.notes,
        };
        invoice.enforce_paid_invariant(today);
        invoice
    }
}

impl From<&Invoice> for InvoiceDraft {
    fn from(inv: &Invoice) -> Self {
        Self {
            number: inv.number.clone(),
            client: inv.client.clone(),
            shop: inv.shop.clone(),
            location: inv.location.clone(),
            issue_date: inv.issue_date.clone(),
            send_date: inv.send_date.clone(),
            due_date: inv.due_date.clone(),
            amount: inv.amount.to_string(),
            sent: inv.sent,
            paid: inv.paid,
            paid_date: inv.paid_date.clone().unwrap_or_default(),
            paid_ref: inv.paid_ref.clone().unwrap_or_default(),
            notes: inv.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    pub number: Option<String>,
    pub client: Option<String>,
    pub shop: Option<String>,
    pub location: Option<String>,
    pub issue_date: Option<String>,
    pub send_date: Option<String>,
    pub due_date: Option<String>,
    pub amount: Option<f64>,
    pub sent: Option<bool>,
    pub paid: Option<bool>,
    pub paid_date: Option<Option<String>>,
    pub paid_ref: Option<Option<String>>,
    pub notes: Option<String>,
}

impl InvoicePatch {
    /// A patch overwriting every mutable field with `inv`'s values.
    pub fn replace_with(inv: &Invoice) -> Self {
        Self {
            number: Some(inv.number.clone()),
            client: Some(inv.client.clone()),
            shop: Some(inv.shop.clone()),
            location: Some(inv.location.clone()),
            issue_date: Some(inv.issue_date.clone()),
            send_date: Some(inv.send_date.clone()),
            due_date: Some(inv.due_date.clone()),
            amount: Some(inv.amount),
            sent: Some(inv.sent),
            paid: Some(inv.paid),
            paid_date: Some(inv.paid_date.clone()),
            paid_ref: Some(inv.paid_ref.clone()),
            notes: Some(inv.notes.clone()),
        }
    }

    pub fn apply(&self, existing: &mut Invoice, fallback_day: &str) {
        if let Some(v) = &self.number {
            existing.number = v.clone();
        }
        if let Some(v) = &self.client {
            existing.client = v.clone();
        }
        if let Some(v) = &self.shop {
            existing.shop = v.clone();
        }
        if let Some(v) = &self.location {
            existing.location = v.clone();
        }
        if let Some(v) = &self.issue_date {
            existing.issue_date = v.clone();
        }
        if let Some(v) = &self.send_date {
            existing.send_date = v.clone();
        }
        if let Some(v) = &self.due_date {
            existing.due_date = v.clone();
        }
        if let Some(v) = self.amount {
            existing.amount = v;
        }
        if let Some(v) = self.sent {
            existing.sent = v;
        }
        if let Some(v) = self.paid {
            existing.paid = v;
        }
        if let Some(v) = &self.paid_date {
            existing.paid_date = v.clone();
        }
        if let Some(v) = &self.paid_ref {
            existing.paid_ref = v.clone();
        }
        if let Some(v) = &self.notes {
            existing.notes = v.clone();
        }

        existing.enforce_paid_invariant(fallback_day);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Shop,
    Location,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Shop => "shop",
            CategoryKind::Location => "location",
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shop" | "shops" => Ok(CategoryKind::Shop),
            "location" | "locations" => Ok(CategoryKind::Location),
            other => Err(format!("unknown category kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Categories {
    pub shops: Vec<String>,
    pub locations: Vec<String>,
}

impl Categories {
    pub fn list(&self, kind: CategoryKind) -> &[String] {
        match kind {
            CategoryKind::Shop => &self.shops,
            CategoryKind::Location => &self.locations,
        }
    }

    pub(crate) fn list_mut(&mut self, kind: CategoryKind) -> &mut Vec<String> {
        match kind {
            CategoryKind::Shop => &mut self.shops,
            CategoryKind::Location => &mut self.locations,
        }
    }

    pub fn contains(&self, kind: CategoryKind, name: &str) -> bool {
        self.list(kind).iter().any(|c| c == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub enabled: bool,
    #[serde(default)]
    pub last_run_day: String,
}

/// Everything the store holds apart from the notification preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub categories: Categories,
    pub invoices: Vec<Invoice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Invoice {
        Invoice {
            id: "inv_1".to_string(),
            number: "LDF-2026-001".to_string(),
            client: "SC Exemplu SRL".to_string(),
            shop: "Depozit Central".to_string(),
            location: "Ilfov".to_string(),
            issue_date: "2026-01-01".to_string(),
            send_date: "2026-01-02".to_string(),
            due_date: "2026-01-15".to_string(),
            amount: 1250.5,
            currency: DEFAULT_CURRENCY.to_string(),
            sent: true,
            paid: true,
            paid_date: Some("2026-01-10".to_string()),
            paid_ref: Some("OP #10492".to_string()),
            notes: String::new(),
        }
    }

    #[test]
    fn legacy_empty_payment_fields_read_as_absent() {
        let json = r#"{
            "id": "inv_a", "number": "1", "client": "c", "shop": "s", "location": "l",
            "issueDate": "2026-01-01", "sendDate": "2026-01-01", "dueDate": "2026-01-02",
            "amount": 10, "currency": "RON", "sent": false, "paid": false,
            "paidDate": "", "paidRef": "", "notes": ""
        }"#;
        let inv: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(inv.paid_date, None);
        assert_eq!(inv.paid_ref, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["colour"] = serde_json::json!("red");
        assert!(serde_json::from_value::<Invoice>(value).is_err());
    }

    #[test]
    fn unpaying_clears_payment_fields() {
        let mut inv = sample();
        let patch = InvoicePatch {
            paid: Some(false),
            ..InvoicePatch::default()
        };
        patch.apply(&mut inv, "2026-01-20");
        assert!(!inv.paid);
        assert_eq!(inv.paid_date, None);
        assert_eq!(inv.paid_ref, None);
    }

    #[test]
    fn draft_paid_without_date_gets_today() {
        let draft = InvoiceDraft {
            paid: true,
            paid_ref: "OP 1".to_string(),
            amount: "12.5".to_string(),
            ..InvoiceDraft::default()
        };
        let inv = draft.into_invoice("inv_x".to_string(), "2026-03-01");
        assert_eq!(inv.paid_date.as_deref(), Some("2026-03-01"));
        assert_eq!(inv.paid_ref.as_deref(), Some("OP 1"));
        assert_eq!(inv.amount, 12.5);
    }

    #[test]
    fn draft_unpaid_drops_payment_fields() {
        let draft = InvoiceDraft {
            paid: false,
            paid_date: "2026-03-01".to_string(),
            paid_ref: "OP 1".to_string(),
            ..InvoiceDraft::default()
        };
        let inv = draft.into_invoice("inv_x".to_string(), "2026-03-02");
        assert_eq!(inv.paid_date, None);
        assert_eq!(inv.paid_ref, None);
    }

    #[test]
    fn amount_text_parses_leniently() {
        assert_eq!(parse_amount(" 12.50 "), 12.5);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }
}
