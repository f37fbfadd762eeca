//! JSON export/import, the one persisted compatibility surface.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model::{CategoryKind, InvoiceDraft, Snapshot};
use crate::validation::validate_invoice;

pub const EXPORT_APP: &str = "LuciDataFact";
pub const EXPORT_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: String,
    pub app: String,
    pub version: String,
    pub data: Snapshot,
}

impl ExportDocument {
    pub fn new(data: Snapshot, exported_at: String) -> Self {
        Self {
            exported_at,
            app: EXPORT_APP.to_string(),
            version: EXPORT_VERSION.to_string(),
            data,
        }
    }
}

/// Accepted import shapes: the export envelope, or the bare data object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Envelope { data: Snapshot },
    Bare(Snapshot),
}

pub fn export_document(data: Snapshot, exported_at: String) -> AppResult<String> {
    serde_json::to_string_pretty(&ExportDocument::new(data, exported_at))
        .map_err(|e| AppError::Store(e.into()))
}

pub fn export_file_name(today: &str) -> String {
    format!("{EXPORT_APP}_export_{today}.json")
}

/// Parses and checks an import payload without touching any store. Either
/// every invoice is acceptable and the whole snapshot is returned, or the
/// import is refused.
///
/// Accepted invoices are normalized to the paid invariant: a paid record
/// without a paid date gets `today`, an unpaid one loses date and reference.
pub fn parse_import(text: &str, today: &str) -> AppResult<Snapshot> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| AppError::ImportFormat(format!("invalid JSON: {e}")))?;

    let has_envelope = value.get("data").is_some_and(|d| d.is_object());
    let root = if has_envelope { &value["data"] } else { &value };
    if root.get("categories").is_none() || !root.get("invoices").is_some_and(|i| i.is_array()) {
        return Err(AppError::ImportFormat(
            "expected an object with `categories` and an `invoices` array".to_string(),
        ));
    }

    let payload: ImportPayload = serde_json::from_value(value)
        .map_err(|e| AppError::ImportFormat(format!("invalid structure: {e}")))?;
    let mut snapshot = match payload {
        ImportPayload::Envelope { data } => data,
        ImportPayload::Bare(data) => data,
    };

    let mut seen = std::collections::HashSet::new();
    for (i, inv) in snapshot.invoices.iter().enumerate() {
        if inv.id.trim().is_empty() {
            return Err(AppError::ImportFormat(format!("invoice #{i} has no id")));
        }
        if !seen.insert(inv.id.as_str()) {
            return Err(AppError::ImportFormat(format!("duplicate invoice id {}", inv.id)));
        }
        validate_invoice(&InvoiceDraft::from(inv))
            .map_err(|e| AppError::ImportFormat(format!("invoice {} ({}): {e}", inv.number, inv.id)))?;
        for (kind, name) in [(CategoryKind::Shop, &inv.shop), (CategoryKind::Location, &inv.location)] {
            if !snapshot.categories.contains(kind, name) {
                return Err(AppError::ImportFormat(format!(
                    "invoice {} ({}): {kind} \"{name}\" is not among the imported categories",
                    inv.number, inv.id
                )));
            }
        }
    }

    for inv in &mut snapshot.invoices {
        inv.enforce_paid_invariant(today);
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: &str = "2026-01-05";

    const BARE: &str = r#"{
        "categories": { "shops": ["Depozit Central"], "locations": ["Ilfov"] },
        "invoices": [{
            "id": "inv_1", "number": "LDF-2026-003", "client": "Distribuitor XYZ",
            "shop": "Depozit Central", "location": "Ilfov",
            "issueDate": "2025-12-16", "sendDate": "2025-12-17", "dueDate": "2025-12-31",
            "amount": 7600, "currency": "RON", "sent": true, "paid": true,
            "paidDate": "2026-01-01", "paidRef": "OP #10492", "notes": "Încasată."
        }]
    }"#;

    #[test]
    fn bare_and_enveloped_payloads_are_accepted() {
        let bare = parse_import(BARE, TODAY).unwrap();
        let wrapped = format!(r#"{{"exportedAt":"2026-01-05T10:00:00Z","app":"LuciDataFact","version":"v1","data":{BARE}}}"#);
        assert_eq!(parse_import(&wrapped, TODAY).unwrap(), bare);
        assert_eq!(bare.invoices[0].paid_ref.as_deref(), Some("OP #10492"));
    }

    #[test]
    fn export_then_import_round_trips() {
        let snapshot = parse_import(BARE, TODAY).unwrap();
        let text = export_document(snapshot.clone(), "2026-01-05T10:00:00Z".to_string()).unwrap();
        assert_eq!(parse_import(&text, TODAY).unwrap(), snapshot);
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        for bad in ["not json", "{}", r#"{"categories":{},"invoices":{}}"#, r#"{"data":{"invoices":[]}}"#] {
            assert!(matches!(parse_import(bad, TODAY), Err(AppError::ImportFormat(_))), "{bad}");
        }
    }

    #[test]
    fn one_invalid_invoice_rejects_everything() {
        let broken = BARE.replace(r#""amount": 7600"#, r#""amount": 0"#);
        assert!(matches!(parse_import(&broken, TODAY), Err(AppError::ImportFormat(_))));
    }

    #[test]
    fn invoice_outside_imported_categories_rejects_everything() {
        let stray_shop = BARE.replace(r#""shop": "Depozit Central""#, r#""shop": "Magazin Fantoma""#);
        assert!(matches!(parse_import(&stray_shop, TODAY), Err(AppError::ImportFormat(_))));

        let stray_location = BARE.replace(r#""location": "Ilfov""#, r#""location": "Cluj""#);
        assert!(matches!(parse_import(&stray_location, TODAY), Err(AppError::ImportFormat(_))));
    }

    #[test]
    fn paid_without_date_gets_today() {
        let text = BARE.replace(r#""paidDate": "2026-01-01""#, r#""paidDate": """#);
        let snapshot = parse_import(&text, TODAY).unwrap();
        let inv = &snapshot.invoices[0];
        assert!(inv.paid);
        assert_eq!(inv.paid_date.as_deref(), Some(TODAY));
        assert_eq!(inv.paid_ref.as_deref(), Some("OP #10492"));
    }

    #[test]
    fn unpaid_record_drops_payment_details() {
        let text = BARE.replace(r#""paid": true"#, r#""paid": false"#);
        let snapshot = parse_import(&text, TODAY).unwrap();
        let inv = &snapshot.invoices[0];
        assert!(!inv.paid);
        assert_eq!(inv.paid_date, None);
        assert_eq!(inv.paid_ref, None);
    }

    #[test]
    fn unknown_invoice_fields_are_rejected() {
        let extra = BARE.replace(r#""notes": "Încasată.""#, r#""notes": "x", "vat": 19"#);
        assert!(matches!(parse_import(&extra, TODAY), Err(AppError::ImportFormat(_))));
    }

    #[test]
    fn file_name_carries_the_day() {
        assert_eq!(export_file_name("2026-01-05"), "LuciDataFact_export_2026-01-05.json");
    }
}
