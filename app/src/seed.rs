use crate::dates::add_days;
use crate::model::{Categories, Invoice, Snapshot, DEFAULT_CURRENCY};
use crate::store::new_invoice_id;

fn shifted(today: &str, days: i64) -> String {
    add_days(today, days).unwrap_or_else(|| today.to_string())
}

/// Demo data written on first run and by a full reset. Dates are relative to
/// `today`: one invoice to send today, one overdue, one paid.
pub fn demo_snapshot(today: &str) -> Snapshot {
    let categories = Categories {
        shops: vec![
            "Depozit Central".to_string(),
            "Magazin București 1".to_string(),
            "Magazin Constanța 1".to_string(),
        ],
        locations: vec![
            "București".to_string(),
            "Constanța".to_string(),
            "Ilfov".to_string(),
        ],
    };

    let invoices = vec![
        Invoice {
            id: new_invoice_id(),
            number: "LDF-2026-001".to_string(),
            client: "SC Exemplu SRL".to_string(),
            shop: "Magazin București 1".to_string(),
            location: "București".to_string(),
            issue_date: shifted(today, -3),
            send_date: today.to_string(),
            due_date: shifted(today, 10),
            amount: 1250.50,
            currency: DEFAULT_CURRENCY.to_string(),
            sent: false,
            paid: false,
            paid_date: None,
            paid_ref: None,
            notes: "De trimis azi, apoi urmărire încasare.".to_string(),
        },
        Invoice {
            id: new_invoice_id(),
            number: "LDF-2026-002".to_string(),
            client: "Company Retail SA".to_string(),
            shop: "Magazin Constanța 1".to_string(),
            location: "Constanța".to_string(),
            issue_date: shifted(today, -14),
            send_date: shifted(today, -12),
            due_date: shifted(today, -1),
            amount: 3890.0,
            currency: DEFAULT_CURRENCY.to_string(),
            sent: true,
            paid: false,
            paid_date: None,
            paid_ref: None,
            notes: "Întârziată, necesar reminder.".to_string(),
        },
        Invoice {
            id: new_invoice_id(),
            number: "LDF-2026-003".to_string(),
            client: "Distribuitor XYZ".to_string(),
            shop: "Depozit Central".to_string(),
            location: "Ilfov".to_string(),
            issue_date: shifted(today, -20),
            send_date: shifted(today, -19),
            due_date: shifted(today, -5),
            amount: 7600.0,
            currency: DEFAULT_CURRENCY.to_string(),
            sent: true,
            paid: true,
            paid_date: Some(shifted(today, -4)),
            paid_ref: Some("OP #10492".to_string()),
            notes: "Încasată.".to_string(),
        },
    ];

    Snapshot { categories, invoices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceDraft;
    use crate::status::DerivedStatus;
    use crate::validation::validate_invoice;

    #[test]
    fn demo_data_is_valid_and_covers_each_state() {
        let today = "2026-01-05";
        let snap = demo_snapshot(today);
        for inv in &snap.invoices {
            assert!(validate_invoice(&InvoiceDraft::from(inv)).is_ok(), "{}", inv.number);
            assert!(snap.categories.shops.contains(&inv.shop));
            assert!(snap.categories.locations.contains(&inv.location));
        }
        let st: Vec<DerivedStatus> = snap.invoices.iter().map(|i| DerivedStatus::evaluate(i, today)).collect();
        assert!(st[0].is_due_today);
        assert!(st[1].is_overdue);
        assert!(st[2].is_paid);
    }
}
