use crate::dates::is_canonical_ymd;
use crate::error::ValidationError;
use crate::model::InvoiceDraft;

/// The single acceptability rule for an invoice, shared by the create, edit
/// and import paths. Checks short-circuit in a fixed order.
pub fn validate_invoice(draft: &InvoiceDraft) -> Result<&InvoiceDraft, ValidationError> {
    let required: [(&'static str, &str); 7] = [
        ("number", &draft.number),
        ("client", &draft.client),
        ("issueDate", &draft.issue_date),
        ("sendDate", &draft.send_date),
        ("dueDate", &draft.due_date),
        ("shop", &draft.shop),
        ("location", &draft.location),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }

    let dates: [(&'static str, &str); 3] = [
        ("issueDate", &draft.issue_date),
        ("sendDate", &draft.send_date),
        ("dueDate", &draft.due_date),
    ];
    for (field, value) in dates {
        if !is_canonical_ymd(value) {
            return Err(ValidationError::InvalidDate(field));
        }
    }

    if draft.parsed_amount() <= 0.0 {
        return Err(ValidationError::InvalidAmount);
    }

    if draft.issue_date > draft.due_date {
        return Err(ValidationError::DateOrderViolation);
    }

    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> InvoiceDraft {
        InvoiceDraft {
            number: "LDF-2026-010".to_string(),
            client: "Distribuitor XYZ".to_string(),
            shop: "Depozit Central".to_string(),
            location: "Ilfov".to_string(),
            issue_date: "2026-01-01".to_string(),
            send_date: "2026-01-02".to_string(),
            due_date: "2026-01-15".to_string(),
            amount: "7600".to_string(),
            ..InvoiceDraft::default()
        }
    }

    #[test]
    fn accepts_and_returns_unchanged() {
        let d = valid();
        assert_eq!(validate_invoice(&d), Ok(&d));
    }

    #[test]
    fn blank_fields_are_reported_by_name() {
        let mut d = valid();
        d.client = "   ".to_string();
        assert_eq!(validate_invoice(&d), Err(ValidationError::MissingField("client")));

        let mut d = valid();
        d.location.clear();
        assert_eq!(validate_invoice(&d), Err(ValidationError::MissingField("location")));
    }

    #[test]
    fn first_failure_wins() {
        let mut d = valid();
        d.number.clear();
        d.amount = "0".to_string();
        d.issue_date = "2026-02-01".to_string();
        assert_eq!(validate_invoice(&d), Err(ValidationError::MissingField("number")));
    }

    #[test]
    fn amount_must_be_positive() {
        for raw in ["0", "-5", "abc", ""] {
            let mut d = valid();
            d.amount = raw.to_string();
            assert_eq!(validate_invoice(&d), Err(ValidationError::InvalidAmount), "amount {raw:?}");
        }
    }

    #[test]
    fn issue_after_due_is_rejected() {
        let mut d = valid();
        d.issue_date = "2026-01-16".to_string();
        assert_eq!(validate_invoice(&d), Err(ValidationError::DateOrderViolation));

        d.issue_date = d.due_date.clone();
        assert!(validate_invoice(&d).is_ok());
    }

    #[test]
    fn non_canonical_dates_are_rejected() {
        let mut d = valid();
        d.due_date = "2026-1-15".to_string();
        assert_eq!(validate_invoice(&d), Err(ValidationError::InvalidDate("dueDate")));
    }
}
