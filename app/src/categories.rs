use std::cmp::Ordering;

use crate::error::{AppError, AppResult};
use crate::model::{Categories, CategoryKind, Invoice};

/// Sort weights following the Romanian alphabet: case is ignored, ă and â
/// sort right after a (in that order), î after i, ș after s and ț after t.
/// Other accented Latin letters weigh the same as their base letter.
pub fn collation_key(input: &str) -> Vec<u32> {
    fn weight(base: char, variant: u32) -> u32 {
        u32::from(base) * 4 + variant
    }

    input
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            'ă' => weight('a', 1),
            'â' => weight('a', 2),
            'î' => weight('i', 1),
            'ș' | 'ş' => weight('s', 1),
            'ț' | 'ţ' => weight('t', 1),
            'á' | 'à' | 'ä' => weight('a', 0),
            'í' => weight('i', 0),
            'é' | 'ë' => weight('e', 0),
            'ó' | 'ö' => weight('o', 0),
            'ú' | 'ü' => weight('u', 0),
            other => weight(other, 0),
        })
        .collect()
}

pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

pub fn sort_collated(list: &mut [String]) {
    list.sort_by(|a, b| collate(a, b));
}

impl Categories {
    /// Adds a trimmed, non-empty, not-yet-present name and re-sorts the list.
    /// Returns the stored name.
    pub fn insert(&mut self, kind: CategoryKind, name: &str) -> AppResult<String> {
        let clean = name.trim();
        if clean.is_empty() {
            return Err(AppError::InvalidCategoryName(kind));
        }
        if self.contains(kind, clean) {
            return Err(AppError::DuplicateCategory {
                kind,
                name: clean.to_string(),
            });
        }
        let list = self.list_mut(kind);
        list.push(clean.to_string());
        sort_collated(list);
        Ok(clean.to_string())
    }

    /// Removes `name` unless an invoice still references it. On refusal the
    /// list is left exactly as it was.
    pub fn remove_unused(&mut self, kind: CategoryKind, name: &str, invoices: &[Invoice]) -> AppResult<()> {
        if invoices.iter().any(|inv| inv.references(kind, name)) {
            return Err(AppError::CategoryInUse {
                kind,
                name: name.to_string(),
            });
        }
        self.list_mut(kind).retain(|c| c != name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_CURRENCY;

    fn categories() -> Categories {
        Categories {
            shops: vec!["Depozit Central".to_string(), "Magazin București 1".to_string()],
            locations: vec!["București".to_string(), "Constanța".to_string(), "Ilfov".to_string()],
        }
    }

    fn invoice_in(location: &str) -> Invoice {
        Invoice {
            id: "inv_1".to_string(),
            number: "LDF-2026-003".to_string(),
            client: "Distribuitor XYZ".to_string(),
            shop: "Depozit Central".to_string(),
            location: location.to_string(),
            issue_date: "2026-01-01".to_string(),
            send_date: "2026-01-01".to_string(),
            due_date: "2026-01-10".to_string(),
            amount: 7600.0,
            currency: DEFAULT_CURRENCY.to_string(),
            sent: true,
            paid: false,
            paid_date: None,
            paid_ref: None,
            notes: String::new(),
        }
    }

    #[test]
    fn referenced_category_cannot_be_deleted() {
        let mut cats = categories();
        let before = cats.clone();
        let err = cats
            .remove_unused(CategoryKind::Location, "Ilfov", &[invoice_in("Ilfov")])
            .unwrap_err();
        assert!(matches!(err, AppError::CategoryInUse { kind: CategoryKind::Location, ref name } if name == "Ilfov"));
        assert_eq!(cats, before);
    }

    #[test]
    fn unused_category_is_removed() {
        let mut cats = categories();
        cats.remove_unused(CategoryKind::Location, "Constanța", &[invoice_in("Ilfov")])
            .unwrap();
        assert_eq!(cats.locations, vec!["București", "Ilfov"]);
    }

    #[test]
    fn insert_trims_and_keeps_collation_order() {
        let mut cats = categories();
        assert_eq!(cats.insert(CategoryKind::Location, "  Arad ").unwrap(), "Arad");
        cats.insert(CategoryKind::Location, "Cluj").unwrap();
        cats.insert(CategoryKind::Location, "ștei").unwrap();
        assert_eq!(
            cats.locations,
            vec!["Arad", "București", "Cluj", "Constanța", "Ilfov", "ștei"]
        );
    }

    #[test]
    fn romanian_letters_follow_their_base_letter() {
        let mut places: Vec<String> = ["Ștefănești", "Suceava", "Sibiu", "Țăndărei", "Tulcea"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_collated(&mut places);
        assert_eq!(places, vec!["Sibiu", "Suceava", "Ștefănești", "Tulcea", "Țăndărei"]);

        let mut words: Vec<String> = ["âzi", "azi", "ăzi", "bac"].iter().map(|s| s.to_string()).collect();
        sort_collated(&mut words);
        assert_eq!(words, vec!["azi", "ăzi", "âzi", "bac"]);
    }

    #[test]
    fn case_is_ignored_before_raw_order() {
        assert_eq!(collate("ilfov", "Ilfov"), "ilfov".cmp("Ilfov"));
        assert_eq!(collate("arad", "Brașov"), Ordering::Less);
        assert_eq!(collate("Brașov", "București"), Ordering::Less);
    }

    #[test]
    fn insert_rejects_blank_and_duplicate_names() {
        let mut cats = categories();
        assert!(matches!(
            cats.insert(CategoryKind::Shop, "   "),
            Err(AppError::InvalidCategoryName(CategoryKind::Shop))
        ));
        assert!(matches!(
            cats.insert(CategoryKind::Shop, "Depozit Central "),
            Err(AppError::DuplicateCategory { .. })
        ));
        assert_eq!(cats.shops.len(), 2);
    }
}
