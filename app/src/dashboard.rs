use serde::Serialize;

use crate::dates::add_days;
use crate::model::{Invoice, DEFAULT_CURRENCY};
use crate::status::DerivedStatus;

/// Days ahead that count as "due soon".
pub const DUE_SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub unpaid_count: usize,
    pub unpaid_sum: f64,
    pub to_send_today: usize,
    pub due_soon: usize,
    pub overdue: usize,
}

impl Dashboard {
    pub fn compute(invoices: &[Invoice], today: &str) -> Self {
        let soon = add_days(today, DUE_SOON_DAYS).unwrap_or_else(|| today.to_string());
        let mut out = Self::default();
        for inv in invoices {
            let st = DerivedStatus::evaluate(inv, today);
            if !st.is_paid {
                out.unpaid_count += 1;
                out.unpaid_sum += inv.amount;
                if inv.due_date.as_str() >= today && inv.due_date <= soon {
                    out.due_soon += 1;
                }
            }
            if st.is_due_today {
                out.to_send_today += 1;
            }
            if st.is_overdue {
                out.overdue += 1;
            }
        }
        out
    }
}

/// Romanian style: thousands '.', decimals ',' (e.g., 1.250,50 RON).
pub fn format_money(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut out = String::new();
    let chars: Vec<char> = int_part.chars().collect();
    let mut cnt = 0;
    for ch in chars.iter().rev() {
        if cnt == 3 {
            out.push('.');
            cnt = 0;
        }
        out.push(*ch);
        cnt += 1;
    }
    let int_with_sep: String = out.chars().rev().collect();
    let sign = if v < 0.0 && s != "0.00" { "-" } else { "" };
    format!("{sign}{int_with_sep},{dec_part} {DEFAULT_CURRENCY}")
}
