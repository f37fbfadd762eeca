use time::{format_description::well_known::Rfc3339, macros::format_description, Date, Duration, OffsetDateTime};

pub fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn today_ymd() -> String {
    format_ymd(OffsetDateTime::now_utc().date())
}

pub fn format_ymd(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

pub fn parse_ymd(input: &str) -> Option<Date> {
    Date::parse(input, format_description!("[year]-[month]-[day]")).ok()
}

/// True only for zero-padded `YYYY-MM-DD` strings naming a real calendar day.
/// Lexicographic date comparison elsewhere depends on this shape.
pub fn is_canonical_ymd(input: &str) -> bool {
    input.len() == 10 && parse_ymd(input).is_some_and(|d| format_ymd(d) == input)
}

pub fn add_days(ymd: &str, days: i64) -> Option<String> {
    parse_ymd(ymd)
        .and_then(|d| d.checked_add(Duration::days(days)))
        .map(format_ymd)
}
