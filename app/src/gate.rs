/// At-most-once-per-day debounce for the "invoices to send today" check.
///
/// Not a scheduler: it is consulted once when a session starts, and the
/// caller persists [`DailyNotificationGate::last_run_day`] afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyNotificationGate {
    last_run_day: String,
}

impl DailyNotificationGate {
    pub fn new(last_run_day: impl Into<String>) -> Self {
        Self {
            last_run_day: last_run_day.into(),
        }
    }

    pub fn last_run_day(&self) -> &str {
        &self.last_run_day
    }

    pub fn should_run_today(&mut self, today: &str) -> bool {
        if self.last_run_day == today {
            return false;
        }
        self.last_run_day = today.to_string();
        true
    }
}
