use chrono::{Days, NaiveDate};

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// A window of `days` days ending the day before `today`.
    ///
    /// With the default 30 days this is `(today - 31, today - 1)`.
    pub fn ending_yesterday(today: NaiveDate, days: u32) -> Self {
        let end = today.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN);
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// `start-date` query parameter (`YYYY-MM-DD`).
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `end-date` query parameter (`YYYY-MM-DD`).
    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// Human-readable range, e.g. `1/2/2024 - 2/1/2024`.
    pub fn display(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%-m/%-d/%Y"),
            self.end.format("%-m/%-d/%Y")
        )
    }
}
