//! Active trading window

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Hours during which recurring topic collaborations may fire
///
/// Expressed in UTC; the default covers the US cash session on weekdays.
/// The window is half-open: `[open_hour, close_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub weekdays_only: bool,
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self {
            weekdays_only: true,
            open_hour: 13,
            close_hour: 21,
        }
    }
}

impl ActiveWindow {
    /// Whether the given instant falls inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if self.weekdays_only && at.weekday().number_from_monday() > 5 {
            return false;
        }
        let hour = at.hour();
        hour >= self.open_hour && hour < self.close_hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn test_weekday_inside_hours() {
        let window = ActiveWindow::default();
        // 2024-06-05 is a Wednesday
        assert!(window.contains(at(2024, 6, 5, 14)));
        assert!(window.contains(at(2024, 6, 5, 13)));
    }

    #[test]
    fn test_close_hour_is_exclusive() {
        let window = ActiveWindow::default();
        assert!(!window.contains(at(2024, 6, 5, 21)));
        assert!(!window.contains(at(2024, 6, 5, 3)));
    }

    #[test]
    fn test_weekends_are_excluded() {
        let window = ActiveWindow::default();
        // 2024-06-08 is a Saturday
        assert!(!window.contains(at(2024, 6, 8, 14)));

        let always = ActiveWindow {
            weekdays_only: false,
            ..ActiveWindow::default()
        };
        assert!(always.contains(at(2024, 6, 8, 14)));
    }
}
