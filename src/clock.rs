//! Wall-clock capability.
//!
//! Everything that needs "now" (relative dates, TOTP windows, record
//! timestamps) takes a [`SharedClock`] instead of reading the system time.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn unix_time(&self) -> i64 {
        self.now().timestamp()
    }
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Local>,
}

impl FixedClock {
    pub fn new(at: DateTime<Local>) -> Self {
        Self { at }
    }

    /// Noon local time on the given day. Falls back to the UTC instant when
    /// the local zone has no unambiguous noon.
    pub fn on_date(year: i32, month: u32, day: u32) -> Self {
        let at = Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .unwrap_or_else(|| {
                Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
                    .single()
                    .map(|t| t.with_timezone(&Local))
                    .unwrap_or_else(Local::now)
            });
        Self { at }
    }

    pub fn at_unix(secs: i64) -> Self {
        let at = Utc
            .timestamp_opt(secs, 0)
            .single()
            .map(|t| t.with_timezone(&Local))
            .unwrap_or_else(Local::now);
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.at
    }
}
