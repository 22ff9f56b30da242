use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::ScheduleConfig;

/// Hours during which the job acts. `start_hour > end_hour` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Window {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour: start_hour % 24,
            end_hour: end_hour % 24,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            self.start_hour <= hour && hour < self.end_hour
        }
    }

    /// Last hourly run before the window closes.
    pub fn is_final_hour(&self, hour: u32) -> bool {
        hour == (self.end_hour + 23) % 24
    }
}

impl From<ScheduleConfig> for Window {
    fn from(c: ScheduleConfig) -> Self {
        Self::new(c.start_hour, c.end_hour)
    }
}

/// Wall-clock time in `tz`, daylight saving included.
pub fn local_time(now: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    now.with_timezone(&tz)
}

pub fn local_hour(now: DateTime<Utc>, tz: Tz) -> u32 {
    local_time(now, tz).hour()
}
