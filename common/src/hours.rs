use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest representable UTC offset, one minute short of a full day.
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Exchange session window, evaluated in exchange-local time
///
/// The offset is stored in minutes so the struct stays serializable;
/// the NSE session is 09:15-15:30 IST (UTC+05:30), Monday to Friday.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    /// Exchange UTC offset in minutes, east positive (IST = 330)
    pub utc_offset_minutes: i32,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            utc_offset_minutes: 330,
        }
    }
}

impl MarketHours {
    pub fn offset(&self) -> FixedOffset {
        let minutes = self.utc_offset_minutes.clamp(-MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES);
        FixedOffset::east_opt(minutes * 60).unwrap()
    }

    /// Converts an instant to exchange-local time.
    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset())
    }

    /// True when `now` falls on a weekday inside the session window.
    /// Both the open and the close minute count as inside.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let local = self.local_time(now);
        if local.weekday().number_from_monday() > 5 {
            return false;
        }
        let time = local.time();
        time >= self.open && time <= self.close
    }
}
