use chrono::{DateTime, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use squats::Clock;

use crate::cli::AppError;

/// Timezone that decides what "today" and "now" mean for the tracker
#[derive(Debug, Clone, Copy)]
pub(crate) enum Timezone {
    Local,
    Named(Tz),
}

impl Timezone {
    pub(crate) fn parse(value: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = value else {
            return Ok(Timezone::Local);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(Timezone::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(Timezone::Named(chrono_tz::UTC));
        }
        Tz::from_str(trimmed)
            .map(Timezone::Named)
            .map_err(|_| AppError::InvalidTimezone {
                input: trimmed.to_string(),
            })
    }

    /// Wall-clock time in this zone at the instant `utc`
    pub(crate) fn wall_clock(self, utc: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Timezone::Local => utc.with_timezone(&Local).naive_local(),
            Timezone::Named(tz) => utc.with_timezone(&tz).naive_local(),
        }
    }
}

impl Clock for Timezone {
    fn now(&self) -> NaiveDateTime {
        self.wall_clock(Utc::now())
    }
}
