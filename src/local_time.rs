use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::resolver::TimezoneResolver;
use crate::store::RingSource;
use crate::types::Point;

/// Source of per-day astronomical events (sunrise, moon phase, ...).
///
/// Computing those is outside this crate; callers plug in their own.
pub trait Ephemeris {
    type Events;

    /// Events for the day containing `at`, as seen from `point`.
    /// `timezone` is `None` when the point resolved to no zone.
    fn events(&self, timezone: Option<&str>, point: Point, at: Timestamp) -> Self::Events;
}

/// Ephemeris events for the day before, the day of and the day after `at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayWindow<E> {
    pub previous: E,
    pub current: E,
    pub next: E,
}

/// Local wall-clock report for a point at an instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalTimeInfo<E> {
    pub point: Point,
    /// Resolved IANA id. `None` means unknown; times are then given in UTC.
    pub timezone: Option<String>,
    pub timestamp: i64,
    /// `%Y-%m-%d %H:%M:%S %Z`
    pub local_time: String,
    pub utc_offset_seconds: i32,
    pub days: DayWindow<E>,
}

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Resolve `point` and describe the instant `at` in its local time.
pub fn local_time_info<S, P>(
    resolver: &TimezoneResolver<S>,
    point: Point,
    at: Timestamp,
    ephemeris: &P,
) -> Result<LocalTimeInfo<P::Events>>
where
    S: RingSource,
    P: Ephemeris,
{
    let timezone = resolver.resolve(point)?.into_timezone_id();
    let tz = match &timezone {
        Some(id) => TimeZone::get(id)?,
        None => TimeZone::UTC,
    };

    let zoned = at.to_zoned(tz);
    let local_time = zoned.strftime(LOCAL_TIME_FORMAT).to_string();
    let utc_offset_seconds = zoned.offset().seconds();
    debug!(
        timezone = timezone.as_deref().unwrap_or("UTC"),
        local_time = %local_time,
        "Local time derived"
    );

    let day = SignedDuration::from_hours(24);
    let previous = at.checked_sub(day)?;
    let next = at.checked_add(day)?;
    let tz_id = timezone.as_deref();
    let days = DayWindow {
        previous: ephemeris.events(tz_id, point, previous),
        current: ephemeris.events(tz_id, point, at),
        next: ephemeris.events(tz_id, point, next),
    };

    Ok(LocalTimeInfo {
        point,
        timezone,
        timestamp: at.as_second(),
        local_time,
        utc_offset_seconds,
        days,
    })
}
