//! Market-local time helpers.
//!
//! The operator publishes interval timestamps and document names in Irish
//! wall-clock time. Interval starts are kept as [`MarketTime`]: Europe/Dublin
//! wall clock together with the UTC offset in force, so the two 01:00 intervals
//! of the autumn fall-back day stay distinct.
//! - [`market_local`]: convert an injected UTC "now" into market wall clock.
//! - [`parse_interval_start`]: accept the timestamp spellings seen across report
//!   vintages; offset-qualified values keep their instant.
//! - [`floor_to_minutes`], [`floor_market_time`]: day-aligned bucket start.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

/// Time zone of the Irish single electricity market.
pub const MARKET_TZ: Tz = chrono_tz::Europe::Dublin;

/// Naive spellings accepted for `START_TIME`, tried in order.
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Dublin wall clock plus the offset in force at that instant.
pub type MarketTime = DateTime<FixedOffset>;

/// UTC instant -> market wall clock.
pub fn market_local(now: DateTime<Utc>) -> NaiveDateTime {
    now.with_timezone(&MARKET_TZ).naive_local()
}

/// Today's date in the market time zone.
pub fn market_today(now: DateTime<Utc>) -> NaiveDate {
    market_local(now).date()
}

/// Attaches the Dublin offset to a wall-clock time.
///
/// A time repeated by the autumn fall-back resolves to its first (summer time)
/// occurrence. A time skipped by the spring change does not exist and yields
/// `None`.
pub fn localize(naive: NaiveDateTime) -> Option<MarketTime> {
    MARKET_TZ
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// Parses an interval timestamp into a [`MarketTime`].
///
/// Offset-qualified values keep their instant and are re-expressed in Dublin
/// time. Naive values are read as Dublin wall clock. Returns `None` for blank
/// or unrecognized text; the caller drops such rows.
pub fn parse_interval_start(raw: &str) -> Option<MarketTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&MARKET_TZ).fixed_offset());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(localize)
}

/// Start of the `minutes`-wide bucket containing `ts`, aligned to midnight.
pub fn floor_to_minutes(ts: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    let width = minutes.max(1) * 60;
    let secs = i64::from(ts.time().num_seconds_from_midnight());
    ts.date().and_time(chrono::NaiveTime::MIN) + Duration::seconds(secs - secs.rem_euclid(width))
}

/// [`floor_to_minutes`] on the wall clock, keeping the timestamp's offset.
pub fn floor_market_time(ts: MarketTime, minutes: i64) -> MarketTime {
    let wall = ts.naive_local();
    ts - (wall - floor_to_minutes(wall, minutes))
}
