//! Mutable date node with calendar accessors.
//!
//! Setters follow calendar-overflow rules: out-of-range components roll into
//! the neighbouring unit (month 12 becomes January of the next year, day 0 the
//! last day of the previous month). Local variants use the process time zone.

use super::Node;
use crate::error::{Result, StoreError};
use chrono::{
    Datelike, Duration, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc,
};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy)]
enum Zone {
    Local,
    Utc,
}

/// Broken-down calendar time. `month` is zero-based.
#[derive(Clone, Copy)]
struct Parts {
    year: i64,
    month: i64,
    day: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
    millis: i64,
}

impl Parts {
    const EPOCH: Parts = Parts {
        year: 1970,
        month: 0,
        day: 1,
        hours: 0,
        minutes: 0,
        seconds: 0,
        millis: 0,
    };

    fn from_naive(ndt: NaiveDateTime) -> Self {
        Self {
            year: ndt.year() as i64,
            month: ndt.month0() as i64,
            day: ndt.day() as i64,
            hours: ndt.hour() as i64,
            minutes: ndt.minute() as i64,
            seconds: ndt.second() as i64,
            millis: (ndt.nanosecond() / 1_000_000) as i64,
        }
    }

    fn to_naive(self) -> Option<NaiveDateTime> {
        let total_months = self.year.checked_mul(12)?.checked_add(self.month)?;
        let year = i32::try_from(total_months.div_euclid(12)).ok()?;
        let month = total_months.rem_euclid(12) as u32 + 1;
        let base = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
        let offset = (self.day - 1)
            .checked_mul(86_400_000)?
            .checked_add(self.hours.checked_mul(3_600_000)?)?
            .checked_add(self.minutes.checked_mul(60_000)?)?
            .checked_add(self.seconds.checked_mul(1_000)?)?
            .checked_add(self.millis)?;
        base.checked_add_signed(Duration::milliseconds(offset))
    }
}

/// Shared handle to a point in time (milliseconds since the Unix epoch).
#[derive(Clone)]
pub struct Date(pub(crate) Arc<Node<i64>>);

impl Date {
    pub fn from_millis(millis: i64) -> Self {
        Self(Node::new(millis))
    }

    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    /// Build from UTC calendar components (`month` is zero-based).
    pub fn from_utc(year: i64, month: i64, day: i64, hours: i64, minutes: i64) -> Result<Self> {
        let parts = Parts {
            year,
            month,
            day,
            hours,
            minutes,
            seconds: 0,
            millis: 0,
        };
        let millis = to_millis(parts, Zone::Utc)
            .ok_or_else(|| StoreError::InvalidDate(format!("{}-{}-{}", year, month + 1, day)))?;
        Ok(Self::from_millis(millis))
    }

    /// Parse an RFC 3339 timestamp.
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self::from_millis(dt.timestamp_millis()))
    }

    pub fn get_time(&self) -> i64 {
        *self.0.read()
    }

    pub fn to_iso_string(&self) -> String {
        Self::iso(self.get_time())
    }

    fn iso(millis: i64) -> String {
        match Utc.timestamp_millis_opt(millis).single() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => "Invalid Date".to_string(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.0.is_frozen()
    }

    /// Freeze this date: every mutator fails afterwards.
    pub fn freeze(&self) {
        self.0.freeze();
    }

    pub fn ptr_eq(&self, other: &Date) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // --- Getters ---

    pub fn get_full_year(&self) -> i64 {
        self.parts(Zone::Local).year
    }

    pub fn get_month(&self) -> i64 {
        self.parts(Zone::Local).month
    }

    pub fn get_date(&self) -> i64 {
        self.parts(Zone::Local).day
    }

    pub fn get_hours(&self) -> i64 {
        self.parts(Zone::Local).hours
    }

    pub fn get_minutes(&self) -> i64 {
        self.parts(Zone::Local).minutes
    }

    pub fn get_seconds(&self) -> i64 {
        self.parts(Zone::Local).seconds
    }

    pub fn get_milliseconds(&self) -> i64 {
        self.parts(Zone::Local).millis
    }

    pub fn get_utc_full_year(&self) -> i64 {
        self.parts(Zone::Utc).year
    }

    pub fn get_utc_month(&self) -> i64 {
        self.parts(Zone::Utc).month
    }

    pub fn get_utc_date(&self) -> i64 {
        self.parts(Zone::Utc).day
    }

    /// Day of the week in UTC, 0 = Sunday.
    pub fn get_utc_day(&self) -> i64 {
        naive(self.get_time(), Zone::Utc)
            .map(|ndt| ndt.weekday().num_days_from_sunday() as i64)
            .unwrap_or(0)
    }

    pub fn get_utc_hours(&self) -> i64 {
        self.parts(Zone::Utc).hours
    }

    pub fn get_utc_minutes(&self) -> i64 {
        self.parts(Zone::Utc).minutes
    }

    pub fn get_utc_seconds(&self) -> i64 {
        self.parts(Zone::Utc).seconds
    }

    pub fn get_utc_milliseconds(&self) -> i64 {
        self.parts(Zone::Utc).millis
    }

    // --- Mutators ---

    pub fn set_time(&self, millis: i64) -> Result<i64> {
        let mut slot = self.0.write(|millis| read_only_message(*millis))?;
        *slot = millis;
        Ok(millis)
    }

    pub fn set_full_year(&self, year: i64) -> Result<i64> {
        self.mutate(Zone::Local, |p| p.year = year)
    }

    pub fn set_month(&self, month: i64) -> Result<i64> {
        self.mutate(Zone::Local, |p| p.month = month)
    }

    pub fn set_date(&self, day: i64) -> Result<i64> {
        self.mutate(Zone::Local, |p| p.day = day)
    }

    pub fn set_hours(&self, hours: i64) -> Result<i64> {
        self.mutate(Zone::Local, |p| p.hours = hours)
    }

    pub fn set_minutes(&self, minutes: i64) -> Result<i64> {
        self.mutate(Zone::Local, |p| p.minutes = minutes)
    }

    pub fn set_seconds(&self, seconds: i64) -> Result<i64> {
        self.mutate(Zone::Local, |p| p.seconds = seconds)
    }

    pub fn set_milliseconds(&self, millis: i64) -> Result<i64> {
        self.mutate(Zone::Local, |p| p.millis = millis)
    }

    pub fn set_utc_full_year(&self, year: i64) -> Result<i64> {
        self.mutate(Zone::Utc, |p| p.year = year)
    }

    pub fn set_utc_month(&self, month: i64) -> Result<i64> {
        self.mutate(Zone::Utc, |p| p.month = month)
    }

    pub fn set_utc_date(&self, day: i64) -> Result<i64> {
        self.mutate(Zone::Utc, |p| p.day = day)
    }

    pub fn set_utc_hours(&self, hours: i64) -> Result<i64> {
        self.mutate(Zone::Utc, |p| p.hours = hours)
    }

    pub fn set_utc_minutes(&self, minutes: i64) -> Result<i64> {
        self.mutate(Zone::Utc, |p| p.minutes = minutes)
    }

    pub fn set_utc_seconds(&self, seconds: i64) -> Result<i64> {
        self.mutate(Zone::Utc, |p| p.seconds = seconds)
    }

    pub fn set_utc_milliseconds(&self, millis: i64) -> Result<i64> {
        self.mutate(Zone::Utc, |p| p.millis = millis)
    }

    fn parts(&self, zone: Zone) -> Parts {
        naive(self.get_time(), zone)
            .map(Parts::from_naive)
            .unwrap_or(Parts::EPOCH)
    }

    fn mutate(&self, zone: Zone, apply: impl FnOnce(&mut Parts)) -> Result<i64> {
        let mut slot = self.0.write(|millis| read_only_message(*millis))?;
        let current = naive(*slot, zone)
            .ok_or_else(|| StoreError::InvalidDate(format!("timestamp {} out of range", *slot)))?;
        let mut parts = Parts::from_naive(current);
        apply(&mut parts);
        let millis = to_millis(parts, zone)
            .ok_or_else(|| StoreError::InvalidDate("component out of range".into()))?;
        *slot = millis;
        Ok(millis)
    }
}

fn read_only_message(millis: i64) -> String {
    format!("date \"{}\" is read only", Date::iso(millis))
}

fn naive(millis: i64, zone: Zone) -> Option<NaiveDateTime> {
    let utc = Utc.timestamp_millis_opt(millis).single()?;
    Some(match zone {
        Zone::Utc => utc.naive_utc(),
        Zone::Local => utc.with_timezone(&Local).naive_local(),
    })
}

fn to_millis(parts: Parts, zone: Zone) -> Option<i64> {
    let ndt = parts.to_naive()?;
    match zone {
        Zone::Utc => Some(Utc.from_utc_datetime(&ndt).timestamp_millis()),
        Zone::Local => Local
            .from_local_datetime(&ndt)
            .earliest()
            .map(|dt| dt.timestamp_millis()),
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date({})", self.to_iso_string())
    }
}
