//! The µUTC/oUTC time model, daylight-change codes, and the timezone table (C2).
//!
//! `µUTC` is a signed 64-bit microsecond count since the Unix epoch. `oUTC`
//! ("offset µUTC") subtracts a per-session recording-time offset for weak
//! temporal obfuscation; [`apply_recording_time_offset`] and
//! [`remove_recording_time_offset`] are exact inverses of one another.

/// Sentinel: no timestamp entry.
pub const UUTC_NO_ENTRY: i64 = i64::MIN;
/// Sentinel: +infinity.
pub const UUTC_POSITIVE_INFINITY: i64 = i64::MAX;
/// Sentinel: -infinity.
pub const UUTC_NEGATIVE_INFINITY: i64 = 0;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;
const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;

/// Subtract the recording-time offset (µUTC → oUTC).
pub fn apply_recording_time_offset(uutc: i64, offset_seconds: i64) -> i64 {
    uutc - offset_seconds * MICROS_PER_SECOND
}

/// Add the recording-time offset back (oUTC → µUTC).
pub fn remove_recording_time_offset(outc: i64, offset_seconds: i64) -> i64 {
    outc + offset_seconds * MICROS_PER_SECOND
}

/// A daylight-change code: a union, on disk, of a signed 64-bit `value` and
/// an 8-byte packed struct. `value == 0` means DST is not observed for this
/// timezone; `value == -1` means no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaylightTimeChangeCode {
    /// -1 = DST end, 0 = not observed, +1 = DST start.
    pub code_type: i8,
    /// -1 = no entry, 0..6 = Sunday..Saturday.
    pub day_of_week: i8,
    /// 0 = no entry, 1..5 = first..fifth, 6 = last.
    pub relative_weekday_of_month: i8,
    /// 0 = no entry, 1..31.
    pub day_of_month: i8,
    /// -1 = no entry, 0..11 = January..December.
    pub month: i8,
    /// Hours relative to local midnight.
    pub hours_of_day: i8,
    /// 0 = local, 1 = UTC.
    pub reference_time: i8,
    /// Minutes, -120..120.
    pub shift_minutes: i8,
}

impl DaylightTimeChangeCode {
    pub const NOT_OBSERVED: i64 = 0;
    pub const NO_ENTRY: i64 = -1;

    /// Reinterpret the packed 8-byte union's `value` arm as the struct arm.
    pub fn from_raw(value: i64) -> Self {
        let bytes = value.to_le_bytes();
        DaylightTimeChangeCode {
            code_type: bytes[0] as i8,
            day_of_week: bytes[1] as i8,
            relative_weekday_of_month: bytes[2] as i8,
            day_of_month: bytes[3] as i8,
            month: bytes[4] as i8,
            hours_of_day: bytes[5] as i8,
            reference_time: bytes[6] as i8,
            shift_minutes: bytes[7] as i8,
        }
    }

    /// Reinterpret the struct arm back into the packed 8-byte union's `value` arm.
    pub fn to_raw(self) -> i64 {
        let bytes = [
            self.code_type as u8,
            self.day_of_week as u8,
            self.relative_weekday_of_month as u8,
            self.day_of_month as u8,
            self.month as u8,
            self.hours_of_day as u8,
            self.reference_time as u8,
            self.shift_minutes as u8,
        ];
        i64::from_le_bytes(bytes)
    }

    pub fn is_observed(self) -> bool {
        self.to_raw() != Self::NOT_OBSERVED && self.to_raw() != Self::NO_ENTRY
    }

    /// Resolve this code to a civil-calendar µUTC instant for the given year,
    /// assuming `reference_time == 0` (local) semantics are pre-applied by
    /// the caller (the engine works entirely in UTC arithmetic once the
    /// standard offset has been subtracted).
    fn resolve_instant_utc(self, year: i32, local_midnight_utc_offset_seconds: i64) -> Option<i64> {
        if !self.is_observed() {
            return None;
        }
        let day = if self.relative_weekday_of_month == 6 {
            last_weekday_of_month(year, self.month as u32 + 1, self.day_of_week as u32)
        } else {
            nth_weekday_of_month(
                year,
                self.month as u32 + 1,
                self.day_of_week as u32,
                self.relative_weekday_of_month as u32,
            )
        };
        let days_since_epoch = civil_to_days_since_epoch(year, self.month as u32 + 1, day);
        let local_seconds = days_since_epoch * 86_400 + i64::from(self.hours_of_day) * 3600;
        let shift = i64::from(self.shift_minutes) * 60;
        let utc_seconds = if self.reference_time == 1 {
            local_seconds + shift
        } else {
            local_seconds - local_midnight_utc_offset_seconds + shift
        };
        Some(utc_seconds * MICROS_PER_SECOND)
    }
}

/// A single entry of the global timezone table.
#[derive(Debug, Clone)]
pub struct TimezoneInfo {
    pub country: String,
    pub country_acronym_2_letter: String,
    pub country_acronym_3_letter: String,
    pub territory: String,
    pub territory_acronym: String,
    pub standard_timezone: String,
    pub standard_timezone_acronym: String,
    /// Seconds, east of UTC positive.
    pub standard_utc_offset: i32,
    pub daylight_timezone: String,
    pub daylight_timezone_acronym: String,
    pub daylight_time_start_code: DaylightTimeChangeCode,
    pub daylight_time_end_code: DaylightTimeChangeCode,
    /// Onset of the rule encoded above, in µUTC. `-1` means the only
    /// historical rule for this timezone in the table.
    pub daylight_codes_start_date: i64,
}

impl TimezoneInfo {
    /// Evaluate whether DST is in effect for the given µUTC instant, per
    /// this entry's start/end codes, returning the DST shift in seconds (`0`
    /// if not in effect).
    pub fn dst_offset_seconds(&self, uutc: i64) -> i32 {
        if !self.daylight_time_start_code.is_observed() || !self.daylight_time_end_code.is_observed() {
            return 0;
        }
        let seconds = uutc.div_euclid(MICROS_PER_SECOND);
        let year = year_of_unix_seconds(seconds, self.standard_utc_offset as i64);

        let start = self
            .daylight_time_start_code
            .resolve_instant_utc(year, self.standard_utc_offset as i64);
        let end = self
            .daylight_time_end_code
            .resolve_instant_utc(year, self.standard_utc_offset as i64);

        match (start, end) {
            (Some(start), Some(end)) if start < end => {
                if uutc >= start && uutc < end {
                    self.dst_shift_seconds()
                } else {
                    0
                }
            }
            // Southern-hemisphere style: DST spans the year boundary.
            (Some(start), Some(end)) => {
                if uutc >= start || uutc < end {
                    self.dst_shift_seconds()
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    fn dst_shift_seconds(&self) -> i32 {
        i64::from(self.daylight_time_start_code.shift_minutes) as i32 * 60
    }
}

/// An alias of a table entry by an alternate or colloquial name.
#[derive(Debug, Clone)]
pub struct TimezoneAlias {
    pub table_name: String,
    pub alias: String,
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => if is_leap_year(year) { 29 } else { 28 },
        _ => 30,
    }
}

/// Day-of-week (0=Sunday..6=Saturday) for a given civil date, via Zeller-like
/// arithmetic (Howard Hinnant's `weekday_from_days` days-since-epoch scheme).
fn weekday_of(year: i32, month: u32, day: u32) -> u32 {
    let days = civil_to_days_since_epoch(year, month, day);
    (days.rem_euclid(7) + 4) as u32 % 7 // 1970-01-01 was a Thursday (4)
}

/// The `n`th (1-indexed) occurrence of `weekday` in `month`/`year`.
fn nth_weekday_of_month(year: i32, month: u32, weekday: u32, n: u32) -> u32 {
    let first_weekday = weekday_of(year, month, 1);
    let offset = (weekday + 7 - first_weekday) % 7;
    1 + offset + 7 * (n.saturating_sub(1))
}

/// The last occurrence of `weekday` in `month`/`year`.
fn last_weekday_of_month(year: i32, month: u32, weekday: u32) -> u32 {
    let last_day = days_in_month(year, month);
    let last_weekday = weekday_of(year, month, last_day);
    let back = (last_weekday + 7 - weekday) % 7;
    last_day - back
}

/// Days since 1970-01-01 for a civil (proleptic Gregorian) date.
/// Algorithm: Howard Hinnant's `days_from_civil`.
fn civil_to_days_since_epoch(year: i32, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year as i64 - 1 } else { year as i64 };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64; // [0, 399]
    let mp = (month as i64 + 9) % 12; // [0, 11]
    let doy = (153 * mp + 2) / 5 + day as i64 - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146_097 + doe - 719_468
}

/// Civil (proleptic Gregorian) year containing the given local day count
/// since the epoch. Inverse of `civil_to_days_since_epoch`, Hinnant's
/// `civil_from_days`.
fn year_of_unix_seconds(seconds: i64, utc_offset_seconds: i64) -> i32 {
    let local_days = (seconds + utc_offset_seconds).div_euclid(86_400);
    let z = local_days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let m = if mp < 10 { mp + 3 } else { mp - 9 }; // [1, 12]
    (y + i64::from(m <= 2)) as i32
}

/// A small but real seed of the reference library's ~400-entry global
/// timezone table, covering the commonly exercised US/European zones. The
/// table is a plain data cache, not an algorithm, so it is represented as an
/// extensible `Vec` rather than the full historical rule set; `lookup`
/// degrades gracefully (returns `None`) for unseeded zones.
pub fn builtin_timezone_table() -> Vec<TimezoneInfo> {
    vec![
        TimezoneInfo {
            country: "United States".to_string(),
            country_acronym_2_letter: "US".to_string(),
            country_acronym_3_letter: "USA".to_string(),
            territory: "".to_string(),
            territory_acronym: "".to_string(),
            standard_timezone: "Eastern Standard Time".to_string(),
            standard_timezone_acronym: "EST".to_string(),
            standard_utc_offset: -18_000,
            daylight_timezone: "Eastern Daylight Time".to_string(),
            daylight_timezone_acronym: "EDT".to_string(),
            // 2nd Sunday of March, 02:00 local, shift +60 minutes.
            daylight_time_start_code: DaylightTimeChangeCode {
                code_type: 1,
                day_of_week: 0,
                relative_weekday_of_month: 2,
                day_of_month: 0,
                month: 2,
                hours_of_day: 2,
                reference_time: 0,
                shift_minutes: 60,
            },
            // 1st Sunday of November, 02:00 local.
            daylight_time_end_code: DaylightTimeChangeCode {
                code_type: -1,
                day_of_week: 0,
                relative_weekday_of_month: 1,
                day_of_month: 0,
                month: 10,
                hours_of_day: 2,
                reference_time: 0,
                shift_minutes: 60,
            },
            daylight_codes_start_date: -1,
        },
    ]
}

/// Find a timezone table entry by its standard acronym, double-checking the
/// supplied standard/DST offsets (seconds) against the table entry.
pub fn find_timezone_acronym<'a>(
    table: &'a [TimezoneInfo],
    acronym: &str,
    std_offset_seconds: i32,
) -> Option<&'a TimezoneInfo> {
    table
        .iter()
        .find(|tz| tz.standard_timezone_acronym == acronym && tz.standard_utc_offset == std_offset_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_exact_inverses() {
        let t = 1_700_000_000_000_000i64;
        assert_eq!(remove_recording_time_offset(apply_recording_time_offset(t, 12345), 12345), t);
    }

    #[test]
    fn dst_transition_new_york_2024() {
        let table = builtin_timezone_table();
        let ny = find_timezone_acronym(&table, "EST", -18_000).expect("seeded entry");

        // 2024-03-10T07:00:00Z is at/after the transition (02:00 EST == 07:00 UTC).
        let after = 1_710_054_000_000_000i64; // 2024-03-10T07:00:00Z
        assert_eq!(ny.dst_offset_seconds(after), 3600);

        let before = after - 1_000_000; // one second earlier
        assert_eq!(ny.dst_offset_seconds(before), 0);
    }

    #[test]
    fn day_of_week_matches_known_anchor() {
        // 1970-01-01 was a Thursday.
        assert_eq!(weekday_of(1970, 1, 1), 4);
        // 2024-03-10 was a Sunday.
        assert_eq!(weekday_of(2024, 3, 10), 0);
    }
}
