//! Calendar date-time shared by the RTC, the time source and the display.
//!
//! Only the range a PCF8563 can hold (1900-2099) is representable; every
//! constructor validates its fields so a `DateTime` is always a real instant.

// Calendar arithmetic below works on values bounded by the validated
// 1900..=2099 range, so none of the i64 operations can overflow.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

/// First year the RTC can store.
pub const MIN_YEAR: u16 = 1900;
/// Last year the RTC can store.
pub const MAX_YEAR: u16 = 2099;

const SECS_PER_DAY: i64 = 86_400;

/// Wall-clock date and time, second resolution, no time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

/// Rejected calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// Year outside 1900..=2099
    Year,
    /// Month outside 1..=12
    Month,
    /// Day outside the month
    Day,
    /// Hour, minute or second out of range
    Time,
}

#[cfg(feature = "std")]
impl std::error::Error for DateTimeError {}

impl core::fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Year => write!(f, "Year outside {MIN_YEAR}..={MAX_YEAR}"),
            Self::Month => write!(f, "Month outside 1..=12"),
            Self::Day => write!(f, "Day outside month"),
            Self::Time => write!(f, "Time of day out of range"),
        }
    }
}

/// Whether `year` is a Gregorian leap year.
pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` of `year`; `0` for an invalid month.
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl DateTime {
    /// Validate and build a date-time.
    pub const fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, DateTimeError> {
        if year < MIN_YEAR || year > MAX_YEAR {
            return Err(DateTimeError::Year);
        }
        if month < 1 || month > 12 {
            return Err(DateTimeError::Month);
        }
        if day < 1 || day > days_in_month(year, month) {
            return Err(DateTimeError::Day);
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(DateTimeError::Time);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Calendar date-time of a Unix timestamp, or `None` outside 1900-2099.
    pub fn from_unix(secs: i64) -> Option<Self> {
        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY);

        // Howard Hinnant's civil_from_days.
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = doy - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = yoe + era * 400 + i64::from(month <= 2);

        if year < i64::from(MIN_YEAR) || year > i64::from(MAX_YEAR) {
            return None;
        }

        Self::new(
            year as u16,
            month as u8,
            day as u8,
            (rem / 3600) as u8,
            (rem % 3600 / 60) as u8,
            (rem % 60) as u8,
        )
        .ok()
    }

    /// Seconds since the Unix epoch.
    pub fn to_unix(&self) -> i64 {
        let m = i64::from(self.month);
        let y = i64::from(self.year) - i64::from(m <= 2);
        let era = y.div_euclid(400);
        let yoe = y - era * 400;
        let mp = if m > 2 { m - 3 } else { m + 9 };
        let doy = (153 * mp + 2) / 5 + i64::from(self.day) - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        let days = era * 146_097 + doe - 719_468;

        days * SECS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// Day of week, `0` = Sunday.
    pub fn weekday(&self) -> u8 {
        // 1970-01-01 was a Thursday.
        (self.to_unix().div_euclid(SECS_PER_DAY) + 4).rem_euclid(7) as u8
    }

    /// Calendar year
    pub const fn year(&self) -> u16 {
        self.year
    }
    /// Month, 1-12
    pub const fn month(&self) -> u8 {
        self.month
    }
    /// Day of month, 1-31
    pub const fn day(&self) -> u8 {
        self.day
    }
    /// Hour, 0-23
    pub const fn hour(&self) -> u8 {
        self.hour
    }
    /// Minute, 0-59
    pub const fn minute(&self) -> u8 {
        self.minute
    }
    /// Second, 0-59
    pub const fn second(&self) -> u8 {
        self.second
    }
}

/// `YYYY/MM/DD HH:MM:SS`
impl core::fmt::Display for DateTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_1970_01_01() {
        let dt = DateTime::from_unix(0).unwrap();
        assert_eq!(dt, DateTime::new(1970, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(dt.weekday(), 4);
    }

    #[test]
    fn known_timestamp_converts() {
        // 2024-02-29 12:34:56 UTC
        let dt = DateTime::from_unix(1_709_210_096).unwrap();
        assert_eq!(dt, DateTime::new(2024, 2, 29, 12, 34, 56).unwrap());
        assert_eq!(dt.to_unix(), 1_709_210_096);
    }

    #[test]
    fn pre_epoch_dates_are_supported() {
        let dt = DateTime::new(1969, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(dt.to_unix(), -1);
        assert_eq!(DateTime::from_unix(-1), Some(dt));
    }

    #[test]
    fn out_of_rtc_range_is_rejected() {
        assert_eq!(DateTime::new(2100, 1, 1, 0, 0, 0), Err(DateTimeError::Year));
        // 2100-01-01 00:00:00 UTC
        assert_eq!(DateTime::from_unix(4_102_444_800), None);
    }

    #[test]
    fn invalid_fields_are_rejected() {
        assert_eq!(DateTime::new(2023, 2, 29, 0, 0, 0), Err(DateTimeError::Day));
        assert_eq!(DateTime::new(2023, 13, 1, 0, 0, 0), Err(DateTimeError::Month));
        assert_eq!(DateTime::new(2023, 1, 1, 24, 0, 0), Err(DateTimeError::Time));
    }

    #[test]
    fn display_matches_dashboard_format() {
        let dt = DateTime::new(2022, 1, 1, 12, 0, 0).unwrap();
        let mut buf = heapless::String::<32>::new();
        core::fmt::write(&mut buf, format_args!("{dt}")).unwrap();
        assert_eq!(buf.as_str(), "2022/01/01 12:00:00");
    }

    #[test]
    fn century_leap_rules() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2024));
        assert_eq!(days_in_month(1900, 2), 28);
    }
}
