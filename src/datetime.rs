//! `NaiveDateTime` access to the seven timekeeping registers.
//!
//! The DS3231 stores date and time in 7 consecutive registers:
//! seconds, minutes, hours, day, date, month and year. Reads and writes here
//! move all seven in one transfer so the fields cannot roll over between
//! accesses.
//!
//! The year register holds two digits and is read as 2000-2099. The century
//! bit in the month register is carried through untouched.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use embedded_hal::i2c::I2c;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::{debug, error};
use crate::date::{encode_date, encode_day, with_month, DateFields};
use crate::registers::RegAddr;
use crate::time::{encode_minutes, encode_seconds, with_hour, TimeFields};
use crate::{bcd, DS3231Error, DS3231};

/// Raw contents of registers 0x00-0x06.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct DS3231DateTime([u8; 7]);

impl DS3231DateTime {
    /// Checks that `year` fits the two-digit year register and returns the
    /// register value (0-99).
    pub(crate) fn year_offset(year: i32) -> Result<u8, DS3231DateTimeError> {
        if year > 2099 {
            #[cfg(any(feature = "log", feature = "defmt"))]
            error!("Year {} is too late! must be before 2100", year);
            return Err(DS3231DateTimeError::YearNotBefore2100);
        }
        if year < 2000 {
            #[cfg(any(feature = "log", feature = "defmt"))]
            error!("Year {} is too early! must be greater than 1999", year);
            return Err(DS3231DateTimeError::YearNotAfter1999);
        }
        u8::try_from(year - 2000).map_err(|_| DS3231DateTimeError::InvalidDateTime)
    }

    /// Re-encodes every field of `prior` from `datetime`.
    ///
    /// The hours keep the mode already in the register, and the month keeps
    /// its century bit.
    pub(crate) fn from_datetime(
        prior: &DS3231DateTime,
        datetime: &NaiveDateTime,
    ) -> Result<Self, DS3231DateTimeError> {
        let year = Self::year_offset(datetime.year())?;
        let [_, _, hours, _, _, month, _] = prior.0;
        // chrono fields are bounded well inside u8
        let field = |value: u32| u8::try_from(value).map_err(|_| DS3231DateTimeError::InvalidDateTime);

        let raw = DS3231DateTime([
            encode_seconds(field(datetime.second())?),
            encode_minutes(field(datetime.minute())?),
            with_hour(hours, field(datetime.hour())?),
            encode_day(field(datetime.weekday().number_from_sunday())?),
            encode_date(field(datetime.day())?),
            with_month(month, field(datetime.month())?),
            bcd::encode(year),
        ]);

        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("raw={:?}", raw.0);

        Ok(raw)
    }

    pub(crate) fn time(&self) -> TimeFields {
        TimeFields::from_registers(&self.0[..3])
    }

    pub(crate) fn date(&self) -> DateFields {
        DateFields::from_registers(&self.0[3..])
    }

    pub(crate) fn into_datetime(self) -> Result<NaiveDateTime, DS3231DateTimeError> {
        let time = self.time();
        let date = self.date();
        NaiveDate::from_ymd_opt(
            2000 + i32::from(date.year),
            u32::from(date.month),
            u32::from(date.date),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(time.hours),
                u32::from(time.minutes),
                u32::from(time.seconds),
            )
        })
        .ok_or(DS3231DateTimeError::InvalidDateTime)
    }
}

impl From<[u8; 7]> for DS3231DateTime {
    fn from(data: [u8; 7]) -> Self {
        DS3231DateTime(data)
    }
}

impl From<&DS3231DateTime> for [u8; 7] {
    fn from(dt: &DS3231DateTime) -> [u8; 7] {
        dt.0
    }
}

/// Errors that can occur during DS3231 date/time conversion or validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DS3231DateTimeError {
    /// The registers do not hold a valid calendar date/time
    InvalidDateTime,
    /// The year is not before 2100 (the year register holds two digits)
    YearNotBefore2100,
    /// The year is not after 1999
    YearNotAfter1999,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Reads all seven timekeeping registers in one transfer.
    ///
    /// The time and date caches are updated even when the registers do not
    /// form a valid date.
    pub fn datetime(&mut self) -> Result<NaiveDateTime, DS3231Error<I2C::Error>> {
        let mut data = [0; 7];
        if let Err(e) = self.read_registers(RegAddr::Seconds, &mut data) {
            self.time = TimeFields::default();
            self.date = DateFields::default();
            return Err(e);
        }
        let raw = DS3231DateTime::from(data);
        self.time = raw.time();
        self.date = raw.date();
        Ok(raw.into_datetime()?)
    }

    /// Writes all seven timekeeping registers in one transfer.
    ///
    /// The current registers are read first so the hour mode and century bit
    /// survive. The day of week is written as 1-7 with Sunday as 1. Years
    /// outside 2000-2099 are rejected before any bus traffic.
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), DS3231Error<I2C::Error>> {
        DS3231DateTime::year_offset(datetime.year())?;
        let mut data = [0; 7];
        self.read_registers(RegAddr::Seconds, &mut data)?;
        let raw = DS3231DateTime::from_datetime(&DS3231DateTime::from(data), datetime)?;
        self.write_registers(RegAddr::Seconds, &<[u8; 7]>::from(&raw))
    }
}
