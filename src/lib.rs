#![no_std]
//! # DS3231 register-level driver
//!
//! A `no_std` driver for the DS3231 real-time clock that works directly on the
//! chip's register map. It converts between the BCD-encoded hardware registers
//! and plain time, date, alarm and configuration values, and it never touches a
//! bit that the requested field does not own.
//!
//! ## Features
//!
//! - Per-field time and date accessors, with 12/24-hour conversion
//! - Burst date/time access through chrono's `NaiveDateTime`
//! - Both alarms: match modes, interrupt enables, flags and match fields
//! - Control and status bits, aging offset and temperature
//! - Optional logging through `log` or `defmt`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ds3231_driver::{Alarm, Alarm1Mode, DS3231, TimeRepresentation};
//!
//! let mut rtc = DS3231::new(i2c);
//! let report = rtc.init();
//! if !report.is_healthy() {
//!     // the device did not answer every step
//! }
//!
//! rtc.set_hour_mode(TimeRepresentation::TwelveHour)?;
//! rtc.set_hours(15)?;
//! assert_eq!(rtc.hours()?, 15);
//!
//! rtc.set_alarm1_mode(Alarm1Mode::MatchSeconds)?;
//! rtc.set_alarm1_seconds(30)?;
//! rtc.set_alarm_enabled(Alarm::One, true)?;
//! ```
//!
//! ## Cache
//!
//! The handle remembers the last time, date and temperature it observed, and
//! which register (if any) failed on the most recent bus access. A failed read
//! resets the affected cached fields to zero.

use embedded_hal::i2c::I2c;

cfg_if::cfg_if! {
    if #[cfg(feature = "log")] {
        #[allow(unused_imports)]
        pub(crate) use log::{debug, error};
    } else if #[cfg(feature = "defmt")] {
        #[allow(unused_imports)]
        pub(crate) use defmt::{debug, error};
    }
}

mod alarm;
pub mod bcd;
mod control;
mod date;
mod datetime;
mod registers;
mod time;

#[cfg(test)]
mod testing;

pub use alarm::{Alarm, Alarm1Mode, Alarm2Mode, RegisterPlan};
pub use control::{Config, InitReport};
pub use date::DateFields;
pub use datetime::DS3231DateTimeError;
pub use registers::{
    AgingOffset, AlarmDayDate, Control, DayDateSelect, Hours, InterruptControl, Oscillator,
    RegAddr, RegisterByte, SquareWaveFrequency, Status, Temperature, TemperatureFraction,
    TimeRepresentation, REGISTER_COUNT,
};
pub use time::TimeFields;

/// Fixed 7-bit I2C address of the DS3231.
pub const DEVICE_ADDRESS: u8 = 0x68;

/// Error type for DS3231 operations.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DS3231Error<I2CE> {
    /// The transport failed while accessing `register`.
    I2c {
        /// First register of the failed access
        register: RegAddr,
        /// Error reported by the transport
        error: I2CE,
    },
    /// Register contents do not form a valid calendar date/time.
    DateTime(DS3231DateTimeError),
    /// A burst of `len` registers starting at `start` runs past the register map.
    OutOfRange {
        /// First register of the burst
        start: RegAddr,
        /// Number of registers requested
        len: usize,
    },
}

impl<I2CE> From<DS3231DateTimeError> for DS3231Error<I2CE> {
    fn from(e: DS3231DateTimeError) -> Self {
        DS3231Error::DateTime(e)
    }
}

/// DS3231 Real-Time Clock driver.
///
/// Owns the transport and a cache of the last observed time, date and
/// temperature. Accessors are grouped by concern: time, date, date/time,
/// alarms and control.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
    time: TimeFields,
    date: DateFields,
    temperature: i16,
    last_failure: Option<RegAddr>,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a new driver on `i2c`, talking to [`DEVICE_ADDRESS`].
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: DEVICE_ADDRESS,
            time: TimeFields::default(),
            date: DateFields::default(),
            temperature: 0,
            last_failure: None,
        }
    }

    /// Gives the transport back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Time fields from the most recent time read (hours in 24-hour form).
    pub fn cached_time(&self) -> TimeFields {
        self.time
    }

    /// Date fields from the most recent date read.
    pub fn cached_date(&self) -> DateFields {
        self.date
    }

    /// Temperature in hundredths of a degree Celsius from the most recent read.
    pub fn cached_temperature(&self) -> i16 {
        self.temperature
    }

    /// Register whose access failed on the most recent transport call, or
    /// `None` when that call succeeded.
    pub fn last_failure(&self) -> Option<RegAddr> {
        self.last_failure
    }

    pub(crate) fn reset_cache(&mut self) {
        self.time = TimeFields::default();
        self.date = DateFields::default();
        self.temperature = 0;
        self.last_failure = None;
    }

    /// Records the outcome of a transport call and maps its error.
    fn track<T>(
        &mut self,
        register: RegAddr,
        result: Result<T, I2C::Error>,
    ) -> Result<T, DS3231Error<I2C::Error>> {
        match result {
            Ok(value) => {
                self.last_failure = None;
                Ok(value)
            }
            Err(error) => {
                #[cfg(any(feature = "log", feature = "defmt"))]
                error!("DS3231: transport failure at {:?}", register);
                self.last_failure = Some(register);
                Err(DS3231Error::I2c { register, error })
            }
        }
    }

    fn check_span(register: RegAddr, len: usize) -> Result<(), DS3231Error<I2C::Error>> {
        if usize::from(register.offset()) + len > REGISTER_COUNT {
            return Err(DS3231Error::OutOfRange {
                start: register,
                len,
            });
        }
        Ok(())
    }

    pub(crate) fn read_register(&mut self, register: RegAddr) -> Result<u8, DS3231Error<I2C::Error>> {
        let mut data = [0];
        let result = self
            .i2c
            .write_read(self.address, &[register.offset()], &mut data);
        self.track(register, result)?;
        Ok(data[0])
    }

    /// Reads `buf.len()` consecutive registers starting at `start`.
    pub(crate) fn read_registers(
        &mut self,
        start: RegAddr,
        buf: &mut [u8],
    ) -> Result<(), DS3231Error<I2C::Error>> {
        Self::check_span(start, buf.len())?;
        let result = self.i2c.write_read(self.address, &[start.offset()], buf);
        self.track(start, result)
    }

    pub(crate) fn write_register(
        &mut self,
        register: RegAddr,
        value: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("DS3231: write {:?} <- {:#x}", register, value);
        let result = self.i2c.write(self.address, &[register.offset(), value]);
        self.track(register, result)
    }

    /// Writes `data` to consecutive registers starting at `start` in one transfer.
    pub(crate) fn write_registers(
        &mut self,
        start: RegAddr,
        data: &[u8],
    ) -> Result<(), DS3231Error<I2C::Error>> {
        Self::check_span(start, data.len())?;
        let mut frame = [0; REGISTER_COUNT + 1];
        frame[0] = start.offset();
        frame[1..=data.len()].copy_from_slice(data);
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("DS3231: burst write {} bytes at {:?}", data.len(), start);
        let result = self.i2c.write(self.address, &frame[..=data.len()]);
        self.track(start, result)
    }

    /// Read-modify-write that always writes. Returns the byte written.
    pub(crate) fn modify_register(
        &mut self,
        register: RegAddr,
        f: impl FnOnce(u8) -> u8,
    ) -> Result<u8, DS3231Error<I2C::Error>> {
        let value = f(self.read_register(register)?);
        self.write_register(register, value)?;
        Ok(value)
    }

    /// Read-modify-write that skips the write when `f` returns `None`.
    /// Returns whether a write happened.
    pub(crate) fn update_register(
        &mut self,
        register: RegAddr,
        f: impl FnOnce(u8) -> Option<u8>,
    ) -> Result<bool, DS3231Error<I2C::Error>> {
        match f(self.read_register(register)?) {
            Some(value) => {
                self.write_register(register, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
