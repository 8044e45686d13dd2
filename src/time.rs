//! Time-of-day accessors and the hour codec.
//!
//! The hours register (and both alarm hour registers) holds either a 24-hour
//! value in six bits or a 12-hour value in five bits plus a PM flag, selected
//! by bit 6. Bit 7 belongs to the alarm mask in the alarm registers. The pure
//! functions here decode any of these layouts to 0-23 and re-encode a value
//! while keeping the mode and bit 7.

use embedded_hal::i2c::I2c;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::debug;
use crate::registers::{
    Hours, RegAddr, RegisterByte, TimeRepresentation, HOURS_12_MASK, HOURS_24_MASK,
    HOUR_MODE_BIT, MINUTES_MASK, PM_BIT, SECONDS_MASK,
};
use crate::{bcd, DS3231Error, DS3231};

/// Seconds, minutes and hours as last read from the device.
///
/// Hours are always in 24-hour form regardless of the register's mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeFields {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
}

impl TimeFields {
    /// Decodes the seconds, minutes and hours registers, in bus order.
    pub(crate) fn from_registers(raw: &[u8]) -> Self {
        Self {
            seconds: decode_seconds(raw[0]),
            minutes: decode_minutes(raw[1]),
            hours: decode_hours(raw[2]),
        }
    }
}

pub(crate) const fn decode_seconds(raw: u8) -> u8 {
    bcd::decode(raw & SECONDS_MASK)
}

pub(crate) const fn decode_minutes(raw: u8) -> u8 {
    bcd::decode(raw & MINUTES_MASK)
}

pub(crate) const fn encode_seconds(seconds: u8) -> u8 {
    bcd::encode(seconds & SECONDS_MASK)
}

pub(crate) const fn encode_minutes(minutes: u8) -> u8 {
    bcd::encode(minutes & MINUTES_MASK)
}

const fn twelve_to_twenty_four(hour: u8, pm: bool) -> u8 {
    match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, false) => hour,
        (hour, true) => hour + 12,
    }
}

const fn twenty_four_to_twelve(hour: u8) -> (u8, bool) {
    let twelve = hour % 12;
    (if twelve == 0 { 12 } else { twelve }, hour >= 12)
}

/// Decodes an hours register in either mode to 0-23.
pub(crate) fn decode_hours(raw: u8) -> u8 {
    let hours = Hours(raw);
    match hours.time_representation() {
        TimeRepresentation::TwentyFourHour => bcd::decode(raw & HOURS_24_MASK),
        TimeRepresentation::TwelveHour => {
            twelve_to_twenty_four(bcd::decode(raw & HOURS_12_MASK), hours.pm_or_twenty_hours())
        }
    }
}

/// Replaces the hour stored in `prior` with `hour` (0-23), encoded for the
/// register's current mode. The mode bit and bit 7 are kept.
pub(crate) fn with_hour(prior: u8, hour: u8) -> u8 {
    let field = match Hours(prior).time_representation() {
        TimeRepresentation::TwentyFourHour => bcd::encode(hour & HOURS_24_MASK),
        TimeRepresentation::TwelveHour => {
            let (twelve, pm) = twenty_four_to_twelve(hour);
            RegisterByte(bcd::encode(twelve & HOURS_12_MASK))
                .with_bit(PM_BIT, pm)
                .value()
        }
    };
    // bits 5..0 are the PM/20-hour bit and the digits in both modes
    RegisterByte(prior).with_field(HOURS_24_MASK, field).value()
}

/// Converts an hours register to `mode`, re-encoding the stored hour.
/// Returns `None` when the register is already in `mode`.
pub(crate) fn with_hour_mode(prior: u8, mode: TimeRepresentation) -> Option<u8> {
    if Hours(prior).time_representation() == mode {
        return None;
    }
    let hour = decode_hours(prior);
    let switched = RegisterByte(prior).with_bit(HOUR_MODE_BIT, mode == TimeRepresentation::TwelveHour);
    Some(with_hour(switched.value(), hour))
}

impl<I2C: I2c> DS3231<I2C> {
    /// Reads the seconds (0-59).
    pub fn seconds(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let seconds = self.read_register(RegAddr::Seconds).map(decode_seconds);
        self.time.seconds = *seconds.as_ref().unwrap_or(&0);
        seconds
    }

    /// Reads the minutes (0-59).
    pub fn minutes(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let minutes = self.read_register(RegAddr::Minutes).map(decode_minutes);
        self.time.minutes = *minutes.as_ref().unwrap_or(&0);
        minutes
    }

    /// Reads the hours as a 24-hour value (0-23), whatever the register's mode.
    pub fn hours(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let hours = self.read_register(RegAddr::Hours).map(decode_hours);
        self.time.hours = *hours.as_ref().unwrap_or(&0);
        hours
    }

    /// Reads the 12/24-hour mode of the hours register.
    pub fn hour_mode(&mut self) -> Result<TimeRepresentation, DS3231Error<I2C::Error>> {
        Ok(Hours(self.read_register(RegAddr::Hours)?).time_representation())
    }

    pub fn set_seconds(&mut self, seconds: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.write_register(RegAddr::Seconds, encode_seconds(seconds))
    }

    pub fn set_minutes(&mut self, minutes: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.write_register(RegAddr::Minutes, encode_minutes(minutes))
    }

    /// Sets the hours from a 24-hour value, encoded in the register's current
    /// mode. In 12-hour mode the PM bit is set or cleared to match.
    pub fn set_hours(&mut self, hours: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(RegAddr::Hours, |prior| with_hour(prior, hours))?;
        Ok(())
    }

    /// Switches the hours register between 12- and 24-hour mode, converting
    /// the stored hour. Returns `false` without writing when the register is
    /// already in `mode`.
    pub fn set_hour_mode(
        &mut self,
        mode: TimeRepresentation,
    ) -> Result<bool, DS3231Error<I2C::Error>> {
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("DS3231: hour mode -> {:?}", mode);
        self.update_register(RegAddr::Hours, |prior| with_hour_mode(prior, mode))
    }

    /// Reads seconds, minutes and hours in one transfer.
    pub fn read_time(&mut self) -> Result<TimeFields, DS3231Error<I2C::Error>> {
        let mut data = [0; 3];
        if let Err(e) = self.read_registers(RegAddr::Seconds, &mut data) {
            self.time = TimeFields::default();
            return Err(e);
        }
        self.time = TimeFields::from_registers(&data);
        Ok(self.time)
    }

    /// Sets seconds, minutes and hours in that order, stopping at the first
    /// failure.
    pub fn set_time(
        &mut self,
        seconds: u8,
        minutes: u8,
        hours: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.set_seconds(seconds)?;
        self.set_minutes(minutes)?;
        self.set_hours(hours)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use crate::testing::{mock, read, write, FakeDs3231};
    use alloc::vec;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::Transaction as I2cTrans;

    #[test]
    fn test_decode_hours_24_hour() {
        assert_eq!(decode_hours(0x00), 0);
        assert_eq!(decode_hours(0x09), 9);
        assert_eq!(decode_hours(0x14), 14);
        assert_eq!(decode_hours(0x23), 23);
        // Alarm mask bit is not part of the value
        assert_eq!(decode_hours(0x80 | 0x23), 23);
    }

    #[test]
    fn test_decode_hours_12_hour() {
        assert_eq!(decode_hours(0x52), 0); // 12 AM
        assert_eq!(decode_hours(0x41), 1); // 1 AM
        assert_eq!(decode_hours(0x51), 11); // 11 AM
        assert_eq!(decode_hours(0x72), 12); // 12 PM
        assert_eq!(decode_hours(0x61), 13); // 1 PM
        assert_eq!(decode_hours(0x71), 23); // 11 PM
        assert_eq!(decode_hours(0xC8), 8); // masked alarm register, 8 AM
    }

    #[test]
    fn test_hour_round_trip_in_both_modes() {
        for hour in 0..24 {
            let twelve = with_hour(0x40, hour);
            assert_eq!(
                Hours(twelve).time_representation(),
                TimeRepresentation::TwelveHour
            );
            assert_eq!(decode_hours(twelve), hour, "12-hour round trip for {}", hour);

            let twenty_four = with_hour(0x00, hour);
            assert_eq!(decode_hours(twenty_four), hour, "24-hour round trip for {}", hour);
        }
    }

    #[test]
    fn test_with_hour_keeps_mode_and_mask_bits() {
        assert_eq!(with_hour(0x00, 14), 0x14);
        assert_eq!(with_hour(0x40, 0), 0x52);
        // PM cleared when moving to a morning hour
        assert_eq!(with_hour(0x72, 9), 0x49);
        // Alarm mask survives in both modes
        assert_eq!(with_hour(0x80, 7), 0x87);
        assert_eq!(with_hour(0xC0, 18), 0xE6);
    }

    #[test]
    fn test_with_hour_mode_converts_magnitude() {
        assert_eq!(
            with_hour_mode(0x23, TimeRepresentation::TwelveHour),
            Some(0x71)
        );
        assert_eq!(
            with_hour_mode(0x71, TimeRepresentation::TwentyFourHour),
            Some(0x23)
        );
        assert_eq!(
            with_hour_mode(0x52, TimeRepresentation::TwentyFourHour),
            Some(0x00)
        );
        assert_eq!(
            with_hour_mode(0x80 | 0x15, TimeRepresentation::TwelveHour),
            Some(0xE3)
        );
        assert_eq!(with_hour_mode(0x14, TimeRepresentation::TwentyFourHour), None);
        assert_eq!(with_hour_mode(0x52, TimeRepresentation::TwelveHour), None);
    }

    #[test]
    fn test_set_hours_24_hour_mode() {
        let mut dev = mock(&[read(RegAddr::Hours, 0x00), write(RegAddr::Hours, 0x14)]);
        dev.set_hours(14).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_hours_midnight_in_12_hour_mode() {
        let mut dev = mock(&[read(RegAddr::Hours, 0x61), write(RegAddr::Hours, 0x52)]);
        dev.set_hours(0).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_hours_aborts_when_read_fails() {
        let mut dev = mock(&[read(RegAddr::Hours, 0x00).with_error(ErrorKind::Other)]);
        assert!(matches!(
            dev.set_hours(5),
            Err(DS3231Error::I2c {
                register: RegAddr::Hours,
                ..
            })
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_getters_cache_and_zero_on_failure() {
        let mut dev = mock(&[
            read(RegAddr::Seconds, 0x45),
            read(RegAddr::Minutes, 0x30),
            read(RegAddr::Hours, 0x61),
            read(RegAddr::Minutes, 0x00).with_error(ErrorKind::Other),
        ]);
        assert_eq!(dev.seconds().unwrap(), 45);
        assert_eq!(dev.minutes().unwrap(), 30);
        assert_eq!(dev.hours().unwrap(), 13);
        assert_eq!(
            dev.cached_time(),
            TimeFields {
                seconds: 45,
                minutes: 30,
                hours: 13
            }
        );

        assert!(dev.minutes().is_err());
        assert_eq!(dev.cached_time().minutes, 0);
        assert_eq!(dev.cached_time().seconds, 45);
        dev.i2c.done();
    }

    #[test]
    fn test_set_seconds_and_minutes_encode_bcd() {
        let mut dev = mock(&[write(RegAddr::Seconds, 0x59), write(RegAddr::Minutes, 0x07)]);
        dev.set_seconds(59).unwrap();
        dev.set_minutes(7).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_hour_mode_writes_only_on_change() {
        let mut dev = mock(&[
            read(RegAddr::Hours, 0x23),
            write(RegAddr::Hours, 0x71),
            read(RegAddr::Hours, 0x71),
        ]);
        assert!(dev.set_hour_mode(TimeRepresentation::TwelveHour).unwrap());
        assert!(!dev.set_hour_mode(TimeRepresentation::TwelveHour).unwrap());
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_burst() {
        let mut dev = mock(&[I2cTrans::write_read(
            crate::DEVICE_ADDRESS,
            vec![RegAddr::Seconds.offset()],
            vec![0x05, 0x59, 0x72],
        )]);
        let time = dev.read_time().unwrap();
        assert_eq!(
            time,
            TimeFields {
                seconds: 5,
                minutes: 59,
                hours: 12
            }
        );
        assert_eq!(dev.cached_time(), time);
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_stops_at_first_failure() {
        let mut dev = mock(&[
            write(RegAddr::Seconds, 0x10),
            write(RegAddr::Minutes, 0x20).with_error(ErrorKind::Other),
        ]);
        assert!(matches!(
            dev.set_time(10, 20, 5),
            Err(DS3231Error::I2c {
                register: RegAddr::Minutes,
                ..
            })
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_hour_writes_preserve_register_bits() {
        let fake = FakeDs3231::with_registers(&[(RegAddr::Hours, 0x52)]);
        let mut dev = DS3231::new(fake);

        dev.set_hours(17).unwrap();
        assert_eq!(dev.hours().unwrap(), 17);
        assert_eq!(dev.hour_mode().unwrap(), TimeRepresentation::TwelveHour);

        dev.set_hour_mode(TimeRepresentation::TwentyFourHour).unwrap();
        assert_eq!(dev.hours().unwrap(), 17);
        assert_eq!(dev.release().get(RegAddr::Hours), 0x17);
    }

    #[test]
    fn test_set_time_round_trip() {
        let mut dev = DS3231::new(FakeDs3231::default());
        dev.set_time(42, 8, 23).unwrap();
        assert_eq!(
            dev.read_time().unwrap(),
            TimeFields {
                seconds: 42,
                minutes: 8,
                hours: 23
            }
        );
    }
}
