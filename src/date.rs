//! Calendar date accessors.

use embedded_hal::i2c::I2c;

use crate::registers::{RegAddr, RegisterByte, DATE_MASK, DAY_MASK, MONTH_MASK};
use crate::{bcd, DS3231Error, DS3231};

/// Day of week, date, month and two-digit year as last read from the device.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateFields {
    /// 1-7, meaning is up to the application
    pub day_of_week: u8,
    pub date: u8,
    pub month: u8,
    /// 0-99
    pub year: u8,
}

impl DateFields {
    /// Decodes the day, date, month and year registers, in bus order.
    pub(crate) fn from_registers(raw: &[u8]) -> Self {
        Self {
            day_of_week: decode_day(raw[0]),
            date: decode_date(raw[1]),
            month: decode_month(raw[2]),
            year: bcd::decode(raw[3]),
        }
    }
}

pub(crate) const fn decode_day(raw: u8) -> u8 {
    bcd::decode(raw & DAY_MASK)
}

pub(crate) const fn decode_date(raw: u8) -> u8 {
    bcd::decode(raw & DATE_MASK)
}

pub(crate) const fn decode_month(raw: u8) -> u8 {
    bcd::decode(raw & MONTH_MASK)
}

pub(crate) const fn encode_day(day: u8) -> u8 {
    bcd::encode(day & DAY_MASK)
}

pub(crate) const fn encode_date(date: u8) -> u8 {
    bcd::encode(date & DATE_MASK)
}

/// Replaces the month digits in `prior`, keeping the century bit.
pub(crate) const fn with_month(prior: u8, month: u8) -> u8 {
    RegisterByte(prior)
        .with_field(MONTH_MASK, bcd::encode(month & MONTH_MASK))
        .value()
}

impl<I2C: I2c> DS3231<I2C> {
    pub fn day_of_week(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let day = self.read_register(RegAddr::Day).map(decode_day);
        self.date.day_of_week = *day.as_ref().unwrap_or(&0);
        day
    }

    /// Reads the day of the month (1-31).
    pub fn date(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let date = self.read_register(RegAddr::Date).map(decode_date);
        self.date.date = *date.as_ref().unwrap_or(&0);
        date
    }

    /// Reads the month (1-12). The century bit is ignored.
    pub fn month(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let month = self.read_register(RegAddr::Month).map(decode_month);
        self.date.month = *month.as_ref().unwrap_or(&0);
        month
    }

    /// Reads the two-digit year (0-99).
    pub fn year(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let year = self.read_register(RegAddr::Year).map(bcd::decode);
        self.date.year = *year.as_ref().unwrap_or(&0);
        year
    }

    pub fn set_day_of_week(&mut self, day: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.write_register(RegAddr::Day, encode_day(day))
    }

    pub fn set_date(&mut self, date: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.write_register(RegAddr::Date, encode_date(date))
    }

    /// Sets the month. The century bit is read back and written unchanged.
    pub fn set_month(&mut self, month: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(RegAddr::Month, |prior| with_month(prior, month))?;
        Ok(())
    }

    pub fn set_year(&mut self, year: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.write_register(RegAddr::Year, bcd::encode(year))
    }

    /// Reads day of week, date, month and year in one transfer.
    pub fn read_date(&mut self) -> Result<DateFields, DS3231Error<I2C::Error>> {
        let mut data = [0; 4];
        if let Err(e) = self.read_registers(RegAddr::Day, &mut data) {
            self.date = DateFields::default();
            return Err(e);
        }
        self.date = DateFields::from_registers(&data);
        Ok(self.date)
    }

    /// Sets day of week, date, month and year in that order, stopping at the
    /// first failure.
    pub fn set_full_date(
        &mut self,
        day_of_week: u8,
        date: u8,
        month: u8,
        year: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.set_day_of_week(day_of_week)?;
        self.set_date(date)?;
        self.set_month(month)?;
        self.set_year(year)
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
    fn test_field_decoders_mask_control_bits() {
        assert_eq!(decode_day(0xF5), 5);
        assert_eq!(decode_date(0xF1), 31);
        assert_eq!(decode_month(0x92), 12);
    }

    #[test]
    fn test_with_month_keeps_century_bit() {
        assert_eq!(with_month(0x80 | 0x12, 3), 0x83);
        assert_eq!(with_month(0x01, 10), 0x10);
        // bits 6 and 5 are outside the month field too
        assert_eq!(with_month(0xE0, 9), 0xE9);
    }

    #[test]
    fn test_getters_decode_and_cache() {
        let mut dev = mock(&[
            read(RegAddr::Day, 0x03),
            read(RegAddr::Date, 0x28),
            read(RegAddr::Month, 0x82),
            read(RegAddr::Year, 0x24),
        ]);
        assert_eq!(dev.day_of_week().unwrap(), 3);
        assert_eq!(dev.date().unwrap(), 28);
        assert_eq!(dev.month().unwrap(), 2);
        assert_eq!(dev.year().unwrap(), 24);
        assert_eq!(
            dev.cached_date(),
            DateFields {
                day_of_week: 3,
                date: 28,
                month: 2,
                year: 24
            }
        );
        dev.i2c.done();
    }

    #[test]
    fn test_failed_getter_zeroes_cached_field() {
        let mut dev = mock(&[
            read(RegAddr::Year, 0x99),
            read(RegAddr::Year, 0x00).with_error(ErrorKind::Other),
        ]);
        assert_eq!(dev.year().unwrap(), 99);
        assert!(dev.year().is_err());
        assert_eq!(dev.cached_date().year, 0);
        assert_eq!(dev.last_failure(), Some(RegAddr::Year));
        dev.i2c.done();
    }

    #[test]
    fn test_direct_setters() {
        let mut dev = mock(&[
            write(RegAddr::Day, 0x07),
            write(RegAddr::Date, 0x31),
            write(RegAddr::Year, 0x99),
        ]);
        dev.set_day_of_week(7).unwrap();
        dev.set_date(31).unwrap();
        dev.set_year(99).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_month_preserves_century() {
        let mut dev = mock(&[read(RegAddr::Month, 0x81), write(RegAddr::Month, 0x92)]);
        dev.set_month(12).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_read_date_burst_failure_zeroes_cache() {
        let mut dev = mock(&[
            I2cTrans::write_read(
                crate::DEVICE_ADDRESS,
                vec![RegAddr::Day.offset()],
                vec![0x02, 0x15, 0x06, 0x25],
            ),
            I2cTrans::write_read(
                crate::DEVICE_ADDRESS,
                vec![RegAddr::Day.offset()],
                vec![0x00, 0x00, 0x00, 0x00],
            )
            .with_error(ErrorKind::Other),
        ]);
        assert_eq!(
            dev.read_date().unwrap(),
            DateFields {
                day_of_week: 2,
                date: 15,
                month: 6,
                year: 25
            }
        );
        assert!(dev.read_date().is_err());
        assert_eq!(dev.cached_date(), DateFields::default());
        dev.i2c.done();
    }

    #[test]
    fn test_full_date_round_trip_keeps_century() {
        let fake = FakeDs3231::with_registers(&[(RegAddr::Month, 0x80)]);
        let mut dev = DS3231::new(fake);
        dev.set_full_date(5, 29, 2, 24).unwrap();
        assert_eq!(
            dev.read_date().unwrap(),
            DateFields {
                day_of_week: 5,
                date: 29,
                month: 2,
                year: 24
            }
        );
        assert_eq!(dev.release().get(RegAddr::Month), 0x82);
    }
}
