//! Alarm configuration for the DS3231 RTC.
//!
//! The DS3231 has two alarms. Alarm 1 owns the seconds, minutes, hours and
//! day/date registers at 0x07-0x0A; Alarm 2 owns minutes, hours and day/date
//! at 0x0B-0x0D and fires at most once per minute.
//!
//! Each alarm register carries a mask bit in bit 7 (A1M1-A1M4, A2M2-A2M4). A set
//! mask bit takes that register out of the comparison, so a match mode is a
//! pattern of mask bits spread over several registers. The day/date register
//! also carries the DY/DT select in bit 6.
//!
//! # Alarm modes
//!
//! | Alarm 1                    | A1M1 | A1M2 | A1M3 | A1M4 | DY/DT |
//! |----------------------------|------|------|------|------|-------|
//! | `EverySecond`              | 1    | 1    | 1    | 1    | -     |
//! | `MatchSeconds`             | 0    | 1    | 1    | 1    | -     |
//! | `MatchMinutesSeconds`      | 0    | 0    | 1    | 1    | -     |
//! | `MatchHoursMinutesSeconds` | 0    | 0    | 0    | 1    | -     |
//! | `MatchDateTime`            | 0    | 0    | 0    | 0    | 0     |
//! | `MatchDayTime`             | 0    | 0    | 0    | 0    | 1     |
//!
//! Alarm 2 follows the same pattern without the seconds register.
//!
//! Changing a mode first computes a [`RegisterPlan`] from the current register
//! contents, then writes it one register at a time. A failure partway through
//! leaves the earlier registers written.

use embedded_hal::i2c::I2c;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::debug;
use crate::registers::{
    AlarmDayDate, Control, DayDateSelect, RegAddr, RegisterByte, Status, TimeRepresentation,
    ALARM_DAY_MASK, ALARM_MASK_BIT, DATE_MASK, DAY_DATE_SELECT_BIT, MINUTES_MASK, SECONDS_MASK,
};
use crate::time::{encode_minutes, encode_seconds, with_hour, with_hour_mode};
use crate::{bcd, DS3231Error, DS3231};

const ALARM1_REGISTERS: [RegAddr; 4] = [
    RegAddr::Alarm1Seconds,
    RegAddr::Alarm1Minutes,
    RegAddr::Alarm1Hours,
    RegAddr::Alarm1DayDate,
];

const ALARM2_REGISTERS: [RegAddr; 3] = [
    RegAddr::Alarm2Minutes,
    RegAddr::Alarm2Hours,
    RegAddr::Alarm2DayDate,
];

/// Selects one of the two alarms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm {
    One,
    Two,
}

impl Alarm {
    const fn minutes_register(self) -> RegAddr {
        match self {
            Alarm::One => RegAddr::Alarm1Minutes,
            Alarm::Two => RegAddr::Alarm2Minutes,
        }
    }

    const fn hours_register(self) -> RegAddr {
        match self {
            Alarm::One => RegAddr::Alarm1Hours,
            Alarm::Two => RegAddr::Alarm2Hours,
        }
    }

    const fn day_date_register(self) -> RegAddr {
        match self {
            Alarm::One => RegAddr::Alarm1DayDate,
            Alarm::Two => RegAddr::Alarm2DayDate,
        }
    }
}

/// Alarm 1 match modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm1Mode {
    /// Fires once per second
    EverySecond,
    /// Fires when the seconds match
    MatchSeconds,
    /// Fires when minutes and seconds match
    MatchMinutesSeconds,
    /// Fires when hours, minutes and seconds match (daily)
    MatchHoursMinutesSeconds,
    /// Fires when date of month, hours, minutes and seconds match
    MatchDateTime,
    /// Fires when day of week, hours, minutes and seconds match
    MatchDayTime,
}

impl Alarm1Mode {
    /// A1M1-A1M4 for this mode. A set bit excludes that register from the match.
    pub const fn mask_bits(self) -> [bool; 4] {
        match self {
            Alarm1Mode::EverySecond => [true, true, true, true],
            Alarm1Mode::MatchSeconds => [false, true, true, true],
            Alarm1Mode::MatchMinutesSeconds => [false, false, true, true],
            Alarm1Mode::MatchHoursMinutesSeconds => [false, false, false, true],
            Alarm1Mode::MatchDateTime | Alarm1Mode::MatchDayTime => [false; 4],
        }
    }

    /// DY/DT value this mode needs, or `None` when the mode leaves it alone.
    pub const fn day_date_select(self) -> Option<DayDateSelect> {
        match self {
            Alarm1Mode::MatchDateTime => Some(DayDateSelect::Date),
            Alarm1Mode::MatchDayTime => Some(DayDateSelect::Day),
            _ => None,
        }
    }

    /// Computes the writes that put registers 0x07-0x0A, currently holding
    /// `prior`, into this mode.
    pub fn plan(self, prior: [u8; 4]) -> RegisterPlan<4> {
        RegisterPlan::for_masks(
            ALARM1_REGISTERS,
            prior,
            self.mask_bits(),
            self.day_date_select(),
        )
    }

    /// Recovers the mode from the contents of registers 0x07-0x0A.
    ///
    /// Returns `None` for mask patterns that do not correspond to a mode.
    pub fn from_registers(registers: [u8; 4]) -> Option<Self> {
        let masks = registers.map(|r| RegisterByte(r).bit(ALARM_MASK_BIT));
        match masks {
            [true, true, true, true] => Some(Alarm1Mode::EverySecond),
            [false, true, true, true] => Some(Alarm1Mode::MatchSeconds),
            [false, false, true, true] => Some(Alarm1Mode::MatchMinutesSeconds),
            [false, false, false, true] => Some(Alarm1Mode::MatchHoursMinutesSeconds),
            [false, false, false, false] => {
                match AlarmDayDate(registers[3]).day_date_select() {
                    DayDateSelect::Day => Some(Alarm1Mode::MatchDayTime),
                    DayDateSelect::Date => Some(Alarm1Mode::MatchDateTime),
                }
            }
            _ => None,
        }
    }
}

/// Alarm 2 match modes. Alarm 2 always fires at 00 seconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm2Mode {
    /// Fires once per minute
    EveryMinute,
    /// Fires when the minutes match
    MatchMinutes,
    /// Fires when hours and minutes match (daily)
    MatchHoursMinutes,
    /// Fires when date of month, hours and minutes match
    MatchDateTime,
    /// Fires when day of week, hours and minutes match
    MatchDayTime,
}

impl Alarm2Mode {
    /// A2M2-A2M4 for this mode.
    pub const fn mask_bits(self) -> [bool; 3] {
        match self {
            Alarm2Mode::EveryMinute => [true, true, true],
            Alarm2Mode::MatchMinutes => [false, true, true],
            Alarm2Mode::MatchHoursMinutes => [false, false, true],
            Alarm2Mode::MatchDateTime | Alarm2Mode::MatchDayTime => [false; 3],
        }
    }

    pub const fn day_date_select(self) -> Option<DayDateSelect> {
        match self {
            Alarm2Mode::MatchDateTime => Some(DayDateSelect::Date),
            Alarm2Mode::MatchDayTime => Some(DayDateSelect::Day),
            _ => None,
        }
    }

    /// Computes the writes that put registers 0x0B-0x0D, currently holding
    /// `prior`, into this mode.
    pub fn plan(self, prior: [u8; 3]) -> RegisterPlan<3> {
        RegisterPlan::for_masks(
            ALARM2_REGISTERS,
            prior,
            self.mask_bits(),
            self.day_date_select(),
        )
    }

    /// Recovers the mode from the contents of registers 0x0B-0x0D.
    pub fn from_registers(registers: [u8; 3]) -> Option<Self> {
        let masks = registers.map(|r| RegisterByte(r).bit(ALARM_MASK_BIT));
        match masks {
            [true, true, true] => Some(Alarm2Mode::EveryMinute),
            [false, true, true] => Some(Alarm2Mode::MatchMinutes),
            [false, false, true] => Some(Alarm2Mode::MatchHoursMinutes),
            [false, false, false] => match AlarmDayDate(registers[2]).day_date_select() {
                DayDateSelect::Day => Some(Alarm2Mode::MatchDayTime),
                DayDateSelect::Date => Some(Alarm2Mode::MatchDateTime),
            },
            _ => None,
        }
    }
}

/// The register writes for one alarm-mode change, in bus order.
///
/// Each entry is the full new byte for its register: the prior contents with
/// the mask bit (and for the day/date register, possibly DY/DT) replaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterPlan<const N: usize> {
    writes: [(RegAddr, u8); N],
}

impl<const N: usize> RegisterPlan<N> {
    fn for_masks(
        registers: [RegAddr; N],
        prior: [u8; N],
        masks: [bool; N],
        select: Option<DayDateSelect>,
    ) -> Self {
        let writes = core::array::from_fn(|i| {
            let mut byte = RegisterByte(prior[i]).with_bit(ALARM_MASK_BIT, masks[i]);
            // the day/date register is always last
            if let (true, Some(select)) = (i + 1 == N, select) {
                byte = byte.with_bit(DAY_DATE_SELECT_BIT, select == DayDateSelect::Day);
            }
            (registers[i], byte.value())
        });
        Self { writes }
    }

    pub fn writes(&self) -> &[(RegAddr, u8)] {
        &self.writes
    }

    /// The byte planned for `register`, if the plan touches it.
    pub fn byte(&self, register: RegAddr) -> Option<u8> {
        self.writes
            .iter()
            .find(|(r, _)| *r == register)
            .map(|&(_, value)| value)
    }
}

impl<I2C: I2c> DS3231<I2C> {
    fn apply_plan<const N: usize>(
        &mut self,
        plan: &RegisterPlan<N>,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        for &(register, value) in plan.writes() {
            self.write_register(register, value)?;
        }
        Ok(())
    }

    /// Puts alarm 1 into `mode`. Match values and DY/DT (for modes that do
    /// not use it) are left as they are.
    pub fn set_alarm1_mode(&mut self, mode: Alarm1Mode) -> Result<(), DS3231Error<I2C::Error>> {
        let mut prior = [0; 4];
        self.read_registers(RegAddr::Alarm1Seconds, &mut prior)?;
        let plan = mode.plan(prior);
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("DS3231: alarm 1 mode {:?}", mode);
        self.apply_plan(&plan)
    }

    /// Puts alarm 2 into `mode`.
    pub fn set_alarm2_mode(&mut self, mode: Alarm2Mode) -> Result<(), DS3231Error<I2C::Error>> {
        let mut prior = [0; 3];
        self.read_registers(RegAddr::Alarm2Minutes, &mut prior)?;
        let plan = mode.plan(prior);
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("DS3231: alarm 2 mode {:?}", mode);
        self.apply_plan(&plan)
    }

    pub fn alarm1_mode(&mut self) -> Result<Option<Alarm1Mode>, DS3231Error<I2C::Error>> {
        let mut registers = [0; 4];
        self.read_registers(RegAddr::Alarm1Seconds, &mut registers)?;
        Ok(Alarm1Mode::from_registers(registers))
    }

    pub fn alarm2_mode(&mut self) -> Result<Option<Alarm2Mode>, DS3231Error<I2C::Error>> {
        let mut registers = [0; 3];
        self.read_registers(RegAddr::Alarm2Minutes, &mut registers)?;
        Ok(Alarm2Mode::from_registers(registers))
    }

    /// Reads the alarm's interrupt enable (A1IE/A2IE).
    pub fn is_alarm_enabled(&mut self, alarm: Alarm) -> Result<bool, DS3231Error<I2C::Error>> {
        let control = Control(self.read_register(RegAddr::Control)?);
        Ok(match alarm {
            Alarm::One => control.alarm1_interrupt_enable(),
            Alarm::Two => control.alarm2_interrupt_enable(),
        })
    }

    /// Enables or disables the alarm's interrupt. Returns `false` without
    /// writing when it is already in the requested state.
    pub fn set_alarm_enabled(
        &mut self,
        alarm: Alarm,
        enabled: bool,
    ) -> Result<bool, DS3231Error<I2C::Error>> {
        self.update_register(RegAddr::Control, |prior| {
            let mut control = Control(prior);
            match alarm {
                Alarm::One => control.set_alarm1_interrupt_enable(enabled),
                Alarm::Two => control.set_alarm2_interrupt_enable(enabled),
            }
            (u8::from(control) != prior).then_some(control.into())
        })
    }

    /// Reads the alarm's flag (A1F/A2F) without clearing it.
    pub fn is_alarm_flag_set(&mut self, alarm: Alarm) -> Result<bool, DS3231Error<I2C::Error>> {
        let status = Status(self.read_register(RegAddr::ControlStatus)?);
        Ok(match alarm {
            Alarm::One => status.alarm1_flag(),
            Alarm::Two => status.alarm2_flag(),
        })
    }

    /// Clears the alarm's flag. The status register is always written back.
    pub fn clear_alarm_flag(&mut self, alarm: Alarm) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(RegAddr::ControlStatus, |prior| {
            let mut status = Status(prior);
            match alarm {
                Alarm::One => status.set_alarm1_flag(false),
                Alarm::Two => status.set_alarm2_flag(false),
            }
            status.into()
        })?;
        Ok(())
    }

    /// Sets the alarm 1 seconds match value, keeping A1M1.
    pub fn set_alarm1_seconds(&mut self, seconds: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(RegAddr::Alarm1Seconds, |prior| {
            RegisterByte(prior)
                .with_field(SECONDS_MASK, encode_seconds(seconds))
                .value()
        })?;
        Ok(())
    }

    /// Sets the minutes match value, keeping the mask bit.
    pub fn set_alarm_minutes(
        &mut self,
        alarm: Alarm,
        minutes: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(alarm.minutes_register(), |prior| {
            RegisterByte(prior)
                .with_field(MINUTES_MASK, encode_minutes(minutes))
                .value()
        })?;
        Ok(())
    }

    /// Sets the hours match value from a 24-hour value, encoded in the alarm
    /// register's own 12/24-hour mode. The mask bit is kept.
    pub fn set_alarm_hours(&mut self, alarm: Alarm, hours: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(alarm.hours_register(), |prior| with_hour(prior, hours))?;
        Ok(())
    }

    /// Switches the alarm hours register between 12- and 24-hour mode. Returns
    /// `false` without writing when it is already in `mode`.
    pub fn set_alarm_hour_mode(
        &mut self,
        alarm: Alarm,
        mode: TimeRepresentation,
    ) -> Result<bool, DS3231Error<I2C::Error>> {
        self.update_register(alarm.hours_register(), |prior| with_hour_mode(prior, mode))
    }

    /// Sets the day/date register's value to a day of week. Mask and DY/DT
    /// are kept; pick the matching mode with `set_alarm1_mode`/`set_alarm2_mode`.
    pub fn set_alarm_day_of_week(
        &mut self,
        alarm: Alarm,
        day: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(alarm.day_date_register(), |prior| {
            RegisterByte(prior)
                .with_field(DATE_MASK, bcd::encode(day & ALARM_DAY_MASK))
                .value()
        })?;
        Ok(())
    }

    /// Sets the day/date register's value to a date of month. Mask and DY/DT
    /// are kept.
    pub fn set_alarm_date(&mut self, alarm: Alarm, date: u8) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(alarm.day_date_register(), |prior| {
            RegisterByte(prior)
                .with_field(DATE_MASK, bcd::encode(date & DATE_MASK))
                .value()
        })?;
        Ok(())
    }
}
