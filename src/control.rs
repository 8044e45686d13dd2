//! Control and status register access, temperature, aging offset and device
//! initialization.

use embedded_hal::i2c::I2c;
use paste::paste;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::{debug, error};
use crate::alarm::Alarm;
use crate::registers::{
    AgingOffset, Control, InterruptControl, Oscillator, RegAddr, SquareWaveFrequency, Status,
    Temperature, TemperatureFraction, TimeRepresentation,
};
use crate::{DS3231Error, DS3231};

/// Configuration applied by [`DS3231::configure`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub time_representation: TimeRepresentation,
    pub square_wave_frequency: SquareWaveFrequency,
    pub interrupt_control: InterruptControl,
    pub battery_backed_square_wave: bool,
    pub oscillator_enable: Oscillator,
}

impl Default for Config {
    /// The chip's power-on settings.
    fn default() -> Self {
        Self {
            time_representation: TimeRepresentation::TwentyFourHour,
            square_wave_frequency: SquareWaveFrequency::Hz8192,
            interrupt_control: InterruptControl::Interrupt,
            battery_backed_square_wave: false,
            oscillator_enable: Oscillator::Enabled,
        }
    }
}

/// Outcome of [`DS3231::init`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitReport {
    /// Number of steps that failed
    pub failures: u8,
    /// Register of the most recent failed step
    pub last_failure: Option<RegAddr>,
}

impl InitReport {
    pub const fn is_healthy(&self) -> bool {
        self.failures == 0
    }

    fn record<T, E>(&mut self, result: Result<T, DS3231Error<E>>) {
        if let Err(e) = result {
            self.failures = self.failures.saturating_add(1);
            if let DS3231Error::I2c { register, .. } = e {
                #[cfg(any(feature = "log", feature = "defmt"))]
                error!("DS3231: init step failed at {:?}", register);
                self.last_failure = Some(register);
            }
        }
    }
}

// Generates a query and an idempotent setter for each single-field setting.
// The setter returns whether it wrote.
macro_rules! register_field_access {
    ($(($field:ident, $typ:ident, $regaddr:expr, $value:ty)),+ $(,)?) => {
        impl<I2C: I2c> DS3231<I2C> {
            $(
                paste! {
                    #[doc = concat!("Reads `", stringify!($field), "` from the ", stringify!($typ), " register.")]
                    pub fn $field(&mut self) -> Result<$value, DS3231Error<I2C::Error>> {
                        Ok($typ(self.read_register($regaddr)?).$field())
                    }

                    #[doc = concat!("Sets `", stringify!($field), "` in the ", stringify!($typ), " register.")]
                    #[doc = ""]
                    #[doc = "Returns `false` without writing when it already holds `value`."]
                    pub fn [<set_ $field>](&mut self, value: $value) -> Result<bool, DS3231Error<I2C::Error>> {
                        self.update_register($regaddr, |prior| {
                            let mut register = $typ(prior);
                            if register.$field() == value {
                                return None;
                            }
                            register.[<set_ $field>](value);
                            Some(register.into())
                        })
                    }
                }
            )+
        }
    };
}

register_field_access!(
    (oscillator_enable, Control, RegAddr::Control, Oscillator),
    (battery_backed_square_wave, Control, RegAddr::Control, bool),
    (square_wave_frequency, Control, RegAddr::Control, SquareWaveFrequency),
    (interrupt_control, Control, RegAddr::Control, InterruptControl),
    (enable_32khz_output, Status, RegAddr::ControlStatus, bool),
);

/// Combines the temperature registers into hundredths of a degree.
///
/// The fraction has the sign of the integer part, so 0xE4/0xC0 is -28.75.
pub(crate) fn decode_temperature(msb: u8, lsb: u8) -> i16 {
    let whole = i16::from(Temperature(msb).temperature()) * 100;
    let fraction = i16::from(TemperatureFraction(lsb).temperature_fraction()) * 25;
    if whole >= 0 {
        whole + fraction
    } else {
        whole - fraction
    }
}

impl<I2C: I2c> DS3231<I2C> {
    /// Applies every control-register setting of `config` in one
    /// read-modify-write, then switches the hour mode.
    pub fn configure(&mut self, config: &Config) -> Result<(), DS3231Error<I2C::Error>> {
        #[cfg_attr(not(any(feature = "log", feature = "defmt")), allow(unused_variables))]
        let control = self.modify_register(RegAddr::Control, |prior| {
            let mut control = Control(prior);
            control.set_oscillator_enable(config.oscillator_enable);
            control.set_battery_backed_square_wave(config.battery_backed_square_wave);
            control.set_square_wave_frequency(config.square_wave_frequency);
            control.set_interrupt_control(config.interrupt_control);
            control.into()
        })?;
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("DS3231: control={:#x}", control);

        self.set_hour_mode(config.time_representation)?;
        Ok(())
    }

    /// Reads the oscillator stop flag (OSF). It is set when the oscillator
    /// stopped at some point, so the time may be wrong.
    pub fn is_oscillator_stopped(&mut self) -> Result<bool, DS3231Error<I2C::Error>> {
        Ok(Status(self.read_register(RegAddr::ControlStatus)?).oscillator_stop_flag())
    }

    pub fn clear_oscillator_stop_flag(&mut self) -> Result<(), DS3231Error<I2C::Error>> {
        self.modify_register(RegAddr::ControlStatus, |prior| {
            let mut status = Status(prior);
            status.set_oscillator_stop_flag(false);
            status.into()
        })?;
        Ok(())
    }

    pub fn aging_offset(&mut self) -> Result<i8, DS3231Error<I2C::Error>> {
        Ok(AgingOffset(self.read_register(RegAddr::AgingOffset)?).aging_offset())
    }

    /// Writes the aging trim. Positive values slow the oscillator down.
    pub fn set_aging_offset(&mut self, offset: i8) -> Result<(), DS3231Error<I2C::Error>> {
        let mut register = AgingOffset::default();
        register.set_aging_offset(offset);
        self.write_register(RegAddr::AgingOffset, register.into())
    }

    /// Starts a temperature conversion unless one is already running.
    /// Returns `false` when the device reported busy and nothing was written.
    pub fn force_temperature_conversion(&mut self) -> Result<bool, DS3231Error<I2C::Error>> {
        if Status(self.read_register(RegAddr::ControlStatus)?).busy() {
            #[cfg(any(feature = "log", feature = "defmt"))]
            debug!("DS3231: busy, conversion not started");
            return Ok(false);
        }
        self.modify_register(RegAddr::Control, |prior| {
            let mut control = Control(prior);
            control.set_convert_temperature(true);
            control.into()
        })?;
        Ok(true)
    }

    /// Reads the temperature in hundredths of a degree Celsius.
    pub fn temperature(&mut self) -> Result<i16, DS3231Error<I2C::Error>> {
        let mut data = [0; 2];
        let temperature = self
            .read_registers(RegAddr::MSBTemp, &mut data)
            .map(|()| decode_temperature(data[0], data[1]));
        self.temperature = *temperature.as_ref().unwrap_or(&0);
        temperature
    }

    /// Reads the temperature in degrees Celsius.
    #[cfg(feature = "temperature_f32")]
    pub fn temperature_f32(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        Ok(f32::from(self.temperature()?) / 100.0)
    }

    /// Brings the device to a known state.
    ///
    /// Clears the cache, checks that the configuration bits can be read, clears
    /// both alarm flags and the oscillator stop flag, disables both alarm
    /// interrupts and routes the INT/SQW pin to interrupts. Every step runs even
    /// if an earlier one failed; the report counts the failures.
    pub fn init(&mut self) -> InitReport {
        self.reset_cache();
        let mut report = InitReport::default();

        report.record(self.oscillator_enable());
        report.record(self.battery_backed_square_wave());
        report.record(self.square_wave_frequency());
        report.record(self.interrupt_control());
        report.record(self.enable_32khz_output());

        report.record(self.clear_alarm_flag(Alarm::One));
        report.record(self.clear_alarm_flag(Alarm::Two));
        report.record(self.clear_oscillator_stop_flag());

        report.record(self.set_alarm_enabled(Alarm::One, false));
        report.record(self.set_alarm_enabled(Alarm::Two, false));
        report.record(self.set_interrupt_control(InterruptControl::Interrupt));

        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("DS3231: init done, {} failures", report.failures);
        report
    }
}
