//! Register definitions and bitfield structures for the RV-8803 RTC.
//!
//! This module contains the logical registers the driver touches, the
//! address table that maps them onto the device, and bitfield views of the
//! Control and Extension registers.

use bitfield::bitfield;

/// Registers used by the driver.
///
/// These are logical names; the bus address of each one comes from the
/// [`RegisterMap`] the driver was built with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Seconds register (weighted bits, 0-59)
    Seconds,
    /// Minutes register (weighted bits, 0-59)
    Minutes,
    /// Hours register (weighted bits, 0-23)
    Hours,
    /// Extension register (CLKOUT frequency, timer setup)
    Extension,
    /// Control register (RESET and interrupt enables)
    Control,
    /// Offset register (6-bit signed clock calibration)
    Offset,
}

/// Bus address of every register the driver uses.
///
/// The driver never hardcodes addresses: each instance carries its own map,
/// so devices with a different layout (or a simulated device in a test)
/// can be driven by the same code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    /// Address of the Seconds register
    pub seconds: u8,
    /// Address of the Minutes register
    pub minutes: u8,
    /// Address of the Hours register
    pub hours: u8,
    /// Address of the Extension register
    pub extension: u8,
    /// Address of the Control register
    pub control: u8,
    /// Address of the Offset register
    pub offset: u8,
}

impl RegisterMap {
    /// Register layout of the RV-8803 as documented in its datasheet.
    pub const RV8803: Self = Self {
        seconds: 0x00,
        minutes: 0x01,
        hours: 0x02,
        extension: 0x0D,
        control: 0x0F,
        offset: 0x2C,
    };

    /// Returns the bus address of `register`.
    pub const fn address(&self, register: Register) -> u8 {
        match register {
            Register::Seconds => self.seconds,
            Register::Minutes => self.minutes,
            Register::Hours => self.hours,
            Register::Extension => self.extension,
            Register::Control => self.control,
            Register::Offset => self.offset,
        }
    }
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::RV8803
    }
}

/// Frequency driven on the CLKOUT pin (FD field of the Extension register).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClkoutFrequency {
    /// 32.768 kHz output (power-on default)
    Hz32768 = 0b00,
    /// 1024 Hz output
    Hz1024 = 0b01,
    /// 1 Hz output, used for offset calibration
    Hz1 = 0b10,
}
impl From<u8> for ClkoutFrequency {
    /// Creates a `ClkoutFrequency` from the raw FD field.
    ///
    /// Both `0b10` and `0b11` select 1 Hz on the device.
    ///
    /// # Panics
    /// Panics if the value does not fit in the two-bit field.
    fn from(v: u8) -> Self {
        match v {
            0b00 => ClkoutFrequency::Hz32768,
            0b01 => ClkoutFrequency::Hz1024,
            0b10 | 0b11 => ClkoutFrequency::Hz1,
            _ => panic!("Invalid value for ClkoutFrequency: {}", v),
        }
    }
}
impl From<ClkoutFrequency> for u8 {
    /// Converts a `ClkoutFrequency` to its raw FD field value.
    fn from(v: ClkoutFrequency) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Periodic time update interrupt enable (UIE)
    pub update_interrupt_enable, set_update_interrupt_enable: 4;
    /// Periodic countdown timer interrupt enable (TIE)
    pub timer_interrupt_enable, set_timer_interrupt_enable: 3;
    /// Alarm interrupt enable (AIE)
    pub alarm_interrupt_enable, set_alarm_interrupt_enable: 2;
    /// External event interrupt enable (EIE)
    pub external_event_interrupt_enable, set_external_event_interrupt_enable: 1;
    /// Holds the prescaler in reset while set, freezing the time registers
    pub reset, set_reset: 0;
}
from_register_u8!(Control);

impl Control {
    /// Control value written while the time registers are being updated.
    pub fn reset_asserted() -> Self {
        let mut control = Control::default();
        control.set_reset(true);
        control
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Control({=u8:#b}", self.0);
        if self.reset() {
            defmt::write!(f, ", reset");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Extension register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Extension(u8);
    impl Debug;
    /// Factory test bit, must be written as 0
    pub test, set_test: 7;
    /// Alarm matches weekday (0) or date (1)
    pub weekday_alarm_date, set_weekday_alarm_date: 6;
    /// Periodic update interrupt every second (0) or minute (1)
    pub update_interrupt_select, set_update_interrupt_select: 5;
    /// Periodic countdown timer enable
    pub timer_enable, set_timer_enable: 4;
    /// CLKOUT frequency selection
    pub from into ClkoutFrequency, clkout_frequency, set_clkout_frequency: 3, 2;
    /// Countdown timer clock frequency selection
    pub timer_clock_frequency, set_timer_clock_frequency: 1, 0;
}
from_register_u8!(Extension);

#[cfg(feature = "defmt")]
impl defmt::Format for Extension {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Extension({=u8:#b}, clkout {})",
            self.0,
            self.clkout_frequency()
        );
    }
}
