#![no_std]
//! A platform-agnostic driver for the time-of-day registers of the RV-8803
//! real-time clock.
//!
//! The driver is built on the [`embedded-hal`] 1.0 I2C traits. An async
//! variant lives in [`asynch`] when the `async` feature is enabled.
//!
//! # Features
//!
//! - Read the time of day with protection against minute rollover tearing
//! - Set the time of day with the prescaler held in reset
//! - Offset calibration: 1 Hz CLKOUT setup and offset register access
//! - Pluggable [`RegisterMap`], so several devices or layouts can coexist
//! - Optional logging through `log` or `defmt`
//!
//! # Time registers
//!
//! Seconds, minutes and hours are stored in a weighted-bit format, see
//! [`codec`]. Reading the time takes three bus transactions. If the seconds
//! read back as 59 the minutes or hours may have been read just before a
//! rollover, so all three registers are read once more and the second
//! reading is returned as is.
//!
//! # Example
//!
//! ```rust,ignore
//! use rv8803::{RV8803, DEFAULT_ADDRESS};
//!
//! let mut rtc = RV8803::new(i2c, DEFAULT_ADDRESS);
//! rtc.init()?;
//!
//! rtc.set_time(13, 37)?;
//! let time = rtc.time()?;
//!
//! // Calibrate against the 1 Hz CLKOUT, then store the measured offset.
//! rtc.initialize_start()?;
//! rtc.set_offset(-5)?;
//! ```
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

#[macro_use]
mod fmt;

#[cfg(feature = "async")]
pub mod asynch;
pub mod codec;
pub mod registers;
pub mod sequence;
pub mod time;

use chrono::NaiveTime;
use embedded_hal::i2c::I2c;
use paste::paste;

pub use codec::EncodingError;
pub use registers::{ClkoutFrequency, Control, Extension, Register, RegisterMap};
use sequence::RegisterWrite;
pub use time::{Time, TimeReading, TimeRegisters};

/// Default I2C address of the RV-8803.
pub const DEFAULT_ADDRESS: u8 = 0x32;

/// Errors returned by the driver.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RV8803Error<I2CE> {
    /// The I2C transaction failed
    I2c(I2CE),
    /// A value could not be encoded for its register
    Encoding(EncodingError),
    /// The time registers do not hold a valid time of day
    InvalidTime,
    /// The device did not answer the probe, or `init` was never called
    NotReady,
}

impl<I2CE> From<I2CE> for RV8803Error<I2CE> {
    fn from(e: I2CE) -> Self {
        RV8803Error::I2c(e)
    }
}

/// RV-8803 Real-Time Clock driver.
pub struct RV8803<I2C: I2c> {
    i2c: I2C,
    address: u8,
    registers: RegisterMap,
    ready: bool,
}

impl<I2C: I2c> RV8803<I2C> {
    /// Creates a new driver instance using the RV-8803 register layout.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x32)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self::with_register_map(i2c, address, RegisterMap::RV8803)
    }

    /// Creates a new driver instance with a custom register layout.
    pub fn with_register_map(i2c: I2C, address: u8, registers: RegisterMap) -> Self {
        Self {
            i2c,
            address,
            registers,
            ready: false,
        }
    }

    /// Consumes the driver and gives back the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// The register layout this driver uses.
    pub fn register_map(&self) -> &RegisterMap {
        &self.registers
    }

    /// Checks that the device answers on the bus.
    ///
    /// Must succeed before any other register operation; until then they
    /// all fail with [`RV8803Error::NotReady`] without touching the bus.
    ///
    /// # Returns
    /// * `Ok(())` once the device answered
    /// * `Err(RV8803Error::NotReady)` if the probe read failed
    pub fn init(&mut self) -> Result<(), RV8803Error<I2C::Error>> {
        let mut data = [0];
        let control = self.registers.address(Register::Control);
        self.ready = self
            .i2c
            .write_read(self.address, &[control], &mut data)
            .is_ok();
        if !self.ready {
            error!("RV8803: no answer from device at {:#x}", self.address);
            return Err(RV8803Error::NotReady);
        }
        debug!("RV8803: device at {:#x} ready", self.address);
        Ok(())
    }

    /// Returns `true` once [`init`](Self::init) has succeeded.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn ensure_ready(&self) -> Result<(), RV8803Error<I2C::Error>> {
        if self.ready {
            Ok(())
        } else {
            Err(RV8803Error::NotReady)
        }
    }

    /// Reads one register.
    pub fn read_register(&mut self, register: Register) -> Result<u8, RV8803Error<I2C::Error>> {
        self.ensure_ready()?;
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[self.registers.address(register)], &mut data)
            .map_err(|e| {
                error!("RV8803: reading {:?} failed", register);
                RV8803Error::I2c(e)
            })?;
        trace!("RV8803: {:?} -> {:#x}", register, data[0]);
        Ok(data[0])
    }

    /// Writes one register.
    pub fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), RV8803Error<I2C::Error>> {
        self.ensure_ready()?;
        trace!("RV8803: {:?} <- {:#x}", register, value);
        self.i2c
            .write(self.address, &[self.registers.address(register), value])
            .map_err(|e| {
                error!("RV8803: writing {:?} failed", register);
                RV8803Error::I2c(e)
            })?;
        Ok(())
    }

    /// Runs the writes in order, stopping at the first failure.
    fn run_sequence(&mut self, steps: &[RegisterWrite]) -> Result<(), RV8803Error<I2C::Error>> {
        for step in steps {
            self.write_register(step.register, step.value)?;
        }
        Ok(())
    }

    fn read_time_registers(&mut self) -> Result<TimeRegisters, RV8803Error<I2C::Error>> {
        let seconds = self.read_register(Register::Seconds)?;
        let minutes = self.read_register(Register::Minutes)?;
        let hours = self.read_register(Register::Hours)?;
        Ok(TimeRegisters {
            seconds,
            minutes,
            hours,
        })
    }

    /// Reads hours, minutes and seconds.
    ///
    /// When the first reading lands on second 59 the registers are read a
    /// second time and that reading is returned, whatever its seconds.
    pub fn read_time(&mut self) -> Result<TimeReading, RV8803Error<I2C::Error>> {
        let reading = self.read_time_registers()?.decode();
        debug!("RV8803: read {:?}", reading);
        if !reading.at_rollover_boundary() {
            return Ok(reading);
        }
        let reading = self.read_time_registers()?.decode();
        debug!("RV8803: re-read at rollover boundary {:?}", reading);
        Ok(reading)
    }

    /// Gets the current hours and minutes.
    pub fn time(&mut self) -> Result<Time, RV8803Error<I2C::Error>> {
        Ok(self.read_time()?.time())
    }

    /// Gets the current time of day as a `NaiveTime`.
    ///
    /// # Returns
    /// * `Ok(NaiveTime)` - The current time, including seconds
    /// * `Err(RV8803Error::InvalidTime)` if the registers hold no valid time
    pub fn naive_time(&mut self) -> Result<NaiveTime, RV8803Error<I2C::Error>> {
        let reading = self.read_time()?;
        reading.to_naive_time().ok_or_else(|| {
            error!("RV8803: invalid time {:?}", reading);
            RV8803Error::InvalidTime
        })
    }

    /// Sets the time of day; the seconds restart from 0.
    ///
    /// The Control and Seconds writes happen before the time is encoded,
    /// so an encoding error leaves the clock frozen in reset until a
    /// later `set_time` succeeds.
    ///
    /// # Arguments
    /// * `hours` - Hours (0-23)
    /// * `minutes` - Minutes (0-59)
    pub fn set_time(&mut self, hours: i32, minutes: i32) -> Result<(), RV8803Error<I2C::Error>> {
        debug!("RV8803: setting time {}:{}", hours, minutes);
        self.run_sequence(&sequence::set_time_prologue())?;
        let time = TimeRegisters::from_time(hours, minutes).map_err(|e| {
            error!("RV8803: can't encode time {}:{}", hours, minutes);
            RV8803Error::Encoding(e)
        })?;
        self.run_sequence(&sequence::set_time_epilogue(&time))
    }

    /// Sets the hours and minutes from a `NaiveTime`.
    pub fn set_naive_time(&mut self, time: &NaiveTime) -> Result<(), RV8803Error<I2C::Error>> {
        let time = Time::from(time);
        self.set_time(i32::from(time.hours), i32::from(time.minutes))
    }

    /// Clears the offset and selects 1 Hz on CLKOUT for calibration.
    pub fn initialize_start(&mut self) -> Result<(), RV8803Error<I2C::Error>> {
        self.run_sequence(&sequence::initialize_start())?;
        debug!("RV8803: offset cleared, CLKOUT at 1 Hz");
        Ok(())
    }

    /// Writes the calibration offset.
    ///
    /// # Arguments
    /// * `offset` - Offset in steps (-32 to 31)
    pub fn set_offset(&mut self, offset: i32) -> Result<(), RV8803Error<I2C::Error>> {
        let steps = sequence::set_offset(offset).map_err(|e| {
            error!("RV8803: offset {} out of range", offset);
            RV8803Error::Encoding(e)
        })?;
        self.run_sequence(&steps)
    }

    /// Reads the calibration offset back.
    pub fn offset(&mut self) -> Result<i8, RV8803Error<I2C::Error>> {
        let register = self.read_register(Register::Offset)?;
        Ok(codec::decode_offset(register))
    }
}

// Typed register accessors
macro_rules! impl_register_access {
    ($(($name:ident, $register:expr, $typ:ty)),+) => {
        impl<I2C: I2c> RV8803<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, RV8803Error<I2C::Error>> {
                        Ok(<$typ>::from(self.read_register($register)?))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), RV8803Error<I2C::Error>> {
                        self.write_register($register, value.into())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (control, Register::Control, Control),
    (extension, Register::Extension, Extension)
);

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x32;
    const SECONDS: u8 = 0x00;
    const MINUTES: u8 = 0x01;
    const HOURS: u8 = 0x02;
    const EXTENSION: u8 = 0x0D;
    const CONTROL: u8 = 0x0F;
    const OFFSET: u8 = 0x2C;

    fn read(register: u8, value: u8) -> I2cTrans {
        I2cTrans::write_read(DEVICE_ADDRESS, vec![register], vec![value])
    }

    fn write(register: u8, value: u8) -> I2cTrans {
        I2cTrans::write(DEVICE_ADDRESS, vec![register, value])
    }

    // Device that already passed its probe
    fn ready_device(expectations: &[I2cTrans]) -> RV8803<I2cMock> {
        let mut all: Vec<I2cTrans> = vec![read(CONTROL, 0)];
        all.extend_from_slice(expectations);
        let mut dev = RV8803::new(I2cMock::new(&all), DEVICE_ADDRESS);
        dev.init().unwrap();
        dev
    }

    #[test]
    fn test_init_probes_control_register() {
        let mut dev = RV8803::new(I2cMock::new(&[read(CONTROL, 0)]), DEVICE_ADDRESS);
        assert!(!dev.is_ready());
        dev.init().unwrap();
        assert!(dev.is_ready());
        dev.i2c.done();
    }

    #[test]
    fn test_init_failure_is_not_ready() {
        let mock = I2cMock::new(&[read(CONTROL, 0).with_error(ErrorKind::Other)]);
        let mut dev = RV8803::new(mock, DEVICE_ADDRESS);
        assert!(matches!(dev.init(), Err(RV8803Error::NotReady)));
        assert!(!dev.is_ready());
        // nothing else reaches the bus
        assert!(matches!(dev.time(), Err(RV8803Error::NotReady)));
        dev.i2c.done();
    }

    #[test]
    fn test_operations_before_init_are_not_ready() {
        let mut dev = RV8803::new(I2cMock::new(&[]), DEVICE_ADDRESS);
        assert!(matches!(dev.read_time(), Err(RV8803Error::NotReady)));
        assert!(matches!(dev.set_time(12, 0), Err(RV8803Error::NotReady)));
        assert!(matches!(dev.initialize_start(), Err(RV8803Error::NotReady)));
        assert!(matches!(dev.set_offset(3), Err(RV8803Error::NotReady)));
        assert!(matches!(dev.control(), Err(RV8803Error::NotReady)));
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_without_boundary_reads_once() {
        let mut dev = ready_device(&[
            read(SECONDS, 0x30),
            read(MINUTES, 0x45),
            read(HOURS, 0x23),
        ]);
        let time = dev.time().unwrap();
        assert_eq!(
            time,
            Time {
                hours: 23,
                minutes: 45,
            }
        );
        // exactly three reads
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_at_boundary_returns_second_reading() {
        let mut dev = ready_device(&[
            // 12:59:59
            read(SECONDS, 0x59),
            read(MINUTES, 0x59),
            read(HOURS, 0x12),
            // 13:00:00
            read(SECONDS, 0x00),
            read(MINUTES, 0x00),
            read(HOURS, 0x13),
        ]);
        let time = dev.time().unwrap();
        assert_eq!(
            time,
            Time {
                hours: 13,
                minutes: 0,
            }
        );
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_second_boundary_is_accepted() {
        let mut dev = ready_device(&[
            read(SECONDS, 0x59),
            read(MINUTES, 0x10),
            read(HOURS, 0x08),
            read(SECONDS, 0x59),
            read(MINUTES, 0x11),
            read(HOURS, 0x08),
        ]);
        let reading = dev.read_time().unwrap();
        assert_eq!(
            reading,
            TimeReading {
                hours: 8,
                minutes: 11,
                seconds: 59,
            }
        );
        // no third round
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_stops_at_failed_read() {
        let mut dev = ready_device(&[
            read(SECONDS, 0x12),
            read(MINUTES, 0x00).with_error(ErrorKind::Other),
        ]);
        assert!(matches!(
            dev.read_time(),
            Err(RV8803Error::I2c(ErrorKind::Other))
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_failure_during_re_read() {
        let mut dev = ready_device(&[
            read(SECONDS, 0x59),
            read(MINUTES, 0x59),
            read(HOURS, 0x23),
            read(SECONDS, 0x00).with_error(ErrorKind::Other),
        ]);
        assert!(matches!(dev.time(), Err(RV8803Error::I2c(_))));
        dev.i2c.done();
    }

    #[test]
    fn test_naive_time() {
        let mut dev = ready_device(&[
            read(SECONDS, 0x42),
            read(MINUTES, 0x05),
            read(HOURS, 0x07),
        ]);
        assert_eq!(dev.naive_time().unwrap(), NaiveTime::from_hms_opt(7, 5, 42).unwrap());
        dev.i2c.done();
    }

    #[test]
    fn test_naive_time_invalid_registers() {
        let mut dev = ready_device(&[
            read(SECONDS, 0x00),
            read(MINUTES, 0x7F),
            read(HOURS, 0x01),
        ]);
        assert!(matches!(dev.naive_time(), Err(RV8803Error::InvalidTime)));
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_sequence() {
        let mut dev = ready_device(&[
            write(CONTROL, 0x01),
            write(SECONDS, 0x00),
            write(MINUTES, 0x45),
            write(HOURS, 0x23),
            write(CONTROL, 0x00),
        ]);
        dev.set_time(23, 45).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_stops_at_failed_minutes_write() {
        let mut dev = ready_device(&[
            write(CONTROL, 0x01),
            write(SECONDS, 0x00),
            write(MINUTES, 0x30).with_error(ErrorKind::Other),
        ]);
        assert!(matches!(
            dev.set_time(15, 30),
            Err(RV8803Error::I2c(ErrorKind::Other))
        ));
        // hours and the reset release are never attempted
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_encoding_failure_after_reset() {
        let mut dev = ready_device(&[write(CONTROL, 0x01), write(SECONDS, 0x00)]);
        assert!(matches!(
            dev.set_time(12, 60),
            Err(RV8803Error::Encoding(EncodingError::OutOfRange(60)))
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_set_time_negative_hours() {
        let mut dev = ready_device(&[write(CONTROL, 0x01), write(SECONDS, 0x00)]);
        assert!(matches!(
            dev.set_time(-1, 0),
            Err(RV8803Error::Encoding(EncodingError::Unrepresentable(-1)))
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_set_naive_time_drops_seconds() {
        let mut dev = ready_device(&[
            write(CONTROL, 0x01),
            write(SECONDS, 0x00),
            write(MINUTES, 0x04),
            write(HOURS, 0x18),
            write(CONTROL, 0x00),
        ]);
        let time = NaiveTime::from_hms_opt(18, 4, 33).unwrap();
        dev.set_naive_time(&time).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_initialize_start() {
        let mut dev = ready_device(&[write(OFFSET, 0x00), write(EXTENSION, 0b0000_1000)]);
        dev.initialize_start().unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_initialize_start_stops_at_failed_offset_write() {
        let mut dev = ready_device(&[write(OFFSET, 0x00).with_error(ErrorKind::Other)]);
        assert!(matches!(dev.initialize_start(), Err(RV8803Error::I2c(_))));
        dev.i2c.done();
    }

    #[test]
    fn test_set_offset() {
        let mut dev = ready_device(&[write(OFFSET, 0x3B), write(OFFSET, 0x14)]);
        dev.set_offset(-5).unwrap();
        dev.set_offset(20).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_offset_out_of_range_writes_nothing() {
        let mut dev = ready_device(&[]);
        assert!(matches!(
            dev.set_offset(32),
            Err(RV8803Error::Encoding(EncodingError::OffsetOutOfRange(32)))
        ));
        assert!(matches!(
            dev.set_offset(-33),
            Err(RV8803Error::Encoding(EncodingError::OffsetOutOfRange(-33)))
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_read_offset() {
        let mut dev = ready_device(&[read(OFFSET, 0x3B), read(OFFSET, 0x14)]);
        assert_eq!(dev.offset().unwrap(), -5);
        assert_eq!(dev.offset().unwrap(), 20);
        dev.i2c.done();
    }

    #[test]
    fn test_register_accessors() {
        let mut dev = ready_device(&[
            read(CONTROL, 0b0000_0001),
            write(CONTROL, 0b0000_0000),
            read(EXTENSION, 0b0000_1000),
        ]);
        let mut control = dev.control().unwrap();
        assert!(control.reset());
        control.set_reset(false);
        dev.set_control(control).unwrap();
        let extension = dev.extension().unwrap();
        assert_eq!(extension.clkout_frequency(), ClkoutFrequency::Hz1);
        dev.i2c.done();
    }

    #[test]
    fn test_custom_register_map() {
        let map = RegisterMap {
            seconds: 0x10,
            minutes: 0x11,
            hours: 0x12,
            extension: 0x1D,
            control: 0x1F,
            offset: 0x3C,
        };
        let mock = I2cMock::new(&[
            read(0x1F, 0),
            read(0x10, 0x01),
            read(0x11, 0x02),
            read(0x12, 0x03),
            write(0x3C, 0x01),
        ]);
        let mut dev = RV8803::with_register_map(mock, DEVICE_ADDRESS, map);
        assert_eq!(dev.register_map(), &map);
        dev.init().unwrap();
        assert_eq!(
            dev.time().unwrap(),
            Time {
                hours: 3,
                minutes: 2,
            }
        );
        dev.set_offset(1).unwrap();
        let mut mock = dev.release();
        mock.done();
    }

    #[test]
    fn test_devices_are_independent() {
        let mut first = ready_device(&[read(OFFSET, 0x01)]);
        let mut second = ready_device(&[read(OFFSET, 0x3F)]);
        assert_eq!(first.offset().unwrap(), 1);
        assert_eq!(second.offset().unwrap(), -1);
        first.i2c.done();
        second.i2c.done();
    }
}
