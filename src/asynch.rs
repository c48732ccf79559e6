//! Async implementation of the RV-8803 driver.
//!
//! This module provides an async interface to the RV-8803 RTC device using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled. Behaviour matches the blocking [`crate::RV8803`] one for one.
//!
//! # Example
//!
//! ```rust,ignore
//! use rv8803::asynch::RV8803;
//!
//! // Initialize device
//! let mut rtc = RV8803::new(i2c, rv8803::DEFAULT_ADDRESS);
//! rtc.init().await?;
//!
//! // Get current time asynchronously
//! let time = rtc.time().await?;
//! ```

use chrono::NaiveTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::sequence::{self, RegisterWrite};
use crate::{
    codec, Control, Extension, RV8803Error, Register, RegisterMap, Time, TimeReading,
    TimeRegisters,
};

/// RV-8803 Real-Time Clock async driver.
///
/// This struct provides the async interface to the RV-8803 RTC device.
/// It supports async I2C operations through the `embedded-hal-async` traits.
pub struct RV8803<I2C: I2c> {
    i2c: I2C,
    address: u8,
    registers: RegisterMap,
    ready: bool,
}

impl<I2C: I2c> RV8803<I2C> {
    /// Creates a new async driver instance using the RV-8803 register layout.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x32)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self::with_register_map(i2c, address, RegisterMap::RV8803)
    }

    /// Creates a new async driver instance with a custom register layout.
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

    /// Checks that the device answers on the bus.
    ///
    /// # Returns
    /// * `Ok(())` once the device answered
    /// * `Err(RV8803Error::NotReady)` if the probe read failed
    pub async fn init(&mut self) -> Result<(), RV8803Error<I2C::Error>> {
        let mut data = [0];
        let control = self.registers.address(Register::Control);
        self.ready = self
            .i2c
            .write_read(self.address, &[control], &mut data)
            .await
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

    /// Reads one register.
    pub async fn read_register(
        &mut self,
        register: Register,
    ) -> Result<u8, RV8803Error<I2C::Error>> {
        if !self.ready {
            return Err(RV8803Error::NotReady);
        }
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[self.registers.address(register)], &mut data)
            .await
            .map_err(|e| {
                error!("RV8803: reading {:?} failed", register);
                RV8803Error::I2c(e)
            })?;
        trace!("RV8803: {:?} -> {:#x}", register, data[0]);
        Ok(data[0])
    }

    /// Writes one register.
    pub async fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), RV8803Error<I2C::Error>> {
        if !self.ready {
            return Err(RV8803Error::NotReady);
        }
        trace!("RV8803: {:?} <- {:#x}", register, value);
        self.i2c
            .write(self.address, &[self.registers.address(register), value])
            .await
            .map_err(|e| {
                error!("RV8803: writing {:?} failed", register);
                RV8803Error::I2c(e)
            })?;
        Ok(())
    }

    async fn run_sequence(&mut self, steps: &[RegisterWrite]) -> Result<(), RV8803Error<I2C::Error>> {
        for step in steps {
            self.write_register(step.register, step.value).await?;
        }
        Ok(())
    }

    async fn read_time_registers(&mut self) -> Result<TimeRegisters, RV8803Error<I2C::Error>> {
        let seconds = self.read_register(Register::Seconds).await?;
        let minutes = self.read_register(Register::Minutes).await?;
        let hours = self.read_register(Register::Hours).await?;
        Ok(TimeRegisters {
            seconds,
            minutes,
            hours,
        })
    }

    /// Reads hours, minutes and seconds, reading again once at second 59.
    pub async fn read_time(&mut self) -> Result<TimeReading, RV8803Error<I2C::Error>> {
        let reading = self.read_time_registers().await?.decode();
        debug!("RV8803: read {:?}", reading);
        if !reading.at_rollover_boundary() {
            return Ok(reading);
        }
        let reading = self.read_time_registers().await?.decode();
        debug!("RV8803: re-read at rollover boundary {:?}", reading);
        Ok(reading)
    }

    /// Gets the current hours and minutes.
    pub async fn time(&mut self) -> Result<Time, RV8803Error<I2C::Error>> {
        Ok(self.read_time().await?.time())
    }

    /// Gets the current time of day as a `NaiveTime`.
    pub async fn naive_time(&mut self) -> Result<NaiveTime, RV8803Error<I2C::Error>> {
        let reading = self.read_time().await?;
        reading.to_naive_time().ok_or_else(|| {
            error!("RV8803: invalid time {:?}", reading);
            RV8803Error::InvalidTime
        })
    }

    /// Sets the time of day; the seconds restart from 0.
    ///
    /// # Arguments
    /// * `hours` - Hours (0-23)
    /// * `minutes` - Minutes (0-59)
    pub async fn set_time(
        &mut self,
        hours: i32,
        minutes: i32,
    ) -> Result<(), RV8803Error<I2C::Error>> {
        debug!("RV8803: setting time {}:{}", hours, minutes);
        self.run_sequence(&sequence::set_time_prologue()).await?;
        let time = TimeRegisters::from_time(hours, minutes).map_err(|e| {
            error!("RV8803: can't encode time {}:{}", hours, minutes);
            RV8803Error::Encoding(e)
        })?;
        self.run_sequence(&sequence::set_time_epilogue(&time)).await
    }

    /// Sets the hours and minutes from a `NaiveTime`.
    pub async fn set_naive_time(&mut self, time: &NaiveTime) -> Result<(), RV8803Error<I2C::Error>> {
        let time = Time::from(time);
        self.set_time(i32::from(time.hours), i32::from(time.minutes)).await
    }

    /// Clears the offset and selects 1 Hz on CLKOUT for calibration.
    pub async fn initialize_start(&mut self) -> Result<(), RV8803Error<I2C::Error>> {
        self.run_sequence(&sequence::initialize_start()).await?;
        debug!("RV8803: offset cleared, CLKOUT at 1 Hz");
        Ok(())
    }

    /// Writes the calibration offset (-32 to 31).
    pub async fn set_offset(&mut self, offset: i32) -> Result<(), RV8803Error<I2C::Error>> {
        let steps = sequence::set_offset(offset).map_err(|e| {
            error!("RV8803: offset {} out of range", offset);
            RV8803Error::Encoding(e)
        })?;
        self.run_sequence(&steps).await
    }

    /// Reads the calibration offset back.
    pub async fn offset(&mut self) -> Result<i8, RV8803Error<I2C::Error>> {
        let register = self.read_register(Register::Offset).await?;
        Ok(codec::decode_offset(register))
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $register:expr, $typ:ty)),+) => {
        impl<I2C: I2c> RV8803<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub async fn $name(&mut self) -> Result<$typ, RV8803Error<I2C::Error>> {
                        Ok(<$typ>::from(self.read_register($register).await?))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), RV8803Error<I2C::Error>> {
                        self.write_register($register, value.into()).await
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
