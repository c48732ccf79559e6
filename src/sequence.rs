//! Multi-register configuration sequences.
//!
//! Every configuration command is an ordered list of [`RegisterWrite`]s.
//! The drivers run a list front to back and stop at the first write that
//! fails. Nothing is rolled back: the writes that already went through stay
//! applied, and the caller recovers by running the whole command again.
//! Each step is idempotent, so a repeat is always safe.
//!
//! Setting the time is split in two lists around the encoding step, which
//! happens after the prescaler is already held in reset:
//!
//! 1. Control ← RESET
//! 2. Seconds ← 0
//! 3. encode hours and minutes (a failure ends the command here)
//! 4. Minutes ← encoded minutes
//! 5. Hours ← encoded hours
//! 6. Control ← 0
//!
//! While RESET is set the time registers don't tick, so the new time starts
//! counting only once step 6 clears it.

use crate::codec::{encode_offset, EncodingError};
use crate::registers::{ClkoutFrequency, Control, Extension, Register};
use crate::time::TimeRegisters;

/// A single register write within a sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterWrite {
    /// Register to write
    pub register: Register,
    /// Value to write
    pub value: u8,
}

impl RegisterWrite {
    /// Creates a write of `value` to `register`.
    pub const fn new(register: Register, value: u8) -> Self {
        Self { register, value }
    }
}

/// Prepares the device for offset calibration.
///
/// Clears the Offset register, then drives 1 Hz on CLKOUT so the clock
/// error can be measured.
pub fn initialize_start() -> [RegisterWrite; 2] {
    let mut extension = Extension::default();
    extension.set_clkout_frequency(ClkoutFrequency::Hz1);
    [
        RegisterWrite::new(Register::Offset, 0),
        RegisterWrite::new(Register::Extension, extension.into()),
    ]
}

/// Writes a calibration offset.
///
/// # Errors
/// [`EncodingError::OffsetOutOfRange`] outside `-32..=31`, before any
/// write is produced.
pub fn set_offset(offset: i32) -> Result<[RegisterWrite; 1], EncodingError> {
    let register = encode_offset(offset)?;
    Ok([RegisterWrite::new(Register::Offset, register)])
}

/// Steps 1 and 2 of setting the time: freeze the clock, clear the seconds.
pub fn set_time_prologue() -> [RegisterWrite; 2] {
    [
        RegisterWrite::new(Register::Control, Control::reset_asserted().into()),
        RegisterWrite::new(Register::Seconds, 0),
    ]
}

/// Steps 4 to 6 of setting the time: write the fields, release the clock.
pub fn set_time_epilogue(time: &TimeRegisters) -> [RegisterWrite; 3] {
    [
        RegisterWrite::new(Register::Minutes, time.minutes),
        RegisterWrite::new(Register::Hours, time.hours),
        RegisterWrite::new(Register::Control, Control::default().into()),
    ]
}
