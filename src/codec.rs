//! Weighted-bit register codec for the RV-8803 time registers.
//!
//! The RV-8803 does not store seconds, minutes and hours as plain binary.
//! Each bit of a time register stands for a fixed weight, and the field
//! value is the sum of the weights whose bits are set:
//!
//! | bit     | 0 | 1 | 2 | 3 | 4  | 5  | 6  |
//! |---------|---|---|---|---|----|----|----|
//! | sec/min | 1 | 2 | 4 | 8 | 10 | 20 | 40 |
//! | hours   | 1 | 2 | 4 | 8 | 10 | 20 |    |
//!
//! [`WeightedCodec`] implements this scheme for an arbitrary weight table.
//! Encoding is a greedy decomposition from the largest weight down and
//! fails when the value is not the sum of a subset of the weights.
//!
//! The module also maps the signed calibration offset onto the 6-bit
//! Offset register.
//!
//! # Example
//!
//! ```rust
//! use rv8803::codec::{encode_time, MINUTES};
//!
//! // 45 = 40 + 4 + 1
//! assert_eq!(MINUTES.encode(45), Ok(0b0100_0101));
//! assert_eq!(MINUTES.decode(0b0100_0101), 45);
//!
//! let (hours, minutes) = encode_time(23, 45).unwrap();
//! assert_eq!((hours, minutes), (0x23, 0x45));
//! ```

use crate::time::TimeReading;

/// Errors raised when a value can't be put into a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodingError {
    /// The value is not a sum of a subset of the weights (negative values included)
    Unrepresentable(i32),
    /// The value is representable but outside the range of its time field
    OutOfRange(i32),
    /// The calibration offset is outside `-32..=31`
    OffsetOutOfRange(i32),
}

/// Converts between decimal values and a weighted-bit register.
///
/// Bit `i` of the register carries `weights[i]`. A table holds at most
/// eight weights, one per register bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedCodec {
    weights: &'static [u8],
}

/// Codec for the Seconds register.
pub const SECONDS: WeightedCodec = WeightedCodec::new(&[1, 2, 4, 8, 10, 20, 40]);
/// Codec for the Minutes register.
pub const MINUTES: WeightedCodec = WeightedCodec::new(&[1, 2, 4, 8, 10, 20, 40]);
/// Codec for the Hours register.
pub const HOURS: WeightedCodec = WeightedCodec::new(&[1, 2, 4, 8, 10, 20]);

/// Largest value accepted for the minutes field.
pub const MAX_MINUTES: i32 = 59;
/// Largest value accepted for the hours field.
pub const MAX_HOURS: i32 = 23;

/// Range of the calibration offset, in steps.
pub const OFFSET_RANGE: core::ops::RangeInclusive<i32> = -32..=31;

impl WeightedCodec {
    /// Creates a codec for the given weight table, least significant bit first.
    ///
    /// # Panics
    /// Panics if the table has more than eight weights.
    pub const fn new(weights: &'static [u8]) -> Self {
        assert!(weights.len() <= 8, "a register byte holds at most 8 weights");
        Self { weights }
    }

    /// The weight table, least significant bit first.
    pub const fn weights(&self) -> &'static [u8] {
        self.weights
    }

    /// Encodes `value` into a register byte.
    ///
    /// Walks the table from the largest weight to the smallest, setting a
    /// bit whenever the weight still fits into what is left of `value`.
    ///
    /// # Errors
    /// Returns [`EncodingError::Unrepresentable`] if anything is left over,
    /// which includes every negative value.
    pub fn encode(&self, value: i32) -> Result<u8, EncodingError> {
        let mut remaining = value;
        let mut register = 0u8;
        for (bit, &weight) in self.weights.iter().enumerate().rev() {
            let weight = i32::from(weight);
            if remaining >= weight {
                remaining -= weight;
                register |= 1 << bit;
            }
        }
        if remaining != 0 {
            return Err(EncodingError::Unrepresentable(value));
        }
        Ok(register)
    }

    /// Decodes a register byte by summing the weights of its set bits.
    ///
    /// Bits above the table are ignored. Contents are not validated: a
    /// register the device would never produce still decodes to some sum.
    pub fn decode(&self, register: u8) -> u8 {
        let mut remaining = register;
        let mut value = 0u8;
        for &weight in self.weights {
            if remaining == 0 {
                break;
            }
            if remaining & 1 == 1 {
                value = value.saturating_add(weight);
            }
            remaining >>= 1;
        }
        value
    }
}

fn encode_field(codec: &WeightedCodec, value: i32, max: i32) -> Result<u8, EncodingError> {
    let register = codec.encode(value)?;
    if value > max {
        return Err(EncodingError::OutOfRange(value));
    }
    Ok(register)
}

/// Encodes a time of day into `(hours_register, minutes_register)`.
///
/// Both fields must encode for anything to be returned, so a caller never
/// ends up with half of a time to write.
///
/// # Errors
/// [`EncodingError::Unrepresentable`] for negative or unrepresentable values,
/// [`EncodingError::OutOfRange`] for hours above 23 or minutes above 59.
pub fn encode_time(hours: i32, minutes: i32) -> Result<(u8, u8), EncodingError> {
    let minutes_reg = encode_field(&MINUTES, minutes, MAX_MINUTES)?;
    let hours_reg = encode_field(&HOURS, hours, MAX_HOURS)?;
    Ok((hours_reg, minutes_reg))
}

/// Decodes the three time registers.
pub fn decode_time(seconds_reg: u8, minutes_reg: u8, hours_reg: u8) -> TimeReading {
    TimeReading {
        hours: HOURS.decode(hours_reg),
        minutes: MINUTES.decode(minutes_reg),
        seconds: SECONDS.decode(seconds_reg),
    }
}

/// Maps a calibration offset onto the 6-bit Offset register.
///
/// `0..=31` is written as is, `-32..=-1` wraps to `32..=63`.
///
/// # Errors
/// [`EncodingError::OffsetOutOfRange`] outside `-32..=31`.
pub fn encode_offset(offset: i32) -> Result<u8, EncodingError> {
    match offset {
        0..=31 => Ok(offset as u8),
        -32..=-1 => Ok((offset + 64) as u8),
        _ => Err(EncodingError::OffsetOutOfRange(offset)),
    }
}

/// Reads the calibration offset back out of an Offset register value.
///
/// Only the low six bits are used.
pub fn decode_offset(register: u8) -> i8 {
    let raw = (register & 0x3F) as i8;
    if raw > 31 {
        raw - 64
    } else {
        raw
    }
}
