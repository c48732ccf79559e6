//! Time-of-day values and the raw time register snapshot.
//!
//! [`TimeRegisters`] is the three-byte image of the Seconds, Minutes and
//! Hours registers as it travels over the bus. Decoding it through the
//! weighted-bit codec yields a [`TimeReading`]; callers usually only want
//! the hours and minutes, which is what [`Time`] carries.
//!
//! Conversions to and from chrono's `NaiveTime` are provided for
//! applications that already work with chrono.

use chrono::{NaiveTime, Timelike};

use crate::codec::{decode_time, encode_time, EncodingError};

/// Seconds value at which the minutes and hours may be about to roll over.
pub const ROLLOVER_SECOND: u8 = 59;

/// Raw contents of the three time registers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeRegisters {
    /// Seconds register
    pub seconds: u8,
    /// Minutes register
    pub minutes: u8,
    /// Hours register
    pub hours: u8,
}

impl TimeRegisters {
    /// Encodes a time of day, with the seconds register cleared.
    pub fn from_time(hours: i32, minutes: i32) -> Result<Self, EncodingError> {
        let (hours, minutes) = encode_time(hours, minutes)?;
        Ok(Self {
            seconds: 0,
            minutes,
            hours,
        })
    }

    /// Decodes the registers into a [`TimeReading`].
    pub fn decode(&self) -> TimeReading {
        decode_time(self.seconds, self.minutes, self.hours)
    }
}

/// A decoded reading of the time registers.
///
/// Built fresh from the device on every read, never cached.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeReading {
    /// Hours (0-23)
    pub hours: u8,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Seconds (0-59)
    pub seconds: u8,
}

impl TimeReading {
    /// Returns `true` when the next tick may roll the minutes over.
    pub fn at_rollover_boundary(&self) -> bool {
        self.seconds == ROLLOVER_SECOND
    }

    /// Hours and minutes of this reading.
    pub fn time(&self) -> Time {
        Time {
            hours: self.hours,
            minutes: self.minutes,
        }
    }

    /// Converts the reading to a `NaiveTime`.
    ///
    /// Returns `None` if the registers held something that is not a valid
    /// time of day.
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(
            u32::from(self.hours),
            u32::from(self.minutes),
            u32::from(self.seconds),
        )
    }
}

/// Hours and minutes, as reported to callers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    /// Hours (0-23)
    pub hours: u8,
    /// Minutes (0-59)
    pub minutes: u8,
}

impl From<&NaiveTime> for Time {
    fn from(time: &NaiveTime) -> Self {
        // chrono keeps hour() < 24 and minute() < 60
        Time {
            hours: time.hour() as u8,
            minutes: time.minute() as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_time_clears_seconds() {
        let raw = TimeRegisters::from_time(15, 30).unwrap();
        assert_eq!(
            raw,
            TimeRegisters {
                seconds: 0,
                minutes: 0x30,
                hours: 0x15,
            }
        );
    }

    #[test]
    fn test_from_time_rejects_invalid() {
        assert!(matches!(
            TimeRegisters::from_time(-1, 0),
            Err(EncodingError::Unrepresentable(-1))
        ));
        assert!(matches!(
            TimeRegisters::from_time(0, 60),
            Err(EncodingError::OutOfRange(60))
        ));
    }

    #[test]
    fn test_decode_registers() {
        let raw = TimeRegisters {
            seconds: 0x59,
            minutes: 0x45,
            hours: 0x23,
        };
        let reading = raw.decode();
        assert_eq!(
            reading,
            TimeReading {
                hours: 23,
                minutes: 45,
                seconds: 59,
            }
        );
        assert!(reading.at_rollover_boundary());
        assert_eq!(
            reading.time(),
            Time {
                hours: 23,
                minutes: 45,
            }
        );
    }

    #[test]
    fn test_rollover_boundary_only_at_59() {
        let mut reading = TimeReading::default();
        for seconds in 0..59 {
            reading.seconds = seconds;
            assert!(!reading.at_rollover_boundary());
        }
        reading.seconds = 59;
        assert!(reading.at_rollover_boundary());
    }

    #[test]
    fn test_to_naive_time() {
        let reading = TimeReading {
            hours: 7,
            minutes: 5,
            seconds: 42,
        };
        assert_eq!(
            reading.to_naive_time(),
            NaiveTime::from_hms_opt(7, 5, 42)
        );
    }

    #[test]
    fn test_to_naive_time_invalid_registers() {
        // hours register with every weight set decodes to 45
        let reading = TimeRegisters {
            seconds: 0,
            minutes: 0,
            hours: 0x3F,
        }
        .decode();
        assert_eq!(reading.hours, 45);
        assert_eq!(reading.to_naive_time(), None);
    }

    #[test]
    fn test_time_from_naive_time() {
        let naive = NaiveTime::from_hms_opt(18, 4, 33).unwrap();
        assert_eq!(
            Time::from(&naive),
            Time {
                hours: 18,
                minutes: 4,
            }
        );
    }

    #[test]
    fn test_time_ordering() {
        let early = Time {
            hours: 9,
            minutes: 59,
        };
        let late = Time {
            hours: 10,
            minutes: 0,
        };
        assert!(early < late);
    }
}
