//! Logging macros used throughout the driver.
//!
//! Messages go to `defmt` when the `defmt` feature is enabled, otherwise to
//! `log` when the `log` feature is enabled. With neither feature the macros
//! compile to nothing.

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! trace {
            ($($arg:tt)*) => { ::defmt::trace!($($arg)*) };
        }
        macro_rules! debug {
            ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { ::defmt::error!($($arg)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! trace {
            ($($arg:tt)*) => { ::log::trace!($($arg)*) };
        }
        macro_rules! debug {
            ($($arg:tt)*) => { ::log::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { ::log::error!($($arg)*) };
        }
    } else {
        // Arguments are still type checked so a message can't rot unnoticed.
        macro_rules! trace {
            ($($arg:tt)*) => {{ let _ = ::core::format_args!($($arg)*); }};
        }
        macro_rules! debug {
            ($($arg:tt)*) => {{ let _ = ::core::format_args!($($arg)*); }};
        }
        macro_rules! error {
            ($($arg:tt)*) => {{ let _ = ::core::format_args!($($arg)*); }};
        }
    }
}
