//! Error types for AXP20x battery operations
//!
//! This module defines the error types that can occur when using the AXP20x
//! battery driver.

/// Error types for AXP20x battery operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// Value or property not supported by the device
    InvalidArgument,
    /// Charging requested while no charge current is available
    Busy,
    /// Calibration profile rejected
    InvalidConfig,
    /// No design capacity configured and no battery present
    NoBattery,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::I2c(error)
    }
}

impl<E> Error<E> {
    /// Returns `true` if the error came from the register bus
    pub fn is_io(&self) -> bool {
        matches!(self, Error::I2c(_))
    }
}
