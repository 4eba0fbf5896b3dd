//! Mains (ACIN) supply
//!
//! The battery's charge policy reads mains availability on its own; this
//! supply only reports the input for telemetry.

use crate::{
    driver::Axp20x,
    error::Error,
    registers::{AdcChannels, InputStatus},
    units,
};
use embedded_hal::i2c::I2c;

/// Mains supply on a shared PMIC
pub struct Mains<'a, I> {
    pmic: &'a mut Axp20x<I>,
}

impl<'a, I> Mains<'a, I>
where
    I: I2c,
{
    pub fn new(pmic: &'a mut Axp20x<I>) -> Self {
        Self { pmic }
    }

    /// Turn on the ACIN voltage and current ADCs
    pub fn init(&mut self) -> Result<(), Error<I::Error>> {
        let channels = AdcChannels::ACIN_VOLT | AdcChannels::ACIN_CURR;
        self.pmic.set_adc_channels(channels, channels)
    }

    /// Mains is plugged in
    pub fn is_present(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self
            .pmic
            .input_status()?
            .contains(InputStatus::AC_PRESENT))
    }

    /// Mains is usable as a supply
    pub fn is_online(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self
            .pmic
            .input_status()?
            .contains(InputStatus::AC_AVAILABLE))
    }

    /// Input voltage in µV
    pub fn voltage_now(&mut self) -> Result<u32, Error<I::Error>> {
        Ok(units::mains_voltage(self.pmic.mains_voltage_raw()?))
    }

    /// Input current in µA
    pub fn current_now(&mut self) -> Result<u32, Error<I::Error>> {
        Ok(units::mains_current(self.pmic.mains_current_raw()?))
    }
}
