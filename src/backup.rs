//! Backup (RTC) cell charger
//!
//! A constant-voltage, constant-current trickle charger for the coin cell
//! that keeps the RTC alive. It has no gauge and no policy: it is either
//! charging at its programmed voltage and current, or off.

use crate::{
    driver::Axp20x,
    error::Error,
    types::{BackupCurrent, BackupVoltage, Status},
};
use embedded_hal::i2c::I2c;
use log::warn;

/// Requested backup charger settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupConfig {
    pub voltage_uv: u32,
    pub current_ua: u32,
}

/// Backup cell charger on a shared PMIC
pub struct Backup<'a, I> {
    pmic: &'a mut Axp20x<I>,
}

impl<'a, I> Backup<'a, I>
where
    I: I2c,
{
    pub fn new(pmic: &'a mut Axp20x<I>) -> Self {
        Self { pmic }
    }

    /// Program voltage and current and start charging
    ///
    /// Only 2.5, 3.0, 3.1 and 3.6 V and 50, 100, 200 and 400 µA are
    /// supported; anything else fails with `Error::InvalidConfig` without
    /// touching the charger.
    pub fn configure(&mut self, config: BackupConfig) -> Result<(), Error<I::Error>> {
        let Some(voltage) = BackupVoltage::from_microvolts(config.voltage_uv) else {
            warn!("Invalid backup voltage limit {} uV", config.voltage_uv);
            return Err(Error::InvalidConfig);
        };
        let Some(current) = BackupCurrent::from_microamps(config.current_ua) else {
            warn!("Invalid backup current limit {} uA", config.current_ua);
            return Err(Error::InvalidConfig);
        };
        self.pmic.configure_backup(voltage, current)
    }

    pub fn status(&mut self) -> Result<Status, Error<I::Error>> {
        Ok(if self.pmic.is_backup_charging_enabled()? {
            Status::Charging
        } else {
            Status::NotCharging
        })
    }

    /// Start or stop charging; only `Charging` and `NotCharging` are accepted
    pub fn set_status(&mut self, status: Status) -> Result<(), Error<I::Error>> {
        match status {
            Status::Charging => self.pmic.set_backup_charging_enabled(true),
            Status::NotCharging => self.pmic.set_backup_charging_enabled(false),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// Constant charge voltage in µV
    pub fn charge_voltage(&mut self) -> Result<u32, Error<I::Error>> {
        Ok(self.pmic.backup_voltage()?.microvolts())
    }

    /// Constant charge current in µA
    pub fn charge_current(&mut self) -> Result<u32, Error<I::Error>> {
        Ok(self.pmic.backup_current()?.microamps())
    }
}
