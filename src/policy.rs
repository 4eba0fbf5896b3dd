//! Charge-current policy
//!
//! The charge current follows whatever external supply is online: mains
//! allows half the design capacity, the bus is tiered by its input current
//! limit, and running on battery allows nothing. A user ceiling caps the
//! result before it is written to the 4-bit target-current field.

use crate::{battery::Battery, error::Error, notify::Notify, types::BusCurrentLimit, units};
use embedded_hal::i2c::I2c;
use log::{debug, warn};

/// Charge current allowed from a 500 mA bus
pub const BUS_500MA_CHARGE_UA: u32 = 300_000;

/// Charge current allowed from a 900 mA bus
pub const BUS_900MA_CHARGE_UA: u32 = 600_000;

impl<I, N> Battery<I, N>
where
    I: I2c,
    N: Notify,
{
    /// Largest charge current the online supplies can deliver, in µA
    pub fn max_charge_current(&mut self) -> Result<u32, Error<I::Error>> {
        let status = self.pmic.input_status()?;
        let unrestricted = self.state.capacity_design() / 2;

        if status.mains_online() {
            return Ok(unrestricted);
        }
        if status.bus_online() {
            return Ok(match self.pmic.bus_current_limit()? {
                BusCurrentLimit::Limit100mA => 0,
                BusCurrentLimit::Limit500mA => BUS_500MA_CHARGE_UA,
                BusCurrentLimit::Limit900mA => BUS_900MA_CHARGE_UA,
                BusCurrentLimit::Unlimited => unrestricted,
            });
        }
        Ok(0)
    }

    /// Re-derive the charge current from the online supplies and the user
    /// ceiling and program it
    ///
    /// Consumers are notified even when nothing was written or the policy
    /// failed, since the caller usually reacts to a supply change.
    pub fn reconfigure_charge_current(&mut self) -> Result<(), Error<I::Error>> {
        let result = self.apply_charge_policy();
        self.notify();
        result
    }

    fn apply_charge_policy(&mut self) -> Result<(), Error<I::Error>> {
        if !self.charger_ready {
            return Err(Error::Busy);
        }

        let available = self.max_charge_current()?;
        if available == 0 {
            debug!("No charge current available, charging disabled");
            return self.pmic.set_charging_enabled(false);
        }

        let target = available.min(self.state.current_ceiling());
        let Some(field) = units::charge_current_field(target) else {
            warn!(
                "Charge current {} uA is below {} uA, charging disabled",
                target,
                units::CHARGE_CURRENT_MIN_UA
            );
            self.pmic.set_charging_enabled(false)?;
            return Err(Error::InvalidArgument);
        };

        debug!(
            "Charge current {} uA (available {} uA)",
            units::charge_current(field),
            available
        );
        self.pmic.set_charge_current_field(field)?;
        self.pmic.set_charging_enabled(true)
    }

    /// Set the user ceiling on the charge current and apply it
    ///
    /// Accepts 300 mA to 1.8 A in 100 mA steps.
    pub fn set_target_current(&mut self, ua: u32) -> Result<(), Error<I::Error>> {
        let in_range =
            (units::CHARGE_CURRENT_MIN_UA..=units::CHARGE_CURRENT_MAX_UA).contains(&ua);
        if !in_range || (ua - units::CHARGE_CURRENT_MIN_UA) % units::CHARGE_CURRENT_STEP_UA != 0 {
            return Err(Error::InvalidArgument);
        }
        if !self.charger_ready {
            return Err(Error::Busy);
        }
        self.state.set_current_ceiling(ua);
        self.reconfigure_charge_current()
    }

    /// Enable or disable charging
    ///
    /// Enabling fails with `Error::Busy` when no supply can deliver charge
    /// current. Disabling only clears the charger enable bit.
    pub fn set_charging(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        if !enable {
            return self.pmic.set_charging_enabled(false);
        }
        if !self.charger_ready || self.max_charge_current()? == 0 {
            return Err(Error::Busy);
        }
        self.pmic.set_charging_enabled(true)?;
        self.reconfigure_charge_current()
    }
}
