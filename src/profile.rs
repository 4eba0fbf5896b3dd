//! Battery calibration profile
//!
//! A `BatteryProfile` carries the cell-specific constants the PMIC's
//! internal gauge needs: the open-circuit-voltage curve, the internal
//! resistance, the optional temperature sensor and the design capacity.
//! It is applied once, before the first poll.

use crate::{
    driver::Axp20x,
    error::Error,
    registers::{AdcChannels, OCV_CURVE_SIZE},
    types::{ChargeTargetVoltage, TsCurrent},
    units,
};
use embedded_hal::i2c::I2c;
use log::{debug, info};

/// Internal resistance used when the profile does not name one
pub const DEFAULT_RESISTANCE_MOHM: u32 = 100;

/// Temperature sensor wired to the TS pin
///
/// Thresholds are raw 12-bit TS ADC readings (0.8 mV per step).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempSensor {
    /// Bias current driven into the sensor, in µA
    pub bias_current_ua: u32,
    /// Readings below this are too cold
    pub low: u16,
    /// Readings above this are too hot
    pub high: u16,
}

impl TempSensor {
    pub const fn new(bias_current_ua: u32, low: u16, high: u16) -> Self {
        Self {
            bias_current_ua,
            low,
            high,
        }
    }

    /// Bias current as a register setting, if the hardware supports it
    pub fn current(&self) -> Option<TsCurrent> {
        TsCurrent::from_microamps(self.bias_current_ua)
    }

    /// A range with both bounds at zero leaves monitoring off
    pub fn is_active(&self) -> bool {
        self.low != 0 || self.high != 0
    }
}

/// Battery calibration profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryProfile {
    pub ocv: Option<[u8; OCV_CURVE_SIZE]>,
    pub resistance_mohm: Option<u32>,
    pub capacity_mah: u32,
    pub temp_sensor: Option<TempSensor>,
}

impl BatteryProfile {
    /// Empty profile: no OCV curve, default resistance, no design capacity
    pub const fn new() -> Self {
        Self {
            ocv: None,
            resistance_mohm: None,
            capacity_mah: 0,
            temp_sensor: None,
        }
    }

    pub const fn with_ocv(mut self, ocv: [u8; OCV_CURVE_SIZE]) -> Self {
        self.ocv = Some(ocv);
        self
    }

    pub const fn with_resistance(mut self, mohm: u32) -> Self {
        self.resistance_mohm = Some(mohm);
        self
    }

    pub const fn with_capacity(mut self, mah: u32) -> Self {
        self.capacity_mah = mah;
        self
    }

    pub const fn with_temp_sensor(mut self, sensor: TempSensor) -> Self {
        self.temp_sensor = Some(sensor);
        self
    }

    /// Design capacity in µAh
    pub fn capacity_uah(&self) -> u32 {
        self.capacity_mah.saturating_mul(1000)
    }

    /// Temperature sensor, unless absent or given an empty range
    pub fn active_temp_sensor(&self) -> Option<TempSensor> {
        self.temp_sensor.filter(TempSensor::is_active)
    }

    /// Internal resistance in mΩ, falling back to the default
    pub fn resistance(&self) -> u32 {
        self.resistance_mohm.unwrap_or(DEFAULT_RESISTANCE_MOHM)
    }

    /// Check the profile for values the hardware cannot take
    pub fn validate<E>(&self) -> Result<(), Error<E>> {
        if let Some(ocv) = &self.ocv {
            if ocv.iter().any(|&p| p > 100) {
                return Err(Error::InvalidConfig);
            }
        }
        if self.resistance_mohm == Some(0) {
            return Err(Error::InvalidConfig);
        }
        if let Some(sensor) = &self.temp_sensor {
            if sensor.current().is_none() || sensor.low > sensor.high {
                return Err(Error::InvalidConfig);
            }
        }
        Ok(())
    }

    /// Program the profile into the PMIC
    ///
    /// Fails with `Error::NoBattery` when no design capacity is given and
    /// no battery is connected; charging and battery detection are turned
    /// off first.
    pub fn apply<I: I2c>(&self, pmic: &mut Axp20x<I>) -> Result<(), Error<I::Error>> {
        self.validate::<I::Error>()?;

        let battery_present = pmic.is_battery_present()?;

        // The gauge must be stopped while its model is rewritten
        pmic.set_gauge_enabled(false)?;
        pmic.set_rdc(units::rdc_register(self.resistance()))?;
        if let Some(ocv) = &self.ocv {
            for (index, &percent) in ocv.iter().enumerate() {
                pmic.set_ocv(index, percent)?;
            }
        }
        pmic.set_gauge_enabled(true)?;

        if self.capacity_mah == 0 && !battery_present {
            info!("No battery, disabling charger");
            pmic.set_charging_enabled(false)?;
            pmic.set_battery_monitor(false)?;
            return Err(Error::NoBattery);
        }

        let mut adc = AdcChannels::BATT_VOLT | AdcChannels::BATT_CURR;
        match self.active_temp_sensor() {
            Some(sensor) => {
                pmic.configure_ts_pin(sensor.current())?;
                // Low readings mean a hot NTC, high readings a cold one
                pmic.set_ts_thresholds(
                    units::ts_threshold(sensor.low),
                    units::ts_threshold(sensor.high),
                )?;
                adc |= AdcChannels::TS;
            }
            None => pmic.configure_ts_pin(None)?,
        }
        pmic.set_adc_channels(adc, adc)?;

        pmic.set_charge_target_voltage(ChargeTargetVoltage::V4_15)?;
        // Both defaults lie inside the register range
        pmic.set_warn_level1(units::warn_level(units::APS_WARN_L1_DEFAULT_UV).unwrap_or(0))?;
        pmic.set_warn_level2(units::warn_level(units::APS_WARN_L2_DEFAULT_UV).unwrap_or(0))?;
        pmic.set_battery_monitor(true)?;

        debug!(
            "Battery profile applied: {} mAh, {} mOhm, ocv {}, ts {:?}",
            self.capacity_mah,
            self.resistance(),
            if self.ocv.is_some() { "custom" } else { "default" },
            self.temp_sensor
        );
        Ok(())
    }
}
