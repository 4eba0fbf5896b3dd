//! Battery supply: configuration, periodic sampling and telemetry properties
//!
//! `Battery` owns the register interface, the cached [`BatteryState`] and
//! the notification sink. The poll loop, the event handlers and property
//! accesses all go through `&mut Battery`, so a reader never sees a
//! half-updated health/percent pair.

use crate::{
    driver::Axp20x,
    error::Error,
    notify::Notify,
    profile::{BatteryProfile, TempSensor},
    registers::{InputStatus, OperatingMode},
    state::{BatteryState, Sample},
    types::{ChargeTargetVoltage, Health, Property, PropertyValue, Status, Technology},
    units,
};
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

/// AXP20x battery supply
pub struct Battery<I, N> {
    pub(crate) pmic: Axp20x<I>,
    pub(crate) notifier: N,
    pub(crate) state: BatteryState,
    pub(crate) temp_sensor: Option<TempSensor>,
    /// Cleared until a profile was applied successfully
    pub(crate) charger_ready: bool,
}

impl<I, N> Battery<I, N>
where
    I: I2c,
    N: Notify,
{
    /// Create an unconfigured battery supply
    ///
    /// Charging requests are refused with `Error::Busy` until
    /// [`Battery::configure`] succeeds.
    pub fn new(pmic: Axp20x<I>, notifier: N) -> Self {
        Self {
            pmic,
            notifier,
            state: BatteryState::new(),
            temp_sensor: None,
            charger_ready: false,
        }
    }

    /// Apply a calibration profile and set up the charger
    ///
    /// Ends by running the charge policy once, so a supply that is already
    /// online gets the right charge current. On failure the charger stays
    /// disabled and the error is returned. A policy refusal (no usable
    /// current) is not a failure.
    pub fn configure(&mut self, profile: &BatteryProfile) -> Result<(), Error<I::Error>> {
        self.charger_ready = false;
        self.state = BatteryState::new();
        self.temp_sensor = None;

        if let Err(e) = profile.apply(&mut self.pmic) {
            match e {
                Error::NoBattery => {}
                Error::InvalidConfig => warn!("Invalid battery profile: {:?}", profile),
                _ => warn!("Failed to apply battery profile"),
            }
            // Best effort, the apply error is what the caller needs
            let _ = self.pmic.set_charging_enabled(false);
            return Err(e);
        }

        self.state
            .set_capacity_design(profile.capacity_uah(), units::CHARGE_CURRENT_MIN_UA);
        self.temp_sensor = profile.active_temp_sensor();
        self.charger_ready = true;
        debug!(
            "Battery configured: capacity {} uAh, ceiling {} uA",
            self.state.capacity_design(),
            self.state.current_ceiling()
        );

        match self.reconfigure_charge_current() {
            Err(e) if e.is_io() => {
                warn!("Failed to program charge current");
                self.charger_ready = false;
                let _ = self.pmic.set_charging_enabled(false);
                Err(e)
            }
            _ => Ok(()),
        }
    }

    /// Cached battery state
    pub fn state(&self) -> &BatteryState {
        &self.state
    }

    /// Register interface, for the sibling supplies sharing the PMIC
    pub fn pmic(&mut self) -> &mut Axp20x<I> {
        &mut self.pmic
    }

    /// Notification sink handed to [`Battery::new`]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Release the register interface and the notifier
    pub fn release(self) -> (Axp20x<I>, N) {
        (self.pmic, self.notifier)
    }

    pub(crate) fn notify(&mut self) {
        self.notifier.power_supply_changed();
    }

    // ========================================
    // Periodic sampling
    // ========================================

    /// Sample health and gauge percent once
    ///
    /// Returns whether either changed; consumers are notified only then.
    /// A failed presence or voltage read aborts the cycle with the state
    /// untouched.
    pub fn poll(&mut self) -> Result<bool, Error<I::Error>> {
        let previous = self.state.sample();
        let mode = self.pmic.operating_mode()?;

        let sample = if !mode.contains(OperatingMode::BATT_PRESENT) {
            Sample::new(Health::Unknown, 0)
        } else {
            // Good is only ever confirmed by the activation event
            let mut health = match previous.health {
                Health::Good => Health::Good,
                _ => Health::Unknown,
            };

            if units::is_dead(self.pmic.battery_voltage_raw()?) {
                health = Health::Dead;
            } else if let Some(sensor) = self.temp_sensor {
                let ts = self.pmic.ts_raw()?;
                if ts < sensor.low as u32 {
                    health = Health::Cold;
                } else if ts > sensor.high as u32 {
                    health = Health::Overheat;
                }
            }

            let percent = match self.pmic.battery_percent() {
                Ok(percent) => percent,
                Err(_) => {
                    warn!("Failed to read gauge, keeping {}%", previous.percent);
                    previous.percent
                }
            };
            Sample::new(health, percent)
        };

        let changed = self.state.update(sample);
        if changed {
            debug!("Battery {:?} {}%", sample.health, sample.percent);
            self.notify();
        }
        Ok(changed)
    }

    // ========================================
    // Telemetry properties
    // ========================================

    /// Read a property
    pub fn get_property(&mut self, property: Property) -> Result<PropertyValue, Error<I::Error>> {
        let value = match property {
            Property::Present | Property::Online => {
                PropertyValue::Bool(self.pmic.is_battery_present()?)
            }
            Property::Status => PropertyValue::Status(self.status()?),
            Property::VoltageNow => {
                PropertyValue::Int(units::battery_voltage(self.pmic.battery_voltage_raw()?) as i32)
            }
            Property::CurrentNow => {
                let raw = if self.is_charging()? {
                    self.pmic.charge_current_raw()?
                } else {
                    self.pmic.discharge_current_raw()?
                };
                PropertyValue::Int(units::battery_current(raw) as i32)
            }
            Property::CurrentMax => {
                PropertyValue::Int(units::charge_current(self.pmic.charge_current_field()?) as i32)
            }
            Property::Health => PropertyValue::Health(self.state.health()),
            Property::Technology => PropertyValue::Technology(Technology::LiIon),
            Property::VoltageMaxDesign => {
                PropertyValue::Int(self.pmic.charge_target_voltage()?.microvolts() as i32)
            }
            Property::VoltageMinDesign => {
                PropertyValue::Int(units::warn_level_voltage(self.pmic.warn_level2()?) as i32)
            }
            Property::ChargeFullDesign => {
                PropertyValue::Int(i32::try_from(self.state.capacity_design()).unwrap_or(i32::MAX))
            }
            Property::Capacity => PropertyValue::Int(self.state.percent() as i32),
            Property::Temp => {
                self.require_temp_sensor()?;
                PropertyValue::Int(units::ts_voltage(self.pmic.ts_raw()?) as i32)
            }
            Property::TempAlertMin => {
                let sensor = self.require_temp_sensor()?;
                PropertyValue::Int(units::ts_voltage(sensor.low as u32) as i32)
            }
            Property::TempAlertMax => {
                let sensor = self.require_temp_sensor()?;
                PropertyValue::Int(units::ts_voltage(sensor.high as u32) as i32)
            }
        };
        Ok(value)
    }

    /// Write a property
    ///
    /// Only the properties reported by [`Property::is_writeable`] accept
    /// writes; everything else fails with `Error::InvalidArgument`.
    pub fn set_property(
        &mut self,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), Error<I::Error>> {
        match (property, value) {
            (Property::Status, PropertyValue::Status(Status::Charging)) => self.set_charging(true),
            (Property::Status, PropertyValue::Status(Status::NotCharging)) => {
                self.set_charging(false)
            }
            (Property::VoltageMaxDesign, PropertyValue::Int(uv)) => {
                let voltage = u32::try_from(uv)
                    .ok()
                    .and_then(ChargeTargetVoltage::from_microvolts)
                    .ok_or(Error::InvalidArgument)?;
                self.pmic.set_charge_target_voltage(voltage)
            }
            (Property::VoltageMinDesign, PropertyValue::Int(uv)) => {
                let level = u32::try_from(uv)
                    .ok()
                    .and_then(units::warn_level)
                    .ok_or(Error::InvalidArgument)?;
                self.set_min_voltage_level(level)
            }
            (Property::CurrentMax, PropertyValue::Int(ua)) => {
                let ua = u32::try_from(ua).map_err(|_| Error::InvalidArgument)?;
                self.set_target_current(ua)
            }
            _ => Err(Error::InvalidArgument),
        }
    }

    fn status(&mut self) -> Result<Status, Error<I::Error>> {
        if self.is_charging()? {
            return Ok(Status::Charging);
        }
        let discharge = units::battery_current(self.pmic.discharge_current_raw()?);
        Ok(if discharge >= units::IDLE_CURRENT_UA {
            Status::Discharging
        } else if self.state.percent() == 100 {
            Status::Full
        } else {
            Status::NotCharging
        })
    }

    fn is_charging(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self
            .pmic
            .input_status()?
            .contains(InputStatus::BAT_CHARGING))
    }

    fn require_temp_sensor(&self) -> Result<TempSensor, Error<I::Error>> {
        self.temp_sensor.ok_or(Error::InvalidArgument)
    }

    /// Move the critical warning level, dragging the first warning level up
    /// with it so the warning still fires before the critical one
    fn set_min_voltage_level(&mut self, level: u8) -> Result<(), Error<I::Error>> {
        self.pmic.set_warn_level2(level)?;
        if self.pmic.warn_level1()? < level {
            self.pmic.set_warn_level1(level)?;
        }
        info!(
            "Minimum design voltage set to {} uV",
            units::warn_level_voltage(level)
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registers::*;
    use crate::testing::FakeBus;
    use embedded_hal::i2c::ErrorKind;

    /// Counts notifications
    #[derive(Default)]
    pub(crate) struct Counter(pub usize);

    impl Notify for Counter {
        fn power_supply_changed(&mut self) {
            self.0 += 1;
        }
    }

    /// A configured battery on a fake PMIC with a 2000 mAh cell inserted
    pub(crate) fn configured(profile: BatteryProfile) -> Battery<FakeBus, Counter> {
        let mut bus = FakeBus::new();
        bus.set(AXP20X_PWR_OP_MODE, 0x20);
        bus.set_adc(AXP20X_BATT_V_H, 3500);
        let mut battery = Battery::new(Axp20x::new(bus), Counter::default());
        battery.configure(&profile).unwrap();
        battery.notifier.0 = 0;
        battery
    }

    pub(crate) fn bus<N>(battery: &mut Battery<FakeBus, N>) -> &mut FakeBus {
        battery.pmic.i2c_mut()
    }

    #[test]
    fn poll_reports_percent_once() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        bus(&mut battery).set_adc(AXP20X_BATT_V_H, 2000);
        bus(&mut battery).set(AXP20X_FG_RES, 0x80 | 55);

        assert!(battery.poll().unwrap());
        assert_eq!(battery.state().sample(), Sample::new(Health::Unknown, 55));
        assert_eq!(battery.notifier().0, 1);

        assert!(!battery.poll().unwrap());
        assert_eq!(battery.notifier().0, 1);
    }

    #[test]
    fn missing_battery_zeroes_percent() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        bus(&mut battery).set(AXP20X_FG_RES, 80);
        battery.poll().unwrap();

        bus(&mut battery).set(AXP20X_PWR_OP_MODE, 0x00);
        assert!(battery.poll().unwrap());
        assert_eq!(battery.state().sample(), Sample::new(Health::Unknown, 0));
    }

    #[test]
    fn dead_cell_wins_over_temperature() {
        let profile = BatteryProfile::new()
            .with_capacity(2000)
            .with_temp_sensor(TempSensor::new(40, 1000, 3000));
        let mut battery = configured(profile);
        bus(&mut battery).set_adc(AXP20X_TS_IN_H, 500);

        battery.poll().unwrap();
        assert_eq!(battery.state().health(), Health::Cold);

        bus(&mut battery).set_adc(AXP20X_BATT_V_H, 1000);
        battery.poll().unwrap();
        assert_eq!(battery.state().health(), Health::Dead);

        bus(&mut battery).set_adc(AXP20X_TS_IN_H, 3500);
        battery.poll().unwrap();
        assert_eq!(battery.state().health(), Health::Dead);

        bus(&mut battery).set_adc(AXP20X_BATT_V_H, 3500);
        battery.poll().unwrap();
        assert_eq!(battery.state().health(), Health::Overheat);
    }

    #[test]
    fn zero_bound_sensor_is_not_monitored() {
        let profile = BatteryProfile::new()
            .with_capacity(2000)
            .with_temp_sensor(TempSensor::new(40, 0, 0));
        let mut battery = configured(profile);
        bus(&mut battery).set_adc(AXP20X_TS_IN_H, 1500);

        battery.poll().unwrap();
        assert_eq!(battery.state().health(), Health::Unknown);
        assert_eq!(
            battery.get_property(Property::TempAlertMax),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn temperature_is_ignored_without_sensor() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        bus(&mut battery).set_adc(AXP20X_TS_IN_H, 0);
        battery.poll().unwrap();
        assert_eq!(battery.state().health(), Health::Unknown);
        assert_eq!(
            battery.get_property(Property::Temp),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn gauge_failure_keeps_previous_percent() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        bus(&mut battery).set(AXP20X_FG_RES, 0x80 | 70);
        battery.poll().unwrap();

        bus(&mut battery).set_adc(AXP20X_BATT_V_H, 1000);
        bus(&mut battery).fail_on(AXP20X_FG_RES);
        assert!(battery.poll().unwrap());
        assert_eq!(battery.state().sample(), Sample::new(Health::Dead, 70));
    }

    #[test]
    fn voltage_failure_aborts_cycle() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        bus(&mut battery).fail_on(AXP20X_BATT_V_H);
        bus(&mut battery).set(AXP20X_FG_RES, 42);

        assert_eq!(battery.poll(), Err(Error::I2c(ErrorKind::Other)));
        assert_eq!(battery.state().percent(), 0);
        assert_eq!(battery.notifier().0, 0);
    }

    #[test]
    fn good_health_survives_polling() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        battery.state.set_health(Health::Good);
        battery.poll().unwrap();
        assert_eq!(battery.state().health(), Health::Good);
    }

    #[test]
    fn status_follows_direction_and_idle_current() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        bus(&mut battery).set(AXP20X_PWR_INPUT_STATUS, 0x04);
        assert_eq!(
            battery.get_property(Property::Status),
            Ok(PropertyValue::Status(Status::Charging))
        );

        bus(&mut battery).set(AXP20X_PWR_INPUT_STATUS, 0x00);
        bus(&mut battery).set_adc(AXP20X_BATT_DISCHRG_I_H, 100);
        assert_eq!(
            battery.get_property(Property::Status),
            Ok(PropertyValue::Status(Status::Discharging))
        );

        bus(&mut battery).set_adc(AXP20X_BATT_DISCHRG_I_H, 3);
        assert_eq!(
            battery.get_property(Property::Status),
            Ok(PropertyValue::Status(Status::NotCharging))
        );

        bus(&mut battery).set(AXP20X_FG_RES, 100);
        battery.poll().unwrap();
        assert_eq!(
            battery.get_property(Property::Status),
            Ok(PropertyValue::Status(Status::Full))
        );
    }

    #[test]
    fn measurements_are_decoded() {
        let profile = BatteryProfile::new()
            .with_capacity(2000)
            .with_temp_sensor(TempSensor::new(80, 0x100, 0xA00));
        let mut battery = configured(profile);
        bus(&mut battery).set_adc(AXP20X_BATT_CHRG_I_H, 1200);
        bus(&mut battery).set_adc(AXP20X_TS_IN_H, 0x800);
        bus(&mut battery).set(AXP20X_PWR_INPUT_STATUS, 0x04);

        assert_eq!(
            battery.get_property(Property::VoltageNow),
            Ok(PropertyValue::Int(3_850_000))
        );
        assert_eq!(
            battery.get_property(Property::CurrentNow),
            Ok(PropertyValue::Int(600_000))
        );
        assert_eq!(
            battery.get_property(Property::Temp),
            Ok(PropertyValue::Int(0x800 * 800))
        );
        assert_eq!(
            battery.get_property(Property::TempAlertMax),
            Ok(PropertyValue::Int(0xA00 * 800))
        );
        assert_eq!(
            battery.get_property(Property::ChargeFullDesign),
            Ok(PropertyValue::Int(2_000_000))
        );
        assert_eq!(
            battery.get_property(Property::VoltageMaxDesign),
            Ok(PropertyValue::Int(4_150_000))
        );
        assert_eq!(
            battery.get_property(Property::VoltageMinDesign),
            Ok(PropertyValue::Int(3_304_000))
        );
        assert_eq!(
            battery.get_property(Property::Technology),
            Ok(PropertyValue::Technology(Technology::LiIon))
        );
    }

    #[test]
    fn voltage_max_refuses_4v36() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        assert_eq!(
            battery.set_property(Property::VoltageMaxDesign, PropertyValue::Int(4_360_000)),
            Err(Error::InvalidArgument)
        );
        battery
            .set_property(Property::VoltageMaxDesign, PropertyValue::Int(4_200_000))
            .unwrap();
        assert_eq!(
            CHARGE_TARGET_VOLTAGE.get(bus(&mut battery).get(AXP20X_CHRG_CTRL1)),
            2
        );
    }

    #[test]
    fn voltage_min_raises_warning_level() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        battery
            .set_property(Property::VoltageMinDesign, PropertyValue::Int(3_600_000))
            .unwrap();
        // (3.6 V - 2.8672 V) / 5.6 mV = 130.857
        assert_eq!(bus(&mut battery).get(AXP20X_APS_WARN_L2), 130);
        assert_eq!(bus(&mut battery).get(AXP20X_APS_WARN_L1), 130);

        battery
            .set_property(Property::VoltageMinDesign, PropertyValue::Int(3_000_000))
            .unwrap();
        assert_eq!(bus(&mut battery).get(AXP20X_APS_WARN_L2), 23);
        assert_eq!(bus(&mut battery).get(AXP20X_APS_WARN_L1), 130);

        assert_eq!(
            battery.set_property(Property::VoltageMinDesign, PropertyValue::Int(-1)),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn read_only_properties_refuse_writes() {
        let mut battery = configured(BatteryProfile::new().with_capacity(2000));
        for property in Property::ALL.iter().filter(|p| !p.is_writeable()) {
            assert_eq!(
                battery.set_property(*property, PropertyValue::Int(0)),
                Err(Error::InvalidArgument)
            );
        }
        assert_eq!(
            battery.set_property(Property::Status, PropertyValue::Status(Status::Full)),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn failed_configuration_disables_charger() {
        let mut fake = FakeBus::new();
        fake.set(AXP20X_CHRG_CTRL1, 0xC0);
        let mut battery = Battery::new(Axp20x::new(fake), Counter::default());

        assert_eq!(
            battery.configure(&BatteryProfile::new()),
            Err(Error::NoBattery)
        );
        assert_eq!(bus(&mut battery).get(AXP20X_CHRG_CTRL1) & 0x80, 0);
        assert_eq!(
            battery.set_property(Property::CurrentMax, PropertyValue::Int(500_000)),
            Err(Error::Busy)
        );
    }

    #[test]
    fn configure_programs_online_mains() {
        let mut fake = FakeBus::new();
        fake.set(AXP20X_PWR_OP_MODE, 0x20);
        fake.set(AXP20X_PWR_INPUT_STATUS, 0xC0);
        fake.set(AXP20X_CHRG_CTRL1, 0x48);
        let mut battery = Battery::new(Axp20x::new(fake), Counter::default());

        battery.configure(&BatteryProfile::new().with_capacity(1000)).unwrap();
        let ctrl = bus(&mut battery).get(AXP20X_CHRG_CTRL1);
        // 500 mA at 4.15 V, charger on
        assert_eq!(CHARGE_TARGET_CURRENT.get(ctrl), 2);
        assert_eq!(CHARGE_ENABLE.get(ctrl), 1);
        assert_eq!(ctrl, 0xA2);
        assert_eq!(battery.notifier().0, 1);
    }

    #[test]
    fn configure_accepts_unusable_current() {
        let mut fake = FakeBus::new();
        fake.set(AXP20X_PWR_OP_MODE, 0x20);
        fake.set(AXP20X_PWR_INPUT_STATUS, 0xC0);
        fake.set(AXP20X_CHRG_CTRL1, 0xC8);
        let mut battery = Battery::new(Axp20x::new(fake), Counter::default());

        // Half of 500 mAh is below the lowest step
        assert_eq!(
            battery.configure(&BatteryProfile::new().with_capacity(500)),
            Ok(())
        );
        let ctrl = bus(&mut battery).get(AXP20X_CHRG_CTRL1);
        assert_eq!(CHARGE_ENABLE.get(ctrl), 0);
        assert_eq!(CHARGE_TARGET_CURRENT.get(ctrl), 8);
    }

    #[test]
    fn configure_fails_when_charger_cannot_be_programmed() {
        let mut fake = FakeBus::new();
        fake.set(AXP20X_PWR_OP_MODE, 0x20);
        fake.fail_on(AXP20X_PWR_INPUT_STATUS);
        let mut battery = Battery::new(Axp20x::new(fake), Counter::default());

        assert_eq!(
            battery.configure(&BatteryProfile::new().with_capacity(2000)),
            Err(Error::I2c(ErrorKind::Other))
        );
        bus(&mut battery).heal();
        bus(&mut battery).set(AXP20X_PWR_INPUT_STATUS, 0xC0);
        assert_eq!(battery.set_charging(true), Err(Error::Busy));
    }

    #[test]
    fn huge_design_capacity_saturates() {
        let mut battery = configured(BatteryProfile::new().with_capacity(3_000_000));
        assert_eq!(
            battery.get_property(Property::ChargeFullDesign),
            Ok(PropertyValue::Int(i32::MAX))
        );
    }
}
