//! Register addresses and bit-field descriptions for the AXP20x
//!
//! Every register the battery driver touches is listed here together with
//! a structured description of its fields, so policy code never works on
//! raw masks.

use bitflags::bitflags;

/// I2C Address
pub const AXP20X_SLAVE_ADDRESS: u8 = 0x34;

/// Power input status - AC/VBUS presence and availability, charge direction
pub const AXP20X_PWR_INPUT_STATUS: u8 = 0x00;

/// Power operating mode - battery presence, activation mode, charging state
pub const AXP20X_PWR_OP_MODE: u8 = 0x01;

/// VBUS-IPSOUT path management - VHOLD and VBUS current limit
pub const AXP20X_VBUS_IPSOUT_MGMT: u8 = 0x30;

/// Shutdown, battery detection and CHGLED control
pub const AXP20X_OFF_CTRL: u8 = 0x32;

/// Charge control 1 - enable, target voltage, end current, target current
pub const AXP20X_CHRG_CTRL1: u8 = 0x33;

/// Backup (RTC) battery charge control
pub const AXP20X_CHRG_BAK_CTRL: u8 = 0x35;

/// Battery under-temperature threshold while charging
pub const AXP20X_V_LTF_CHRG: u8 = 0x38;

/// Battery over-temperature threshold while charging
pub const AXP20X_V_HTF_CHRG: u8 = 0x39;

/// System power warning level 1
pub const AXP20X_APS_WARN_L1: u8 = 0x3A;

/// System power warning level 2 (critical)
pub const AXP20X_APS_WARN_L2: u8 = 0x3B;

/// Battery under-temperature threshold while discharging
pub const AXP20X_V_LTF_DISCHRG: u8 = 0x3C;

/// Battery over-temperature threshold while discharging
pub const AXP20X_V_HTF_DISCHRG: u8 = 0x3D;

/// Interrupt control
pub const AXP20X_IRQ1_EN: u8 = 0x40;
pub const AXP20X_IRQ1_STATE: u8 = 0x48;
pub const AXP20X_IRQ_BANKS: usize = 5;

/// ADC data
pub const AXP20X_ACIN_V_ADC_H: u8 = 0x56;
pub const AXP20X_ACIN_I_ADC_H: u8 = 0x58;
pub const AXP20X_TS_IN_H: u8 = 0x62;
pub const AXP20X_BATT_V_H: u8 = 0x78;
pub const AXP20X_BATT_CHRG_I_H: u8 = 0x7A;
pub const AXP20X_BATT_DISCHRG_I_H: u8 = 0x7C;

/// ADC enable 1 - battery, ACIN, VBUS, APS and TS channels
pub const AXP20X_ADC_EN1: u8 = 0x82;

/// ADC sample rate and TS pin configuration
pub const AXP20X_ADC_RATE: u8 = 0x84;

/// Fuel gauge result - gauge enable and battery percent
pub const AXP20X_FG_RES: u8 = 0xB9;

/// Battery internal resistance (RDC)
pub const AXP20X_RDC_H: u8 = 0xBA;
pub const AXP20X_RDC_L: u8 = 0xBB;

/// First open-circuit-voltage curve register
pub const AXP20X_OCV_BASE: u8 = 0xC0;

/// Number of OCV curve points stored by the gauge (0xC0..=0xDF)
pub const OCV_CURVE_SIZE: usize = 32;

bitflags! {
    /// Fields of `AXP20X_PWR_INPUT_STATUS`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InputStatus: u8 {
        const AC_PRESENT = 1 << 7;
        const AC_AVAILABLE = 1 << 6;
        const VBUS_PRESENT = 1 << 5;
        const VBUS_AVAILABLE = 1 << 4;
        const VBUS_VHOLD = 1 << 3;
        /// Battery current direction: set while charging
        const BAT_CHARGING = 1 << 2;
        const AC_VBUS_SHORT = 1 << 1;
        const AC_VBUS_SEL = 1 << 0;
    }
}

impl InputStatus {
    /// Mains (ACIN) connected and within operating limits
    pub fn mains_online(self) -> bool {
        self.contains(Self::AC_PRESENT | Self::AC_AVAILABLE)
    }

    /// Bus (VBUS) connected and within operating limits
    pub fn bus_online(self) -> bool {
        self.contains(Self::VBUS_PRESENT | Self::VBUS_AVAILABLE)
    }
}

bitflags! {
    /// Fields of `AXP20X_PWR_OP_MODE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OperatingMode: u8 {
        const OVERTEMP = 1 << 7;
        const CHARGING = 1 << 6;
        const BATT_PRESENT = 1 << 5;
        const BATT_ACTIVATED = 1 << 3;
        const BATT_CHG_CURRENT_LOW = 1 << 2;
    }
}

bitflags! {
    /// Fields of `AXP20X_ADC_EN1`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdcChannels: u8 {
        const BATT_VOLT = 1 << 7;
        const BATT_CURR = 1 << 6;
        const ACIN_VOLT = 1 << 5;
        const ACIN_CURR = 1 << 4;
        const VBUS_VOLT = 1 << 3;
        const VBUS_CURR = 1 << 2;
        const APS_VOLT = 1 << 1;
        const TS = 1 << 0;
    }
}

/// A bit-field inside a single 8-bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub reg: u8,
    pub mask: u8,
    pub shift: u8,
}

impl Field {
    pub const fn new(reg: u8, mask: u8, shift: u8) -> Self {
        Self { reg, mask, shift }
    }

    /// Extract the field from a register value
    pub const fn get(&self, value: u8) -> u8 {
        (value & self.mask) >> self.shift
    }

    /// Position a field value inside the register
    pub const fn put(&self, field: u8) -> u8 {
        (field << self.shift) & self.mask
    }
}

/// VBUS current limit (900 mA / 500 mA / 100 mA / none)
pub const VBUS_CURRENT_LIMIT: Field = Field::new(AXP20X_VBUS_IPSOUT_MGMT, 0x03, 0);

/// Battery detection / monitoring enable
pub const BATTERY_MONITOR: Field = Field::new(AXP20X_OFF_CTRL, 0x40, 6);

/// Charger enable
pub const CHARGE_ENABLE: Field = Field::new(AXP20X_CHRG_CTRL1, 0x80, 7);

/// Charge target voltage (4.1 / 4.15 / 4.2 / 4.36 V)
pub const CHARGE_TARGET_VOLTAGE: Field = Field::new(AXP20X_CHRG_CTRL1, 0x60, 5);

/// Charge target current, 100 mA steps from 300 mA
pub const CHARGE_TARGET_CURRENT: Field = Field::new(AXP20X_CHRG_CTRL1, 0x0F, 0);

/// Backup battery charger enable
pub const BACKUP_ENABLE: Field = Field::new(AXP20X_CHRG_BAK_CTRL, 0x80, 7);

/// Backup battery target voltage
pub const BACKUP_VOLTAGE: Field = Field::new(AXP20X_CHRG_BAK_CTRL, 0x60, 5);

/// Backup battery charge current
pub const BACKUP_CURRENT: Field = Field::new(AXP20X_CHRG_BAK_CTRL, 0x03, 0);

/// TS pin bias current
pub const TS_CURRENT: Field = Field::new(AXP20X_ADC_RATE, 0x30, 4);

/// TS pin not related to battery temperature
pub const TS_UNRELATED: Field = Field::new(AXP20X_ADC_RATE, 0x04, 2);

/// When the TS bias current source is active
pub const TS_WHEN: Field = Field::new(AXP20X_ADC_RATE, 0x03, 0);

/// Gauge enable
pub const GAUGE_ENABLE: Field = Field::new(AXP20X_FG_RES, 0x80, 7);

/// Gauge battery percent
pub const GAUGE_PERCENT: Field = Field::new(AXP20X_FG_RES, 0x7F, 0);

/// RDC calibration trigger
pub const RDC_CALIBRATE: Field = Field::new(AXP20X_RDC_H, 0x80, 7);

/// RDC bits 12..8
pub const RDC_HIGH: Field = Field::new(AXP20X_RDC_H, 0x1F, 0);

/// RDC bits 7..0
pub const RDC_LOW: Field = Field::new(AXP20X_RDC_L, 0xFF, 0);
