//! ADC and register-field unit conversions
//!
//! All conversions are exact integer arithmetic: the AXP20x ADC steps are
//! whole µV/µA multiples, so no rounding is involved.

/// Battery voltage ADC step (1.1 mV)
pub const BATT_VOLTAGE_STEP_UV: u32 = 1100;

/// Battery charge/discharge current ADC step (0.5 mA)
pub const BATT_CURRENT_STEP_UA: u32 = 500;

/// TS pin voltage ADC step (0.8 mV)
pub const TS_VOLTAGE_STEP_UV: u32 = 800;

/// ACIN voltage ADC step (1.7 mV)
pub const ACIN_VOLTAGE_STEP_UV: u32 = 1700;

/// ACIN current ADC step (0.375 mA)
pub const ACIN_CURRENT_STEP_UA: u32 = 375;

/// Pack voltage below which the cell is considered dead
pub const DEAD_VOLTAGE_UV: u32 = 2_000_000;

/// Discharge current below which the battery counts as idle
pub const IDLE_CURRENT_UA: u32 = 2000;

/// Charge current register: 16 steps of 100 mA starting at 300 mA
pub const CHARGE_CURRENT_MIN_UA: u32 = 300_000;
pub const CHARGE_CURRENT_STEP_UA: u32 = 100_000;
pub const CHARGE_CURRENT_MAX_FIELD: u8 = 0x0F;
pub const CHARGE_CURRENT_MAX_UA: u32 =
    CHARGE_CURRENT_MIN_UA + CHARGE_CURRENT_MAX_FIELD as u32 * CHARGE_CURRENT_STEP_UA;

/// APS warning levels: 2.8672 V base, 4 × 1.4 mV per step
pub const APS_WARN_BASE_UV: u32 = 2_867_200;
pub const APS_WARN_STEP_UV: u32 = 4 * 1400;

/// Default warning level: about 5% capacity
pub const APS_WARN_L1_DEFAULT_UV: u32 = 3_500_000;

/// Default critical level
pub const APS_WARN_L2_DEFAULT_UV: u32 = 3_304_000;

/// TS threshold registers hold the top 8 bits of the 12-bit TS reading
pub const TS_THRESHOLD_DIVISOR: u16 = 0x10;

/// Largest value the 13-bit RDC register holds
pub const RDC_MAX: u16 = 0x1FFF;

/// Compose a variable-width ADC value from consecutive registers.
///
/// All bytes but the last are full high bytes; the last contributes only
/// its low `width - 8 * (n - 1)` bits.
pub fn compose(bytes: &[u8], width: u32) -> u32 {
    let Some((&low, high)) = bytes.split_last() else {
        return 0;
    };
    let low_bits = width.saturating_sub(8 * high.len() as u32).min(8);
    let high = high.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
    let low_mask = ((1u32 << low_bits) - 1) as u8;
    (high << low_bits) | (low & low_mask) as u32
}

/// Battery voltage in µV
pub fn battery_voltage(raw: u32) -> u32 {
    raw * BATT_VOLTAGE_STEP_UV
}

/// Battery charge or discharge current in µA
pub fn battery_current(raw: u32) -> u32 {
    raw * BATT_CURRENT_STEP_UA
}

/// TS pin voltage in µV
pub fn ts_voltage(raw: u32) -> u32 {
    raw * TS_VOLTAGE_STEP_UV
}

/// ACIN voltage in µV
pub fn mains_voltage(raw: u32) -> u32 {
    raw * ACIN_VOLTAGE_STEP_UV
}

/// ACIN current in µA
pub fn mains_current(raw: u32) -> u32 {
    raw * ACIN_CURRENT_STEP_UA
}

/// Whether a raw battery voltage reading means a dead cell
pub fn is_dead(raw_voltage: u32) -> bool {
    battery_voltage(raw_voltage) < DEAD_VOLTAGE_UV
}

/// RDC register value for an internal resistance, rounded to nearest
pub fn rdc_register(resistance_mohm: u32) -> u16 {
    let value = (resistance_mohm as u64 * 10_000 + 5371) / 10_742;
    value.min(RDC_MAX as u64) as u16
}

/// Target-current field for a charge current, clamped to the top step.
///
/// Returns `None` below the 300 mA floor: there is no field for it.
pub fn charge_current_field(ua: u32) -> Option<u8> {
    if ua < CHARGE_CURRENT_MIN_UA {
        return None;
    }
    let steps = (ua - CHARGE_CURRENT_MIN_UA) / CHARGE_CURRENT_STEP_UA;
    Some(steps.min(CHARGE_CURRENT_MAX_FIELD as u32) as u8)
}

/// Charge current in µA programmed by a target-current field
pub fn charge_current(field: u8) -> u32 {
    (field & CHARGE_CURRENT_MAX_FIELD) as u32 * CHARGE_CURRENT_STEP_UA + CHARGE_CURRENT_MIN_UA
}

/// Voltage in µV of an APS warning level register
pub fn warn_level_voltage(level: u8) -> u32 {
    APS_WARN_BASE_UV + APS_WARN_STEP_UV * level as u32
}

/// APS warning level register for a voltage, rounded down
pub fn warn_level(uv: u32) -> Option<u8> {
    let steps = uv.checked_sub(APS_WARN_BASE_UV)? / APS_WARN_STEP_UV;
    u8::try_from(steps).ok()
}

/// TS threshold register for a raw TS reading
pub fn ts_threshold(raw: u16) -> u8 {
    (raw / TS_THRESHOLD_DIVISOR).min(u8::MAX as u16) as u8
}
