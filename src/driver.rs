//! Synchronous AXP20x register interface
//!
//! `Axp20x` wraps the I2C bus and exposes one typed accessor per register
//! field the battery, mains and backup supplies need.

use crate::{error::Error, registers::*, types::*, units};
use embedded_hal::i2c::I2c;

/// Largest block written in a single bus transaction
const MAX_BLOCK: usize = 8;

/// AXP20x register interface
pub struct Axp20x<I> {
    i2c: I,
    addr: u8,
}

impl<I> Axp20x<I>
where
    I: I2c,
{
    /// Create a new AXP20x register interface
    ///
    /// # Arguments
    /// * `i2c` - I2C bus instance
    ///
    /// # Example
    /// ```no_run
    /// # use axp20x_battery::Axp20x;
    /// # use embedded_hal::i2c::I2c;
    /// # fn example<I: I2c>(i2c: I) {
    /// let pmic = Axp20x::new(i2c);
    /// # }
    /// ```
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, AXP20X_SLAVE_ADDRESS)
    }

    /// Create a new AXP20x register interface with custom I2C address
    pub fn with_address(i2c: I, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Give the bus back
    pub fn release(self) -> I {
        self.i2c
    }

    #[cfg(test)]
    pub(crate) fn i2c_mut(&mut self) -> &mut I {
        &mut self.i2c
    }

    // ========================================
    // Low-level I2C operations
    // ========================================

    /// Read a single register
    pub fn read_register(&mut self, reg: u8) -> Result<u8, Error<I::Error>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    /// Write a single register
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.addr, &[reg, value]).map_err(Error::I2c)
    }

    /// Read consecutive registers
    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.i2c
            .write_read(self.addr, &[reg], buf)
            .map_err(Error::I2c)
    }

    /// Write consecutive registers
    fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), Error<I::Error>> {
        let mut buf = [0u8; MAX_BLOCK + 1];
        if data.len() > MAX_BLOCK {
            return Err(Error::InvalidArgument);
        }
        buf[0] = reg;
        buf[1..=data.len()].copy_from_slice(data);
        self.i2c
            .write(self.addr, &buf[..=data.len()])
            .map_err(Error::I2c)
    }

    /// Read-modify-write the bits selected by `mask`
    pub fn update_bits(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<I::Error>> {
        let val = self.read_register(reg)?;
        self.write_register(reg, (val & !mask) | (value & mask))
    }

    /// Read a register field
    pub fn read_field(&mut self, field: Field) -> Result<u8, Error<I::Error>> {
        Ok(field.get(self.read_register(field.reg)?))
    }

    /// Write a register field, leaving the other bits untouched
    pub fn write_field(&mut self, field: Field, value: u8) -> Result<(), Error<I::Error>> {
        self.update_bits(field.reg, field.mask, field.put(value))
    }

    /// Read a 12-bit (two registers) or 24-bit (three registers) ADC value
    pub fn read_variable_width(&mut self, reg: u8, width: u32) -> Result<u32, Error<I::Error>> {
        let mut buf = [0u8; 3];
        let len = if width > 16 { 3 } else { 2 };
        self.read_registers(reg, &mut buf[..len])?;
        Ok(units::compose(&buf[..len], width))
    }

    // ========================================
    // Status
    // ========================================

    /// Power input status flags
    pub fn input_status(&mut self) -> Result<InputStatus, Error<I::Error>> {
        Ok(InputStatus::from_bits_retain(
            self.read_register(AXP20X_PWR_INPUT_STATUS)?,
        ))
    }

    /// Operating mode flags
    pub fn operating_mode(&mut self) -> Result<OperatingMode, Error<I::Error>> {
        Ok(OperatingMode::from_bits_retain(
            self.read_register(AXP20X_PWR_OP_MODE)?,
        ))
    }

    /// Check if a battery is connected
    pub fn is_battery_present(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self
            .operating_mode()?
            .contains(OperatingMode::BATT_PRESENT))
    }

    /// VBUS input current limit
    pub fn bus_current_limit(&mut self) -> Result<BusCurrentLimit, Error<I::Error>> {
        Ok(BusCurrentLimit::from(self.read_field(VBUS_CURRENT_LIMIT)?))
    }

    // ========================================
    // Charging Control
    // ========================================

    /// Check if the charger is enabled
    pub fn is_charging_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.read_field(CHARGE_ENABLE)? != 0)
    }

    /// Enable or disable the charger
    pub fn set_charging_enabled(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.write_field(CHARGE_ENABLE, enable as u8)
    }

    /// Get the charge target current field
    pub fn charge_current_field(&mut self) -> Result<u8, Error<I::Error>> {
        self.read_field(CHARGE_TARGET_CURRENT)
    }

    /// Set the charge target current field
    pub fn set_charge_current_field(&mut self, field: u8) -> Result<(), Error<I::Error>> {
        if field > units::CHARGE_CURRENT_MAX_FIELD {
            return Err(Error::InvalidArgument);
        }
        self.write_field(CHARGE_TARGET_CURRENT, field)
    }

    /// Get the charge target voltage
    pub fn charge_target_voltage(&mut self) -> Result<ChargeTargetVoltage, Error<I::Error>> {
        Ok(ChargeTargetVoltage::from(
            self.read_field(CHARGE_TARGET_VOLTAGE)?,
        ))
    }

    /// Set the charge target voltage
    pub fn set_charge_target_voltage(
        &mut self,
        voltage: ChargeTargetVoltage,
    ) -> Result<(), Error<I::Error>> {
        self.write_field(CHARGE_TARGET_VOLTAGE, voltage as u8)
    }

    // ========================================
    // Power Warning Levels
    // ========================================

    /// Get the power warning level (register value)
    pub fn warn_level1(&mut self) -> Result<u8, Error<I::Error>> {
        self.read_register(AXP20X_APS_WARN_L1)
    }

    /// Set the power warning level (register value)
    pub fn set_warn_level1(&mut self, level: u8) -> Result<(), Error<I::Error>> {
        self.write_register(AXP20X_APS_WARN_L1, level)
    }

    /// Get the critical power warning level (register value)
    pub fn warn_level2(&mut self) -> Result<u8, Error<I::Error>> {
        self.read_register(AXP20X_APS_WARN_L2)
    }

    /// Set the critical power warning level (register value)
    pub fn set_warn_level2(&mut self, level: u8) -> Result<(), Error<I::Error>> {
        self.write_register(AXP20X_APS_WARN_L2, level)
    }

    // ========================================
    // Fuel Gauge
    // ========================================

    /// Enable or disable the fuel gauge
    pub fn set_gauge_enabled(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.write_field(GAUGE_ENABLE, enable as u8)
    }

    /// Get battery percentage (0-100) from the fuel gauge
    pub fn battery_percent(&mut self) -> Result<u8, Error<I::Error>> {
        self.read_field(GAUGE_PERCENT)
    }

    /// Store the battery internal resistance register value (13 bits)
    pub fn set_rdc(&mut self, rdc: u16) -> Result<(), Error<I::Error>> {
        let rdc = rdc.min(units::RDC_MAX);
        self.write_field(RDC_CALIBRATE, 0)?;
        self.write_field(RDC_LOW, (rdc & 0xFF) as u8)?;
        self.write_field(RDC_HIGH, (rdc >> 8) as u8)
    }

    /// Store one point of the open-circuit-voltage curve
    pub fn set_ocv(&mut self, index: usize, percent: u8) -> Result<(), Error<I::Error>> {
        if index >= OCV_CURVE_SIZE {
            return Err(Error::InvalidArgument);
        }
        self.write_register(AXP20X_OCV_BASE + index as u8, percent)
    }

    /// Enable or disable battery detection
    pub fn set_battery_monitor(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.write_field(BATTERY_MONITOR, enable as u8)
    }

    // ========================================
    // ADC Control and Measurements
    // ========================================

    /// Enable or disable ADC channels; channels outside `mask` are untouched
    pub fn set_adc_channels(
        &mut self,
        mask: AdcChannels,
        enabled: AdcChannels,
    ) -> Result<(), Error<I::Error>> {
        self.update_bits(AXP20X_ADC_EN1, mask.bits(), enabled.bits())
    }

    /// Drive the TS pin with `current` while sampling, or detach it from
    /// battery temperature monitoring when `None`
    pub fn configure_ts_pin(&mut self, current: Option<TsCurrent>) -> Result<(), Error<I::Error>> {
        match current {
            None => self.update_bits(
                AXP20X_ADC_RATE,
                TS_WHEN.mask | TS_UNRELATED.mask,
                TS_UNRELATED.put(1) | TS_WHEN.put(TsMode::Off as u8),
            ),
            Some(current) => self.update_bits(
                AXP20X_ADC_RATE,
                TS_CURRENT.mask | TS_WHEN.mask | TS_UNRELATED.mask,
                TS_CURRENT.put(current as u8) | TS_WHEN.put(TsMode::WhenSampling as u8),
            ),
        }
    }

    /// Set the TS hot (low voltage) and cold (high voltage) thresholds for
    /// both charging and discharging
    pub fn set_ts_thresholds(&mut self, hot: u8, cold: u8) -> Result<(), Error<I::Error>> {
        self.write_register(AXP20X_V_HTF_CHRG, hot)?;
        self.write_register(AXP20X_V_HTF_DISCHRG, hot)?;
        self.write_register(AXP20X_V_LTF_CHRG, cold)?;
        self.write_register(AXP20X_V_LTF_DISCHRG, cold)
    }

    /// Raw 12-bit battery voltage
    pub fn battery_voltage_raw(&mut self) -> Result<u32, Error<I::Error>> {
        self.read_variable_width(AXP20X_BATT_V_H, 12)
    }

    /// Raw 12-bit battery charge current
    pub fn charge_current_raw(&mut self) -> Result<u32, Error<I::Error>> {
        self.read_variable_width(AXP20X_BATT_CHRG_I_H, 12)
    }

    /// Raw 12-bit battery discharge current
    pub fn discharge_current_raw(&mut self) -> Result<u32, Error<I::Error>> {
        self.read_variable_width(AXP20X_BATT_DISCHRG_I_H, 12)
    }

    /// Raw 12-bit TS pin voltage
    pub fn ts_raw(&mut self) -> Result<u32, Error<I::Error>> {
        self.read_variable_width(AXP20X_TS_IN_H, 12)
    }

    /// Raw 12-bit ACIN voltage
    pub fn mains_voltage_raw(&mut self) -> Result<u32, Error<I::Error>> {
        self.read_variable_width(AXP20X_ACIN_V_ADC_H, 12)
    }

    /// Raw 12-bit ACIN current
    pub fn mains_current_raw(&mut self) -> Result<u32, Error<I::Error>> {
        self.read_variable_width(AXP20X_ACIN_I_ADC_H, 12)
    }

    // ========================================
    // Backup Battery
    // ========================================

    /// Check if the backup battery charger is enabled
    pub fn is_backup_charging_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.read_field(BACKUP_ENABLE)? != 0)
    }

    /// Enable or disable the backup battery charger
    pub fn set_backup_charging_enabled(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.write_field(BACKUP_ENABLE, enable as u8)
    }

    /// Program the backup battery charger and enable it
    pub fn configure_backup(
        &mut self,
        voltage: BackupVoltage,
        current: BackupCurrent,
    ) -> Result<(), Error<I::Error>> {
        self.update_bits(
            AXP20X_CHRG_BAK_CTRL,
            BACKUP_ENABLE.mask | BACKUP_VOLTAGE.mask | BACKUP_CURRENT.mask,
            BACKUP_ENABLE.put(1)
                | BACKUP_VOLTAGE.put(voltage as u8)
                | BACKUP_CURRENT.put(current as u8),
        )
    }

    /// Get the backup battery target voltage
    pub fn backup_voltage(&mut self) -> Result<BackupVoltage, Error<I::Error>> {
        Ok(BackupVoltage::from(self.read_field(BACKUP_VOLTAGE)?))
    }

    /// Get the backup battery charge current
    pub fn backup_current(&mut self) -> Result<BackupCurrent, Error<I::Error>> {
        Ok(BackupCurrent::from(self.read_field(BACKUP_CURRENT)?))
    }

    // ========================================
    // Interrupt Control
    // ========================================

    /// Program the five IRQ enable registers
    pub fn enable_irqs(&mut self, banks: [u8; AXP20X_IRQ_BANKS]) -> Result<(), Error<I::Error>> {
        self.write_registers(AXP20X_IRQ1_EN, &banks)
    }

    /// Read the five IRQ status registers and acknowledge the pending bits
    /// selected by `mask`
    ///
    /// Bits outside the mask stay pending for whoever else owns them and
    /// are not returned.
    pub fn take_irq_status(
        &mut self,
        mask: [u8; AXP20X_IRQ_BANKS],
    ) -> Result<[u8; AXP20X_IRQ_BANKS], Error<I::Error>> {
        let mut status = [0u8; AXP20X_IRQ_BANKS];
        self.read_registers(AXP20X_IRQ1_STATE, &mut status)?;
        for (bits, mask) in status.iter_mut().zip(mask) {
            *bits &= mask;
        }
        // Status bits are write-1-to-clear
        self.write_registers(AXP20X_IRQ1_STATE, &status)?;
        Ok(status)
    }
}
