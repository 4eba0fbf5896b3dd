//! Type definitions and enumerations for the AXP20x battery driver
//!
//! This module provides strongly-typed enumerations for the register
//! fields the driver reads and writes, and for the telemetry properties it
//! exposes.

/// Battery health as reported to telemetry consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Health {
    #[default]
    Unknown,
    Good,
    Dead,
    Cold,
    Overheat,
}

/// Battery charging status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Charging,
    Discharging,
    NotCharging,
    Full,
}

/// Battery chemistry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technology {
    LiIon,
}

/// VBUS input current limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BusCurrentLimit {
    Limit900mA = 0,
    Limit500mA = 1,
    Limit100mA = 2,
    Unlimited = 3,
}

impl From<u8> for BusCurrentLimit {
    fn from(field: u8) -> Self {
        match field & 0x03 {
            0 => BusCurrentLimit::Limit900mA,
            1 => BusCurrentLimit::Limit500mA,
            2 => BusCurrentLimit::Limit100mA,
            _ => BusCurrentLimit::Unlimited,
        }
    }
}

/// Charge target voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChargeTargetVoltage {
    V4_10 = 0,
    V4_15 = 1,
    V4_20 = 2,
    V4_36 = 3,
}

impl ChargeTargetVoltage {
    pub fn microvolts(self) -> u32 {
        match self {
            ChargeTargetVoltage::V4_10 => 4_100_000,
            ChargeTargetVoltage::V4_15 => 4_150_000,
            ChargeTargetVoltage::V4_20 => 4_200_000,
            ChargeTargetVoltage::V4_36 => 4_360_000,
        }
    }

    /// Target voltages accepted from telemetry consumers.
    ///
    /// 4.36 V is never accepted: it is beyond what a Li-ion cell tolerates.
    pub fn from_microvolts(uv: u32) -> Option<Self> {
        match uv {
            4_100_000 => Some(ChargeTargetVoltage::V4_10),
            4_150_000 => Some(ChargeTargetVoltage::V4_15),
            4_200_000 => Some(ChargeTargetVoltage::V4_20),
            _ => None,
        }
    }
}

impl From<u8> for ChargeTargetVoltage {
    fn from(field: u8) -> Self {
        match field & 0x03 {
            0 => ChargeTargetVoltage::V4_10,
            1 => ChargeTargetVoltage::V4_15,
            2 => ChargeTargetVoltage::V4_20,
            _ => ChargeTargetVoltage::V4_36,
        }
    }
}

/// TS pin bias current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TsCurrent {
    I20uA = 0,
    I40uA = 1,
    I60uA = 2,
    I80uA = 3,
}

impl TsCurrent {
    pub fn from_microamps(ua: u32) -> Option<Self> {
        match ua {
            20 => Some(TsCurrent::I20uA),
            40 => Some(TsCurrent::I40uA),
            60 => Some(TsCurrent::I60uA),
            80 => Some(TsCurrent::I80uA),
            _ => None,
        }
    }
}

/// When the TS pin bias current is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TsMode {
    Off = 0,
    WhenCharging = 1,
    WhenSampling = 2,
    AlwaysOn = 3,
}

/// Backup battery target voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BackupVoltage {
    V3_1 = 0,
    V3_0 = 1,
    V3_6 = 2,
    V2_5 = 3,
}

impl BackupVoltage {
    pub fn microvolts(self) -> u32 {
        match self {
            BackupVoltage::V3_1 => 3_100_000,
            BackupVoltage::V3_0 => 3_000_000,
            BackupVoltage::V3_6 => 3_600_000,
            BackupVoltage::V2_5 => 2_500_000,
        }
    }

    pub fn from_microvolts(uv: u32) -> Option<Self> {
        match uv {
            3_100_000 => Some(BackupVoltage::V3_1),
            3_000_000 => Some(BackupVoltage::V3_0),
            3_600_000 => Some(BackupVoltage::V3_6),
            2_500_000 => Some(BackupVoltage::V2_5),
            _ => None,
        }
    }
}

impl From<u8> for BackupVoltage {
    fn from(field: u8) -> Self {
        match field & 0x03 {
            0 => BackupVoltage::V3_1,
            1 => BackupVoltage::V3_0,
            2 => BackupVoltage::V3_6,
            _ => BackupVoltage::V2_5,
        }
    }
}

/// Backup battery charge current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BackupCurrent {
    I50uA = 0,
    I100uA = 1,
    I200uA = 2,
    I400uA = 3,
}

impl BackupCurrent {
    pub fn microamps(self) -> u32 {
        match self {
            BackupCurrent::I50uA => 50,
            BackupCurrent::I100uA => 100,
            BackupCurrent::I200uA => 200,
            BackupCurrent::I400uA => 400,
        }
    }

    pub fn from_microamps(ua: u32) -> Option<Self> {
        match ua {
            50 => Some(BackupCurrent::I50uA),
            100 => Some(BackupCurrent::I100uA),
            200 => Some(BackupCurrent::I200uA),
            400 => Some(BackupCurrent::I400uA),
            _ => None,
        }
    }
}

impl From<u8> for BackupCurrent {
    fn from(field: u8) -> Self {
        match field & 0x03 {
            0 => BackupCurrent::I50uA,
            1 => BackupCurrent::I100uA,
            2 => BackupCurrent::I200uA,
            _ => BackupCurrent::I400uA,
        }
    }
}

/// Telemetry properties exposed by the battery supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Present,
    Online,
    Status,
    VoltageNow,
    CurrentNow,
    CurrentMax,
    Health,
    Technology,
    VoltageMaxDesign,
    VoltageMinDesign,
    ChargeFullDesign,
    Capacity,
    Temp,
    TempAlertMin,
    TempAlertMax,
}

impl Property {
    /// Every property, in the order consumers enumerate them
    pub const ALL: [Property; 15] = [
        Property::Present,
        Property::Online,
        Property::Status,
        Property::VoltageNow,
        Property::CurrentNow,
        Property::CurrentMax,
        Property::Health,
        Property::Technology,
        Property::VoltageMaxDesign,
        Property::VoltageMinDesign,
        Property::ChargeFullDesign,
        Property::Capacity,
        Property::Temp,
        Property::TempAlertMin,
        Property::TempAlertMax,
    ];

    /// Whether consumers may write this property
    pub fn is_writeable(self) -> bool {
        matches!(
            self,
            Property::VoltageMinDesign
                | Property::VoltageMaxDesign
                | Property::CurrentMax
                | Property::Status
        )
    }

    /// Properties only present when a temperature sensor is configured
    pub fn needs_temp_sensor(self) -> bool {
        matches!(
            self,
            Property::Temp | Property::TempAlertMin | Property::TempAlertMax
        )
    }
}

/// A property value. Voltages are in µV, currents in µA, charge in µAh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Status(Status),
    Health(Health),
    Technology(Technology),
}
