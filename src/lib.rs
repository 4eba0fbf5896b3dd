#![cfg_attr(not(test), no_std)]
//! # AXP20x Battery Driver
//!
//! This crate drives the battery side of the X-Powers AXP20x Power
//! Management IC (PMIC). It supports:
//! - Decoding of the battery, TS and ACIN ADCs into µV / µA
//! - Fuel-gauge calibration (OCV curve, internal resistance, TS sensor)
//! - Battery health and gauge percent sampling with change notification
//! - A charge-current policy following the mains / VBUS supplies
//! - Interrupt decoding into battery events
//! - Telemetry properties (read and write)
//! - Mains and backup (RTC) cell supplies
//! - Async monitor and event tasks on embassy
//!
//! ## Example
//!
//! ```no_run
//! use axp20x_battery::{Axp20x, Battery, BatteryProfile, Error, Property};
//! # use embedded_hal::i2c::I2c;
//! # fn example<I: I2c>(i2c: I) -> Result<(), Error<I::Error>> {
//! let mut battery = Battery::new(Axp20x::new(i2c), || {
//!     // tell consumers to re-read the battery
//! });
//!
//! battery.configure(&BatteryProfile::new().with_capacity(2000))?;
//! battery.enable_irqs()?;
//!
//! // Every minute
//! battery.poll()?;
//! let voltage = battery.get_property(Property::VoltageNow)?;
//!
//! // When the PMIC raises its IRQ line
//! battery.service_irq()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Async tasks
//!
//! With the battery behind an embassy mutex, [`run_monitor`] polls it every
//! [`MONITOR_INTERVAL`] and [`run_irq_handler`] services the PMIC on each
//! falling edge of its IRQ line.

mod backup;
mod battery;
mod driver;
mod error;
mod event;
mod mains;
mod monitor;
mod notify;
mod policy;
mod profile;
mod registers;
mod state;
mod types;
pub mod units;

#[cfg(test)]
mod testing;

// Re-export main types
pub use backup::{Backup, BackupConfig};
pub use battery::Battery;
pub use driver::Axp20x;
pub use error::Error;
pub use event::{BatteryEvent, Transition};
pub use mains::Mains;
pub use monitor::{
    run_dispatcher, run_irq_handler, run_monitor, service_irq, MonitorCommand, MONITOR_INTERVAL,
};
pub use notify::{Notify, SignalNotifier};
pub use policy::{BUS_500MA_CHARGE_UA, BUS_900MA_CHARGE_UA};
pub use profile::{BatteryProfile, TempSensor, DEFAULT_RESISTANCE_MOHM};
pub use registers::*;
pub use state::{BatteryState, Sample};
pub use types::*;
