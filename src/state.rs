//! Cached battery state shared by the poll loop and the event handlers

use crate::types::Health;

/// One observation of the battery: health and gauge percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    pub health: Health,
    pub percent: u8,
}

impl Sample {
    pub const fn new(health: Health, percent: u8) -> Self {
        Self { health, percent }
    }
}

/// Last observed battery state and the charge-current settings
///
/// Health and percent only change together through [`BatteryState::update`],
/// which reports whether the pair differs from what was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryState {
    sample: Sample,
    capacity_design_uah: u32,
    current_ceiling_ua: u32,
}

impl BatteryState {
    pub const fn new() -> Self {
        Self {
            sample: Sample::new(Health::Unknown, 0),
            capacity_design_uah: 0,
            current_ceiling_ua: 0,
        }
    }

    pub fn sample(&self) -> Sample {
        self.sample
    }

    pub fn health(&self) -> Health {
        self.sample.health
    }

    pub fn percent(&self) -> u8 {
        self.sample.percent
    }

    /// Store a new sample; returns `true` if health or percent changed
    pub fn update(&mut self, sample: Sample) -> bool {
        let changed = self.sample != sample;
        self.sample = sample;
        changed
    }

    /// Replace the health, keeping the percent
    pub fn set_health(&mut self, health: Health) -> bool {
        self.update(Sample::new(health, self.sample.percent))
    }

    /// Design capacity in µAh
    pub fn capacity_design(&self) -> u32 {
        self.capacity_design_uah
    }

    /// Record the design capacity and reset the charge-current ceiling to
    /// match it, never below the lowest programmable current
    pub fn set_capacity_design(&mut self, uah: u32, floor_ua: u32) {
        self.capacity_design_uah = uah;
        self.current_ceiling_ua = uah.max(floor_ua);
    }

    /// User ceiling on the charge current in µA
    pub fn current_ceiling(&self) -> u32 {
        self.current_ceiling_ua
    }

    pub fn set_current_ceiling(&mut self, ua: u32) {
        self.current_ceiling_ua = ua;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reports_changes_only() {
        let mut state = BatteryState::new();
        assert!(!state.update(Sample::new(Health::Unknown, 0)));
        assert!(state.update(Sample::new(Health::Unknown, 55)));
        assert!(!state.update(Sample::new(Health::Unknown, 55)));
        assert!(state.set_health(Health::Good));
        assert_eq!(state.sample(), Sample::new(Health::Good, 55));
        assert!(!state.set_health(Health::Good));
    }

    #[test]
    fn ceiling_defaults_from_capacity() {
        let mut state = BatteryState::new();
        state.set_capacity_design(2_000_000, 300_000);
        assert_eq!(state.current_ceiling(), 2_000_000);

        state.set_capacity_design(100_000, 300_000);
        assert_eq!(state.capacity_design(), 100_000);
        assert_eq!(state.current_ceiling(), 300_000);
    }
}
