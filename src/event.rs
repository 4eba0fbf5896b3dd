//! Hardware events and the state transitions they trigger
//!
//! Every interrupt the battery cares about maps to one [`Transition`]:
//! an optional new health, an optional charger enable/disable, whether the
//! charge policy must be re-derived, and how loudly to log it. Handling an
//! event always ends with a notification, even when nothing changed.

use crate::{
    battery::Battery,
    error::Error,
    notify::Notify,
    registers::AXP20X_IRQ_BANKS,
    types::Health,
};
use embedded_hal::i2c::I2c;
use log::{log, warn, Level};

/// Asynchronous PMIC events relevant to the battery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryEvent {
    MainsPlugIn,
    MainsRemoval,
    BusPlugIn,
    BusRemoval,
    BatteryInserted,
    BatteryRemoved,
    ActivationStarted,
    ActivationCompleted,
    Charging,
    Charged,
    Overheat,
    UnderTemperature,
    /// Supply cannot deliver the programmed charge current
    SourceTooWeak,
    PowerLowWarning,
    PowerLowCritical,
}

/// Effect of one event on the battery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub health: Option<Health>,
    pub charging: Option<bool>,
    pub reconfigure: bool,
    pub level: Level,
    pub message: &'static str,
}

impl Transition {
    const fn notify(level: Level, message: &'static str) -> Self {
        Self {
            health: None,
            charging: None,
            reconfigure: false,
            level,
            message,
        }
    }

    const fn health(mut self, health: Health) -> Self {
        self.health = Some(health);
        self
    }

    const fn charging(mut self, enable: bool) -> Self {
        self.charging = Some(enable);
        self
    }

    const fn reconfigure(mut self) -> Self {
        self.reconfigure = true;
        self
    }
}

/// IRQ status bits, as (bank, bit, event)
const IRQ_MAP: [(usize, u8, BatteryEvent); 15] = [
    (0, 6, BatteryEvent::MainsPlugIn),
    (0, 5, BatteryEvent::MainsRemoval),
    (0, 3, BatteryEvent::BusPlugIn),
    (0, 2, BatteryEvent::BusRemoval),
    (1, 7, BatteryEvent::BatteryInserted),
    (1, 6, BatteryEvent::BatteryRemoved),
    (1, 5, BatteryEvent::ActivationStarted),
    (1, 4, BatteryEvent::ActivationCompleted),
    (1, 3, BatteryEvent::Charging),
    (1, 2, BatteryEvent::Charged),
    (1, 1, BatteryEvent::Overheat),
    (1, 0, BatteryEvent::UnderTemperature),
    (2, 6, BatteryEvent::SourceTooWeak),
    (3, 1, BatteryEvent::PowerLowWarning),
    (3, 0, BatteryEvent::PowerLowCritical),
];

impl BatteryEvent {
    /// What handling this event does
    pub const fn transition(self) -> Transition {
        use BatteryEvent::*;
        match self {
            MainsPlugIn => Transition::notify(Level::Info, "Mains connected").reconfigure(),
            MainsRemoval => Transition::notify(Level::Info, "Mains removed").reconfigure(),
            BusPlugIn => Transition::notify(Level::Info, "VBUS connected").reconfigure(),
            BusRemoval => Transition::notify(Level::Info, "VBUS removed").reconfigure(),
            BatteryInserted => Transition::notify(Level::Info, "Battery connected")
                .health(Health::Unknown)
                .charging(true),
            BatteryRemoved => Transition::notify(Level::Info, "Battery removed")
                .health(Health::Unknown)
                .charging(false),
            ActivationStarted => Transition::notify(Level::Info, "Battery activation started")
                .health(Health::Unknown),
            ActivationCompleted => {
                Transition::notify(Level::Info, "Battery activated").health(Health::Good)
            }
            Charging => Transition::notify(Level::Debug, "Battery charging"),
            Charged => Transition::notify(Level::Debug, "Battery charged"),
            Overheat => Transition::notify(Level::Warn, "Battery temperature high")
                .health(Health::Overheat)
                .charging(false),
            UnderTemperature => {
                Transition::notify(Level::Warn, "Battery temperature low").health(Health::Cold)
            }
            SourceTooWeak => {
                Transition::notify(Level::Info, "Supply too weak for the charge current")
            }
            PowerLowWarning => Transition::notify(Level::Warn, "System power running out"),
            PowerLowCritical => Transition::notify(Level::Error, "System power critically low"),
        }
    }

    /// Decode the IRQ status registers into the events they flag
    pub fn from_irq_status(
        status: [u8; AXP20X_IRQ_BANKS],
    ) -> impl Iterator<Item = BatteryEvent> {
        let map: &'static [(usize, u8, BatteryEvent)] = &IRQ_MAP;
        map.iter()
            .filter(move |(bank, bit, _)| status[*bank] & (1 << *bit) != 0)
            .map(|(_, _, event)| *event)
    }

    /// IRQ enable registers covering every battery event
    pub const fn irq_mask() -> [u8; AXP20X_IRQ_BANKS] {
        let mut mask = [0u8; AXP20X_IRQ_BANKS];
        let mut i = 0;
        while i < IRQ_MAP.len() {
            let (bank, bit, _) = IRQ_MAP[i];
            mask[bank] |= 1 << bit;
            i += 1;
        }
        mask
    }
}

impl<I, N> Battery<I, N>
where
    I: I2c,
    N: Notify,
{
    /// Apply the transition of one hardware event
    ///
    /// A failed register write abandons the rest of the transition; the
    /// notification is still sent.
    pub fn handle_event(&mut self, event: BatteryEvent) -> Result<(), Error<I::Error>> {
        let transition = event.transition();
        log!(transition.level, "{}", transition.message);

        if let Some(health) = transition.health {
            self.state.set_health(health);
        }
        let result = match transition.charging {
            Some(enable) => self.pmic.set_charging_enabled(enable),
            None => Ok(()),
        };

        if transition.reconfigure && result.is_ok() {
            // Notifies on its own
            return self.reconfigure_charge_current();
        }
        self.notify();
        result
    }

    /// Read and acknowledge pending battery interrupts and handle every
    /// event they flag
    ///
    /// Interrupts outside [`BatteryEvent::irq_mask`] are left pending.
    /// A failing handler is logged and the remaining events still run.
    /// Returns the number of events handled.
    pub fn service_irq(&mut self) -> Result<usize, Error<I::Error>> {
        let status = self.pmic.take_irq_status(BatteryEvent::irq_mask())?;
        let mut handled = 0;
        for event in BatteryEvent::from_irq_status(status) {
            if let Err(e) = self.handle_event(event) {
                warn!("Failed to handle {:?}: {:?}", event, e);
            }
            handled += 1;
        }
        Ok(handled)
    }

    /// Enable the interrupts [`BatteryEvent`] covers
    pub fn enable_irqs(&mut self) -> Result<(), Error<I::Error>> {
        self.pmic.enable_irqs(BatteryEvent::irq_mask())
    }
}
