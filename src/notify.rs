//! Change notification sink for telemetry consumers

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// Receives a call every time consumers should re-read the battery
///
/// Notifications may be spurious: a call does not promise that any
/// property actually changed.
pub trait Notify {
    fn power_supply_changed(&mut self);
}

impl<F: FnMut()> Notify for F {
    fn power_supply_changed(&mut self) {
        self()
    }
}

/// Raises an embassy [`Signal`] on every change
pub struct SignalNotifier<'a, M: RawMutex> {
    signal: &'a Signal<M, ()>,
}

impl<'a, M: RawMutex> SignalNotifier<'a, M> {
    pub const fn new(signal: &'a Signal<M, ()>) -> Self {
        Self { signal }
    }
}

impl<M: RawMutex> Notify for SignalNotifier<'_, M> {
    fn power_supply_changed(&mut self) {
        self.signal.signal(());
    }
}
