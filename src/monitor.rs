//! Async tasks driving the battery: the periodic monitor, the event
//! dispatcher and the IRQ line handler
//!
//! All three share one `Battery` behind an embassy [`Mutex`]. Errors are
//! logged here and never end a task.

use crate::{battery::Battery, event::BatteryEvent, notify::Notify};
use core::convert::Infallible;
use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel, mutex::Mutex};
use embassy_time::{Duration, Timer};
use embedded_hal::i2c::I2c;
use embedded_hal_async::digital::Wait;
use log::{debug, info, warn};

/// Delay between the end of one poll and the start of the next
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(60);

/// Control messages for [`run_monitor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Cancel the pending poll and stop re-arming
    Suspend,
    /// Poll once right away, then re-arm
    Resume,
    /// Stop the monitor for good
    Shutdown,
}

async fn poll_once<M, I, N>(battery: &Mutex<M, Battery<I, N>>)
where
    M: RawMutex,
    I: I2c,
    N: Notify,
{
    if let Err(e) = battery.lock().await.poll() {
        warn!("Battery poll failed: {:?}", e);
    }
}

/// Poll the battery every [`MONITOR_INTERVAL`] until shut down
///
/// # Example
/// ```no_run
/// # use axp20x_battery::{Battery, MonitorCommand, run_monitor};
/// # use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
/// # use embassy_sync::{channel::Channel, mutex::Mutex};
/// # async fn example<I: embedded_hal::i2c::I2c, N: axp20x_battery::Notify>(
/// #     battery: Mutex<CriticalSectionRawMutex, Battery<I, N>>,
/// # ) {
/// let commands = Channel::<CriticalSectionRawMutex, MonitorCommand, 2>::new();
/// run_monitor(&battery, &commands).await;
/// # }
/// ```
pub async fn run_monitor<M, I, N, const Q: usize>(
    battery: &Mutex<M, Battery<I, N>>,
    commands: &Channel<M, MonitorCommand, Q>,
) where
    M: RawMutex,
    I: I2c,
    N: Notify,
{
    let mut suspended = false;
    loop {
        if !suspended {
            poll_once(battery).await;
        }

        let command = if suspended {
            commands.receive().await
        } else {
            match select(Timer::after(MONITOR_INTERVAL), commands.receive()).await {
                Either::First(()) => continue,
                Either::Second(command) => command,
            }
        };

        debug!("Battery monitor: {:?}", command);
        match command {
            MonitorCommand::Suspend => suspended = true,
            MonitorCommand::Resume => suspended = false,
            MonitorCommand::Shutdown => {
                info!("Battery monitor stopped");
                return;
            }
        }
    }
}

/// Handle queued battery events forever
pub async fn run_dispatcher<M, I, N, const Q: usize>(
    battery: &Mutex<M, Battery<I, N>>,
    events: &Channel<M, BatteryEvent, Q>,
) -> !
where
    M: RawMutex,
    I: I2c,
    N: Notify,
{
    loop {
        let event = events.receive().await;
        if let Err(e) = battery.lock().await.handle_event(event) {
            warn!("Failed to handle {:?}: {:?}", event, e);
        }
    }
}

/// Read, acknowledge and handle pending PMIC interrupts
pub async fn service_irq<M, I, N>(battery: &Mutex<M, Battery<I, N>>)
where
    M: RawMutex,
    I: I2c,
    N: Notify,
{
    match battery.lock().await.service_irq() {
        Ok(handled) => debug!("Handled {} battery events", handled),
        Err(e) => warn!("Failed to read IRQ status: {:?}", e),
    }
}

/// Service the PMIC on every falling edge of its IRQ line
///
/// Only returns if waiting on the pin fails.
pub async fn run_irq_handler<M, I, N, P>(
    battery: &Mutex<M, Battery<I, N>>,
    irq: &mut P,
) -> Result<Infallible, P::Error>
where
    M: RawMutex,
    I: I2c,
    N: Notify,
    P: Wait,
{
    loop {
        irq.wait_for_falling_edge().await?;
        service_irq(battery).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::tests::{configured, Counter};
    use crate::profile::BatteryProfile;
    use crate::registers::*;
    use crate::testing::FakeBus;
    use crate::types::Health;
    use embassy_futures::{block_on, yield_now};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_time::MockDriver;

    type Shared = Mutex<NoopRawMutex, Battery<FakeBus, Counter>>;

    fn shared() -> Shared {
        Mutex::new(configured(BatteryProfile::new().with_capacity(2000)))
    }

    /// Give the other half of a `select` a few turns
    async fn settle() {
        for _ in 0..4 {
            yield_now().await;
        }
    }

    /// Change the gauge reading so the next poll notifies
    async fn set_percent(battery: &Shared, percent: u8) {
        battery
            .lock()
            .await
            .pmic()
            .i2c_mut()
            .set(AXP20X_FG_RES, percent);
    }

    async fn polls(battery: &Shared) -> usize {
        battery.lock().await.notifier().0
    }

    #[test]
    fn monitor_schedule() {
        let clock = MockDriver::get();
        clock.reset();
        let battery = shared();
        let commands = Channel::<NoopRawMutex, MonitorCommand, 2>::new();
        block_on(set_percent(&battery, 10));

        let outcome = block_on(select(run_monitor(&battery, &commands), async {
            // First cycle runs right away
            settle().await;
            assert_eq!(polls(&battery).await, 1);

            // Re-armed for one interval after the cycle
            set_percent(&battery, 20).await;
            clock.advance(Duration::from_secs(59));
            settle().await;
            assert_eq!(polls(&battery).await, 1);
            clock.advance(Duration::from_secs(1));
            settle().await;
            assert_eq!(polls(&battery).await, 2);

            // Suspend cancels the pending cycle
            commands.send(MonitorCommand::Suspend).await;
            settle().await;
            set_percent(&battery, 30).await;
            clock.advance(MONITOR_INTERVAL * 3);
            settle().await;
            assert_eq!(polls(&battery).await, 2);

            // Resume runs exactly one cycle, then waits a full interval
            commands.send(MonitorCommand::Resume).await;
            settle().await;
            assert_eq!(polls(&battery).await, 3);
            set_percent(&battery, 40).await;
            settle().await;
            assert_eq!(polls(&battery).await, 3);
            clock.advance(MONITOR_INTERVAL);
            settle().await;
            assert_eq!(polls(&battery).await, 4);

            commands.send(MonitorCommand::Shutdown).await;
            core::future::pending::<()>().await;
        }));

        assert!(matches!(outcome, Either::First(())));
        assert_eq!(block_on(battery.lock()).state().percent(), 40);
    }

    #[test]
    fn dispatcher_drains_queue() {
        let battery = shared();
        let events = Channel::<NoopRawMutex, BatteryEvent, 4>::new();
        events.try_send(BatteryEvent::ActivationCompleted).unwrap();
        events.try_send(BatteryEvent::Charging).unwrap();
        events.try_send(BatteryEvent::UnderTemperature).unwrap();

        block_on(select(run_dispatcher(&battery, &events), async {
            for _ in 0..8 {
                yield_now().await;
            }
        }));

        let battery = block_on(battery.lock());
        assert_eq!(battery.state().health(), Health::Cold);
        assert_eq!(battery.notifier().0, 3);
        assert!(events.is_empty());
    }

    #[test]
    fn service_irq_locks_and_handles() {
        let battery = shared();
        block_on(async {
            battery
                .lock()
                .await
                .pmic()
                .i2c_mut()
                .set(AXP20X_IRQ1_STATE + 1, 0x10);
            service_irq(&battery).await;
        });

        let battery = block_on(battery.lock());
        assert_eq!(battery.state().health(), Health::Good);
        assert_eq!(battery.notifier().0, 1);
    }
}
