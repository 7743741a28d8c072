use std::{sync::Arc, time::Duration};

use embedded_hal::digital::OutputPin;
use thermostat_common::{RelayState, RuntimeConfig, ThermostatEngine};
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::state::{RelayPublisher, SharedControlState};

/// Thermostat control task. Parks until the first plausible temperature has
/// been published, then reads the published temperature and setpoint every
/// poll and drives the relay (active high) only on transitions.
pub struct ControlTask<R> {
    engine: ThermostatEngine,
    relay: R,
    state: Arc<SharedControlState>,
    publisher: RelayPublisher,
    first_reading: watch::Receiver<bool>,
    period: Duration,
}

impl<R: OutputPin> ControlTask<R> {
    pub fn new(
        config: &RuntimeConfig,
        relay: R,
        state: Arc<SharedControlState>,
        publisher: RelayPublisher,
        first_reading: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine: ThermostatEngine::new(&config.thermostat),
            relay,
            state,
            publisher,
            first_reading,
            period: Duration::from_millis(config.timing.control_period_ms),
        }
    }

    pub async fn run(mut self) {
        if self.first_reading.wait_for(|seen| *seen).await.is_err() {
            warn!("no temperature will be published; relay stays off");
            return;
        }
        info!(
            period_ms = self.period.as_millis() as u64,
            band = self.engine.threshold_band(),
            "thermostat control started"
        );
        let mut poll = interval(self.period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            poll.tick().await;
            self.poll();
        }
    }

    fn poll(&mut self) {
        let current = self.state.current_temperature();
        let setpoint = self.state.setpoint();
        let Some(action) = self.engine.evaluate(current, setpoint) else {
            return;
        };

        let target = action.target();
        let driven = match target {
            RelayState::On => self.relay.set_high(),
            RelayState::Off => self.relay.set_low(),
        };
        match driven {
            Ok(()) => {
                self.engine.apply(action);
                self.publisher.set_relay(target);
                info!(
                    relay = target.as_str(),
                    current,
                    setpoint,
                    transitions = self.engine.transitions(),
                    "relay switched"
                );
            }
            // Engine state is left alone so the same transition is retried.
            Err(err) => warn!(relay = target.as_str(), "relay drive failed: {err:?}"),
        }
    }
}
