use std::time::Duration;

use embedded_hal::digital::OutputPin;
use thermostat_common::TimingConfig;
use tokio::time::sleep;
use tracing::warn;

/// Liveness LED: `blinks` flashes of `on` length separated by equal gaps,
/// then a longer pause, forever.
pub struct Heartbeat<L> {
    led: L,
    on: Duration,
    pause: Duration,
    blinks: u8,
}

impl<L: OutputPin> Heartbeat<L> {
    pub fn new(timing: &TimingConfig, led: L) -> Self {
        Self {
            led,
            on: Duration::from_millis(timing.heartbeat_on_ms),
            pause: Duration::from_millis(timing.heartbeat_pause_ms),
            blinks: timing.heartbeat_blinks.max(1),
        }
    }

    pub async fn run(mut self) {
        loop {
            for blink in 1..=self.blinks {
                self.set(true);
                sleep(self.on).await;
                self.set(false);
                sleep(if blink == self.blinks { self.pause } else { self.on }).await;
            }
        }
    }

    fn set(&mut self, on: bool) {
        let result = if on {
            self.led.set_high()
        } else {
            self.led.set_low()
        };
        if let Err(err) = result {
            warn!("heartbeat led write failed: {err:?}");
        }
    }
}
