use std::time::Duration;

use embedded_hal::i2c::I2c;
use thermostat_common::{LiveReadings, RuntimeConfig, SamplePipeline};
use thermostat_sensor::{Aht20, Aht20Error};
use tokio::{
    sync::{mpsc, watch},
    time::{interval, sleep, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{input::UiEvent, state::SensorPublisher};

/// Sensor acquisition task: trigger, wait out the conversion, read, filter,
/// publish. Cycles start on a fixed cadence, so the conversion wait is part
/// of the period rather than added to it.
pub struct AcquisitionTask<I> {
    sensor: Aht20<I>,
    pipeline: SamplePipeline,
    publisher: SensorPublisher,
    ui_events: mpsc::Sender<UiEvent>,
    gate: watch::Receiver<bool>,
    first_reading: watch::Sender<bool>,
    period: Duration,
    conversion: Duration,
}

impl<I: I2c> AcquisitionTask<I> {
    pub fn new(
        config: &RuntimeConfig,
        sensor: Aht20<I>,
        publisher: SensorPublisher,
        ui_events: mpsc::Sender<UiEvent>,
        gate: watch::Receiver<bool>,
        first_reading: watch::Sender<bool>,
    ) -> Self {
        Self {
            sensor,
            pipeline: SamplePipeline::new(&config.thermostat),
            publisher,
            ui_events,
            gate,
            first_reading,
            period: Duration::from_millis(config.timing.sensor_period_ms),
            conversion: Duration::from_millis(config.timing.conversion_latency_ms),
        }
    }

    pub async fn run(mut self) {
        if self.gate.wait_for(|open| *open).await.is_err() {
            warn!("acquisition gate closed before startup finished");
            return;
        }
        info!(period_ms = self.period.as_millis() as u64, "sensor acquisition started");

        let mut cadence = interval(self.period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            cadence.tick().await;
            if let Err(err) = self.cycle().await {
                warn!("sensor cycle failed: {err}");
            }
        }
    }

    async fn cycle(&mut self) -> Result<(), Aht20Error<I::Error>> {
        if !self.sensor.is_initialized() {
            self.sensor.initialize()?;
            info!("sensor initialized");
        }

        self.sensor.start_measurement()?;
        sleep(self.conversion).await;
        let reading = self.sensor.read_measurement()?;

        let ingest = self.pipeline.ingest(reading);
        self.publisher.publish_humidity(ingest.humidity);
        match ingest.temperature {
            Some(average) => {
                self.publisher.publish_temperature(average);
                if !*self.first_reading.borrow() {
                    self.first_reading.send_replace(true);
                    info!(temperature = average, "first plausible temperature published");
                }
            }
            None => debug!(
                temperature = reading.temperature,
                "implausible temperature discarded"
            ),
        }

        let live = LiveReadings {
            temperature: self.publisher.state().current_temperature(),
            humidity: ingest.humidity,
        };
        if self.ui_events.send(UiEvent::Readings(live)).await.is_err() {
            debug!("input task gone; reading not shown");
        }
        Ok(())
    }
}
