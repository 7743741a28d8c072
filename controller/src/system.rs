//! Power-on sequence and the fixed task set.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use embedded_hal::{
    digital::{InputPin, OutputPin},
    i2c::I2c,
};
use thermostat_common::{RuntimeConfig, Screen, TimerId};
use thermostat_sensor::Aht20;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{info, warn};

use crate::{
    acquisition::AcquisitionTask,
    bus::SharedBus,
    clock::Clock,
    control::ControlTask,
    display::SegmentDisplay,
    heartbeat::Heartbeat,
    input::{ButtonPins, InputTask},
    state::{ControlSnapshot, SharedControlState},
    timers::TimerService,
};

const UI_EVENT_CAPACITY: usize = 16;

/// Board peripherals the controller takes ownership of.
pub struct Hardware<I, B, R, L> {
    pub i2c: I,
    pub buttons: ButtonPins<B>,
    pub relay: R,
    pub led: L,
}

pub struct System {
    state: Arc<SharedControlState>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

/// Brings the board to a safe state, then starts every task. Sensor
/// acquisition stays parked until the startup timer expires and the relay
/// is not driven before the first plausible temperature; the display shows
/// the placeholder pattern meanwhile.
pub async fn start<I, B, R, L>(
    config: RuntimeConfig,
    hardware: Hardware<I, B, R, L>,
) -> anyhow::Result<System>
where
    I: I2c + Send + 'static,
    B: InputPin + Send + 'static,
    R: OutputPin + Send + 'static,
    L: OutputPin + Send + 'static,
{
    let clock = Clock::new();
    let Hardware {
        i2c,
        buttons,
        mut relay,
        led,
    } = hardware;

    if let Err(err) = relay.set_low() {
        warn!("relay could not be forced off at startup: {err:?}");
    }

    let bus = SharedBus::new(i2c);
    let mut display = SegmentDisplay::new(bus.clone());
    if let Err(err) = display.begin(config.display.brightness) {
        warn!("display bring-up failed: {err}");
    }
    if let Err(err) = display.render(Screen::Placeholder) {
        warn!("placeholder not shown: {err}");
    }

    let (state, publishers) = SharedControlState::new(&config.thermostat);

    sleep(Duration::from_millis(config.timing.sensor_power_on_settle_ms)).await;
    let mut sensor = Aht20::new(bus);
    if let Err(err) = sensor.initialize() {
        warn!("sensor initialization failed, retrying on first cycle: {err}");
    }

    let (gate_tx, gate_rx) = watch::channel(false);
    let (reading_tx, reading_rx) = watch::channel(false);
    let (ui_tx, ui_rx) = mpsc::channel(UI_EVENT_CAPACITY);
    let (timer_service, timers) = TimerService::new(clock, &config.timing, gate_tx, ui_tx.clone());

    let acquisition = AcquisitionTask::new(
        &config,
        sensor,
        publishers.sensor,
        ui_tx,
        gate_rx,
        reading_tx,
    );
    let control = ControlTask::new(&config, relay, state.clone(), publishers.relay, reading_rx);
    let input = InputTask::new(
        &config,
        clock,
        buttons,
        display,
        publishers.ui,
        timers.clone(),
        ui_rx,
    );
    let heartbeat = Heartbeat::new(&config.timing, led);

    let tasks = vec![
        ("timers", tokio::spawn(timer_service.run())),
        ("input", tokio::spawn(input.run())),
        ("acquisition", tokio::spawn(acquisition.run())),
        ("control", tokio::spawn(control.run())),
        ("heartbeat", tokio::spawn(heartbeat.run())),
    ];

    timers
        .start(TimerId::Startup)
        .context("failed to arm startup timer")?;
    info!(
        setpoint = state.setpoint(),
        startup_ms = config.timing.startup_delay_ms,
        "thermostat started"
    );

    Ok(System { state, tasks })
}

impl System {
    pub fn state(&self) -> &Arc<SharedControlState> {
        &self.state
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        self.state.snapshot()
    }

    pub async fn shutdown(self) {
        for (name, task) in self.tasks {
            task.abort();
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(task = name, "task ended abnormally: {err}");
                }
            }
        }
        info!("thermostat stopped");
    }
}
