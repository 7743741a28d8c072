//! Input and UI task.
//!
//! Polls the buttons, owns the UI state machine and is the only writer of
//! the setpoint, the display mode and the preview flag. It is also the only
//! task that writes to the display. Sensor readings and timer expiries reach
//! it as [`UiEvent`]s, so every UI transition runs here.

use std::time::Duration;

use embedded_hal::{digital::InputPin, i2c::I2c};
use thermostat_common::{
    AdjustOutcome, Button, ButtonBank, ButtonLevel, InputAction, LiveReadings, RuntimeConfig,
    Screen, TimerId, UiStateMachine,
};
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    display::{RenderOutcome, SegmentDisplay},
    state::UiPublisher,
    timers::TimerHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Readings(LiveReadings),
    TimerExpired { id: TimerId, at_ms: u64 },
}

/// The three front-panel buttons, wired active low.
#[derive(Debug)]
pub struct ButtonPins<P> {
    pub up: P,
    pub down: P,
    pub cycle: P,
}

impl<P> ButtonPins<P> {
    fn pin_mut(&mut self, button: Button) -> &mut P {
        match button {
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::Cycle => &mut self.cycle,
        }
    }
}

pub struct InputTask<P, D> {
    clock: Clock,
    poll_period: Duration,
    bank: ButtonBank,
    pins: ButtonPins<P>,
    ui: UiStateMachine,
    display: SegmentDisplay<D>,
    publisher: UiPublisher,
    timers: TimerHandle,
    events: mpsc::Receiver<UiEvent>,
}

impl<P, D> InputTask<P, D>
where
    P: InputPin,
    D: I2c,
{
    pub fn new(
        config: &RuntimeConfig,
        clock: Clock,
        pins: ButtonPins<P>,
        display: SegmentDisplay<D>,
        publisher: UiPublisher,
        timers: TimerHandle,
        events: mpsc::Receiver<UiEvent>,
    ) -> Self {
        Self {
            clock,
            poll_period: Duration::from_millis(config.timing.input_poll_ms),
            bank: ButtonBank::new(config.input.debounce, config.thermostat.setpoint_step),
            pins,
            ui: UiStateMachine::new(&config.thermostat, config.timing.screen_timeout_ms),
            display,
            publisher,
            timers,
            events,
        }
    }

    pub async fn run(mut self) {
        info!(poll_ms = self.poll_period.as_millis() as u64, "input task started");
        let mut poll = interval(self.poll_period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = poll.tick() => self.poll_buttons(),
                event = self.events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => events_open = false,
                },
            }
        }
    }

    fn poll_buttons(&mut self) {
        for button in Button::ALL {
            let level = match self.pins.pin_mut(button).is_low() {
                Ok(true) => ButtonLevel::Pressed,
                Ok(false) => ButtonLevel::Released,
                Err(err) => {
                    warn!(button = button.as_str(), "button read failed: {err:?}");
                    continue;
                }
            };
            if let Some(action) = self.bank.sample(button, level) {
                self.handle_action(action);
            }
        }
    }

    fn handle_action(&mut self, action: InputAction) {
        match action {
            InputAction::AdjustSetpoint(delta) => {
                let (outcome, screen) = self.ui.adjust_setpoint(delta, self.clock.now_ms());
                self.publisher.set_setpoint(outcome.setpoint());
                self.publisher.set_showing_setpoint(true);
                match outcome {
                    AdjustOutcome::Revealed(setpoint) => info!(setpoint, "setpoint shown"),
                    AdjustOutcome::Changed { from, to } => info!(from, to, "setpoint changed"),
                }
                if let Err(err) = self.timers.start(TimerId::ScreenTimeout) {
                    warn!("screen timeout not armed: {err}");
                }
                self.render(screen);
            }
            InputAction::CycleMode => {
                let screen = self.ui.cycle_mode();
                let mode = self.ui.mode();
                self.publisher.set_ui_mode(mode);
                info!(mode = mode.as_str(), "display mode changed");
                if let Some(screen) = screen {
                    self.render(screen);
                }
            }
        }
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Readings(readings) => {
                if let Some(screen) = self.ui.live_update(readings) {
                    self.render(screen);
                }
            }
            UiEvent::TimerExpired {
                id: TimerId::ScreenTimeout,
                at_ms,
            } => match self.ui.expire_preview(at_ms) {
                Some(screen) => {
                    self.publisher.set_showing_setpoint(false);
                    debug!("setpoint preview ended");
                    self.render(screen);
                }
                None => debug!(at_ms, "stale screen timeout ignored"),
            },
            UiEvent::TimerExpired {
                id: TimerId::Startup,
                ..
            } => debug!("startup stabilization over; waiting for first reading"),
        }
    }

    fn render(&mut self, screen: Screen) {
        match self.display.render(screen) {
            Ok(RenderOutcome::Written) => {}
            Ok(RenderOutcome::Rejected) => {
                debug!(?screen, "value outside display range; display unchanged");
            }
            Err(err) => warn!(?screen, "display write failed: {err:?}"),
        }
    }
}
