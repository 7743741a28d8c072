//! Process-wide control state shared between tasks.
//!
//! Every field is an atomic, and every field has exactly one writer. The
//! write side is split into publisher handles at construction time, one per
//! owning task, so ownership is enforced by who holds which handle; everyone
//! else only gets the read-only `Arc<SharedControlState>`.

use std::sync::{
    atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering},
    Arc,
};

use thermostat_common::{DisplayMode, RelayState, ThermostatConfig};

#[derive(Debug)]
pub struct SharedControlState {
    setpoint: AtomicI32,
    current_temperature: AtomicI32,
    current_humidity: AtomicI32,
    ui_mode: AtomicU8,
    showing_setpoint: AtomicBool,
    relay_on: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSnapshot {
    pub setpoint: i32,
    pub current_temperature: i32,
    pub current_humidity: i32,
    pub ui_mode: DisplayMode,
    pub showing_setpoint: bool,
    pub relay: RelayState,
}

/// Write access for the sensor acquisition task.
#[derive(Debug)]
pub struct SensorPublisher {
    state: Arc<SharedControlState>,
}

/// Write access for the input task, which owns the setpoint and UI fields.
#[derive(Debug)]
pub struct UiPublisher {
    state: Arc<SharedControlState>,
}

/// Write access for the thermostat control task.
#[derive(Debug)]
pub struct RelayPublisher {
    state: Arc<SharedControlState>,
}

#[derive(Debug)]
pub struct Publishers {
    pub sensor: SensorPublisher,
    pub ui: UiPublisher,
    pub relay: RelayPublisher,
}

impl SharedControlState {
    /// Fixed power-on values. The published temperature starts at the filter
    /// seed so the control task sees "warm enough" until a real sample lands.
    pub fn new(config: &ThermostatConfig) -> (Arc<Self>, Publishers) {
        let state = Arc::new(Self {
            setpoint: AtomicI32::new(config.default_setpoint),
            current_temperature: AtomicI32::new(config.seed_temperature()),
            current_humidity: AtomicI32::new(0),
            ui_mode: AtomicU8::new(DisplayMode::ShowTemperature.to_tag()),
            showing_setpoint: AtomicBool::new(false),
            relay_on: AtomicBool::new(false),
        });

        let publishers = Publishers {
            sensor: SensorPublisher {
                state: state.clone(),
            },
            ui: UiPublisher {
                state: state.clone(),
            },
            relay: RelayPublisher {
                state: state.clone(),
            },
        };

        (state, publishers)
    }

    pub fn setpoint(&self) -> i32 {
        self.setpoint.load(Ordering::Acquire)
    }

    pub fn current_temperature(&self) -> i32 {
        self.current_temperature.load(Ordering::Acquire)
    }

    pub fn current_humidity(&self) -> i32 {
        self.current_humidity.load(Ordering::Acquire)
    }

    pub fn ui_mode(&self) -> DisplayMode {
        DisplayMode::from_tag(self.ui_mode.load(Ordering::Acquire))
            .unwrap_or(DisplayMode::ShowTemperature)
    }

    pub fn showing_setpoint(&self) -> bool {
        self.showing_setpoint.load(Ordering::Acquire)
    }

    pub fn relay(&self) -> RelayState {
        if self.relay_on.load(Ordering::Acquire) {
            RelayState::On
        } else {
            RelayState::Off
        }
    }

    /// Each field is read atomically; fields are not read as one transaction.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            setpoint: self.setpoint(),
            current_temperature: self.current_temperature(),
            current_humidity: self.current_humidity(),
            ui_mode: self.ui_mode(),
            showing_setpoint: self.showing_setpoint(),
            relay: self.relay(),
        }
    }
}

impl SensorPublisher {
    pub fn publish_temperature(&self, tenths: i32) {
        self.state
            .current_temperature
            .store(tenths, Ordering::Release);
    }

    pub fn publish_humidity(&self, percent: i32) {
        self.state.current_humidity.store(percent, Ordering::Release);
    }

    pub fn state(&self) -> &SharedControlState {
        &self.state
    }
}

impl UiPublisher {
    pub fn set_setpoint(&self, tenths: i32) {
        self.state.setpoint.store(tenths, Ordering::Release);
    }

    pub fn set_ui_mode(&self, mode: DisplayMode) {
        self.state.ui_mode.store(mode.to_tag(), Ordering::Release);
    }

    pub fn set_showing_setpoint(&self, showing: bool) {
        self.state
            .showing_setpoint
            .store(showing, Ordering::Release);
    }
}

impl RelayPublisher {
    pub fn set_relay(&self, relay: RelayState) {
        self.state.relay_on.store(relay.is_on(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn power_on_values() {
        let (state, _publishers) = SharedControlState::new(&ThermostatConfig::default());
        assert_eq!(
            state.snapshot(),
            ControlSnapshot {
                setpoint: 700,
                current_temperature: 720,
                current_humidity: 0,
                ui_mode: DisplayMode::ShowTemperature,
                showing_setpoint: false,
                relay: RelayState::Off,
            }
        );
    }

    #[test]
    fn publishers_write_their_own_fields() {
        let (state, publishers) = SharedControlState::new(&ThermostatConfig::default());

        publishers.sensor.publish_temperature(688);
        publishers.sensor.publish_humidity(44);
        publishers.ui.set_setpoint(710);
        publishers.ui.set_ui_mode(DisplayMode::ShowNone);
        publishers.ui.set_showing_setpoint(true);
        publishers.relay.set_relay(RelayState::On);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.current_temperature, 688);
        assert_eq!(snapshot.current_humidity, 44);
        assert_eq!(snapshot.setpoint, 710);
        assert_eq!(snapshot.ui_mode, DisplayMode::ShowNone);
        assert!(snapshot.showing_setpoint);
        assert_eq!(snapshot.relay, RelayState::On);
    }

    #[test]
    fn readers_on_other_threads_never_see_torn_values() {
        let (state, publishers) = SharedControlState::new(&ThermostatConfig::default());
        let sensor = publishers.sensor;

        let writer = thread::spawn(move || {
            for value in 0..10_000 {
                let tenths = if value % 2 == 0 { 0x0F0F_0F0F } else { -1 };
                sensor.publish_temperature(tenths);
            }
        });

        for _ in 0..10_000 {
            let seen = state.current_temperature();
            assert!(seen == 720 || seen == 0x0F0F_0F0F || seen == -1);
        }
        writer.join().unwrap();
    }
}
