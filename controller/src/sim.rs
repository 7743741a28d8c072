//! In-process stand-in for the board: an AHT20 and an HT16K33 on one I2C
//! bus, three push buttons, the relay and the heartbeat LED. All of it reads
//! and writes one `WorldState`, so tests and the host runtime can poke the
//! environment and observe outputs while the real tasks run.

use std::{
    convert::Infallible,
    sync::{Arc, Mutex, MutexGuard},
};

use embedded_hal::{
    digital::{self, InputPin, OutputPin},
    i2c::{self, I2c, NoAcknowledgeSource, Operation},
};
#[cfg(test)]
use thermostat_common::segment::{Frame, DISPLAY_POSITIONS};
use thermostat_common::Button;
use thermostat_sensor::{decode, AHT20_ADDRESS};

use crate::display::HT16K33_ADDRESS;

const RAW_FULL_SCALE: f64 = 1_048_576.0;
const RAW_MAX: u32 = 0xF_FFFF;
const STATUS_IDLE_CALIBRATED: u8 = 0x1C;

/// Raw 20-bit sensor words for a few reference temperatures.
pub const RAW_77_0_F: u32 = 0x6_0000;
#[cfg(test)]
pub const RAW_54_5_F: u32 = 0x5_0000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(not(test), allow(dead_code))]
pub struct PanelState {
    pub oscillator_on: bool,
    pub display_on: bool,
    pub brightness: u8,
    pub ram: [u8; 16],
}

#[derive(Debug, Default)]
struct SensorModel {
    initialized: bool,
    #[cfg_attr(not(test), allow(dead_code))]
    measurements: u32,
    temperature_raw: u32,
    humidity_raw: u32,
    latched: Option<(u32, u32)>,
}

#[derive(Debug, Default)]
struct WorldState {
    sensor: SensorModel,
    panel: PanelState,
    #[cfg_attr(not(test), allow(dead_code))]
    display_writes: usize,
    bus_failure: bool,
    pressed: [bool; 3],
    relay_on: bool,
    relay_failure: bool,
    led_on: bool,
    #[cfg_attr(not(test), allow(dead_code))]
    led_pulses: u32,
}

/// Cloneable handle onto the simulated board.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    inner: Arc<Mutex<WorldState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLine {
    Relay,
    Led,
}

#[derive(Debug, Clone)]
pub struct SimI2c {
    world: SimWorld,
}

#[derive(Debug, Clone)]
pub struct SimButton {
    world: SimWorld,
    button: Button,
}

#[derive(Debug, Clone)]
pub struct SimOutput {
    world: SimWorld,
    line: OutputLine,
}

impl SimWorld {
    /// A 77.0 degree, 50 % room.
    pub fn new() -> Self {
        let world = Self::default();
        {
            let mut state = world.lock();
            state.sensor.temperature_raw = RAW_77_0_F;
            state.sensor.humidity_raw = 0x8_0000;
        }
        world
    }

    pub fn i2c(&self) -> SimI2c {
        SimI2c {
            world: self.clone(),
        }
    }

    pub fn button(&self, button: Button) -> SimButton {
        SimButton {
            world: self.clone(),
            button,
        }
    }

    pub fn output(&self, line: OutputLine) -> SimOutput {
        SimOutput {
            world: self.clone(),
            line,
        }
    }

    pub fn set_temperature_raw(&self, raw: u32) {
        self.lock().sensor.temperature_raw = raw.min(RAW_MAX);
    }

    /// Picks the raw word whose decoded value is exactly `tenths`.
    pub fn set_temperature_tenths(&self, tenths: i32) {
        let celsius = (f64::from(tenths) / 10.0 - 32.0) * 5.0 / 9.0;
        let raw = ((celsius + 50.0) / 200.0 * RAW_FULL_SCALE).ceil() + 1.0;
        self.set_temperature_raw(raw.clamp(0.0, f64::from(RAW_MAX)) as u32);
    }

    pub fn set_humidity(&self, percent: i32) {
        let raw = (f64::from(percent) / 100.0 * RAW_FULL_SCALE).ceil() + 1.0;
        self.lock().sensor.humidity_raw = raw.clamp(0.0, f64::from(RAW_MAX)) as u32;
    }

    /// The temperature the sensor would report right now.
    pub fn temperature_tenths(&self) -> i32 {
        let state = self.lock();
        decode(&encode(state.sensor.temperature_raw, state.sensor.humidity_raw)).temperature
    }

    pub fn press(&self, button: Button) {
        self.lock().pressed[button_index(button)] = true;
    }

    pub fn release(&self, button: Button) {
        self.lock().pressed[button_index(button)] = false;
    }

    pub fn set_bus_failure(&self, failing: bool) {
        self.lock().bus_failure = failing;
    }

    pub fn set_relay_failure(&self, failing: bool) {
        self.lock().relay_failure = failing;
    }

    pub fn relay_on(&self) -> bool {
        self.lock().relay_on
    }

    /// One step of a crude room model: the heater adds heat, the room leaks it.
    pub fn step_environment(&self) {
        let heating = self.relay_on();
        let tenths = self.temperature_tenths();
        self.set_temperature_tenths(if heating { tenths + 2 } else { tenths - 1 });
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Observation side, read by tests.
#[cfg(test)]
impl SimWorld {
    pub fn led_on(&self) -> bool {
        self.lock().led_on
    }

    pub fn led_pulses(&self) -> u32 {
        self.lock().led_pulses
    }

    pub fn sensor_initialized(&self) -> bool {
        self.lock().sensor.initialized
    }

    pub fn measurements(&self) -> u32 {
        self.lock().sensor.measurements
    }

    pub fn panel(&self) -> PanelState {
        self.lock().panel.clone()
    }

    /// The five visible positions, read back from display RAM.
    pub fn frame(&self) -> Frame {
        let state = self.lock();
        let mut frame = [0_u8; DISPLAY_POSITIONS];
        for (position, slot) in frame.iter_mut().enumerate() {
            *slot = state.panel.ram[position * 2];
        }
        frame
    }

    pub fn display_writes(&self) -> usize {
        self.lock().display_writes
    }
}

fn button_index(button: Button) -> usize {
    match button {
        Button::Up => 0,
        Button::Down => 1,
        Button::Cycle => 2,
    }
}

fn encode(temperature_raw: u32, humidity_raw: u32) -> [u8; 6] {
    [
        STATUS_IDLE_CALIBRATED,
        (humidity_raw >> 12) as u8,
        (humidity_raw >> 4) as u8,
        (((humidity_raw & 0x0F) << 4) | ((temperature_raw >> 16) & 0x0F)) as u8,
        (temperature_raw >> 8) as u8,
        temperature_raw as u8,
    ]
}

impl WorldState {
    fn aht20(&mut self, operation: &mut Operation<'_>) {
        match operation {
            Operation::Write(bytes) => match *bytes {
                [0xBE, ..] => self.sensor.initialized = true,
                [0xAC, 0x33, 0x00] if self.sensor.initialized => {
                    self.sensor.measurements += 1;
                    self.sensor.latched =
                        Some((self.sensor.temperature_raw, self.sensor.humidity_raw));
                }
                _ => {}
            },
            Operation::Read(buffer) => {
                let (temperature, humidity) = self
                    .sensor
                    .latched
                    .unwrap_or((self.sensor.temperature_raw, self.sensor.humidity_raw));
                let frame = encode(temperature, humidity);
                let len = buffer.len().min(frame.len());
                buffer[..len].copy_from_slice(&frame[..len]);
            }
        }
    }

    fn ht16k33(&mut self, operation: &mut Operation<'_>) {
        let Operation::Write(bytes) = operation else {
            return;
        };
        match *bytes {
            [command] if command & 0xF0 == 0x20 => self.panel.oscillator_on = command & 0x01 != 0,
            [command] if command & 0xF0 == 0x80 => self.panel.display_on = command & 0x01 != 0,
            [command] if command & 0xF0 == 0xE0 => self.panel.brightness = command & 0x0F,
            [address, data @ ..] if !data.is_empty() => {
                let start = usize::from(*address & 0x0F);
                for (offset, byte) in data.iter().enumerate() {
                    if let Some(slot) = self.panel.ram.get_mut(start + offset) {
                        *slot = *byte;
                    }
                }
                self.display_writes += 1;
            }
            _ => {}
        }
    }
}

impl i2c::ErrorType for SimI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for SimI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.world.lock();
        if state.bus_failure {
            return Err(i2c::ErrorKind::Bus);
        }
        for operation in operations.iter_mut() {
            match address {
                AHT20_ADDRESS => state.aht20(operation),
                HT16K33_ADDRESS => state.ht16k33(operation),
                _ => {
                    return Err(i2c::ErrorKind::NoAcknowledge(
                        NoAcknowledgeSource::Address,
                    ))
                }
            }
        }
        Ok(())
    }
}

impl digital::ErrorType for SimButton {
    type Error = Infallible;
}

/// Buttons are wired active low: a pressed button reads low.
impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.world.lock().pressed[button_index(self.button)])
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.world.lock().pressed[button_index(self.button)])
    }
}

impl digital::ErrorType for SimOutput {
    type Error = digital::ErrorKind;
}

impl SimOutput {
    fn drive(&mut self, high: bool) -> Result<(), digital::ErrorKind> {
        let mut state = self.world.lock();
        match self.line {
            OutputLine::Relay => {
                if state.relay_failure {
                    return Err(digital::ErrorKind::Other);
                }
                state.relay_on = high;
            }
            OutputLine::Led => {
                if high && !state.led_on {
                    state.led_pulses += 1;
                }
                state.led_on = high;
            }
        }
        Ok(())
    }
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

#[cfg(test)]
mod tests {
    use thermostat_sensor::Aht20;

    use super::*;

    #[test]
    fn sensor_answers_with_the_reference_frame() {
        let world = SimWorld::new();
        let mut sensor = Aht20::new(world.i2c());
        sensor.initialize().unwrap();
        sensor.start_measurement().unwrap();

        let reading = sensor.read_measurement().unwrap();
        assert_eq!(reading.temperature, 770);
        assert_eq!(reading.humidity, 50);
        assert_eq!(world.measurements(), 1);
    }

    #[test]
    fn temperature_setter_round_trips_through_decode() {
        let world = SimWorld::new();
        for tenths in [545, 699, 700, 716, 1_000] {
            world.set_temperature_tenths(tenths);
            assert_eq!(world.temperature_tenths(), tenths);
        }
    }

    #[test]
    fn measurement_latches_the_environment() {
        let world = SimWorld::new();
        let mut sensor = Aht20::new(world.i2c());
        sensor.initialize().unwrap();
        sensor.start_measurement().unwrap();

        world.set_temperature_raw(RAW_54_5_F);
        assert_eq!(sensor.read_measurement().unwrap().temperature, 770);
    }

    #[test]
    fn unknown_address_is_not_acknowledged() {
        let world = SimWorld::new();
        let mut bus = world.i2c();
        assert_eq!(
            bus.write(0x50, &[0x00]),
            Err(i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
    }

    #[test]
    fn buttons_read_low_while_pressed() {
        let world = SimWorld::new();
        let mut up = world.button(Button::Up);
        assert!(up.is_high().unwrap());

        world.press(Button::Up);
        assert!(up.is_low().unwrap());
        assert!(world.button(Button::Down).is_high().unwrap());
    }

    #[test]
    fn led_pulses_count_rising_edges() {
        let world = SimWorld::new();
        let mut led = world.output(OutputLine::Led);
        led.set_high().unwrap();
        led.set_high().unwrap();
        led.set_low().unwrap();
        led.set_high().unwrap();
        assert_eq!(world.led_pulses(), 2);
    }

    #[test]
    fn room_warms_while_heating() {
        let world = SimWorld::new();
        world.set_temperature_tenths(690);
        world.output(OutputLine::Relay).set_high().unwrap();
        world.step_environment();
        assert_eq!(world.temperature_tenths(), 692);
    }
}
