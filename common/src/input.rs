//! Button debouncing and the actions button presses map to.
//!
//! Each button is a two-state machine (`Pressed` / `Released`) fed by
//! periodic level samples. Only `Released -> Pressed` edges produce an
//! action; release edges just reset the logical state.
//!
//! [`DebounceMode::LevelSampled`] treats a single sample at the new level as
//! an edge, so a contact bouncing across a poll boundary can register extra
//! presses. [`DebounceMode::Settled`] requires the new level on several
//! consecutive polls first, which adds `samples - 1` poll periods of latency.

use crate::{
    config::DebounceMode,
    types::{Button, ButtonLevel},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    AdjustSetpoint(i32),
    CycleMode,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    mode: DebounceMode,
    state: ButtonLevel,
    streak: u8,
}

impl Debouncer {
    pub fn new(mode: DebounceMode) -> Self {
        Self {
            mode,
            state: ButtonLevel::Released,
            streak: 0,
        }
    }

    pub fn state(&self) -> ButtonLevel {
        self.state
    }

    pub fn sample(&mut self, level: ButtonLevel) -> Option<Edge> {
        if level == self.state {
            self.streak = 0;
            return None;
        }

        let required = match self.mode {
            DebounceMode::LevelSampled => 1,
            DebounceMode::Settled { samples } => samples.max(1),
        };

        self.streak = self.streak.saturating_add(1);
        if self.streak < required {
            return None;
        }

        self.streak = 0;
        self.state = level;
        Some(match level {
            ButtonLevel::Pressed => Edge::Pressed,
            ButtonLevel::Released => Edge::Released,
        })
    }
}

/// Debouncers for the Up, Down and Cycle buttons.
#[derive(Debug, Clone)]
pub struct ButtonBank {
    up: Debouncer,
    down: Debouncer,
    cycle: Debouncer,
    step: i32,
}

impl ButtonBank {
    pub fn new(mode: DebounceMode, step: i32) -> Self {
        Self {
            up: Debouncer::new(mode),
            down: Debouncer::new(mode),
            cycle: Debouncer::new(mode),
            step,
        }
    }

    pub fn state(&self, button: Button) -> ButtonLevel {
        self.debouncer(button).state()
    }

    /// Feeds one sample for `button`, returning the action a press triggers.
    pub fn sample(&mut self, button: Button, level: ButtonLevel) -> Option<InputAction> {
        let step = self.step;
        let edge = self.debouncer_mut(button).sample(level)?;
        if edge != Edge::Pressed {
            return None;
        }

        Some(match button {
            Button::Up => InputAction::AdjustSetpoint(step),
            Button::Down => InputAction::AdjustSetpoint(-step),
            Button::Cycle => InputAction::CycleMode,
        })
    }

    fn debouncer(&self, button: Button) -> &Debouncer {
        match button {
            Button::Up => &self.up,
            Button::Down => &self.down,
            Button::Cycle => &self.cycle,
        }
    }

    fn debouncer_mut(&mut self, button: Button) -> &mut Debouncer {
        match button {
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::Cycle => &mut self.cycle,
        }
    }
}
