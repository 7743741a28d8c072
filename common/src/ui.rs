//! Display mode and setpoint preview.
//!
//! The persistent [`DisplayMode`] and the transient setpoint preview are one
//! tagged state. While previewing, the display always shows the setpoint and
//! live updates or mode changes only affect what is shown after the preview
//! ends. Every handler returns the [`Screen`] to render now, or `None` when
//! the display must be left alone.

use crate::{
    config::ThermostatConfig,
    types::{DisplayMode, LiveReadings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Persistent(DisplayMode),
    SetpointPreview {
        prior_mode: DisplayMode,
        deadline_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Shown until the first live reading exists.
    Placeholder,
    Temperature(i32),
    Humidity(i32),
    Setpoint(i32),
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    /// First press of a session: setpoint unchanged, preview opened.
    Revealed(i32),
    Changed { from: i32, to: i32 },
}

impl AdjustOutcome {
    pub fn setpoint(self) -> i32 {
        match self {
            Self::Revealed(value) => value,
            Self::Changed { to, .. } => to,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiStateMachine {
    state: UiState,
    setpoint: i32,
    setpoint_min: i32,
    setpoint_max: i32,
    screen_timeout_ms: u64,
    live: Option<LiveReadings>,
}

impl UiStateMachine {
    pub fn new(config: &ThermostatConfig, screen_timeout_ms: u64) -> Self {
        Self {
            state: UiState::Persistent(DisplayMode::ShowTemperature),
            setpoint: config.default_setpoint,
            setpoint_min: config.setpoint_min,
            setpoint_max: config.setpoint_max,
            screen_timeout_ms,
            live: None,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn setpoint(&self) -> i32 {
        self.setpoint
    }

    /// The persistent mode, including while a preview hides it.
    pub fn mode(&self) -> DisplayMode {
        match self.state {
            UiState::Persistent(mode) => mode,
            UiState::SetpointPreview { prior_mode, .. } => prior_mode,
        }
    }

    pub fn is_showing_setpoint(&self) -> bool {
        matches!(self.state, UiState::SetpointPreview { .. })
    }

    pub fn preview_deadline_ms(&self) -> Option<u64> {
        match self.state {
            UiState::SetpointPreview { deadline_ms, .. } => Some(deadline_ms),
            UiState::Persistent(_) => None,
        }
    }

    pub fn live(&self) -> Option<LiveReadings> {
        self.live
    }

    /// Up/Down press. Opens (or extends) the preview and only changes the
    /// setpoint when a preview was already showing. The caller restarts the
    /// screen-timeout timer and renders the returned setpoint.
    pub fn adjust_setpoint(&mut self, delta: i32, now_ms: u64) -> (AdjustOutcome, Screen) {
        let deadline_ms = now_ms.saturating_add(self.screen_timeout_ms);
        let outcome = match self.state {
            UiState::Persistent(mode) => {
                self.state = UiState::SetpointPreview {
                    prior_mode: mode,
                    deadline_ms,
                };
                AdjustOutcome::Revealed(self.setpoint)
            }
            UiState::SetpointPreview { prior_mode, .. } => {
                let from = self.setpoint;
                self.setpoint = from
                    .saturating_add(delta)
                    .clamp(self.setpoint_min, self.setpoint_max);
                self.state = UiState::SetpointPreview {
                    prior_mode,
                    deadline_ms,
                };
                AdjustOutcome::Changed {
                    from,
                    to: self.setpoint,
                }
            }
        };

        (outcome, Screen::Setpoint(self.setpoint))
    }

    /// Cycle press: advances the persistent mode.
    pub fn cycle_mode(&mut self) -> Option<Screen> {
        match self.state {
            UiState::Persistent(mode) => {
                self.state = UiState::Persistent(mode.next());
                Some(self.screen())
            }
            UiState::SetpointPreview {
                prior_mode,
                deadline_ms,
            } => {
                self.state = UiState::SetpointPreview {
                    prior_mode: prior_mode.next(),
                    deadline_ms,
                };
                None
            }
        }
    }

    /// New published values from the sensor pipeline.
    pub fn live_update(&mut self, readings: LiveReadings) -> Option<Screen> {
        self.live = Some(readings);
        if self.is_showing_setpoint() {
            None
        } else {
            Some(self.screen())
        }
    }

    /// Screen-timeout expiry. An expiry that arrives before the current
    /// deadline belongs to an earlier arming and is ignored.
    pub fn expire_preview(&mut self, now_ms: u64) -> Option<Screen> {
        match self.state {
            UiState::SetpointPreview {
                prior_mode,
                deadline_ms,
            } if now_ms >= deadline_ms => {
                self.state = UiState::Persistent(prior_mode);
                Some(self.screen())
            }
            _ => None,
        }
    }

    /// What the display should show for the current state.
    pub fn screen(&self) -> Screen {
        match self.state {
            UiState::SetpointPreview { .. } => Screen::Setpoint(self.setpoint),
            UiState::Persistent(mode) => match (mode, self.live) {
                (DisplayMode::ShowNone, _) => Screen::Blank,
                (_, None) => Screen::Placeholder,
                (DisplayMode::ShowTemperature, Some(live)) => Screen::Temperature(live.temperature),
                (DisplayMode::ShowHumidity, Some(live)) => Screen::Humidity(live.humidity),
            },
        }
    }
}
