use crate::{config::ThermostatConfig, types::RelayState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    RelayOn,
    RelayOff,
}

impl EngineAction {
    pub fn target(self) -> RelayState {
        match self {
            Self::RelayOn => RelayState::On,
            Self::RelayOff => RelayState::Off,
        }
    }
}

/// Two-state hysteresis controller.
///
/// Turns on strictly below the setpoint and off strictly above
/// `setpoint + threshold_band`; anything in between holds the current state.
#[derive(Debug, Clone)]
pub struct ThermostatEngine {
    threshold_band: i32,
    relay: RelayState,
    transitions: u64,
}

impl ThermostatEngine {
    pub fn new(config: &ThermostatConfig) -> Self {
        Self {
            threshold_band: config.threshold_band,
            relay: RelayState::Off,
            transitions: 0,
        }
    }

    pub fn relay(&self) -> RelayState {
        self.relay
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn threshold_band(&self) -> i32 {
        self.threshold_band
    }

    /// Decides whether the relay must change. Does not mutate state, so a
    /// caller whose output write fails can leave the engine as it was and
    /// get the same decision on the next poll.
    pub fn evaluate(&self, current_temperature: i32, setpoint: i32) -> Option<EngineAction> {
        match self.relay {
            RelayState::Off if current_temperature < setpoint => Some(EngineAction::RelayOn),
            RelayState::On if current_temperature > setpoint + self.threshold_band => {
                Some(EngineAction::RelayOff)
            }
            _ => None,
        }
    }

    /// Records that the output now reflects `action`.
    pub fn apply(&mut self, action: EngineAction) {
        let target = action.target();
        if self.relay != target {
            self.relay = target;
            self.transitions = self.transitions.saturating_add(1);
        }
    }

    /// Evaluate and apply in one step, for callers without a fallible output.
    pub fn tick(&mut self, current_temperature: i32, setpoint: i32) -> Option<EngineAction> {
        let action = self.evaluate(current_temperature, setpoint)?;
        self.apply(action);
        Some(action)
    }
}
