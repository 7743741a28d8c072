/// Persistent display mode, cycled by the Cycle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    ShowTemperature,
    ShowHumidity,
    ShowNone,
}

impl DisplayMode {
    pub fn next(self) -> Self {
        match self {
            Self::ShowTemperature => Self::ShowHumidity,
            Self::ShowHumidity => Self::ShowNone,
            Self::ShowNone => Self::ShowTemperature,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShowTemperature => "SHOW_TEMPERATURE",
            Self::ShowHumidity => "SHOW_HUMIDITY",
            Self::ShowNone => "SHOW_NONE",
        }
    }

    /// Compact tag used when the mode is stored in an atomic.
    pub fn to_tag(self) -> u8 {
        match self {
            Self::ShowTemperature => 0,
            Self::ShowHumidity => 1,
            Self::ShowNone => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::ShowTemperature),
            1 => Some(Self::ShowHumidity),
            2 => Some(Self::ShowNone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Off,
    On,
}

impl RelayState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Cycle,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Up, Button::Down, Button::Cycle];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Cycle => "CYCLE",
        }
    }
}

/// Debounced logical level of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLevel {
    Pressed,
    Released,
}

/// One decoded sensor sample: temperature in tenths of a degree, humidity in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub temperature: i32,
    pub humidity: i32,
}

/// Most recent published values, as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveReadings {
    pub temperature: i32,
    pub humidity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mode_tags_round_trip() {
        for mode in [
            DisplayMode::ShowTemperature,
            DisplayMode::ShowHumidity,
            DisplayMode::ShowNone,
        ] {
            assert_eq!(DisplayMode::from_tag(mode.to_tag()), Some(mode));
        }
        assert_eq!(DisplayMode::from_tag(7), None);
    }

    #[test]
    fn mode_cycle_returns_after_three_steps() {
        let start = DisplayMode::ShowTemperature;
        assert_eq!(start.next(), DisplayMode::ShowHumidity);
        assert_eq!(start.next().next(), DisplayMode::ShowNone);
        assert_eq!(start.next().next().next(), start);
    }
}
