pub mod acquisition;
pub mod config;
pub mod filter;
pub mod input;
pub mod segment;
pub mod thermostat;
pub mod timer;
pub mod types;
pub mod ui;

pub use acquisition::{Ingest, PlausibilityBand, SamplePipeline};
pub use config::{
    ConfigError, DebounceMode, DisplayConfig, InputConfig, RuntimeConfig, ThermostatConfig,
    TimingConfig,
};
pub use filter::{AveragingBuffer, FILTER_DEPTH};
pub use input::{ButtonBank, Debouncer, Edge, InputAction};
pub use thermostat::{EngineAction, ThermostatEngine};
pub use timer::{OneShotTimer, TimerId};
pub use types::{Button, ButtonLevel, DisplayMode, LiveReadings, Reading, RelayState};
pub use ui::{AdjustOutcome, Screen, UiState, UiStateMachine};
