use std::{sync::Arc, time::Duration};

use anyhow::Context;
use thermostat_common::{Button, RuntimeConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::{
    input::ButtonPins,
    sim::{OutputLine, SimWorld},
    state::SharedControlState,
    system::{self, Hardware},
};

const CONFIG_ENV: &str = "THERMOSTAT_CONFIG";
const ROOM_START_TENTHS: i32 = 655;
const ROOM_HUMIDITY: i32 = 45;
const TAP_HOLD: Duration = Duration::from_millis(30);

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config()?;

    let world = SimWorld::new();
    world.set_temperature_tenths(ROOM_START_TENTHS);
    world.set_humidity(ROOM_HUMIDITY);

    let hardware = Hardware {
        i2c: world.i2c(),
        buttons: ButtonPins {
            up: world.button(Button::Up),
            down: world.button(Button::Down),
            cycle: world.button(Button::Cycle),
        },
        relay: world.output(OutputLine::Relay),
        led: world.output(OutputLine::Led),
    };
    let system = system::start(config, hardware)
        .await
        .context("failed to start thermostat")?;

    spawn_room_model(world.clone());
    spawn_status_loop(system.state().clone());
    spawn_console(world);

    info!("simulated thermostat running; commands: u, d, c, t <tenths>, fault bus|relay on|off");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    info!(snapshot = ?system.snapshot(), "shutting down");
    system.shutdown().await;
    Ok(())
}

fn load_config() -> anyhow::Result<RuntimeConfig> {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return Ok(RuntimeConfig::default());
    };
    let raw = std::fs::read(&path).with_context(|| format!("failed to read config {path}"))?;
    let config =
        RuntimeConfig::from_json(&raw).with_context(|| format!("failed to load config {path}"))?;
    info!(%path, "runtime config loaded");
    Ok(config)
}

fn spawn_room_model(world: SimWorld) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            world.step_environment();
        }
    });
}

fn spawn_status_loop(state: Arc<SharedControlState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));
        loop {
            interval.tick().await;
            let snapshot = state.snapshot();
            info!(
                temperature = snapshot.current_temperature,
                humidity = snapshot.current_humidity,
                setpoint = snapshot.setpoint,
                mode = snapshot.ui_mode.as_str(),
                showing_setpoint = snapshot.showing_setpoint,
                relay = snapshot.relay.as_str(),
                "status"
            );
        }
    });
}

fn spawn_console(world: SimWorld) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => handle_command(&world, line.trim()).await,
                Ok(None) => break,
                Err(err) => {
                    warn!("console read failed: {err}");
                    break;
                }
            }
        }
    });
}

async fn handle_command(world: &SimWorld, line: &str) {
    let mut words = line.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("u"), None, None) => tap(world, Button::Up).await,
        (Some("d"), None, None) => tap(world, Button::Down).await,
        (Some("c"), None, None) => tap(world, Button::Cycle).await,
        (Some("t"), Some(value), None) => match value.parse::<i32>() {
            Ok(tenths) => {
                world.set_temperature_tenths(tenths);
                info!(tenths, "room temperature set");
            }
            Err(err) => warn!("bad temperature {value:?}: {err}"),
        },
        (Some("fault"), Some(target), Some(state)) => {
            let failing = state == "on";
            match target {
                "bus" => world.set_bus_failure(failing),
                "relay" => world.set_relay_failure(failing),
                _ => {
                    warn!("unknown fault target {target:?}");
                    return;
                }
            }
            info!(fault = target, failing, "fault injection updated");
        }
        (None, _, _) => {}
        _ => warn!("unknown command {line:?}"),
    }
}

async fn tap(world: &SimWorld, button: Button) {
    world.press(button);
    tokio::time::sleep(TAP_HOLD).await;
    world.release(button);
}
