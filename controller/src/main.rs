mod acquisition;
mod bus;
mod clock;
mod control;
mod display;
mod heartbeat;
mod host;
mod input;
mod sim;
mod state;
mod system;
mod timers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
