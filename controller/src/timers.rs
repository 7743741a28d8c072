use tokio::{
    sync::{mpsc, watch},
    time::sleep_until,
};
use thermostat_common::{OneShotTimer, TimerId, TimingConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{clock::Clock, input::UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timer service is not running")]
pub struct TimerServiceStopped;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerCommand {
    Start(TimerId),
}

/// Arms timers owned by the timer service. Starting an armed timer moves its
/// deadline to `now + period`.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<TimerCommand>,
}

impl TimerHandle {
    pub fn start(&self, id: TimerId) -> Result<(), TimerServiceStopped> {
        self.commands
            .send(TimerCommand::Start(id))
            .map_err(|_| TimerServiceStopped)
    }
}

/// Owns both one-shot timers and turns their expiries into events: the
/// startup expiry opens the acquisition gate, and every expiry is queued to
/// the input task, which owns the state the timers act on.
#[derive(Debug)]
pub struct TimerService {
    clock: Clock,
    startup: OneShotTimer,
    screen: OneShotTimer,
    commands: mpsc::UnboundedReceiver<TimerCommand>,
    acquisition_gate: watch::Sender<bool>,
    ui_events: mpsc::Sender<UiEvent>,
}

impl TimerService {
    pub fn new(
        clock: Clock,
        timing: &TimingConfig,
        acquisition_gate: watch::Sender<bool>,
        ui_events: mpsc::Sender<UiEvent>,
    ) -> (Self, TimerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            clock,
            startup: OneShotTimer::new(TimerId::Startup, timing.startup_delay_ms),
            screen: OneShotTimer::new(TimerId::ScreenTimeout, timing.screen_timeout_ms),
            commands: rx,
            acquisition_gate,
            ui_events,
        };
        (service, TimerHandle { commands: tx })
    }

    /// Runs until every handle is gone and nothing is left armed.
    pub async fn run(mut self) {
        let mut accepting = true;
        loop {
            let next_deadline = self.next_deadline();
            if !accepting && next_deadline.is_none() {
                break;
            }
            let wake_at = self.clock.instant_at(next_deadline.unwrap_or_default());

            tokio::select! {
                command = self.commands.recv(), if accepting => match command {
                    Some(TimerCommand::Start(id)) => self.start(id),
                    None => accepting = false,
                },
                _ = sleep_until(wake_at), if next_deadline.is_some() => {
                    self.dispatch_expired(next_deadline.unwrap_or_default()).await;
                }
            }
        }
        debug!("timer service stopped");
    }

    fn next_deadline(&self) -> Option<u64> {
        match (self.startup.deadline_ms(), self.screen.deadline_ms()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn start(&mut self, id: TimerId) {
        let now_ms = self.clock.now_ms();
        match id {
            TimerId::Startup if self.startup.fired() > 0 => {
                debug!("startup timer already fired; ignoring restart");
            }
            TimerId::Startup => self.startup.start(now_ms),
            TimerId::ScreenTimeout => self.screen.start(now_ms),
        }
    }

    async fn dispatch_expired(&mut self, woke_for_ms: u64) {
        let now_ms = self.clock.now_ms().max(woke_for_ms);

        if self.startup.poll_expired(now_ms) {
            info!(now_ms, "startup stabilization elapsed; sensor acquisition enabled");
            self.acquisition_gate.send_replace(true);
            self.notify(TimerId::Startup, now_ms).await;
        }
        if self.screen.poll_expired(now_ms) {
            self.notify(TimerId::ScreenTimeout, now_ms).await;
        }
    }

    async fn notify(&self, id: TimerId, at_ms: u64) {
        let event = UiEvent::TimerExpired { id, at_ms };
        if self.ui_events.send(event).await.is_err() {
            warn!(timer = id.as_str(), "input task gone; expiry dropped");
        }
    }
}
