#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Gates the start of sensor acquisition. Fires once per process.
    Startup,
    /// Ends the setpoint preview.
    ScreenTimeout,
}

impl TimerId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::ScreenTimeout => "screen-timeout",
        }
    }
}

/// One-shot timer bookkeeping in milliseconds of monotonic time.
///
/// `start` on an armed timer moves the deadline instead of queueing a
/// second expiry.
#[derive(Debug, Clone)]
pub struct OneShotTimer {
    id: TimerId,
    period_ms: u64,
    deadline_ms: Option<u64>,
    fired: u32,
}

impl OneShotTimer {
    pub fn new(id: TimerId, period_ms: u64) -> Self {
        Self {
            id,
            period_ms,
            deadline_ms: None,
            fired: 0,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn fired(&self) -> u32 {
        self.fired
    }

    /// Arms, or re-arms from `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    /// Disarms and reports `true` exactly once when the deadline has passed.
    pub fn poll_expired(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                self.fired = self.fired.saturating_add(1);
                true
            }
            _ => false,
        }
    }
}
