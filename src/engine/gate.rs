/// Whether scoring is currently allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Inactive,
    Active,
}

/// What changed during one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// Inactive → Active: the caller must drop stale hits and move the scoring cursor.
    Resumed,
    /// Active → Inactive.
    Idled,
    Unchanged(GateState),
}

impl GateTransition {
    pub fn is_active(self) -> bool {
        matches!(self, GateTransition::Resumed | GateTransition::Unchanged(GateState::Active))
    }
}

/// Idle/active tracking based on how recently the player hit anything.
#[derive(Debug, Clone)]
pub struct TrackingGate {
    idle_beats: f64,
    ever_hit: bool,
    last_hit_time: f64,
    active: bool,
}

impl TrackingGate {
    pub fn new(idle_beats: f64) -> Self {
        Self {
            idle_beats,
            ever_hit: false,
            last_hit_time: f64::NEG_INFINITY,
            active: false,
        }
    }

    pub fn record_hit(&mut self, now: f64) {
        self.ever_hit = true;
        self.last_hit_time = now;
    }

    pub fn state(&self) -> GateState {
        if self.active {
            GateState::Active
        } else {
            GateState::Inactive
        }
    }

    pub fn ever_hit(&self) -> bool {
        self.ever_hit
    }

    /// True while the last hit is less than `idle_beats` periods old.
    pub fn is_recent(&self, now: f64, period: f64) -> bool {
        if !self.ever_hit {
            return false;
        }
        // The clock may step backwards briefly; never treat that as negative idle time.
        let elapsed = (now - self.last_hit_time).max(0.0);
        elapsed / period < self.idle_beats
    }

    pub fn evaluate(&mut self, now: f64, period: f64) -> GateTransition {
        let recent = self.is_recent(now, period);
        match (self.active, recent) {
            (false, true) => {
                self.active = true;
                GateTransition::Resumed
            }
            (true, false) => {
                self.active = false;
                GateTransition::Idled
            }
            _ => GateTransition::Unchanged(self.state()),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.idle_beats);
    }
}
