use std::time::{Duration, Instant};
use crate::config::config::{AlertDurations, AlertThresholds};
use crate::pipeline::frame::MetricSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed,
    Sustained,
}

/// Turns a per-frame boolean into "held for at least `required`".
#[derive(Debug, Clone)]
pub struct ConditionTimer {
    required: Duration,
    started_at: Option<Instant>,
    state: TimerState,
}

impl ConditionTimer {

    pub fn new(required: Duration) -> Self {
        ConditionTimer {
            required,
            started_at: None,
            state: TimerState::Idle,
        }
    }

    /// update records this frame's condition and returns whether it is sustained.
    /// A false frame drops any accumulated time.
    pub fn update(&mut self, condition: bool, now: Instant) -> bool {
        if !condition {
            self.started_at = None;
            self.state = TimerState::Idle;
            return false;
        }
        let started = *self.started_at.get_or_insert(now);
        self.state = if now.duration_since(started) >= self.required {
            TimerState::Sustained
        } else {
            TimerState::Armed
        };
        self.state == TimerState::Sustained
    }

    pub fn state(&self) -> TimerState {
        self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertDecision {
    pub alert: bool,
    pub moderate: TimerState,
    pub severe: TimerState,
    pub mouth: TimerState,
}

/// The three independent alert timers: moderate closure, severe closure, open mouth.
#[derive(Debug, Clone)]
pub struct TimerBank {
    thresholds: AlertThresholds,
    moderate: ConditionTimer,
    severe: ConditionTimer,
    mouth: ConditionTimer,
}

impl TimerBank {

    pub fn new(thresholds: AlertThresholds, durations: &AlertDurations) -> Self {
        TimerBank {
            thresholds,
            moderate: ConditionTimer::new(durations.moderate()),
            severe: ConditionTimer::new(durations.severe()),
            mouth: ConditionTimer::new(durations.mouth()),
        }
    }

    /// evaluate advances every timer with the frame's metrics.
    ///
    /// # Arguments
    /// * `sample` - metrics of the current frame
    /// * `cheating_brow` - whether a brow raise above baseline was detected
    /// * `now` - capture time of the frame
    ///
    /// # Returns
    /// * `AlertDecision` - the OR of the sustained timers and each timer's state
    pub fn evaluate(&mut self, sample: &MetricSample, cheating_brow: bool, now: Instant) -> AlertDecision {
        let t = &self.thresholds;
        let moderate_cond = sample.ecr >= t.ecr_moderate || (sample.ecr >= t.ecr_brow && cheating_brow);
        let severe_cond = sample.ecr >= t.ecr_severe;
        let mouth_cond = sample.mar > t.mar;

        let moderate = self.moderate.update(moderate_cond, now);
        let severe = self.severe.update(severe_cond, now);
        let mouth = self.mouth.update(mouth_cond, now);

        AlertDecision {
            alert: moderate || severe || mouth,
            moderate: self.moderate.state(),
            severe: self.severe.state(),
            mouth: self.mouth.state(),
        }
    }

    pub fn states(&self) -> [TimerState; 3] {
        [self.moderate.state(), self.severe.state(), self.mouth.state()]
    }
}
