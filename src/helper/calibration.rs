use std::time::Duration;
use tracing::info;
use crate::utils::utils::median;

/// Brow gap reference captured once during the opening calibration window.
#[derive(Debug, Clone)]
pub struct BrowBaseline {
    window: Duration,
    coef: f32,
    samples: Vec<f32>,
    value: Option<f32>,
}

impl BrowBaseline {

    pub fn new(window: Duration, coef: f32) -> Self {
        BrowBaseline {
            window,
            coef,
            samples: Vec::new(),
            value: None,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    /// observe feeds one brow gap sample taken `elapsed` after engine start.
    /// Once the window has passed the baseline is frozen and later samples are ignored.
    pub fn observe(&mut self, elapsed: Duration, blg: f32) {
        if self.value.is_some() {
            return;
        }
        if elapsed < self.window {
            self.samples.push(blg);
            return;
        }
        let baseline = median(&self.samples).unwrap_or(blg);
        info!(baseline, samples = self.samples.len(), "brow gap baseline calibrated");
        self.value = Some(baseline);
        self.samples = Vec::new();
    }

    /// is_cheating reports a brow raise above `coef` times the baseline.
    /// A zero baseline never counts as calibrated.
    pub fn is_cheating(&self, blg: f32) -> bool {
        match self.value {
            Some(baseline) if baseline != 0.0 => blg > self.coef * baseline,
            _ => false,
        }
    }
}
