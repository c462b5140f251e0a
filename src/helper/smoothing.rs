use std::collections::VecDeque;
use crate::utils::utils::median;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Rolling median over the most recent raw iris radii of each eye.
#[derive(Debug, Clone)]
pub struct IrisSmoother {
    capacity: usize,
    left: VecDeque<f32>,
    right: VecDeque<f32>,
}

impl IrisSmoother {

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        IrisSmoother {
            capacity,
            left: VecDeque::with_capacity(capacity),
            right: VecDeque::with_capacity(capacity),
        }
    }

    fn queue_mut(&mut self, eye: Eye) -> &mut VecDeque<f32> {
        match eye {
            Eye::Left => &mut self.left,
            Eye::Right => &mut self.right,
        }
    }

    pub fn push(&mut self, eye: Eye, raw_radius: f32) {
        let capacity = self.capacity;
        let queue = self.queue_mut(eye);
        if queue.len() == capacity {
            queue.pop_front();
        }
        queue.push_back(raw_radius);
    }

    /// diameter is twice the median of the buffered radii, 0 before any push.
    pub fn diameter(&self, eye: Eye) -> f32 {
        let queue = match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        };
        let samples: Vec<f32> = queue.iter().copied().collect();
        median(&samples).map_or(0.0, |m| 2.0 * m)
    }
}

/// eye_closure_ratio of a smoothed diameter over the lid gap; 0 when the lids touch.
pub fn eye_closure_ratio(diameter: f32, lid_gap: f32) -> f32 {
    if lid_gap > 0.0 {
        diameter / lid_gap
    } else {
        0.0
    }
}
