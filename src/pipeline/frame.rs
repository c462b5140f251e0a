use serde::{Deserialize, Serialize};

/// Per-frame metrics. All zero when no face was found.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSample {
    /// Eye closure ratio, the larger of the two eyes.
    pub ecr: f32,
    /// Brow gap in pixels, averaged over both eyes.
    pub blg: f32,
    /// Mouth aspect ratio.
    pub mar: f32,
}

/// One emitted frame: the encoded annotated image plus its metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub image: Vec<u8>,
    pub ecr: f32,
    pub blg: f32,
    pub mar: f32,
    pub alert: bool,
}

impl FrameResult {
    pub fn new(image: Vec<u8>, metrics: MetricSample, alert: bool) -> Self {
        FrameResult {
            image,
            ecr: metrics.ecr,
            blg: metrics.blg,
            mar: metrics.mar,
            alert,
        }
    }

    pub fn metrics(&self) -> MetricSample {
        MetricSample {
            ecr: self.ecr,
            blg: self.blg,
            mar: self.mar,
        }
    }

    /// Label lines in the order the display shows them.
    pub fn labels(&self) -> [String; 3] {
        [
            format!("ECR: {:.2}", self.ecr),
            format!("BLG: {:.0}", self.blg),
            format!("MAR: {:.2}", self.mar),
        ]
    }
}
