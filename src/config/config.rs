use std::path::Path;
use std::time::Duration;
use anyhow::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertThresholds {
    pub ecr_moderate: f32,
    pub ecr_brow: f32,
    pub ecr_severe: f32,
    pub mar: f32,
    pub brow_coef: f32,
}

impl AlertThresholds {
    pub fn new() -> Self {
        AlertThresholds {
            ecr_moderate: 1.30,
            ecr_brow: 1.40,
            ecr_severe: 1.15,
            mar: 0.35,
            brow_coef: 1.25,
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::new()
    }
}

/// Sustain durations, in seconds, each condition must hold before it alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertDurations {
    pub moderate_secs: f32,
    pub severe_secs: f32,
    pub mouth_secs: f32,
}

impl AlertDurations {
    pub fn new() -> Self {
        AlertDurations {
            moderate_secs: 0.20,
            severe_secs: 0.50,
            mouth_secs: 0.50,
        }
    }

    pub fn moderate(&self) -> Duration {
        Duration::from_secs_f32(self.moderate_secs)
    }

    pub fn severe(&self) -> Duration {
        Duration::from_secs_f32(self.severe_secs)
    }

    pub fn mouth(&self) -> Duration {
        Duration::from_secs_f32(self.mouth_secs)
    }
}

impl Default for AlertDurations {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub device_index: i32,
    pub api_preference: i32,
    pub buffer_size: i32,
}

impl CaptureConfig {
    pub fn new() -> Self {
        CaptureConfig {
            device_index: 0,
            api_preference: opencv::videoio::CAP_ANY,
            buffer_size: 1,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings handed to the external landmark detector. The engine itself only
/// ever consumes the first face.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub max_num_faces: u32,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl DetectorConfig {
    pub fn new() -> Self {
        DetectorConfig {
            max_num_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EyeLandmarks {
    pub center: usize,
    pub perimeter: [usize; 4],
    pub upper_lid: usize,
    pub lower_lid: usize,
    pub brow: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MouthLandmarks {
    pub left_corner: usize,
    pub right_corner: usize,
    pub upper_lip: usize,
    pub lower_lip: usize,
}

/// Landmark indices of the refined 478 point face mesh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LandmarkLayout {
    pub left_eye: EyeLandmarks,
    pub right_eye: EyeLandmarks,
    pub mouth: MouthLandmarks,
}

impl LandmarkLayout {
    pub fn new() -> Self {
        LandmarkLayout {
            left_eye: EyeLandmarks {
                center: 468,
                perimeter: [469, 470, 471, 472],
                upper_lid: 159,
                lower_lid: 145,
                brow: 70,
            },
            right_eye: EyeLandmarks {
                center: 473,
                perimeter: [474, 475, 476, 477],
                upper_lid: 386,
                lower_lid: 374,
                brow: 336,
            },
            mouth: MouthLandmarks {
                left_corner: 61,
                right_corner: 291,
                upper_lip: 13,
                lower_lip: 14,
            },
        }
    }

    /// Largest landmark index referenced by the layout.
    pub fn max_index(&self) -> usize {
        let eyes = [&self.left_eye, &self.right_eye]
            .into_iter()
            .flat_map(|eye| {
                eye.perimeter
                    .iter()
                    .copied()
                    .chain([eye.center, eye.upper_lid, eye.lower_lid, eye.brow])
            })
            .max()
            .unwrap_or(0);
        let mouth = [
            self.mouth.left_corner,
            self.mouth.right_corner,
            self.mouth.upper_lip,
            self.mouth.lower_lip,
        ];
        mouth.into_iter().fold(eyes, usize::max)
    }
}

impl Default for LandmarkLayout {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: AlertThresholds,
    pub durations: AlertDurations,
    pub calibration_secs: f32,
    pub smoothing_window: usize,
    pub frame_interval_ms: u64,
    pub placeholder_interval_ms: u64,
    pub stop_timeout_ms: u64,
    pub encode_ext: String,
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub layout: LandmarkLayout,
}

impl EngineConfig {
    pub fn new() -> Self {
        EngineConfig {
            thresholds: AlertThresholds::new(),
            durations: AlertDurations::new(),
            calibration_secs: 1.5,
            smoothing_window: 3,
            frame_interval_ms: 20,
            placeholder_interval_ms: 200,
            stop_timeout_ms: 1000,
            encode_ext: ".jpg".to_string(),
            capture: CaptureConfig::new(),
            detector: DetectorConfig::new(),
            layout: LandmarkLayout::new(),
        }
    }

    /// from_json_file reads a configuration file; missing keys keep their defaults.
    ///
    /// # Arguments
    /// * `path` - path of the JSON document
    ///
    /// # Returns
    /// * `Result<EngineConfig, Error>`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::msg(format!("cannot read config {}: {e}", path.display())))?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.smoothing_window == 0 {
            return Err(Error::msg("smoothing_window must be at least 1"));
        }
        if self.frame_interval_ms == 0 || self.placeholder_interval_ms == 0 {
            return Err(Error::msg("frame intervals must be positive"));
        }
        let d = &self.durations;
        let durations = [
            ("calibration_secs", self.calibration_secs),
            ("moderate_secs", d.moderate_secs),
            ("severe_secs", d.severe_secs),
            ("mouth_secs", d.mouth_secs),
        ];
        for (name, secs) in durations {
            if Duration::try_from_secs_f32(secs).is_err() {
                return Err(Error::msg(format!("{name} is not a representable duration: {secs}")));
            }
        }
        let t = &self.thresholds;
        let values = [t.ecr_moderate, t.ecr_brow, t.ecr_severe, t.mar, t.brow_coef];
        if values.iter().any(|v| !(*v >= 0.0) || !v.is_finite()) {
            return Err(Error::msg("thresholds must be finite and non-negative"));
        }
        if !self.encode_ext.starts_with('.') {
            return Err(Error::msg("encode_ext must look like \".jpg\""));
        }
        Ok(())
    }

    pub fn calibration(&self) -> Duration {
        Duration::from_secs_f32(self.calibration_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn placeholder_interval(&self) -> Duration {
        Duration::from_millis(self.placeholder_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
