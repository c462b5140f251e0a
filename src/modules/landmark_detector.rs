use anyhow::Error;
use opencv::core::Mat;
use crate::config::config::DetectorConfig;
use crate::utils::coordinate::LandmarkSet;

/// Face landmark model plugged into the engine.
///
/// Implementations should track a single face with refined iris landmarks and
/// return `Ok(None)` when no face is visible. The frame is BGR as delivered by
/// OpenCV capture.
pub trait LandmarkDetector: Send {
    /// configure receives the engine's detector settings once, before any frame.
    /// Returning an error rejects the engine configuration.
    fn configure(&mut self, _config: &DetectorConfig) -> Result<(), Error> {
        Ok(())
    }

    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>, Error>;
}

impl<F> LandmarkDetector for F
where
    F: FnMut(&Mat) -> Result<Option<LandmarkSet>, Error> + Send,
{
    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>, Error> {
        self(frame)
    }
}

/// Detector for builds without a landmark model: every frame reports no face.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceDetector;

impl LandmarkDetector for NoFaceDetector {
    fn detect(&mut self, _frame: &Mat) -> Result<Option<LandmarkSet>, Error> {
        Ok(None)
    }
}
