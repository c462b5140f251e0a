use std::time::Instant;
use anyhow::Error;
use nalgebra::Vector2;
use opencv::core::{Mat, MatTraitConst};
use tracing::{debug, info, warn};
use crate::config::config::EngineConfig;
use crate::helper::calibration::BrowBaseline;
use crate::helper::face_geometry::{FaceGeometryExtractor, MarkerKind};
use crate::helper::smoothing::{eye_closure_ratio, Eye, IrisSmoother};
use crate::modules::annotator::FrameAnnotator;
use crate::modules::debounce::{AlertDecision, TimerBank};
use crate::pipeline::frame::{FrameResult, MetricSample};
use crate::utils::coordinate::LandmarkSet;

/// Outcome of the metric stage for one frame, before drawing.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub metrics: MetricSample,
    pub decision: AlertDecision,
    pub markers: Vec<(Vector2<f32>, MarkerKind)>,
}

/// Everything the engine does to a single frame, without threads or I/O.
///
/// Holds the per-engine state (smoothing queues, brow baseline, alert timers)
/// and is driven with explicit timestamps so callers control the clock.
#[derive(Debug)]
pub struct FramePipeline {
    extractor: FaceGeometryExtractor,
    smoother: IrisSmoother,
    baseline: BrowBaseline,
    timers: TimerBank,
    annotator: FrameAnnotator,
    started_at: Instant,
    alerting: bool,
}

impl FramePipeline {

    /// new initializes the pipeline; calibration time is measured from `started_at`.
    pub fn new(config: &EngineConfig, started_at: Instant) -> Self {
        FramePipeline {
            extractor: FaceGeometryExtractor::new(config.layout.clone()),
            smoother: IrisSmoother::new(config.smoothing_window),
            baseline: BrowBaseline::new(config.calibration(), config.thresholds.brow_coef),
            timers: TimerBank::new(config.thresholds.clone(), &config.durations),
            annotator: FrameAnnotator::new(config.encode_ext.clone()),
            started_at,
            alerting: false,
        }
    }

    pub fn baseline(&self) -> &BrowBaseline {
        &self.baseline
    }

    pub fn timers(&self) -> &TimerBank {
        &self.timers
    }

    /// analyze derives metrics from the landmarks and advances the alert timers.
    ///
    /// # Arguments
    /// * `landmarks` - detector output, `None` when no face was found
    /// * `width` - frame width in pixels
    /// * `height` - frame height in pixels
    /// * `now` - capture time of the frame
    ///
    /// # Returns
    /// * `FrameAnalysis`
    pub fn analyze(&mut self, landmarks: Option<&LandmarkSet>, width: i32, height: i32, now: Instant) -> FrameAnalysis {
        let mut metrics = MetricSample::default();
        let mut markers = Vec::new();
        let mut cheating_brow = false;

        if let Some(landmarks) = landmarks {
            let measured = self
                .extractor
                .extract(landmarks, width, height)
                .and_then(|g| Ok((g, self.extractor.marker_points(landmarks, width, height)?)));

            match measured {
                Ok((geometry, points)) => {
                    self.smoother.push(Eye::Left, geometry.left.iris_radius);
                    self.smoother.push(Eye::Right, geometry.right.iris_radius);
                    let ecr_left = eye_closure_ratio(self.smoother.diameter(Eye::Left), geometry.left.lid_gap);
                    let ecr_right = eye_closure_ratio(self.smoother.diameter(Eye::Right), geometry.right.lid_gap);

                    metrics = MetricSample {
                        ecr: ecr_left.max(ecr_right),
                        blg: geometry.brow_gap,
                        mar: geometry.mouth_aspect_ratio,
                    };
                    self.baseline.observe(now.duration_since(self.started_at), metrics.blg);
                    cheating_brow = self.baseline.is_cheating(metrics.blg);
                    markers = points;
                }
                Err(e) => {
                    warn!("landmark set unusable, treating frame as faceless: {e}");
                }
            }
        }

        let decision = self.timers.evaluate(&metrics, cheating_brow, now);
        if decision.alert != self.alerting {
            if decision.alert {
                info!(
                    ecr = metrics.ecr,
                    mar = metrics.mar,
                    moderate = ?decision.moderate,
                    severe = ?decision.severe,
                    mouth = ?decision.mouth,
                    "alert raised"
                );
            } else {
                info!("alert cleared");
            }
            self.alerting = decision.alert;
        }

        FrameAnalysis {
            metrics,
            decision,
            markers,
        }
    }

    /// process runs analysis, annotation and encoding on one captured frame.
    ///
    /// # Arguments
    /// * `frame` - captured BGR frame, annotated in place
    /// * `landmarks` - detector output for `frame`
    /// * `now` - capture time of the frame
    ///
    /// # Returns
    /// * `Result<FrameResult, Error>` - an error means the frame should be skipped
    pub fn process(&mut self, frame: &mut Mat, landmarks: Option<&LandmarkSet>, now: Instant) -> Result<FrameResult, Error> {
        let (width, height) = (frame.cols(), frame.rows());
        let analysis = self.analyze(landmarks, width, height, now);
        let alert = analysis.decision.alert;

        self.annotator.annotate(frame, &analysis.markers, &analysis.metrics, alert)?;
        let image = self.annotator.encode(frame)?;
        debug!(bytes = image.len(), ecr = analysis.metrics.ecr, alert, "frame encoded");

        Ok(FrameResult::new(image, analysis.metrics, alert))
    }
}
