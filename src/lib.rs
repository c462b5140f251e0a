//! Drowsiness and distraction alerts from a live face landmark stream.
//!
//! Each captured frame goes through landmark detection, geometry extraction,
//! iris smoothing, brow calibration and three debounce timers before it is
//! annotated, encoded and handed to a callback as a [`FrameResult`].

pub mod config;
pub mod error;
pub mod helper;
pub mod modules;
pub mod pipeline;
pub mod utils;

pub use config::config::EngineConfig;
pub use error::{EngineError, Result};
pub use modules::capture::{CameraSource, FrameSource, SourceOpener};
pub use modules::landmark_detector::{LandmarkDetector, NoFaceDetector};
pub use pipeline::engine::{build_engine, CameraEngine, Engine, EngineKind, FrameCallback, StopOutcome, StopToken, WorkerExit};
pub use pipeline::frame::{FrameResult, MetricSample};
pub use pipeline::handoff::{latest_frame_slot, FramePublisher, FrameReader};
pub use pipeline::pipeline::FramePipeline;
pub use pipeline::placeholder::PlaceholderEngine;
pub use utils::coordinate::{Coordinate2D, LandmarkSet};
