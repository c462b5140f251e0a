use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use opencv::core::Mat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::config::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::modules::capture::{CameraSource, FrameSource, SourceOpener};
use crate::modules::landmark_detector::LandmarkDetector;
use crate::pipeline::frame::FrameResult;
use crate::pipeline::pipeline::FramePipeline;
use crate::pipeline::placeholder::PlaceholderEngine;

/// Receives every emitted frame on the engine worker thread.
pub type FrameCallback = Box<dyn FnMut(FrameResult) + Send + 'static>;

/// Start/stop contract shared by the camera engine and the placeholder.
pub trait Engine: Send {
    /// start spawns the worker and returns once it is producing frames.
    /// An engine runs at most once; a second call fails with `AlreadyStarted`.
    fn start(&mut self, callback: FrameCallback) -> Result<()>;

    /// stop asks the worker to finish and waits up to the configured timeout.
    fn stop(&mut self) -> StopOutcome;

    fn is_running(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Camera,
    Placeholder,
}

impl FromStr for EngineKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camera" => Ok(EngineKind::Camera),
            "placeholder" => Ok(EngineKind::Placeholder),
            other => Err(EngineError::InvalidConfig(format!("unknown engine kind {other:?}"))),
        }
    }
}

/// build_engine constructs the engine variant chosen by the caller.
///
/// # Arguments
/// * `kind` - camera-backed or placeholder
/// * `config` - engine configuration, validated here
/// * `detector` - landmark model; unused by the placeholder
///
/// # Returns
/// * `Result<Box<dyn Engine>>`
pub fn build_engine(kind: EngineKind, config: EngineConfig, detector: Box<dyn LandmarkDetector>) -> Result<Box<dyn Engine>> {
    match kind {
        EngineKind::Camera => Ok(Box::new(CameraEngine::new(config, detector)?)),
        EngineKind::Placeholder => Ok(Box::new(PlaceholderEngine::new(config)?)),
    }
}

/// Why a worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Stopped,
    EndOfStream,
    ReadFailed,
    OpenFailed,
    Panicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running.
    NotStarted,
    Joined(WorkerExit),
    /// The worker did not finish within the timeout and was detached.
    Abandoned,
}

/// Cooperative cancellation flag, checked once per loop iteration.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A named worker thread with a stop token and a bounded join.
#[derive(Debug)]
pub(crate) struct Worker {
    token: StopToken,
    finished: mpsc::Receiver<()>,
    handle: JoinHandle<WorkerExit>,
}

impl Worker {
    pub(crate) fn spawn<F>(name: &str, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(StopToken) -> WorkerExit + Send + 'static,
    {
        let token = StopToken::new();
        let worker_token = token.clone();
        // dropped when the thread exits, even by panic
        let (finished_tx, finished) = mpsc::channel::<()>();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let _finished = finished_tx;
            body(worker_token)
        })?;
        Ok(Worker {
            token,
            finished,
            handle,
        })
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(crate) fn join(self) -> WorkerExit {
        self.handle.join().unwrap_or(WorkerExit::Panicked)
    }

    pub(crate) fn stop(self, timeout: Duration) -> StopOutcome {
        self.token.cancel();
        match self.finished.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                let name = self.handle.thread().name().unwrap_or("engine").to_string();
                warn!(worker = %name, ?timeout, "worker did not stop in time, abandoning it");
                StopOutcome::Abandoned
            }
            _ => StopOutcome::Joined(self.join()),
        }
    }
}

/// Engine reading a real capture device and running the full frame pipeline.
pub struct CameraEngine {
    config: EngineConfig,
    opener: Option<SourceOpener>,
    detector: Option<Box<dyn LandmarkDetector>>,
    worker: Option<Worker>,
}

impl CameraEngine {

    pub fn new(config: EngineConfig, detector: Box<dyn LandmarkDetector>) -> Result<Self> {
        let opener = CameraSource::opener(config.capture.clone());
        Self::with_source(config, opener, detector)
    }

    /// with_source uses `opener` instead of the configured capture device.
    pub fn with_source(config: EngineConfig, opener: SourceOpener, mut detector: Box<dyn LandmarkDetector>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        detector
            .configure(&config.detector)
            .map_err(|e| EngineError::InvalidConfig(format!("detector rejected settings: {e}")))?;
        Ok(CameraEngine {
            config,
            opener: Some(opener),
            detector: Some(detector),
            worker: None,
        })
    }
}

impl Engine for CameraEngine {
    fn start(&mut self, callback: FrameCallback) -> Result<()> {
        let (opener, detector) = match (self.opener.take(), self.detector.take()) {
            (Some(opener), Some(detector)) => (opener, detector),
            _ => return Err(EngineError::AlreadyStarted),
        };
        let config = self.config.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<std::result::Result<(), String>>(1);

        let worker = Worker::spawn("eyelid-engine", move |token| {
            let source = match opener() {
                Ok(source) => source,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return WorkerExit::OpenFailed;
                }
            };
            let _ = ready_tx.send(Ok(()));
            run_capture_loop(source, detector, &config, &token, callback)
        })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("camera engine started");
                self.worker = Some(worker);
                Ok(())
            }
            Ok(Err(reason)) => {
                worker.join();
                warn!(%reason, "capture device unavailable");
                Err(EngineError::DeviceUnavailable(reason))
            }
            Err(_) => {
                worker.join();
                Err(EngineError::WorkerLost)
            }
        }
    }

    fn stop(&mut self) -> StopOutcome {
        match self.worker.take() {
            None => StopOutcome::NotStarted,
            Some(worker) => {
                let outcome = worker.stop(self.config.stop_timeout());
                info!(?outcome, "camera engine stopped");
                outcome
            }
        }
    }

    fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for CameraEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop(self.config.stop_timeout());
        }
    }
}

fn run_capture_loop(
    mut source: Box<dyn FrameSource>,
    mut detector: Box<dyn LandmarkDetector>,
    config: &EngineConfig,
    token: &StopToken,
    mut callback: FrameCallback,
) -> WorkerExit {
    let mut pipeline = FramePipeline::new(config, Instant::now());
    let interval = config.frame_interval();
    let mut frame = Mat::default();
    let mut emitted: u64 = 0;

    let exit = loop {
        if token.is_cancelled() {
            break WorkerExit::Stopped;
        }
        match source.read_frame(&mut frame) {
            Ok(true) => {}
            Ok(false) => {
                info!(emitted, "capture stream ended");
                break WorkerExit::EndOfStream;
            }
            Err(e) => {
                warn!(emitted, "frame read failed, stopping: {e}");
                break WorkerExit::ReadFailed;
            }
        }

        let landmarks = detector.detect(&frame).unwrap_or_else(|e| {
            warn!("landmark detection failed: {e}");
            None
        });

        match pipeline.process(&mut frame, landmarks.as_ref(), Instant::now()) {
            Ok(result) => {
                emitted += 1;
                callback(result);
            }
            Err(e) => debug!("skipping frame: {e}"),
        }
        thread::sleep(interval);
    };

    if let Err(e) = source.release() {
        warn!("capture release failed: {e}");
    }
    exit
}
