use std::thread;
use tracing::info;
use crate::config::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pipeline::engine::{Engine, FrameCallback, StopOutcome, Worker, WorkerExit};
use crate::pipeline::frame::{FrameResult, MetricSample};
use crate::utils::image::PLACEHOLDER_PNG;

/// Inert engine for hosts without a camera. Emits a black 1x1 PNG with zero
/// metrics on a slow fixed interval so consumers keep receiving frames.
pub struct PlaceholderEngine {
    config: EngineConfig,
    started: bool,
    worker: Option<Worker>,
}

impl PlaceholderEngine {

    pub fn new(config: EngineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        Ok(PlaceholderEngine {
            config,
            started: false,
            worker: None,
        })
    }
}

impl Engine for PlaceholderEngine {
    fn start(&mut self, mut callback: FrameCallback) -> Result<()> {
        if self.started {
            return Err(EngineError::AlreadyStarted);
        }
        let interval = self.config.placeholder_interval();
        let worker = Worker::spawn("eyelid-placeholder", move |token| {
            while !token.is_cancelled() {
                callback(FrameResult::new(PLACEHOLDER_PNG.to_vec(), MetricSample::default(), false));
                thread::sleep(interval);
            }
            WorkerExit::Stopped
        })?;
        self.started = true;
        self.worker = Some(worker);
        info!(?interval, "placeholder engine started");
        Ok(())
    }

    fn stop(&mut self) -> StopOutcome {
        match self.worker.take() {
            None => StopOutcome::NotStarted,
            Some(worker) => worker.stop(self.config.stop_timeout()),
        }
    }

    fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for PlaceholderEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop(self.config.stop_timeout());
        }
    }
}
