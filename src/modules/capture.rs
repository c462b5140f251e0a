use anyhow::Error;
use opencv::core::{Mat, MatTraitConst};
use opencv::prelude::{VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{VideoCapture, CAP_PROP_BUFFERSIZE};
use tracing::{info, warn};
use crate::config::config::CaptureConfig;

/// A source of BGR frames owned by the engine worker.
pub trait FrameSource: Send {
    /// read_frame fills `frame`; `Ok(false)` means the stream has ended.
    fn read_frame(&mut self, frame: &mut Mat) -> Result<bool, Error>;

    fn release(&mut self) -> Result<(), Error>;
}

/// Opens the frame source on the worker thread.
pub type SourceOpener = Box<dyn FnOnce() -> Result<Box<dyn FrameSource>, Error> + Send>;

pub struct CameraSource {
    capture: VideoCapture,
}

impl CameraSource {

    /// open connects to the capture device and keeps a single buffered frame.
    ///
    /// # Arguments
    /// * `config` - device index, backend and buffer size
    ///
    /// # Returns
    /// * `Result<CameraSource, Error>` - fails when the device does not open
    pub fn open(config: &CaptureConfig) -> Result<Self, Error> {
        info!(device = config.device_index, "opening capture device");
        let mut capture = VideoCapture::new(config.device_index, config.api_preference)?;
        if !capture.is_opened()? {
            return Err(Error::msg(format!("capture device {} did not open", config.device_index)));
        }
        if !capture.set(CAP_PROP_BUFFERSIZE, config.buffer_size as f64)? {
            warn!(buffer_size = config.buffer_size, "capture backend ignored buffer size");
        }
        Ok(CameraSource { capture })
    }

    pub fn opener(config: CaptureConfig) -> SourceOpener {
        Box::new(move || {
            let source = CameraSource::open(&config)?;
            Ok(Box::new(source) as Box<dyn FrameSource>)
        })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self, frame: &mut Mat) -> Result<bool, Error> {
        let ok = self.capture.read(frame)?;
        Ok(ok && !frame.empty())
    }

    fn release(&mut self) -> Result<(), Error> {
        self.capture.release()?;
        Ok(())
    }
}
