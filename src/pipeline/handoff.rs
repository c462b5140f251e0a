use std::sync::Arc;
use tokio::sync::watch;
use crate::pipeline::engine::FrameCallback;
use crate::pipeline::frame::FrameResult;

/// latest_frame_slot creates a single-slot, last-value-wins handoff between
/// the engine worker and a consumer polling on its own schedule.
pub fn latest_frame_slot() -> (FramePublisher, FrameReader) {
    let (tx, rx) = watch::channel(None);
    (FramePublisher { tx }, FrameReader { rx })
}

/// Writer half. Publishing never blocks and overwrites whatever is unread.
#[derive(Debug)]
pub struct FramePublisher {
    tx: watch::Sender<Option<Arc<FrameResult>>>,
}

impl FramePublisher {
    pub fn publish(&self, result: FrameResult) {
        self.tx.send_replace(Some(Arc::new(result)));
    }

    pub fn into_callback(self) -> FrameCallback {
        Box::new(move |result| self.publish(result))
    }
}

#[derive(Debug, Clone)]
pub struct FrameReader {
    rx: watch::Receiver<Option<Arc<FrameResult>>>,
}

impl FrameReader {
    /// latest returns the most recent result, possibly one already seen.
    pub fn latest(&self) -> Option<Arc<FrameResult>> {
        self.rx.borrow().clone()
    }

    /// take_new returns the latest result only if it arrived since the last call.
    /// A result published just before the worker exited is still returned once.
    pub fn take_new(&mut self) -> Option<Arc<FrameResult>> {
        let latest = self.rx.borrow_and_update();
        if latest.has_changed() {
            (*latest).clone()
        } else {
            None
        }
    }

    /// changed waits for the next publish; `false` once the publisher is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
