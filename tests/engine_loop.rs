use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use anyhow::Error;
use opencv::core::{Mat, MatTraitConst, Scalar, CV_8UC3};
use eyelid_monitor::config::config::LandmarkLayout;
use eyelid_monitor::{
    latest_frame_slot, CameraEngine, Coordinate2D, Engine, EngineConfig, EngineError, FrameResult,
    FrameSource, LandmarkSet, NoFaceDetector, SourceOpener, StopOutcome, WorkerExit,
};

const W: i32 = 640;
const H: i32 = 480;

struct ScriptedSource {
    remaining: Option<usize>,
    fail_read: bool,
    released: Arc<AtomicBool>,
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self, frame: &mut Mat) -> Result<bool, Error> {
        if self.fail_read {
            return Err(Error::msg("usb unplugged"));
        }
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(false);
            }
            *remaining -= 1;
        }
        *frame = Mat::new_rows_cols_with_default(H, W, CV_8UC3, Scalar::all(0.0))?;
        Ok(true)
    }

    fn release(&mut self) -> Result<(), Error> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn opener(frames: Option<usize>, fail_read: bool, released: Arc<AtomicBool>) -> SourceOpener {
    Box::new(move || {
        Ok(Box::new(ScriptedSource {
            remaining: frames,
            fail_read,
            released,
        }) as Box<dyn FrameSource>)
    })
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        frame_interval_ms: 5,
        ..EngineConfig::new()
    }
}

/// Face with round irises of radius `iris_px` and the given lid gap in pixels.
fn face(iris_px: f32, lid_gap_px: f32) -> LandmarkSet {
    let layout = LandmarkLayout::new();
    let (w, h) = (W as f32, H as f32);
    let mut coords = vec![Coordinate2D { x: 0.5, y: 0.5 }; 478];
    for (eye, cx) in [(&layout.left_eye, 240.0), (&layout.right_eye, 400.0)] {
        let cy = 200.0;
        let mut put = |idx: usize, px: f32, py: f32| coords[idx] = Coordinate2D { x: px / w, y: py / h };
        put(eye.center, cx, cy);
        put(eye.perimeter[0], cx + iris_px, cy);
        put(eye.perimeter[1], cx, cy - iris_px);
        put(eye.perimeter[2], cx - iris_px, cy);
        put(eye.perimeter[3], cx, cy + iris_px);
        put(eye.upper_lid, cx, cy - lid_gap_px / 2.0);
        put(eye.lower_lid, cx, cy + lid_gap_px / 2.0);
        put(eye.brow, cx, cy - lid_gap_px / 2.0 - 30.0);
    }
    let mouth = &layout.mouth;
    coords[mouth.left_corner] = Coordinate2D { x: 280.0 / w, y: 360.0 / h };
    coords[mouth.right_corner] = Coordinate2D { x: 360.0 / w, y: 360.0 / h };
    coords[mouth.upper_lip] = Coordinate2D { x: 320.0 / w, y: 355.0 / h };
    coords[mouth.lower_lip] = Coordinate2D { x: 320.0 / w, y: 365.0 / h };
    LandmarkSet::from_coordinates(&coords)
}

fn collector() -> (Arc<Mutex<Vec<FrameResult>>>, Box<dyn FnMut(FrameResult) + Send>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, Box::new(move |r| sink.lock().unwrap().push(r)))
}

fn wait_until_finished(engine: &CameraEngine) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while engine.is_running() {
        assert!(Instant::now() < deadline, "engine did not finish");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_emits_one_result_per_frame_then_releases_device() {
    let released = Arc::new(AtomicBool::new(false));
    let mut engine = CameraEngine::with_source(
        fast_config(),
        opener(Some(5), false, released.clone()),
        Box::new(NoFaceDetector),
    )
    .unwrap();
    let (seen, callback) = collector();

    engine.start(callback).unwrap();
    wait_until_finished(&engine);

    assert_eq!(engine.stop(), StopOutcome::Joined(WorkerExit::EndOfStream));
    assert!(released.load(Ordering::SeqCst));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 5);
    for r in seen.iter() {
        assert_eq!((r.ecr, r.blg, r.mar), (0.0, 0.0, 0.0));
        assert!(!r.alert);
        assert_eq!(&r.image[..2], &[0xFF, 0xD8]);
    }
}

#[test]
fn test_device_unavailable_is_reported_from_start() {
    let failing: SourceOpener = Box::new(|| Err(Error::msg("no camera")));
    let mut engine = CameraEngine::with_source(fast_config(), failing, Box::new(NoFaceDetector)).unwrap();
    let (seen, callback) = collector();

    let err = engine.start(callback).unwrap_err();
    assert!(matches!(err, EngineError::DeviceUnavailable(ref msg) if msg.contains("no camera")));
    assert!(!engine.is_running());
    assert_eq!(engine.stop(), StopOutcome::NotStarted);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_read_failure_ends_loop() {
    let released = Arc::new(AtomicBool::new(false));
    let mut engine = CameraEngine::with_source(
        fast_config(),
        opener(None, true, released.clone()),
        Box::new(NoFaceDetector),
    )
    .unwrap();
    let (seen, callback) = collector();

    engine.start(callback).unwrap();
    wait_until_finished(&engine);
    assert_eq!(engine.stop(), StopOutcome::Joined(WorkerExit::ReadFailed));
    assert!(released.load(Ordering::SeqCst));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_stop_ends_endless_stream() {
    let released = Arc::new(AtomicBool::new(false));
    let mut engine = CameraEngine::with_source(
        fast_config(),
        opener(None, false, released.clone()),
        Box::new(NoFaceDetector),
    )
    .unwrap();
    let (seen, callback) = collector();

    assert_eq!(engine.stop(), StopOutcome::NotStarted);
    engine.start(callback).unwrap();
    assert!(matches!(engine.start(Box::new(|_| {})), Err(EngineError::AlreadyStarted)));
    thread::sleep(Duration::from_millis(60));

    assert_eq!(engine.stop(), StopOutcome::Joined(WorkerExit::Stopped));
    assert!(released.load(Ordering::SeqCst));
    assert!(!seen.lock().unwrap().is_empty());
    assert_eq!(engine.stop(), StopOutcome::NotStarted);
}

#[test]
fn test_sustained_closure_raises_alert_and_no_face_clears_it() {
    let released = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let closed = face(8.0, 10.0);
    // 120 closed-eye frames, then faceless frames until the source ends
    let detector = move |_: &Mat| -> Result<Option<LandmarkSet>, Error> {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Ok(if n < 120 { Some(closed.clone()) } else { None })
    };
    let mut engine = CameraEngine::with_source(
        fast_config(),
        opener(Some(125), false, released),
        Box::new(detector),
    )
    .unwrap();
    let (seen, callback) = collector();

    engine.start(callback).unwrap();
    wait_until_finished(&engine);
    assert_eq!(engine.stop(), StopOutcome::Joined(WorkerExit::EndOfStream));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 125);
    assert!(!seen[0].alert);
    assert!((seen[0].ecr - 1.6).abs() < 1e-3);
    assert!(seen[119].alert);
    for r in &seen[120..] {
        assert!(!r.alert);
        assert_eq!((r.ecr, r.blg, r.mar), (0.0, 0.0, 0.0));
    }
}

#[test]
fn test_detector_errors_are_treated_as_no_face() {
    let released = Arc::new(AtomicBool::new(false));
    let detector = |_: &Mat| -> Result<Option<LandmarkSet>, Error> { Err(Error::msg("model crashed")) };
    let mut engine = CameraEngine::with_source(
        fast_config(),
        opener(Some(3), false, released),
        Box::new(detector),
    )
    .unwrap();
    let (seen, callback) = collector();

    engine.start(callback).unwrap();
    wait_until_finished(&engine);
    engine.stop();
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn test_latest_slot_feeds_consumer() {
    let released = Arc::new(AtomicBool::new(false));
    let mut engine = CameraEngine::with_source(
        fast_config(),
        opener(Some(10), false, released),
        Box::new(NoFaceDetector),
    )
    .unwrap();
    let (publisher, mut reader) = latest_frame_slot();

    engine.start(publisher.into_callback()).unwrap();
    wait_until_finished(&engine);
    engine.stop();

    let latest = reader.take_new().expect("a frame was published");
    assert!(!latest.alert);
    assert!(reader.take_new().is_none());
    assert!(reader.latest().is_some());

    let decoded = eyelid_monitor::utils::image::convert_bytes_to_mat(&latest.image).unwrap();
    assert_eq!((decoded.cols(), decoded.rows()), (W, H));
}

#[test]
fn test_consumer_reads_final_frame_after_worker_exits() {
    let released = Arc::new(AtomicBool::new(false));
    let open_face = face(8.0, 10.0);
    let detector = move |_: &Mat| -> Result<Option<LandmarkSet>, Error> { Ok(Some(open_face.clone())) };
    let mut engine = CameraEngine::with_source(
        fast_config(),
        opener(Some(3), false, released.clone()),
        Box::new(detector),
    )
    .unwrap();
    let (publisher, mut reader) = latest_frame_slot();

    engine.start(publisher.into_callback()).unwrap();
    wait_until_finished(&engine);
    assert_eq!(engine.stop(), StopOutcome::Joined(WorkerExit::EndOfStream));
    assert!(released.load(Ordering::SeqCst));

    // the publisher was dropped with the worker; the unseen frame must still arrive
    let last = reader.take_new().expect("final frame still readable");
    assert!((last.ecr - 1.6).abs() < 1e-3);
    assert!(reader.take_new().is_none());
}
