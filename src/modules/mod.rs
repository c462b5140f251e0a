pub mod annotator;
pub mod capture;
pub mod debounce;
pub mod landmark_detector;
