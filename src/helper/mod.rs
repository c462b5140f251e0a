pub mod calibration;
pub mod face_geometry;
pub mod smoothing;
