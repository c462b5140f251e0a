use anyhow::Error;
use nalgebra::Vector2;
use crate::config::config::{EyeLandmarks, LandmarkLayout, MouthLandmarks};
use crate::utils::coordinate::LandmarkSet;

/// Raw, unsmoothed measurements of one eye in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EyeGeometry {
    pub center: Vector2<f32>,
    pub iris_radius: f32,
    pub lid_gap: f32,
    pub brow_gap: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceGeometry {
    pub left: EyeGeometry,
    pub right: EyeGeometry,
    pub brow_gap: f32,
    pub mouth_aspect_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    IrisCenter,
    IrisPerimeter,
    UpperLid,
    LowerLid,
    Brow,
}

/// Stateless mapping from a landmark set to pixel-space face geometry.
#[derive(Debug, Clone)]
pub struct FaceGeometryExtractor {
    layout: LandmarkLayout,
}

impl FaceGeometryExtractor {

    pub fn new(layout: LandmarkLayout) -> Self {
        FaceGeometryExtractor { layout }
    }

    /// extract measures both eyes, the brow gap and the mouth aspect ratio.
    ///
    /// # Arguments
    /// * `landmarks` - normalized landmarks of one face
    /// * `width` - frame width in pixels
    /// * `height` - frame height in pixels
    ///
    /// # Returns
    /// * `Result<FaceGeometry, Error>` - fails when a layout index is missing from `landmarks`
    pub fn extract(&self, landmarks: &LandmarkSet, width: i32, height: i32) -> Result<FaceGeometry, Error> {
        if landmarks.len() <= self.layout.max_index() {
            return Err(Error::msg(format!(
                "expected at least {} landmarks, got {}",
                self.layout.max_index() + 1,
                landmarks.len()
            )));
        }
        let (w, h) = (width as f32, height as f32);
        let left = eye_geometry(landmarks, &self.layout.left_eye, w, h)?;
        let right = eye_geometry(landmarks, &self.layout.right_eye, w, h)?;
        let mar = mouth_geometry(landmarks, &self.layout.mouth, w, h)?;

        Ok(FaceGeometry {
            left,
            right,
            brow_gap: (left.brow_gap + right.brow_gap) / 2.0,
            mouth_aspect_ratio: mar,
        })
    }

    /// marker_points lists every landmark the annotator draws, in pixel space.
    pub fn marker_points(&self, landmarks: &LandmarkSet, width: i32, height: i32) -> Result<Vec<(Vector2<f32>, MarkerKind)>, Error> {
        let (w, h) = (width as f32, height as f32);
        let eyes = [&self.layout.left_eye, &self.layout.right_eye];
        let mut points = Vec::with_capacity(16);

        for eye in eyes {
            points.push((landmarks.to_pixel(eye.center, w, h)?, MarkerKind::IrisCenter));
        }
        for eye in eyes {
            for idx in eye.perimeter {
                points.push((landmarks.to_pixel(idx, w, h)?, MarkerKind::IrisPerimeter));
            }
        }
        for eye in eyes {
            points.push((landmarks.to_pixel(eye.upper_lid, w, h)?, MarkerKind::UpperLid));
        }
        for eye in eyes {
            points.push((landmarks.to_pixel(eye.lower_lid, w, h)?, MarkerKind::LowerLid));
        }
        for eye in eyes {
            points.push((landmarks.to_pixel(eye.brow, w, h)?, MarkerKind::Brow));
        }
        Ok(points)
    }
}

fn eye_geometry(landmarks: &LandmarkSet, eye: &EyeLandmarks, w: f32, h: f32) -> Result<EyeGeometry, Error> {
    let center = landmarks.to_pixel(eye.center, w, h)?;
    let mut total = 0.0;
    for idx in eye.perimeter {
        total += (landmarks.to_pixel(idx, w, h)? - center).norm();
    }
    let iris_radius = total / eye.perimeter.len() as f32;

    let upper = landmarks.to_pixel(eye.upper_lid, w, h)?;
    let lower = landmarks.to_pixel(eye.lower_lid, w, h)?;
    let brow = landmarks.to_pixel(eye.brow, w, h)?;

    Ok(EyeGeometry {
        center,
        iris_radius,
        lid_gap: lower.y - upper.y,
        brow_gap: upper.y - brow.y,
    })
}

fn mouth_geometry(landmarks: &LandmarkSet, mouth: &MouthLandmarks, w: f32, h: f32) -> Result<f32, Error> {
    let left = landmarks.to_pixel(mouth.left_corner, w, h)?;
    let right = landmarks.to_pixel(mouth.right_corner, w, h)?;
    let upper = landmarks.to_pixel(mouth.upper_lip, w, h)?;
    let lower = landmarks.to_pixel(mouth.lower_lip, w, h)?;
    Ok(mouth_aspect_ratio(left, right, upper, lower))
}

/// mouth_aspect_ratio divides lip opening by mouth width; a zero width divides by 1.
pub fn mouth_aspect_ratio(left: Vector2<f32>, right: Vector2<f32>, upper: Vector2<f32>, lower: Vector2<f32>) -> f32 {
    let width = (left - right).norm();
    let divisor = if width == 0.0 { 1.0 } else { width };
    (upper - lower).norm() / divisor
}
