use anyhow::Error;
use nalgebra::Vector2;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate2D {
    pub x: f32,
    pub y: f32,
}

/// Landmarks of one face as produced by the detector.
///
/// Row `i` of the backing array holds the normalized `(x, y)` position of
/// landmark `i`, both in `[0, 1]` relative to the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Array2<f32>,
}

impl LandmarkSet {

    /// new wraps an `(n, 2)` array of normalized coordinates.
    ///
    /// # Arguments
    /// * `points` - two-dimensional array, one row per landmark
    ///
    /// # Returns
    /// * `Result<LandmarkSet, Error>`
    pub fn new(points: Array2<f32>) -> Result<Self, Error> {
        if points.ncols() != 2 {
            return Err(Error::msg(format!(
                "landmark array must have 2 columns, got {}",
                points.ncols()
            )));
        }
        Ok(LandmarkSet { points })
    }

    pub fn from_coordinates(coords: &[Coordinate2D]) -> Self {
        let mut points = Array2::<f32>::zeros((coords.len(), 2));
        for (mut row, c) in points.axis_iter_mut(Axis(0)).zip(coords) {
            row[0] = c.x;
            row[1] = c.y;
        }
        LandmarkSet { points }
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn get(&self, idx: usize) -> Option<Coordinate2D> {
        if idx >= self.points.nrows() {
            return None;
        }
        Some(Coordinate2D {
            x: self.points[[idx, 0]],
            y: self.points[[idx, 1]],
        })
    }

    /// to_pixel scales landmark `idx` into pixel space of a `width` x `height` frame.
    pub fn to_pixel(&self, idx: usize, width: f32, height: f32) -> Result<Vector2<f32>, Error> {
        let c = self.get(idx).ok_or_else(|| {
            Error::msg(format!("landmark {idx} missing from set of {}", self.len()))
        })?;
        Ok(Vector2::new(c.x * width, c.y * height))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use super::*;

    #[test]
    fn test_new_rejects_wrong_shape() {
        assert!(LandmarkSet::new(Array2::zeros((4, 3))).is_err());
        assert!(LandmarkSet::new(Array2::zeros((4, 2))).is_ok());
    }

    #[test]
    fn test_to_pixel_scales_by_frame() {
        let set = LandmarkSet::new(array![[0.5, 0.25], [1.0, 1.0]]).unwrap();
        let p = set.to_pixel(0, 640.0, 480.0).unwrap();
        assert_eq!(p, Vector2::new(320.0, 120.0));
        assert!(set.to_pixel(2, 640.0, 480.0).is_err());
    }

    #[test]
    fn test_from_coordinates_keeps_order() {
        let set = LandmarkSet::from_coordinates(&[
            Coordinate2D { x: 0.1, y: 0.2 },
            Coordinate2D { x: 0.3, y: 0.4 },
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1), Some(Coordinate2D { x: 0.3, y: 0.4 }));
        assert_eq!(set.get(2), None);
    }
}
