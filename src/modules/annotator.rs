use anyhow::Error;
use nalgebra::Vector2;
use opencv::core::{Mat, MatTraitConst, Point, Scalar};
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8};
use crate::helper::face_geometry::MarkerKind;
use crate::pipeline::frame::MetricSample;
use crate::utils::image::encode_frame;

// BGR
const COL_CENTER: (f64, f64, f64) = (0.0, 0.0, 255.0);
const COL_PERIMETER: (f64, f64, f64) = (255.0, 0.0, 0.0);
const COL_UPPER_LID: (f64, f64, f64) = (0.0, 255.0, 255.0);
const COL_LOWER_LID: (f64, f64, f64) = (255.0, 255.0, 0.0);
const COL_BROW: (f64, f64, f64) = (255.0, 255.0, 255.0);
const COL_ALERT: (f64, f64, f64) = (0.0, 0.0, 255.0);
const COL_NORMAL: (f64, f64, f64) = (0.0, 255.0, 0.0);

const BORDER_INSET: i32 = 5;
const BORDER_THICKNESS: i32 = 3;
const MARKER_RADIUS: i32 = 2;

fn scalar(c: (f64, f64, f64)) -> Scalar {
    Scalar::new(c.0, c.1, c.2, 0.0)
}

pub fn marker_color(kind: MarkerKind) -> Scalar {
    match kind {
        MarkerKind::IrisCenter => scalar(COL_CENTER),
        MarkerKind::IrisPerimeter => scalar(COL_PERIMETER),
        MarkerKind::UpperLid => scalar(COL_UPPER_LID),
        MarkerKind::LowerLid => scalar(COL_LOWER_LID),
        MarkerKind::Brow => scalar(COL_BROW),
    }
}

pub fn border_color(alert: bool) -> Scalar {
    if alert {
        scalar(COL_ALERT)
    } else {
        scalar(COL_NORMAL)
    }
}

/// Draws landmarks, metric text and the alert border, then encodes the frame.
#[derive(Debug, Clone)]
pub struct FrameAnnotator {
    encode_ext: String,
}

impl FrameAnnotator {

    pub fn new(encode_ext: impl Into<String>) -> Self {
        FrameAnnotator {
            encode_ext: encode_ext.into(),
        }
    }

    /// annotate draws onto `frame` in place. `markers` is empty when no face was found.
    ///
    /// # Arguments
    /// * `frame` - BGR frame straight from capture
    /// * `markers` - pixel-space landmark points to highlight
    /// * `metrics` - values printed in the top-left corner
    /// * `alert` - selects the border colour and the ALERT label
    pub fn annotate(&self, frame: &mut Mat, markers: &[(Vector2<f32>, MarkerKind)], metrics: &MetricSample, alert: bool) -> Result<(), Error> {
        for (p, kind) in markers {
            imgproc::circle(
                frame,
                Point::new(p.x as i32, p.y as i32),
                MARKER_RADIUS,
                marker_color(*kind),
                -1,
                LINE_8,
                0,
            )?;
        }

        let lines = [
            (format!("ECR:{:.2}", metrics.ecr), 24, COL_CENTER),
            (format!("BLG:{:.0}", metrics.blg), 46, COL_BROW),
            (format!("MAR:{:.2}", metrics.mar), 68, COL_PERIMETER),
        ];
        for (text, y, color) in lines {
            imgproc::put_text(
                frame,
                &text,
                Point::new(10, y),
                FONT_HERSHEY_SIMPLEX,
                0.6,
                scalar(color),
                2,
                LINE_8,
                false,
            )?;
        }

        let (w, h) = (frame.cols(), frame.rows());
        imgproc::rectangle_points(
            frame,
            Point::new(BORDER_INSET, BORDER_INSET),
            Point::new(w - BORDER_INSET, h - BORDER_INSET),
            border_color(alert),
            BORDER_THICKNESS,
            LINE_8,
            0,
        )?;

        if alert {
            imgproc::put_text(
                frame,
                "ALERT!",
                Point::new(60, 110),
                FONT_HERSHEY_SIMPLEX,
                1.0,
                scalar(COL_ALERT),
                3,
                LINE_8,
                false,
            )?;
        }
        Ok(())
    }

    pub fn encode(&self, frame: &Mat) -> Result<Vec<u8>, Error> {
        encode_frame(frame, &self.encode_ext)
    }
}
