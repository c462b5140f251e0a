use anyhow::Error;
use opencv::core::{Mat, Vector};
use opencv::imgcodecs::{imdecode, imencode, IMREAD_COLOR};

/// 1x1 black PNG shown where no camera is available.
pub const PLACEHOLDER_PNG: &[u8] = &[
    137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 1, 0, 0, 0, 1, 8, 4,
    0, 0, 0, 181, 28, 12, 2, 0, 0, 0, 11, 73, 68, 65, 84, 120, 218, 99, 252, 255, 31, 0, 3, 3, 1,
    0, 86, 105, 234, 45, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
];

/// encode_frame compresses the frame with the codec selected by `ext` (".jpg", ".png").
///
/// # Arguments
/// * `frame` - OpenCV matrix
/// * `ext` - file extension understood by `imencode`
///
/// # Returns
/// * `Result<Vec<u8>, Error>`
pub fn encode_frame(frame: &Mat, ext: &str) -> Result<Vec<u8>, Error> {
    let mut buf: Vector<u8> = Vector::new();
    let ok = imencode(ext, frame, &mut buf, &Vector::new())?;
    if !ok {
        return Err(Error::msg(format!("imencode rejected frame for {ext}")));
    }
    Ok(buf.to_vec())
}

/// convert_bytes_to_mat decodes an encoded image back into a BGR matrix.
pub fn convert_bytes_to_mat(im_bytes: &[u8]) -> Result<Mat, Error> {
    let img_as_mat = Mat::from_slice(im_bytes)?;
    let decoded = imdecode(&img_as_mat, IMREAD_COLOR)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use opencv::core::{Mat, MatTraitConst, Scalar, CV_8UC3};
    use crate::utils::image::{convert_bytes_to_mat, encode_frame, PLACEHOLDER_PNG};

    #[test]
    fn test_encode_frame_round_trips_dimensions() {
        let frame = Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::all(40.0)).unwrap();
        let bytes = encode_frame(&frame, ".jpg").unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = convert_bytes_to_mat(&bytes).unwrap();
        assert_eq!(decoded.rows(), 48);
        assert_eq!(decoded.cols(), 64);
    }

    #[test]
    fn test_encode_frame_fails_on_empty_mat() {
        assert!(encode_frame(&Mat::default(), ".jpg").is_err());
    }

    #[test]
    fn test_placeholder_png_decodes() {
        let decoded = convert_bytes_to_mat(PLACEHOLDER_PNG).unwrap();
        assert_eq!(decoded.rows(), 1);
        assert_eq!(decoded.cols(), 1);
    }
}
