use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("failed to decode image: {0}")]
    Malformed(#[from] image::ImageError),
}

/// Decodes uploaded bytes into a pixel buffer, reporting the detected source
/// encoding. Detection goes by content, not by the uploaded filename.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|_| DecodeError::UnknownFormat)?;
    let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
    let image = reader.decode()?;
    Ok((image, format))
}
