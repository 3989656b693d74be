use crate::resize::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

/// The two encodings a processed image can come back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// One successfully resized and re-encoded upload.
#[derive(Debug)]
pub struct ProcessedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to encode image: {0}")]
    Encoding(#[from] image::ImageError),
}

/// Output encoding is sticky to the source and never user-chosen: anything
/// from the JPEG family, or anything whose filename says it is a JPEG, comes
/// back as JPEG; everything else comes back as PNG.
pub fn output_format(detected: ImageFormat, filename: &str) -> OutputFormat {
    let lower = filename.to_lowercase();
    if detected == ImageFormat::Jpeg || lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        OutputFormat::Jpeg
    } else {
        OutputFormat::Png
    }
}

/// Re-serializes a resized pixel buffer, stamping the requested DPI into the
/// container metadata and deriving the output filename from the actual
/// dimensions.
pub fn encode(
    image: &DynamicImage,
    basename: &str,
    format: OutputFormat,
    params: &ResizeParams,
) -> Result<ProcessedImage, EncodeError> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, params.quality);
            // JPEG has no alpha channel.
            image.to_rgb8().write_with_encoder(encoder)?;
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                image::codecs::png::FilterType::Adaptive,
            );
            image.write_with_encoder(encoder)?;
        }
    }

    let bytes = match format {
        OutputFormat::Jpeg => stamp_jfif_density(buf.into_inner(), params.dpi as u16),
        OutputFormat::Png => stamp_phys_chunk(buf.into_inner(), params.dpi),
    };

    let filename = format!(
        "{basename}_{}x{}.{}",
        image.width(),
        image.height(),
        format.extension()
    );
    Ok(ProcessedImage {
        filename,
        bytes,
        width: image.width(),
        height: image.height(),
    })
}

/// Sets the JFIF APP0 density of an encoded JPEG to `dpi` dots per inch,
/// inserting the segment right after SOI if the encoder did not write one.
fn stamp_jfif_density(mut bytes: Vec<u8>, dpi: u16) -> Vec<u8> {
    let [dpi_hi, dpi_lo] = dpi.to_be_bytes();
    let mut offset = 2;
    while offset + 4 <= bytes.len() && bytes[offset] == 0xFF {
        let marker = bytes[offset + 1];
        // Entropy-coded data begins at SOS, no more headers after that.
        if marker == 0xDA {
            break;
        }
        let length = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        if marker == 0xE0 && length >= 16 && bytes[offset + 4..].starts_with(b"JFIF\0") {
            // Segment layout: marker(2) length(2) "JFIF\0"(5) version(2)
            // units(1) x-density(2) y-density(2) thumbnail(2).
            bytes[offset + 11] = 1; // dots per inch
            bytes[offset + 12] = dpi_hi;
            bytes[offset + 13] = dpi_lo;
            bytes[offset + 14] = dpi_hi;
            bytes[offset + 15] = dpi_lo;
            return bytes;
        }
        offset += 2 + length;
    }

    let segment = [
        0xFF, 0xE0, // APP0
        0x00, 0x10, // length: 16
        b'J', b'F', b'I', b'F', 0x00, // identifier
        0x01, 0x02, // version 1.2
        0x01, // density unit: dots per inch
        dpi_hi, dpi_lo, // x density
        dpi_hi, dpi_lo, // y density
        0x00, 0x00, // no thumbnail
    ];
    bytes.splice(2..2, segment);
    bytes
}

/// Inserts a `pHYs` chunk right after `IHDR`, carrying the DPI converted to
/// pixels per meter.
fn stamp_phys_chunk(bytes: Vec<u8>, dpi: u32) -> Vec<u8> {
    // Signature (8) + IHDR length/type (8); IHDR is always the first chunk.
    if bytes.len() < 16 {
        return bytes;
    }
    let ihdr_length =
        u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let insert_at = 8 + 12 + ihdr_length;
    if insert_at > bytes.len() {
        return bytes;
    }

    let ppm = (dpi as f64 / 0.0254).round() as u32;
    let mut chunk = Vec::with_capacity(21);
    chunk.extend_from_slice(&9u32.to_be_bytes());
    chunk.extend_from_slice(b"pHYs");
    chunk.extend_from_slice(&ppm.to_be_bytes());
    chunk.extend_from_slice(&ppm.to_be_bytes());
    chunk.push(1); // unit: meter
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&chunk[4..]);
    chunk.extend_from_slice(&hasher.finalize().to_be_bytes());

    let mut out = bytes;
    out.splice(insert_at..insert_at, chunk);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn params(quality: u8, dpi: u32) -> ResizeParams {
        ResizeParams {
            width: 50,
            height: 50,
            quality,
            dpi,
            preserve_aspect: false,
        }
    }

    fn sample_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 120])
        }))
    }

    #[test]
    fn test_output_format_sticks_to_detected_jpeg() {
        assert_eq!(
            output_format(ImageFormat::Jpeg, "photo.png"),
            OutputFormat::Jpeg
        );
    }

    #[test]
    fn test_output_format_sticks_to_jpeg_filename() {
        assert_eq!(
            output_format(ImageFormat::Png, "photo.JPG"),
            OutputFormat::Jpeg
        );
        assert_eq!(
            output_format(ImageFormat::Png, "photo.jpeg"),
            OutputFormat::Jpeg
        );
    }

    #[test]
    fn test_output_format_defaults_to_png() {
        assert_eq!(
            output_format(ImageFormat::Png, "photo.png"),
            OutputFormat::Png
        );
    }

    #[test]
    fn test_encode_jpeg_magic_and_filename() {
        let processed = encode(&sample_image(30, 20), "photo", OutputFormat::Jpeg, &params(80, 300))
            .unwrap();
        assert_eq!(&processed.bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(processed.filename, "photo_30x20.jpg");
        assert_eq!((processed.width, processed.height), (30, 20));
    }

    #[test]
    fn test_encode_png_magic_and_filename() {
        let processed = encode(&sample_image(30, 20), "photo", OutputFormat::Png, &params(80, 300))
            .unwrap();
        assert_eq!(
            &processed.bytes[0..8],
            &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
        );
        assert_eq!(processed.filename, "photo_30x20.png");
    }

    #[test]
    fn test_rgba_source_flattens_into_jpeg() {
        let image = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            12,
            8,
            image::Rgba([200, 40, 90, 128]),
        ));
        let processed = encode(&image, "overlay", OutputFormat::Jpeg, &params(80, 300)).unwrap();
        assert_eq!(&processed.bytes[0..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&processed.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }

    #[test]
    fn test_jpeg_carries_requested_dpi() {
        let processed = encode(&sample_image(10, 10), "photo", OutputFormat::Jpeg, &params(80, 150))
            .unwrap();
        let jfif_at = processed
            .bytes
            .windows(5)
            .position(|window| window == b"JFIF\0")
            .expect("no JFIF APP0 segment");
        // identifier(5) + version(2), then units and the two densities.
        let units = processed.bytes[jfif_at + 7];
        let x_density =
            u16::from_be_bytes([processed.bytes[jfif_at + 8], processed.bytes[jfif_at + 9]]);
        let y_density =
            u16::from_be_bytes([processed.bytes[jfif_at + 10], processed.bytes[jfif_at + 11]]);
        assert_eq!(units, 1);
        assert_eq!(x_density, 150);
        assert_eq!(y_density, 150);
    }

    #[test]
    fn test_png_carries_phys_chunk() {
        let processed = encode(&sample_image(10, 10), "photo", OutputFormat::Png, &params(80, 300))
            .unwrap();
        let phys_at = processed
            .bytes
            .windows(4)
            .position(|window| window == b"pHYs")
            .expect("no pHYs chunk");
        let ppm = u32::from_be_bytes([
            processed.bytes[phys_at + 4],
            processed.bytes[phys_at + 5],
            processed.bytes[phys_at + 6],
            processed.bytes[phys_at + 7],
        ]);
        assert_eq!(ppm, 11_811); // 300 dpi in pixels per meter
        assert_eq!(processed.bytes[phys_at + 12], 1);
    }

    #[test]
    fn test_stamped_png_still_decodes() {
        let processed = encode(&sample_image(10, 10), "photo", OutputFormat::Png, &params(80, 300))
            .unwrap();
        let decoded = image::load_from_memory(&processed.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[test]
    fn test_stamped_jpeg_still_decodes() {
        let processed = encode(&sample_image(10, 10), "photo", OutputFormat::Jpeg, &params(80, 150))
            .unwrap();
        let decoded = image::load_from_memory(&processed.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }
}
