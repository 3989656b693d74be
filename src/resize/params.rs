use thiserror::Error;

pub const DEFAULT_QUALITY: u8 = 95;
pub const DEFAULT_DPI: u32 = 300;
/// Upper bound on a single requested dimension, to keep one request from
/// allocating an absurd pixel buffer.
pub const MAX_DIMENSION: i64 = 20_000;
/// JFIF stores density as a 16-bit integer, so anything above this cannot be
/// embedded faithfully.
pub const MAX_DPI: i64 = u16::MAX as i64;

/// Validated resize parameters shared by every file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub dpi: u32,
    pub preserve_aspect: bool,
}

/// Form fields as they arrived in the multipart body, before validation.
#[derive(Debug, Default)]
pub struct RawParams {
    pub width: Option<String>,
    pub height: Option<String>,
    pub quality: Option<String>,
    pub dpi: Option<String>,
    pub preserve_aspect: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be an integer, got `{value}`")]
    NotAnInteger { field: &'static str, value: String },
    #[error("width and height must be positive, got {width}x{height}")]
    NonPositiveDimensions { width: i64, height: i64 },
    #[error("width and height must not exceed {MAX_DIMENSION}, got {width}x{height}")]
    DimensionsTooLarge { width: i64, height: i64 },
    #[error("quality must be between 1 and 100, got {0}")]
    QualityOutOfRange(i64),
    #[error("dpi must be between 1 and {MAX_DPI}, got {0}")]
    DpiOutOfRange(i64),
}

impl RawParams {
    /// Checks every numeric field before any file is touched. Identical
    /// inputs always fail on the same check, in field order.
    pub fn validate(&self) -> Result<ResizeParams, ParamsError> {
        let width = parse_required("width", self.width.as_deref())?;
        let height = parse_required("height", self.height.as_deref())?;
        let quality = parse_with_default("quality", self.quality.as_deref(), DEFAULT_QUALITY as i64)?;
        let dpi = parse_with_default("dpi", self.dpi.as_deref(), DEFAULT_DPI as i64)?;

        if width <= 0 || height <= 0 {
            return Err(ParamsError::NonPositiveDimensions { width, height });
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ParamsError::DimensionsTooLarge { width, height });
        }
        if !(1..=100).contains(&quality) {
            return Err(ParamsError::QualityOutOfRange(quality));
        }
        if !(1..=MAX_DPI).contains(&dpi) {
            return Err(ParamsError::DpiOutOfRange(dpi));
        }

        Ok(ResizeParams {
            width: width as u32,
            height: height as u32,
            quality: quality as u8,
            dpi: dpi as u32,
            preserve_aspect: self.preserve_aspect,
        })
    }
}

fn parse_required(field: &'static str, value: Option<&str>) -> Result<i64, ParamsError> {
    let value = value.ok_or(ParamsError::MissingField(field))?;
    value
        .trim()
        .parse()
        .map_err(|_| ParamsError::NotAnInteger {
            field,
            value: value.to_string(),
        })
}

fn parse_with_default(
    field: &'static str,
    value: Option<&str>,
    default: i64,
) -> Result<i64, ParamsError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ParamsError::NotAnInteger {
                field,
                value: value.to_string(),
            }),
        None => Ok(default),
    }
}
