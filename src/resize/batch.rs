use crate::resize::codec;
use crate::resize::encode::{self, ProcessedImage};
use crate::resize::params::ResizeParams;
use crate::resize::scale;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Extensions accepted for processing, matched verbatim. Mixed-case variants
/// like `jPg` are deliberately not in the set and get rejected.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "PNG", "JPG", "JPEG"];

/// One uploaded file as received from the multipart form.
#[derive(Debug)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-file failure. Recorded against the filename, never fatal to the batch.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("`{0}` has a disallowed extension")]
    DisallowedExtension(String),
    #[error("error processing `{filename}`: {reason}")]
    Processing { filename: String, reason: String },
}

#[derive(Debug, Error)]
#[error("failed to build the zip archive: {0}")]
pub struct ArchiveError(#[from] zip::result::ZipError);

/// Per-file outcomes of one batch, in upload order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub processed: Vec<ProcessedImage>,
    pub errors: Vec<FileError>,
}

/// What the handler sends back: one file, an archive of several, or a
/// distinct nothing-processed signal carrying the per-file errors.
#[derive(Debug)]
pub enum BatchOutput {
    Single(ProcessedImage),
    Archive { filename: String, bytes: Vec<u8> },
    NothingProcessed { errors: Vec<String> },
}

pub fn is_allowed_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| ALLOWED_EXTENSIONS.contains(&extension))
        .unwrap_or(false)
}

/// Keeps only the final path component and filename-safe characters.
pub fn sanitize_filename(filename: &str) -> String {
    let last_component = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    last_component
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Runs decode, resize and encode for every file. Failures are collected and
/// the loop moves on; nothing short-circuits the batch.
pub fn process_batch(files: &[UploadedImage], params: &ResizeParams) -> BatchResult {
    let mut result = BatchResult::default();
    for file in files {
        match process_one(file, params) {
            Ok(image) => result.processed.push(image),
            Err(error) => {
                tracing::warn!(filename = %file.filename, "Skipping uploaded file: {error}.");
                result.errors.push(error);
            }
        }
    }
    result
}

fn process_one(file: &UploadedImage, params: &ResizeParams) -> Result<ProcessedImage, FileError> {
    if !is_allowed_filename(&file.filename) {
        return Err(FileError::DisallowedExtension(file.filename.clone()));
    }
    let filename = sanitize_filename(&file.filename);
    let processing_error = |reason: String| FileError::Processing {
        filename: filename.clone(),
        reason,
    };

    let (image, detected) =
        codec::decode(&file.bytes).map_err(|error| processing_error(error.to_string()))?;
    let resized = scale::resize(&image, params);
    let format = encode::output_format(detected, &filename);
    let basename = filename
        .rsplit_once('.')
        .map(|(basename, _)| basename)
        .unwrap_or(&filename);
    encode::encode(&resized, basename, format, params)
        .map_err(|error| processing_error(error.to_string()))
}

/// Packages the batch outcome. The archive is named after the requested
/// dimensions, while individual entries carry their actual dimensions.
pub fn package(mut result: BatchResult, params: &ResizeParams) -> Result<BatchOutput, ArchiveError> {
    if result.processed.is_empty() {
        return Ok(BatchOutput::NothingProcessed {
            errors: result.errors.iter().map(ToString::to_string).collect(),
        });
    }
    if result.processed.len() == 1 {
        if let Some(image) = result.processed.pop() {
            return Ok(BatchOutput::Single(image));
        }
    }

    let filename = format!("resized_images_{}x{}.zip", params.width, params.height);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for image in &result.processed {
        writer.start_file(image.filename.as_str(), options)?;
        writer.write_all(&image.bytes).map_err(zip::result::ZipError::from)?;
    }
    let bytes = writer.finish()?.into_inner();
    Ok(BatchOutput::Archive { filename, bytes })
}
