use crate::resize::batch::{self, BatchOutput, UploadedImage};
use crate::resize::params::RawParams;
use crate::resize::responses::{ResizeErrorCode, ResizeErrorResponse};
use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};

/// Accepts a multipart form with one or more `files` parts plus the resize
/// parameters, and answers with a single resized file, a zip archive, or a
/// JSON error body.
#[axum::debug_handler]
pub async fn resize_images(mut multipart: Multipart) -> Response {
    let mut files: Vec<UploadedImage> = Vec::new();
    let mut raw_params = RawParams::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    ResizeErrorCode::MalformedBody,
                    Some(error.to_string()),
                    Vec::new(),
                );
            }
        };
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("files") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(error) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            ResizeErrorCode::MalformedBody,
                            Some(error.to_string()),
                            Vec::new(),
                        );
                    }
                };
                // Browsers submit one empty part when no file was picked.
                if filename.is_empty() {
                    continue;
                }
                files.push(UploadedImage {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("width") => raw_params.width = field.text().await.ok(),
            Some("height") => raw_params.height = field.text().await.ok(),
            Some("quality") => raw_params.quality = field.text().await.ok(),
            Some("dpi") => raw_params.dpi = field.text().await.ok(),
            Some("preserve_aspect") => {
                let _ = field.text().await;
                raw_params.preserve_aspect = true;
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    if files.is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ResizeErrorCode::NoFilesProvided,
            Some(String::from("No files selected.")),
            Vec::new(),
        );
    }
    let params = match raw_params.validate() {
        Ok(params) => params,
        Err(error) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                ResizeErrorCode::InvalidParameters,
                Some(error.to_string()),
                Vec::new(),
            );
        }
    };

    let result = batch::process_batch(&files, &params);
    match batch::package(result, &params) {
        Ok(BatchOutput::Single(image)) => download_response(
            &image.filename,
            "application/octet-stream",
            image.bytes,
        ),
        Ok(BatchOutput::Archive { filename, bytes }) => {
            download_response(&filename, "application/zip", bytes)
        }
        Ok(BatchOutput::NothingProcessed { errors }) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ResizeErrorCode::NothingProcessed,
            Some(String::from("No images were successfully processed.")),
            errors,
        ),
        Err(error) => {
            tracing::error!("Failed to package a resize batch: {error}.");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ResizeErrorCode::ArchiveFailed,
                Some(error.to_string()),
                Vec::new(),
            )
        }
    }
}

fn download_response(filename: &str, content_type: &'static str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn error_response(
    status: StatusCode,
    error_code: ResizeErrorCode,
    message: Option<String>,
    file_errors: Vec<String>,
) -> Response {
    (
        status,
        Json(ResizeErrorResponse {
            error: true,
            error_code,
            message,
            file_errors,
        }),
    )
        .into_response()
}
