//! Multipart image upload extraction

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::http::StatusCode;

use crate::analysis::UploadedImage;
use crate::error::AppError;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image_file";

fn read_failure(reason: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Failed to read uploaded image: {}", reason))
}

/// Body-limit overruns surface as 413 naming the limit; anything else is a 400
fn stream_failure(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(format!(
            "Uploaded image exceeds the {} byte upload limit",
            max_bytes
        ));
    }
    read_failure(err.body_text())
}

/// Pull the `image_file` field out of a multipart body.
///
/// Only readability is checked here; format is left to the vision service.
/// `max_bytes` is the router's body limit, reported back when exceeded.
pub async fn read_image(
    multipart: Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> Result<UploadedImage, AppError> {
    let mut multipart = multipart.map_err(|e| read_failure(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| stream_failure(e, max_bytes))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(String::from)
            .unwrap_or_else(|| {
                mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .to_string()
            });

        let data = field
            .bytes()
            .await
            .map_err(|e| stream_failure(e, max_bytes))?;
        if data.is_empty() {
            return Err(read_failure("file is empty"));
        }

        tracing::debug!(
            filename = %filename,
            content_type = %content_type,
            bytes = data.len(),
            "Received image upload"
        );

        return Ok(UploadedImage {
            filename,
            content_type,
            data,
        });
    }

    Err(read_failure(format!("missing multipart field '{}'", IMAGE_FIELD)))
}
