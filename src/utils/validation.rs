use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Webp => "image/webp",
        }
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    fn signature_matches(&self, data: &[u8]) -> bool {
        match self {
            ImageKind::Jpeg => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            ImageKind::Png => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageKind::Webp => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",
        }
    }
}

/// Checks an uploaded poster: declared type (or extension when no type was
/// sent), size limit and magic bytes.
pub fn validate_image(
    file_name: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<ImageKind, ValidationError> {
    let kind = match content_type.filter(|ct| !ct.trim().is_empty()) {
        Some(ct) => ImageKind::from_content_type(ct)
            .ok_or_else(|| image_error("invalid_image_type", "Please upload an image file (JPEG, PNG or WEBP)"))?,
        None => ImageKind::from_file_name(file_name)
            .ok_or_else(|| image_error("invalid_image_type", "Please upload an image file (JPEG, PNG or WEBP)"))?,
    };

    if data.is_empty() {
        return Err(image_error("empty_image", "Image file is empty"));
    }
    if data.len() > MAX_IMAGE_BYTES {
        return Err(image_error("image_too_large", "Image must be less than 5MB"));
    }
    if !kind.signature_matches(data) {
        return Err(image_error("image_content_mismatch", "Image content does not match its type"));
    }
    Ok(kind)
}

pub fn field_errors(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

pub fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn image_error(code: &'static str, message: &'static str) -> ValidationError {
    field_error(code, message)
}
