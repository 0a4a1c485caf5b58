//! Input validation shared by the ledger engines and the HTTP layer.

use validator::ValidationError;

use crate::error::AppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Trim comment text and enforce non-blank and maximum length.
pub fn normalize_comment_text(text: &str, max_length: usize) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Comment text must not be blank".to_string(),
        ));
    }
    let length = trimmed.chars().count();
    if length > max_length {
        return Err(AppError::Validation(format!(
            "Comment text is {} characters, maximum is {}",
            length, max_length
        )));
    }
    Ok(trimmed.to_string())
}

/// `validator` hook for request fields that must contain a non-whitespace character.
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must contain non-whitespace characters".into());
        return Err(error);
    }
    Ok(())
}

/// Sanitize an uploaded filename: strip directories, replace unsafe characters.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::Validation(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_is_rejected() {
        assert!(matches!(
            normalize_comment_text("   \n\t", 100),
            Err(AppError::Validation(_))
        ));
        assert!(normalize_comment_text("", 100).is_err());
    }

    #[test]
    fn comment_is_trimmed_and_length_checked() {
        assert_eq!(normalize_comment_text("  hi  ", 10).unwrap(), "hi");
        assert!(normalize_comment_text("abcdef", 5).is_err());
        // length is counted in characters, not bytes
        assert!(normalize_comment_text("ééééé", 5).is_ok());
    }

    #[test]
    fn sanitize_filename_rejects_path_traversal() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("foo/../bar..png").is_err());
    }

    #[test]
    fn sanitize_filename_accepts_valid_names() {
        assert_eq!(sanitize_filename("image.png").unwrap(), "image.png");
        assert_eq!(sanitize_filename("dir/my photo.jpg").unwrap(), "my_photo.jpg");
        assert_eq!(sanitize_filename("???").unwrap(), "file");
    }
}
