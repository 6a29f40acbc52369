use crate::api::error::AppError;
use crate::config::AppConfig;
use std::path::Path;
use uuid::Uuid;

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), AppError> {
    if size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "Image size {} bytes exceeds maximum allowed {} bytes ({} MB)",
            size,
            max_size,
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Extracts the lowercase extension of a client-supplied filename, looking
/// only at the final path component.
pub fn image_extension(filename: &str) -> Option<String> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    // Hidden files like ".png" have no extension
    if name.starts_with('.') {
        return None;
    }

    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Checks if file content appears to be executable
pub fn is_executable_content(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }

    // ELF binary (Linux)
    if header.starts_with(&[0x7F, 0x45, 0x4C, 0x46]) {
        return true;
    }

    // PE/COFF (Windows .exe, .dll)
    if header.starts_with(&[0x4D, 0x5A]) {
        return true;
    }

    // Shebang (shell scripts)
    if header.starts_with(b"#!") {
        return true;
    }

    false
}

/// Full validation pipeline for an uploaded animal image.
/// Returns the normalized extension to store the file under.
pub fn validate_image_upload(
    filename: &str,
    data: &[u8],
    config: &AppConfig,
) -> Result<String, AppError> {
    // 1. Size check
    validate_file_size(data.len(), config.max_file_size)?;

    // 2. Extension allowlist
    let ext = image_extension(filename).ok_or_else(|| {
        AppError::UnsupportedMediaType(format!("File '{}' has no image extension", filename))
    })?;
    if !config.is_allowed_extension(&ext) {
        return Err(AppError::UnsupportedMediaType(format!(
            "File extension '.{}' is not allowed. Allowed: {}",
            ext,
            config.allowed_image_extensions.join(", ")
        )));
    }

    // 3. Content sniffing
    if data.is_empty() {
        return Err(AppError::Validation("Image file appears to be empty".to_string()));
    }
    if is_executable_content(data) || !infer::is_image(data) {
        return Err(AppError::UnsupportedMediaType(
            "Uploaded file content is not a recognized image".to_string(),
        ));
    }

    Ok(ext)
}

/// Generates a collision-free name for a stored image.
pub fn generate_image_filename(ext: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), ext)
}

/// A stored image reference must be a bare file name inside the upload store.
pub fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(2048, 2048).is_ok());
        assert!(matches!(
            validate_file_size(2049, 2048),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("rex.PNG").as_deref(), Some("png"));
        assert_eq!(image_extension("../../etc/cat.jpg").as_deref(), Some("jpg"));
        assert_eq!(image_extension("noext"), None);
        assert_eq!(image_extension(".png"), None);
        assert_eq!(image_extension("a.p;g"), None);
    }

    #[test]
    fn test_validate_image_upload() {
        let config = AppConfig::default();
        assert_eq!(
            validate_image_upload("rex.png", PNG_HEADER, &config).unwrap(),
            "png"
        );
        assert!(matches!(
            validate_image_upload("virus.exe", PNG_HEADER, &config),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_image_upload("fake.png", b"hello world, not an image", &config),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_image_upload("elf.png", &[0x7F, 0x45, 0x4C, 0x46, 0x02], &config),
            Err(AppError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_generated_names_are_unique_and_safe() {
        let a = generate_image_filename("png");
        let b = generate_image_filename("png");
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        assert!(is_safe_stored_name(&a));
    }

    #[test]
    fn test_is_safe_stored_name() {
        assert!(is_safe_stored_name("sample_image_0.jpg"));
        assert!(!is_safe_stored_name("../shelter.db"));
        assert!(!is_safe_stored_name("sub/dir.png"));
        assert!(!is_safe_stored_name(""));
        assert!(!is_safe_stored_name(".env"));
    }
}
