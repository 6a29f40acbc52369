use std::env;

/// Application configuration for the shelter backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (default: "sqlite://shelter.db?mode=rwc")
    pub database_url: String,

    /// Directory holding uploaded animal images (default: "static/uploads")
    pub upload_dir: String,

    /// Maximum image size in bytes (default: 16 MB)
    pub max_file_size: usize,

    /// Lowercase image extensions accepted on upload
    pub allowed_image_extensions: Vec<String>,

    /// Secret used to sign session tokens
    pub jwt_secret: String,

    /// Session lifetime in hours (default: 24)
    pub session_ttl_hours: i64,

    /// Animals shown per listing page (default: 9)
    pub page_size: u64,

    /// Mark session cookies `Secure` (default: false)
    pub secure_cookies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://shelter.db?mode=rwc".to_string(),
            upload_dir: "static/uploads".to_string(),
            max_file_size: 16 * 1024 * 1024, // 16 MB
            allowed_image_extensions: default_extensions(),
            jwt_secret: "secret".to_string(),
            session_ttl_hours: 24,
            page_size: 9,
            secure_cookies: false,
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            upload_dir: env::var("UPLOAD_DIR").unwrap_or(default.upload_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_image_extensions: env::var("ALLOWED_IMAGE_EXTENSIONS")
                .ok()
                .map(|v| parse_extensions(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or(default.allowed_image_extensions),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // Fallback for dev convenience, strictly enforced in production method

            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(default.session_ttl_hours),

            page_size: env::var("PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &u64| *n > 0)
                .unwrap_or(default.page_size),

            secure_cookies: env::var("SECURE_COOKIES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.secure_cookies),
        }
    }

    /// Create config for development (local sqlite file, relaxed cookies)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite://shelter-dev.db?mode=rwc".to_string(),
            jwt_secret: "secret".to_string(),
            secure_cookies: false,
            ..Self::default()
        }
    }

    /// Create config for production (secret required, secure cookies)
    pub fn production() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            secure_cookies: true,
            ..Self::from_env()
        }
    }

    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.allowed_image_extensions.iter().any(|allowed| *allowed == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.page_size, 9);
        assert_eq!(config.upload_dir, "static/uploads");
        assert_eq!(config.session_ttl_hours, 24);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert!(!config.secure_cookies);
        assert!(config.database_url.starts_with("sqlite://"));
    }

    #[test]
    fn test_production_config() {
        unsafe { env::set_var("JWT_SECRET", "test_secret") };
        let config = AppConfig::production();
        unsafe { env::remove_var("JWT_SECRET") };
        assert!(config.secure_cookies);
        assert_eq!(config.jwt_secret, "test_secret");
    }

    #[test]
    fn test_extension_list_parsing() {
        assert_eq!(parse_extensions(" PNG, .jpg,,webp "), vec!["png", "jpg", "webp"]);
        let config = AppConfig::default();
        assert!(config.is_allowed_extension("JPEG"));
        assert!(!config.is_allowed_extension("exe"));
    }
}
