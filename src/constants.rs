//! Application constants
//!
//! Centralized location for endpoint paths and configuration defaults.

/// Default API base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default per-request transport timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application name
pub const APP_NAME: &str = "Stash";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory under the home directory holding the persisted session
pub const CONFIG_DIR_NAME: &str = ".stash";

// Endpoints
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const ME_PATH: &str = "/api/auth/me";
pub const IMAGE_UPLOAD_PATH: &str = "/api/images/upload";
