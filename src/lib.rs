//! # Stash client
//!
//! Authenticated API client for the Stash inventory app.
//!
//! ## Features
//! - Bearer auth with a held access/refresh token pair
//! - Local expiry check before sending (no round trip for a dead token)
//! - One refresh and one retry on 401, shared by concurrent callers
//! - Listeners for token rotation and terminal auth failure
//! - Account operations: login, signup, logout, profile, image upload
//!
//! ## Architecture
//! - Network layer: `ApiClient` owns the session and executes requests
//! - Api layer: domain operations building request descriptors
//! - Storage: optional on-disk session for the binary

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod network;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use models::{AuthResponse, Credentials, HttpMethod, SignupRequest, TokenPair, UploadedImage, User};
pub use network::{ApiClient, RequestDescriptor};
pub use storage::SessionStore;
