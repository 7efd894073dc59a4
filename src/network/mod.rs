//! Network layer - authenticated request execution
//!
//! The client owns the session and turns request descriptors into HTTP calls.

pub mod client;
pub mod descriptor;
pub mod hooks;
pub(crate) mod session;

pub use client::ApiClient;
pub use descriptor::RequestDescriptor;
pub use hooks::{AuthErrorListener, TokenRefreshListener};
