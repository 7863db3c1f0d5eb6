//! Request handler module
//!
//! Route table dispatch, the proxy endpoint and static file serving.

pub mod proxy;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
