//! CORS header values
//!
//! The relay is a local development tool: any origin may read its responses.

pub const ALLOW_ORIGIN: &str = "*";

/// Methods advertised in preflight responses
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

pub const ALLOW_HEADERS: &str = "Content-Type";
