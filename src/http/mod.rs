//! HTTP protocol layer module
//!
//! Response builders, CORS header values and MIME detection, decoupled from
//! the proxy and static-file logic that uses them.

pub mod cors;
pub mod mime;
pub mod response;

pub use response::{
    build_404_response, build_500_response, build_501_response, build_file_response,
    build_preflight_response, build_proxy_error_response, build_proxy_response,
};
