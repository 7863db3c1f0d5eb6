//! MIME type detection module
//!
//! The relay only distinguishes the file types a browser demo page loads;
//! everything else is served as UTF-8 text.

/// Get Content-Type based on the file name suffix
pub fn get_content_type(file_name: &str) -> &'static str {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext);
    match extension {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        _ => "text/plain; charset=utf-8",
    }
}
