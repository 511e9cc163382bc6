use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::core::error::{MailError, Result};

const DEFAULT_MIME: &str = "application/octet-stream";

/// Known extensions, lowercase, and the MIME type they map to.
const EXTENSIONS: &[(&[&str], &str)] = &[
    (&["txt"], "text/plain"),
    (&["html", "htm"], "text/html"),
    (&["css"], "text/css"),
    (&["csv"], "text/csv"),
    (&["png"], "image/png"),
    (&["jpg", "jpeg"], "image/jpeg"),
    (&["gif"], "image/gif"),
    (&["webp"], "image/webp"),
    (&["svg"], "image/svg+xml"),
    (&["pdf"], "application/pdf"),
    (&["json"], "application/json"),
    (&["xml"], "application/xml"),
    (&["zip"], "application/zip"),
    (&["gz", "gzip"], "application/gzip"),
    (&["tar"], "application/x-tar"),
    (&["doc"], "application/msword"),
    (&["docx"], "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    (&["xls"], "application/vnd.ms-excel"),
    (&["xlsx"], "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    (&["odt"], "application/vnd.oasis.opendocument.text"),
    (&["ods"], "application/vnd.oasis.opendocument.spreadsheet"),
    (&["mp3"], "audio/mpeg"),
    (&["mp4"], "video/mp4"),
    (&["webm"], "video/webm"),
];

/// MIME type for a file name, `application/octet-stream` when unknown.
pub fn mime_from_ext(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_MIME;
    };
    EXTENSIONS
        .iter()
        .find(|(exts, _)| exts.iter().any(|x| x.eq_ignore_ascii_case(ext)))
        .map_or(DEFAULT_MIME, |&(_, mime)| mime)
}

/// Encode raw bytes as a `data:<mime>;base64,<payload>` URI.
///
/// An empty MIME type is written as `application/octet-stream`.
pub fn encode_data_uri(mime_type: &str, data: &[u8]) -> String {
    let mime_type = if mime_type.trim().is_empty() {
        DEFAULT_MIME
    } else {
        mime_type
    };
    format!("data:{mime_type};base64,{}", BASE64.encode(data))
}

/// Split a base64 data URI into its MIME type and decoded bytes.
///
/// Anything that is not a complete base64 data URI is rejected, including
/// percent-encoded (non-base64) data URIs.
pub fn decode_data_uri(content: &str) -> Result<(String, Vec<u8>)> {
    let rest = content
        .strip_prefix("data:")
        .ok_or_else(|| MailError::Encoding("content is not a data URI".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MailError::Encoding("data URI has no payload separator".into()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| MailError::Encoding("data URI is not base64 encoded".into()))?;
    let data = BASE64
        .decode(payload)
        .map_err(|e| MailError::Encoding(format!("invalid base64 payload: {e}")))?;
    Ok((mime_type.to_string(), data))
}
