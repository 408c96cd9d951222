//! Payload compression for pushes.

use std::io::{self, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::GzEncoder;

/// Largest accepted `json_data` field, in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 100_000_000;

/// Compression marker sent alongside compressed payloads.
pub const GZIP: &str = "GZIP";

/// Gzips `payload` and encodes the result as standard base64.
///
/// # Errors
///
/// Returns the encoder's I/O error.
///
/// # Examples
///
/// ```
/// use oaaclient::client::compress_payload;
///
/// let encoded = compress_payload(br#"{"applications": []}"#)?;
/// assert!(encoded.starts_with("H4sI"));
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn compress_payload(payload: &[u8]) -> io::Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Formats `value` with `,` between groups of three digits, as in
/// `100,000,002`. Used for the byte counts in size logs and errors.
pub(crate) fn with_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut groups: Vec<&str> = digits
        .as_bytes()
        .rchunks(3)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    groups.reverse();
    groups.join(",")
}
