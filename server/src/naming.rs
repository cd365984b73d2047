//! Identifier generation and the stored file naming scheme
//!
//! Blobs are stored as `<data_key>__<sanitized name>`. Files written before
//! the delimiter convention existed are named `<data_key>.json`; both forms
//! must stay readable.

use std::path::Path;

/// Separates the identifier from the display name in a stored file name
pub const DELIMITER: &str = "__";

/// Display name used when the client does not supply one
pub const DEFAULT_NAME: &str = "replay.json";

/// Extension used by the legacy `<data_key>.json` naming
pub const LEGACY_EXTENSION: &str = "json";

/// Content type reported for every stored blob
pub const CONTENT_TYPE: &str = "application/json";

/// Number of random bytes behind an identifier (32 hex characters)
const DATA_KEY_BYTES: usize = 16;

/// Data key type
pub type DataKey = String;

/// Generate a fresh 128-bit random identifier, hex encoded
pub fn generate_data_key() -> DataKey {
    let bytes: [u8; DATA_KEY_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Replace every path separator so the name cannot leave the storage directory
pub fn sanitize_name(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => name.replace(['/', '\\'], "_"),
        _ => DEFAULT_NAME.to_string(),
    }
}

/// Compose the stored file name for a new upload
pub fn compose_file_name(data_key: &str, sanitized_name: &str) -> String {
    format!("{}{}{}", data_key, DELIMITER, sanitized_name)
}

/// Stored file name used by the legacy naming scheme
pub fn legacy_file_name(data_key: &str) -> String {
    format!("{}.{}", data_key, LEGACY_EXTENSION)
}

/// Prefix shared by every delimiter-named file of a data key
pub fn file_name_prefix(data_key: &str) -> String {
    format!("{}{}", data_key, DELIMITER)
}

/// Recover `(file_id, name)` from a stored file name.
///
/// With the delimiter present the name is split on its first occurrence.
/// Without it the whole entry is the display name and the identifier is the
/// entry minus its last extension.
pub fn parse_file_name(file_name: &str) -> (String, String) {
    if let Some((file_id, name)) = file_name.split_once(DELIMITER) {
        return (file_id.to_string(), name.to_string());
    }

    let file_id = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
        .to_string();
    (file_id, file_name.to_string())
}

/// Whether a caller-supplied key can name a file inside the storage directory
pub fn is_valid_data_key(data_key: &str) -> bool {
    !data_key.is_empty()
        && data_key != "."
        && data_key != ".."
        && !data_key.contains(['/', '\\'])
}
