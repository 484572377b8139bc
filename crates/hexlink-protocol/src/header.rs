/// Extension header: the file extension as ASCII, right-padded with spaces
/// to a fixed width. The peer uses it to name the received file.

use std::path::Path;

use crate::error::TransferError;
use crate::protocol::{EXTENSION_LEN, EXTENSION_PAD};

/// Encode an extension into the standard `EXTENSION_LEN`-byte header.
pub fn encode_extension(extension: &str) -> Result<[u8; EXTENSION_LEN], TransferError> {
    check_fits(extension, EXTENSION_LEN)?;
    let mut header = [EXTENSION_PAD; EXTENSION_LEN];
    header[..extension.len()].copy_from_slice(extension.as_bytes());
    Ok(header)
}

/// Encode an extension into a header of `width` bytes.
///
/// The extension must be ASCII and strictly shorter than `width`; anything
/// else is rejected instead of truncated.
pub fn encode_extension_with_width(extension: &str, width: usize) -> Result<Vec<u8>, TransferError> {
    check_fits(extension, width)?;
    let mut header = Vec::with_capacity(width);
    header.extend_from_slice(extension.as_bytes());
    header.resize(width, EXTENSION_PAD);
    Ok(header)
}

fn check_fits(extension: &str, width: usize) -> Result<(), TransferError> {
    if !extension.is_ascii() {
        return Err(TransferError::malformed(extension, "extension is not ASCII"));
    }
    if extension.len() >= width {
        return Err(TransferError::malformed(
            extension,
            "extension does not fit the header width",
        ));
    }
    Ok(())
}

/// Extension of the file at `path`: the text after the last dot of its name.
/// A name ending in a dot has no extension.
pub fn extension_from_path(path: &Path) -> Result<String, TransferError> {
    let missing = || TransferError::malformed(&path.display().to_string(), "path has no extension");
    let extension = path
        .extension()
        .filter(|ext| !ext.is_empty())
        .ok_or_else(missing)?;
    extension
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| TransferError::malformed(&path.display().to_string(), "extension is not UTF-8"))
}
