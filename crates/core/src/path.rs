//! Remote path rules
//!
//! Derives the remote target path of an upload from a local file name and
//! the configured prefix, and encodes upload arguments for an HTTP header.

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::traits::{UploadDescriptor, WriteMode};

/// Default remote folder for uploads
pub const DEFAULT_UPLOAD_PREFIX: &str = "/downloads";

/// Extract the base name of a local file
pub fn file_name_of(local_path: &Path) -> Result<String> {
    let name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidPath(format!(
            "'{}' does not name a file",
            local_path.display()
        )));
    }

    Ok(name)
}

/// Join a remote folder prefix and a file name
///
/// The prefix is normalized to a leading slash and no trailing slash.
/// An empty prefix or "/" places the file at the root.
pub fn remote_path(prefix: &str, file_name: &str) -> Result<String> {
    if file_name.is_empty() || file_name.contains('/') {
        return Err(Error::InvalidPath(format!(
            "'{file_name}' is not a valid remote file name"
        )));
    }

    let folder = prefix.trim().trim_matches('/');
    if folder.is_empty() {
        Ok(format!("/{file_name}"))
    } else {
        Ok(format!("/{folder}/{file_name}"))
    }
}

impl UploadDescriptor {
    /// Upload policy used for published media: never overwrite, never rename,
    /// notify as usual
    pub fn add_only(prefix: &str, local_path: &Path) -> Result<Self> {
        let name = file_name_of(local_path)?;
        Ok(Self {
            path: remote_path(prefix, &name)?,
            mode: WriteMode::Add,
            autorename: false,
            mute: false,
        })
    }
}

/// Serialize a value to JSON that is safe to send in an HTTP header
///
/// Every character outside printable ASCII is written as a `\uXXXX` escape,
/// using a surrogate pair above U+FFFF.
pub fn header_safe_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];

    for c in json.chars() {
        if c.is_ascii() && c != '\u{7f}' {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }

    Ok(out)
}
