//! Protected data archive.
//!
//! A protected data is a zip archive with one entry per field. The recipient
//! address is the `email` entry.

use std::io::{Read, Seek};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};

/// Archive entry holding the recipient address.
pub const EMAIL_ENTRY: &str = "email";

/// Reads the recipient address from a protected data archive.
///
/// # Errors
///
/// Returns [`Error::MissingEmail`] if the archive has no non-empty `email`
/// entry, or an I/O or archive error if the file cannot be read.
pub fn extract_email(reader: impl Read + Seek) -> Result<String> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entry = match archive.by_name(EMAIL_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(Error::MissingEmail),
        Err(e) => return Err(e.into()),
    };
    let mut email = String::new();
    entry.read_to_string(&mut email)?;
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::MissingEmail);
    }
    Ok(email.to_owned())
}

/// Reads the recipient address from the archive at `path`.
///
/// # Errors
///
/// See [`extract_email`].
pub fn extract_email_from_file(path: &Path) -> Result<String> {
    extract_email(std::fs::File::open(path)?)
}
