//! Platform metadata extraction.
//!
//! Unix-specific fields (uid, gid, device id, mtime, ctime) are read via
//! [`std::os::unix::fs::MetadataExt`]; on other platforms they are zeroed,
//! matching the contract that unselected or unavailable attributes are
//! zeroed, never omitted.

use std::fs;
use std::path::Path;

use crate::error::XsumError;

/// Metadata fields that fold into a directory entry's digest when
/// selected by the active [`crate::mask::Mask`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sys {
    pub uid: u32,
    pub gid: u32,
    pub dev: u64,
    pub mtime_sec: u64,
    pub mtime_nsec: u64,
    pub ctime_sec: u64,
    pub ctime_nsec: u64,
}

impl Sys {
    #[cfg(unix)]
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Sys {
            uid: meta.uid(),
            gid: meta.gid(),
            dev: meta.rdev(),
            mtime_sec: meta.mtime().max(0) as u64,
            mtime_nsec: meta.mtime_nsec().max(0) as u64,
            ctime_sec: meta.ctime().max(0) as u64,
            ctime_nsec: meta.ctime_nsec().max(0) as u64,
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_meta: &fs::Metadata) -> Self {
        Sys::default()
    }
}

/// Returns a canonical byte encoding of a path's extended attributes:
/// each attribute's name is sorted, then encoded as
/// `name || \0 || len(value) as u32 LE || value`, concatenated in that
/// order. Sorting makes the encoding independent of the filesystem's
/// xattr enumeration order, the same determinism rationale as the
/// Merkle block sort.
#[cfg(unix)]
pub fn read_xattrs(path: &Path) -> Result<Vec<u8>, XsumError> {
    let mut names: Vec<std::ffi::OsString> =
        xattr::list(path).map_err(XsumError::XattrFailed)?.collect();
    names.sort();

    let mut out = Vec::new();
    for name in names {
        let value = xattr::get(path, &name)
            .map_err(XsumError::XattrFailed)?
            .unwrap_or_default();
        out.extend_from_slice(name.as_encoded_bytes());
        out.push(0);
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(&value);
    }
    Ok(out)
}

#[cfg(not(unix))]
pub fn read_xattrs(_path: &Path) -> Result<Vec<u8>, XsumError> {
    Ok(Vec::new())
}
