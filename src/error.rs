use std::path::Path;

use thiserror::Error;

/// Errors that can occur while hashing a single filesystem node.
///
/// Variants deliberately carry no path: the path is attached by
/// [`WalkError`], at the point where the failure is first observed. A
/// top-level directory wraps its first failing child in [`Self::Nested`]
/// so the emitted message is prefixed with the top-level path; a
/// subdirectory instead bubbles the child's already-qualified
/// [`WalkError`] through unchanged, so a failure never accumulates more
/// than one extra prefix.
#[derive(Debug, Error)]
pub enum XsumError {
    #[error("does not exist")]
    PathMissing,

    #[error("failed to stat")]
    StatFailed(#[source] std::io::Error),

    #[error("failed to open")]
    OpenFailed(#[source] std::io::Error),

    #[error("failed to read")]
    ReadFailed(#[source] std::io::Error),

    #[error("failed to read link")]
    ReadLinkFailed(#[source] std::io::Error),

    #[error("failed to read directory")]
    ReadDirFailed(#[source] std::io::Error),

    #[error("failed to read extended attributes")]
    XattrFailed(#[source] std::io::Error),

    #[error("hash computation failed: {0}")]
    HashFailed(String),

    #[error("special file (not a regular file, directory, or symlink)")]
    SpecialFile,

    #[error("invalid mask `{0}`")]
    MaskParse(String),

    #[error("invalid check-file entry: {0}")]
    CheckParse(String),

    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error("{0}")]
    Nested(#[source] Box<WalkError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A [`XsumError`] together with the path of the node where it was raised.
///
/// A subdirectory bubbles a failing child's `WalkError` through unchanged
/// (it is already path-qualified); a top-level directory instead wraps it
/// in [`XsumError::Nested`] under its own path, so the final message reads
/// `<top-level path>: <original path>: <error>`.
///
/// `path` is stored pre-rendered (`Path`/`PathBuf` have no `Display` impl)
/// so the error message can interpolate it directly.
#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct WalkError {
    pub path: String,
    #[source]
    pub source: XsumError,
}

impl WalkError {
    pub fn new(path: &Path, source: XsumError) -> Self {
        Self {
            path: path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn nested_error_prefixes_the_top_level_path_once() {
        let child = WalkError::new(Path::new("/top/sub/leaf"), XsumError::SpecialFile);
        let top = WalkError::new(Path::new("/top"), XsumError::Nested(Box::new(child)));

        assert_eq!(
            top.to_string(),
            "/top: /top/sub/leaf: special file (not a regular file, directory, or symlink)"
        );
    }
}
