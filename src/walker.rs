//! The node hasher: stats a path, dispatches on its kind, and recursively
//! fans out over directory entries.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crate::directory::fold;
use crate::error::{WalkError, XsumError};
use crate::gate::Gate;
use crate::hash::HashProvider;
use crate::mask::Mask;
use crate::metadata::Sys;
use crate::node::{mode_from_metadata, Node};

/// Hashes `path`.
///
/// `subdir` distinguishes a path reached by recursing into a parent
/// directory from a path given directly on the command line: top-level
/// symlinks are followed and hashed as their target's content; symlinks
/// encountered as directory entries are hashed as their raw target bytes.
pub fn walk(
    path: &Path,
    subdir: bool,
    gate: &Gate,
    mask: &Mask,
    hasher: &dyn HashProvider,
) -> Result<Node, WalkError> {
    log::debug!("walk: path={} subdir={subdir}", path.display());

    let permit = gate.acquire();
    let meta = fs::symlink_metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WalkError::new(path, XsumError::PathMissing)
        } else {
            WalkError::new(path, XsumError::StatFailed(e))
        }
    })?;
    let file_type = meta.file_type();
    let sys = Sys::from_metadata(&meta);
    let mode = mode_from_metadata(&meta, file_type);

    let node = if file_type.is_dir() {
        let child_paths = list_dir(path)?;
        let released = permit.release();

        let results: Vec<Result<Node, WalkError>> = thread::scope(|scope| {
            let handles: Vec<_> = child_paths
                .iter()
                .map(|child_path| scope.spawn(move || walk(child_path, true, gate, mask, hasher)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("walker thread panicked"))
                .collect()
        });

        let mut children = Vec::with_capacity(results.len());
        let mut first_err = None;
        for result in results {
            match result {
                Ok(child) => children.push(child),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_err {
            // A subdirectory's failure is already path-qualified and bubbles
            // through unchanged; a top-level directory prefixes it with its
            // own path so the emitted line names where the run was invoked.
            return Err(if subdir {
                e
            } else {
                WalkError::new(path, XsumError::Nested(Box::new(e)))
            });
        }

        let _permit = released.reacquire();
        let digest =
            fold(&children, mask, hasher).map_err(|e| WalkError::new(path, e))?;

        Node {
            path: path.to_path_buf(),
            digest,
            mode,
            sys,
        }
    } else if file_type.is_symlink() && subdir {
        let target = fs::read_link(path).map_err(|e| WalkError::new(path, XsumError::ReadLinkFailed(e)))?;
        let digest = hasher
            .metadata(target.as_os_str().as_encoded_bytes())
            .map_err(|e| WalkError::new(path, e))?;

        Node {
            path: path.to_path_buf(),
            digest,
            mode,
            sys,
        }
    } else if file_type.is_file() || file_type.is_symlink() {
        // regular file, or a top-level symlink followed for its content
        let digest = hasher
            .data_file(path)
            .map_err(|e| WalkError::new(path, e))?;

        Node {
            path: path.to_path_buf(),
            digest,
            mode,
            sys,
        }
    } else {
        return Err(WalkError::new(path, XsumError::SpecialFile));
    };

    log::debug!(
        "walk: done path={} digest={}",
        path.display(),
        hex::encode(&node.digest[..node.digest.len().min(8)])
    );

    Ok(node)
}

fn list_dir(path: &Path) -> Result<Vec<PathBuf>, WalkError> {
    let entries = fs::read_dir(path).map_err(|e| WalkError::new(path, XsumError::ReadDirFailed(e)))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WalkError::new(path, XsumError::ReadDirFailed(e)))?;
        paths.push(entry.path());
    }
    Ok(paths)
}
