//! The Merkle folder: combines a directory's already-hashed children into
//! the directory's own digest.

use crate::hash::HashProvider;
use crate::mask::{Mask, ATTR_CTIME, ATTR_GID, ATTR_MTIME, ATTR_SPECIAL, ATTR_UID, ATTR_XATTR};
use crate::metadata;
use crate::node::Node;
use crate::{error::XsumError, node::S_IFMT};

/// Encodes the portion of a [`Node`]'s metadata selected by `mask` into a
/// fixed 52-byte little-endian layout. Fields the mask does not select
/// are left zeroed, never omitted, so that selecting a field always and
/// only changes the corresponding byte range.
///
/// ```text
/// 0..4   mode (type bits always present; permission bits masked)
/// 4..8   uid
/// 8..12  gid
/// 12..20 device id (only for device/char-device nodes)
/// 20..28 mtime seconds
/// 28..36 mtime nanoseconds
/// 36..44 ctime seconds
/// 44..52 ctime nanoseconds
/// ```
///
/// Bytes 52..68 are reserved for a future birth-time field and are never
/// written.
pub fn encode_sys(node: &Node, mask: &Mask) -> [u8; 52] {
    let mut buf = [0u8; 52];

    let type_bits = node.mode & S_IFMT;
    let perm_bits = node.mode & 0o7777;
    let mode_out = type_bits | (perm_bits & mask.mode_bits());
    buf[0..4].copy_from_slice(&mode_out.to_le_bytes());

    if mask.has(ATTR_UID) {
        buf[4..8].copy_from_slice(&node.sys.uid.to_le_bytes());
    }
    if mask.has(ATTR_GID) {
        buf[8..12].copy_from_slice(&node.sys.gid.to_le_bytes());
    }
    if mask.has(ATTR_SPECIAL) && node.is_device() {
        buf[12..20].copy_from_slice(&node.sys.dev.to_le_bytes());
    }
    if mask.has(ATTR_MTIME) {
        buf[20..28].copy_from_slice(&node.sys.mtime_sec.to_le_bytes());
        buf[28..36].copy_from_slice(&node.sys.mtime_nsec.to_le_bytes());
    }
    if mask.has(ATTR_CTIME) {
        buf[36..44].copy_from_slice(&node.sys.ctime_sec.to_le_bytes());
        buf[44..52].copy_from_slice(&node.sys.ctime_nsec.to_le_bytes());
    }

    buf
}

/// Folds a directory's children into the directory's digest.
///
/// Each child contributes a block of `name_digest || child.digest ||
/// meta_digest || xattr_digest`; blocks are sorted lexicographically
/// before being combined so the result does not depend on `readdir`
/// order.
pub fn fold(
    children: &[Node],
    mask: &Mask,
    hasher: &dyn HashProvider,
) -> Result<Vec<u8>, XsumError> {
    let mut blocks = Vec::with_capacity(children.len());

    for child in children {
        let name = child
            .path
            .file_name()
            .map(|n| n.as_encoded_bytes().to_vec())
            .unwrap_or_default();
        let name_digest = hasher.metadata(&name)?;

        let sys_bytes = encode_sys(child, mask);
        let meta_digest = hasher.metadata(&sys_bytes)?;

        let xattr_digest = if mask.has(ATTR_XATTR) {
            let raw = metadata::read_xattrs(&child.path)?;
            hasher.metadata(&raw)?
        } else {
            Vec::new()
        };

        let mut block = Vec::with_capacity(
            name_digest.len() + child.digest.len() + meta_digest.len() + xattr_digest.len(),
        );
        block.extend_from_slice(&name_digest);
        block.extend_from_slice(&child.digest);
        block.extend_from_slice(&meta_digest);
        block.extend_from_slice(&xattr_digest);
        blocks.push(block);
    }

    blocks.sort_unstable();
    hasher.tree(&blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Provider;
    use crate::metadata::Sys;
    use std::path::PathBuf;

    fn leaf(name: &str, digest: &[u8]) -> Node {
        Node {
            path: PathBuf::from(name),
            digest: digest.to_vec(),
            mode: crate::node::S_IFREG | 0o644,
            sys: Sys::default(),
        }
    }

    #[test]
    fn fold_is_independent_of_input_order() {
        let hasher = Sha256Provider;
        let mask = Mask::parse("0000").unwrap();

        let a = leaf("a.txt", &[1; 32]);
        let b = leaf("b.txt", &[2; 32]);

        let forward = fold(&[a.clone(), b.clone()], &mask, &hasher).unwrap();
        let backward = fold(&[b, a], &mask, &hasher).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn unselected_attrs_are_zeroed_not_omitted() {
        let mask_off = Mask::parse("0000").unwrap();
        let mask_on = Mask::parse("0000u").unwrap();

        let mut node = leaf("f", &[0; 32]);
        node.sys.uid = 1000;

        let off = encode_sys(&node, &mask_off);
        let on = encode_sys(&node, &mask_on);

        assert_eq!(&off[4..8], &[0, 0, 0, 0]);
        assert_eq!(&on[4..8], &1000u32.to_le_bytes());
        // only the uid field differs between the two encodings
        assert_eq!(off[0..4], on[0..4]);
        assert_eq!(off[8..], on[8..]);
    }

    #[test]
    fn empty_directory_hashes_the_empty_block_list() {
        let hasher = Sha256Provider;
        let mask = Mask::parse("0000").unwrap();
        let digest = fold(&[], &mask, &hasher).unwrap();
        let expected = hasher.tree(&[]).unwrap();
        assert_eq!(digest, expected);
    }
}
