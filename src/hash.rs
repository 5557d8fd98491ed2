//! Pluggable hash providers.
//!
//! A [`HashProvider`] exposes three operations the core never needs to
//! distinguish by implementation: hashing a short in-memory byte string
//! (entry names, encoded metadata, xattr blobs), hashing a file's content,
//! and combining a directory's sorted entry blocks into one digest. Native
//! providers run in-process; [`PluginProvider`] shells out to an external
//! executable per call.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use sha2::{Digest, Sha256, Sha512};

use crate::error::XsumError;

pub trait HashProvider: Send + Sync {
    fn name(&self) -> &str;

    fn output_size(&self) -> usize;

    /// Hashes a short in-memory byte string (a name, encoded metadata, or
    /// an xattr blob).
    fn metadata(&self, bytes: &[u8]) -> Result<Vec<u8>, XsumError>;

    /// Hashes a stream of file content.
    fn data(&self, reader: &mut dyn Read) -> Result<Vec<u8>, XsumError>;

    /// Hashes file content read from `path`. The default implementation
    /// opens the file and delegates to [`HashProvider::data`]; providers
    /// with a faster whole-file path (e.g. memory-mapped hashing) may
    /// override it.
    fn data_file(&self, path: &Path) -> Result<Vec<u8>, XsumError> {
        let mut file = std::fs::File::open(path).map_err(XsumError::OpenFailed)?;
        self.data(&mut file)
    }

    /// Combines a directory's sorted entry blocks into the directory's
    /// digest.
    fn tree(&self, blocks: &[Vec<u8>]) -> Result<Vec<u8>, XsumError>;
}

macro_rules! sha2_provider {
    ($name:ident, $digest:ty, $output_size:expr, $label:expr) => {
        pub struct $name;

        impl HashProvider for $name {
            fn name(&self) -> &str {
                $label
            }

            fn output_size(&self) -> usize {
                $output_size
            }

            fn metadata(&self, bytes: &[u8]) -> Result<Vec<u8>, XsumError> {
                let mut hasher = <$digest>::new();
                hasher.update(bytes);
                Ok(hasher.finalize().to_vec())
            }

            fn data(&self, reader: &mut dyn Read) -> Result<Vec<u8>, XsumError> {
                let mut hasher = <$digest>::new();
                let mut buf = [0u8; 64 * 1024];
                loop {
                    let n = reader.read(&mut buf).map_err(XsumError::ReadFailed)?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                Ok(hasher.finalize().to_vec())
            }

            fn tree(&self, blocks: &[Vec<u8>]) -> Result<Vec<u8>, XsumError> {
                let mut hasher = <$digest>::new();
                for block in blocks {
                    hasher.update(block);
                }
                Ok(hasher.finalize().to_vec())
            }
        }
    };
}

sha2_provider!(Sha256Provider, Sha256, 32, "sha256");
sha2_provider!(Sha512Provider, Sha512, 64, "sha512");

pub struct Blake3Provider;

impl HashProvider for Blake3Provider {
    fn name(&self) -> &str {
        "blake3"
    }

    fn output_size(&self) -> usize {
        32
    }

    fn metadata(&self, bytes: &[u8]) -> Result<Vec<u8>, XsumError> {
        Ok(blake3::hash(bytes).as_bytes().to_vec())
    }

    fn data(&self, reader: &mut dyn Read) -> Result<Vec<u8>, XsumError> {
        let mut hasher = blake3::Hasher::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf).map_err(XsumError::ReadFailed)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize().as_bytes().to_vec())
    }

    fn data_file(&self, path: &Path) -> Result<Vec<u8>, XsumError> {
        let mut hasher = blake3::Hasher::new();
        hasher.update_mmap(path).map_err(XsumError::ReadFailed)?;
        Ok(hasher.finalize().as_bytes().to_vec())
    }

    fn tree(&self, blocks: &[Vec<u8>]) -> Result<Vec<u8>, XsumError> {
        let mut hasher = blake3::Hasher::new();
        for block in blocks {
            hasher.update(block);
        }
        Ok(hasher.finalize().as_bytes().to_vec())
    }
}

/// An external hash algorithm, invoked as a subprocess per call.
///
/// The child is told which operation it is performing via the
/// `XSUM_PLUGIN_TYPE` environment variable (`metadata`, `data`, or
/// `tree`). For `tree`, each block is written length-prefixed
/// (`u32` little-endian length, then the block bytes) so the child can
/// recover block boundaries; `metadata` and `data` simply stream their
/// input. The child writes the raw digest bytes to stdout.
pub struct PluginProvider {
    executable: PathBuf,
}

impl PluginProvider {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    fn invoke(&self, plugin_type: &str, input: &[u8]) -> Result<Vec<u8>, XsumError> {
        use std::io::Write;

        let mut child = Command::new(&self.executable)
            .env("XSUM_PLUGIN_TYPE", plugin_type)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| XsumError::HashFailed(format!("failed to launch plugin: {e}")))?;

        child
            .stdin
            .take()
            .expect("piped stdin")
            .write_all(input)
            .map_err(|e| XsumError::HashFailed(format!("failed to write to plugin: {e}")))?;

        let output = child
            .wait_with_output()
            .map_err(|e| XsumError::HashFailed(format!("plugin failed: {e}")))?;

        if !output.status.success() {
            return Err(XsumError::HashFailed(format!(
                "plugin exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(output.stdout)
    }
}

impl HashProvider for PluginProvider {
    fn name(&self) -> &str {
        "plugin"
    }

    fn output_size(&self) -> usize {
        0
    }

    fn metadata(&self, bytes: &[u8]) -> Result<Vec<u8>, XsumError> {
        self.invoke("metadata", bytes)
    }

    fn data(&self, reader: &mut dyn Read) -> Result<Vec<u8>, XsumError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(XsumError::ReadFailed)?;
        self.invoke("data", &buf)
    }

    fn tree(&self, blocks: &[Vec<u8>]) -> Result<Vec<u8>, XsumError> {
        let mut input = Vec::new();
        for block in blocks {
            input.extend_from_slice(&(block.len() as u32).to_le_bytes());
            input.extend_from_slice(block);
        }
        self.invoke("tree", &input)
    }
}

/// Resolves an `--algorithm` name to a provider: one of the built-in
/// native algorithms, or an executable path treated as a plugin.
pub fn resolve(name: &str) -> Result<Box<dyn HashProvider>, XsumError> {
    match name {
        "sha256" => Ok(Box::new(Sha256Provider)),
        "sha512" => Ok(Box::new(Sha512Provider)),
        "blake3" => Ok(Box::new(Blake3Provider)),
        other => {
            let path = Path::new(other);
            if path.is_file() {
                Ok(Box::new(PluginProvider::new(path.to_path_buf())))
            } else {
                Err(XsumError::UnknownAlgorithm(other.to_string()))
            }
        }
    }
}
