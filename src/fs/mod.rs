//! Filesystem abstraction used by the configuration manager.
//!
//! Everything the manager does to storage goes through [`FileSystem`], so the
//! persistence protocol can run against the real OS ([`OsFileSystem`]) or a
//! fully in-memory tree ([`MemoryFileSystem`]) in tests.

mod memory;
mod os;

use std::io;
use std::path::{Path, PathBuf};

pub use memory::{FsOp, MemoryFileSystem};
pub use os::OsFileSystem;

/// Owner read/write only.
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Owner read/write/search only.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Result of [`FileSystem::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub is_dir: bool,
    pub len: u64,
    /// Unix permission bits. Platforms without them report `0o644` for files.
    pub mode: u32,
}

impl FileInfo {
    /// Regular file with at least one execute bit set.
    pub fn is_executable(&self) -> bool {
        !self.is_dir && self.mode & 0o111 != 0
    }
}

/// Storage operations needed by the configuration manager.
///
/// Implementations report failures as [`io::Error`] with the same kinds the
/// OS would produce (`NotFound` for missing files or parents, and so on).
pub trait FileSystem {
    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate a file and write `contents` to it.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Create a directory and all missing parents with the given mode.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create a new, empty, uniquely named file inside `dir` and return its path.
    fn create_temp(&self, dir: &Path, prefix: &str) -> io::Result<PathBuf>;

    /// Move `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Set unix permission bits. A no-op where the platform has none.
    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Query a file or directory.
    fn stat(&self, path: &Path) -> io::Result<FileInfo>;

    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }
}
