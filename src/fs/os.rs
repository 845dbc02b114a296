use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{FileInfo, FileSystem};

/// [`FileSystem`] backed by the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
    pub fn new() -> Self {
        OsFileSystem
    }
}

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new().recursive(true).mode(mode).create(path)
        }

        #[cfg(not(unix))]
        {
            let _ = mode;
            fs::create_dir_all(path)
        }
    }

    fn create_temp(&self, dir: &Path, prefix: &str) -> io::Result<PathBuf> {
        let (_file, path) = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".tmp")
            .tempfile_in(dir)?
            .keep()
            .map_err(|e| e.error)?;
        Ok(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        // Only unix guarantees rename(2) atomically replaces an existing target.
        #[cfg(not(unix))]
        if to.exists() {
            fs::remove_file(to)?;
        }

        fs::rename(from, to)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(mode))
        }

        #[cfg(not(unix))]
        {
            let _ = (path, mode);
            Ok(())
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let metadata = fs::metadata(path)?;

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            metadata.permissions().mode() & 0o7777
        };

        #[cfg(not(unix))]
        let mode = if metadata.permissions().readonly() {
            0o444
        } else {
            0o644
        };

        Ok(FileInfo {
            is_dir: metadata.is_dir(),
            len: metadata.len(),
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_temp_is_unique_and_in_dir() {
        let temp = TempDir::new().unwrap();
        let fs = OsFileSystem::new();

        let a = fs.create_temp(temp.path(), ".config-").unwrap();
        let b = fs.create_temp(temp.path(), ".config-").unwrap();

        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(temp.path()));
        assert!(a.exists());
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = OsFileSystem::new()
            .read(&temp.path().join("missing.yaml"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    #[cfg(unix)]
    fn test_set_permissions_and_stat() {
        let temp = TempDir::new().unwrap();
        let fs = OsFileSystem::new();
        let path = temp.path().join("file");

        fs.write(&path, b"data").unwrap();
        fs.set_permissions(&path, 0o600).unwrap();

        let info = fs.stat(&path).unwrap();
        assert_eq!(info.mode, 0o600);
        assert_eq!(info.len, 4);
        assert!(!info.is_executable());
    }

    #[test]
    fn test_rename_replaces_existing_target() {
        let temp = TempDir::new().unwrap();
        let fs = OsFileSystem::new();
        let from = temp.path().join("a");
        let to = temp.path().join("b");

        fs.write(&from, b"new").unwrap();
        fs.write(&to, b"old").unwrap();
        fs.rename(&from, &to).unwrap();

        assert_eq!(fs.read(&to).unwrap(), b"new");
        assert!(!fs.exists(&from));
    }
}
