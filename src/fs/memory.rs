use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{FileInfo, FileSystem, PRIVATE_FILE_MODE};

const DEFAULT_FILE_MODE: u32 = 0o644;

/// Operations that can be made to fail on purpose with [`MemoryFileSystem::fail_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    Read,
    Write,
    CreateDir,
    CreateTemp,
    Rename,
    SetPermissions,
    Remove,
}

#[derive(Debug, Clone)]
struct MemFile {
    data: Vec<u8>,
    mode: u32,
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<PathBuf, MemFile>,
    dirs: HashMap<PathBuf, u32>,
    failures: HashSet<(FsOp, Option<PathBuf>)>,
}

/// [`FileSystem`] kept entirely in memory.
///
/// Clones share the same tree, so a test can hand one clone to the manager
/// and inspect the other. Not meant to be shared across threads; every test
/// builds its own.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Rc<RefCell<State>>,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_on(&self, op: FsOp) {
        self.state.borrow_mut().failures.insert((op, None));
    }

    /// Like [`fail_on`](Self::fail_on), but only for calls on `path`.
    pub fn fail_on_path(&self, op: FsOp, path: impl Into<PathBuf>) {
        self.state
            .borrow_mut()
            .failures
            .insert((op, Some(path.into())));
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    /// Create a file with execute bits, along with its parent directories.
    pub fn add_executable(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.borrow_mut();
        if let Some(parent) = path.parent() {
            insert_ancestors(&mut state, parent, 0o755);
        }
        state.files.insert(
            path.to_path_buf(),
            MemFile {
                data: Vec::new(),
                mode: 0o755,
            },
        );
    }

    /// Every file path currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.state.borrow().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn check(&self, op: FsOp, path: &Path) -> io::Result<()> {
        let state = self.state.borrow();
        let injected = state
            .failures
            .iter()
            .any(|(o, p)| *o == op && p.as_deref().map_or(true, |p| p == path));
        if injected {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected failure: {op:?}"),
            ));
        }
        Ok(())
    }
}

fn is_root(path: &Path) -> bool {
    path.parent().is_none() || path.as_os_str().is_empty()
}

fn dir_exists(state: &State, path: &Path) -> bool {
    is_root(path) || state.dirs.contains_key(path)
}

fn parent_exists(state: &State, path: &Path) -> bool {
    match path.parent() {
        Some(parent) => dir_exists(state, parent),
        None => true,
    }
}

fn insert_ancestors(state: &mut State, path: &Path, mode: u32) {
    for ancestor in path.ancestors() {
        if is_root(ancestor) {
            break;
        }
        state.dirs.entry(ancestor.to_path_buf()).or_insert(mode);
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.check(FsOp::Read, path)?;
        let state = self.state.borrow();
        state
            .files
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check(FsOp::Write, path)?;
        let mut state = self.state.borrow_mut();
        if !parent_exists(&state, path) {
            return Err(not_found(path));
        }
        if state.dirs.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            ));
        }
        let entry = state.files.entry(path.to_path_buf()).or_insert(MemFile {
            data: Vec::new(),
            mode: DEFAULT_FILE_MODE,
        });
        entry.data = contents.to_vec();
        Ok(())
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        self.check(FsOp::CreateDir, path)?;
        let mut state = self.state.borrow_mut();
        if let Some(file) = path.ancestors().find(|a| state.files.contains_key(*a)) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("not a directory: {}", file.display()),
            ));
        }
        insert_ancestors(&mut state, path, mode);
        Ok(())
    }

    fn create_temp(&self, dir: &Path, prefix: &str) -> io::Result<PathBuf> {
        self.check(FsOp::CreateTemp, dir)?;
        let mut state = self.state.borrow_mut();
        if !dir_exists(&state, dir) {
            return Err(not_found(dir));
        }
        let path = dir.join(format!("{prefix}{}.tmp", uuid::Uuid::new_v4().simple()));
        state.files.insert(
            path.clone(),
            MemFile {
                data: Vec::new(),
                mode: PRIVATE_FILE_MODE,
            },
        );
        Ok(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(FsOp::Rename, from)?;
        let mut state = self.state.borrow_mut();
        if !parent_exists(&state, to) || !state.files.contains_key(from) {
            return Err(not_found(from));
        }
        if state.dirs.contains_key(to) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", to.display()),
            ));
        }
        if let Some(file) = state.files.remove(from) {
            state.files.insert(to.to_path_buf(), file);
        }
        Ok(())
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()> {
        self.check(FsOp::SetPermissions, path)?;
        let mut state = self.state.borrow_mut();
        if let Some(file) = state.files.get_mut(path) {
            file.mode = mode;
            return Ok(());
        }
        if let Some(dir_mode) = state.dirs.get_mut(path) {
            *dir_mode = mode;
            return Ok(());
        }
        Err(not_found(path))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.check(FsOp::Remove, path)?;
        self.state
            .borrow_mut()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let state = self.state.borrow();
        if let Some(file) = state.files.get(path) {
            return Ok(FileInfo {
                is_dir: false,
                len: file.data.len() as u64,
                mode: file.mode,
            });
        }
        if let Some(mode) = state.dirs.get(path) {
            return Ok(FileInfo {
                is_dir: true,
                len: 0,
                mode: *mode,
            });
        }
        if is_root(path) {
            return Ok(FileInfo {
                is_dir: true,
                len: 0,
                mode: 0o755,
            });
        }
        Err(not_found(path))
    }
}
