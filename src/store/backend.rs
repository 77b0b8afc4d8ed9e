use crate::errors::{AppError, AppResult};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::NamedTempFile;

/// Where a record store keeps its single document.
pub trait StorageBackend {
    /// Human-readable location, used in logs and corrupt-store errors.
    fn location(&self) -> PathBuf;

    /// Returns the whole document, or `None` when it has never been written.
    fn read(&self) -> AppResult<Option<Vec<u8>>>;

    /// Replaces the whole document. Readers never observe a partial write.
    fn write(&self, bytes: &[u8]) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StorageBackend for JsonFileBackend {
    fn location(&self) -> PathBuf {
        self.path.clone()
    }

    fn read(&self) -> AppResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AppError::Io(format!(
                "failed to read {}: {}",
                self.path.display(),
                error
            ))),
        }
    }

    fn write(&self, bytes: &[u8]) -> AppResult<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|error| AppError::Io(error.to_string()))?;

        // Sibling temp file so the final rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(dir).map_err(|error| AppError::Io(error.to_string()))?;
        staged
            .write_all(bytes)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|error| AppError::Io(error.to_string()))?;
        staged.persist(&self.path).map_err(|error| {
            AppError::Io(format!(
                "failed to replace {}: {}",
                self.path.display(),
                error.error
            ))
        })?;
        Ok(())
    }
}

/// In-process document for tests. Clones share the same document, so a test
/// can keep a handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    document: Rc<RefCell<Option<Vec<u8>>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        let backend = Self::default();
        backend.document.replace(Some(bytes.into()));
        backend
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.document.borrow().clone()
    }

    /// Makes every subsequent write fail with an I/O error until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl StorageBackend for MemoryBackend {
    fn location(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }

    fn read(&self) -> AppResult<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> AppResult<()> {
        if self.fail_writes.get() {
            return Err(AppError::Io("simulated write failure".to_string()));
        }
        self.document.replace(Some(bytes.to_vec()));
        Ok(())
    }
}
