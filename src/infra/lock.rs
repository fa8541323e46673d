//! Per-project run lock
//!
//! Advisory exclusive lock on a file under the user cache directory, keyed by
//! the project root. Released when the guard drops.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use super::hash_content;
use crate::error::{TestGenieError, TestGenieResult};

#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Default lock directory: `<cache>/testgenie/locks`
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("testgenie")
            .join("locks")
    }

    pub fn acquire(project_root: &Path) -> TestGenieResult<Self> {
        Self::acquire_in(&Self::default_dir(), project_root)
    }

    /// Fails with a precondition error while another run holds the root
    pub fn acquire_in(lock_dir: &Path, project_root: &Path) -> TestGenieResult<Self> {
        std::fs::create_dir_all(lock_dir)?;

        let canonical = project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.to_path_buf());
        let key = hash_content(&canonical.to_string_lossy());
        let path = lock_dir.join(format!("{}.lock", key));

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        if !try_lock_exclusive(&file) {
            return Err(TestGenieError::Precondition(format!(
                "A generation run is already in progress for {}",
                project_root.display()
            )));
        }

        tracing::debug!("Acquired run lock {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        unlock(&self.file);
        tracing::debug!("Released run lock {}", self.path.display());
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> bool {
    true
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_file_outside_project() {
        let locks = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let lock = RunLock::acquire_in(locks.path(), project.path()).unwrap();
        assert!(lock.path().starts_with(locks.path()));
        assert_eq!(std::fs::read_dir(project.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_second_run_rejected_until_release() {
        let locks = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let first = RunLock::acquire_in(locks.path(), project.path()).unwrap();
        let err = RunLock::acquire_in(locks.path(), project.path()).unwrap_err();
        assert!(matches!(err, TestGenieError::Precondition(_)));

        drop(first);
        assert!(RunLock::acquire_in(locks.path(), project.path()).is_ok());
    }

    #[test]
    fn test_distinct_roots_do_not_contend() {
        let locks = TempDir::new().unwrap();
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        let _first = RunLock::acquire_in(locks.path(), a.path()).unwrap();
        assert!(RunLock::acquire_in(locks.path(), b.path()).is_ok());
    }

    #[test]
    fn test_lock_name_derives_from_canonical_root() {
        let locks = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let canonical = project.path().canonicalize().unwrap();

        let lock = RunLock::acquire_in(locks.path(), project.path()).unwrap();
        let expected = format!("{}.lock", hash_content(&canonical.to_string_lossy()));
        assert_eq!(lock.path(), locks.path().join(expected));
    }
}
