//! Startup verification of the storage root, bucket directories and temp area

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::config::{StoreConfig, TEMP_DIR};
use crate::error::StoreError;

const PROBE_FILE: &str = ".stencil-rw-probe";

/// Verified, canonical directory layout
///
/// Built once by [`StorageLayout::verify`]; every path in here is a resolved
/// real path inside `root`.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    buckets: BTreeMap<String, PathBuf>,
    temp: PathBuf,
}

impl StorageLayout {
    /// Check the root, create missing bucket and temp directories, and probe
    /// read/write access. Any failure is fatal for startup.
    pub fn verify(config: &StoreConfig) -> Result<Self, StoreError> {
        let root = verify_root(&config.root)?;

        let mut buckets = BTreeMap::new();
        for (key, subdirectory) in &config.buckets {
            if key == TEMP_DIR || key.is_empty() || key.contains(['/', '\\']) {
                return Err(StoreError::Validation(format!(
                    "invalid bucket key: {}",
                    key
                )));
            }
            if subdirectory.starts_with(TEMP_DIR) {
                return Err(StoreError::Validation(format!(
                    "bucket {} cannot use the temp directory",
                    key
                )));
            }
            let dir = verify_subdirectory(&root, subdirectory)?;
            probe_read_write(&dir)?;
            tracing::debug!(bucket = %key, path = %dir.display(), "Bucket directory verified");
            buckets.insert(key.clone(), dir);
        }

        let temp = verify_subdirectory(&root, Path::new(TEMP_DIR))?;
        probe_read_write(&temp)?;

        Ok(Self {
            root,
            buckets,
            temp,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket(&self, key: &str) -> Option<&Path> {
        self.buckets.get(key).map(PathBuf::as_path)
    }

    pub fn bucket_keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn temp(&self) -> &Path {
        &self.temp
    }
}

fn verify_root(root: &Path) -> Result<PathBuf, StoreError> {
    let metadata = fs::symlink_metadata(root).map_err(|e| {
        StoreError::Integrity(format!(
            "storage root {} is not accessible: {}",
            root.display(),
            e
        ))
    })?;

    if metadata.file_type().is_symlink() {
        return Err(StoreError::Integrity(format!(
            "storage root {} is a symbolic link",
            root.display()
        )));
    }
    if !metadata.is_dir() {
        return Err(StoreError::Integrity(format!(
            "storage root {} is not a directory",
            root.display()
        )));
    }

    Ok(fs::canonicalize(root)?)
}

/// Walk `relative` segment by segment below `root`, creating what is missing.
/// No segment may be a symlink or a non-directory.
fn verify_subdirectory(root: &Path, relative: &Path) -> Result<PathBuf, StoreError> {
    if relative.as_os_str().is_empty() {
        return Err(StoreError::Validation(
            "bucket subdirectory must not be empty".to_string(),
        ));
    }

    let mut current = root.to_path_buf();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return Err(StoreError::Validation(format!(
                "bucket subdirectory must be a plain relative path: {}",
                relative.display()
            )));
        };
        current.push(segment);

        match fs::symlink_metadata(&current) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                return Err(StoreError::Integrity(format!(
                    "{} is a symbolic link",
                    current.display()
                )));
            }
            Ok(metadata) if !metadata.is_dir() => {
                return Err(StoreError::Integrity(format!(
                    "{} is not a directory",
                    current.display()
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                create_dir(&current)?;
                tracing::info!(path = %current.display(), "Created storage directory");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let resolved = fs::canonicalize(&current)?;
    if !resolved.starts_with(root) {
        return Err(StoreError::Integrity(format!(
            "{} resolves outside the storage root",
            current.display()
        )));
    }

    Ok(resolved)
}

#[cfg(unix)]
fn create_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().mode(0o755).create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> std::io::Result<()> {
    fs::DirBuilder::new().create(path)
}

fn probe_read_write(dir: &Path) -> Result<(), StoreError> {
    fs::read_dir(dir)?;
    let probe = dir.join(PROBE_FILE);
    fs::write(&probe, b"")?;
    fs::remove_file(&probe)?;
    Ok(())
}
