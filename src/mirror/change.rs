//! Change detection for mirrored artifacts.
//!
//! Byte length is the only signal: an existing local file of the same length as the
//! remote descriptor is considered unchanged. Same-length edits go unnoticed.

use crate::error::ApiError;
use crate::remote::FileDescriptor;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to do with a local artifact given its remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No local artifact exists.
    Create,
    /// A local artifact exists with a different length; overwrite it.
    Update,
    /// A local artifact exists with the same length.
    Skip,
    /// The remote file is locked; record a sidecar instead of downloading.
    Locked,
}

/// Decides whether a local write is needed.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Compare a remote byte length against the file at `local_path`.
    pub fn compare(remote_len: u64, local_path: &Path) -> Decision {
        match fs::metadata(local_path) {
            Ok(meta) if meta.is_file() => {
                if meta.len() == remote_len {
                    Decision::Skip
                } else {
                    Decision::Update
                }
            }
            _ => Decision::Create,
        }
    }

    /// Decision for a binary file download.
    ///
    /// Locked files never download. Without a declared size the file is always
    /// (re)written.
    pub fn for_file(file: &FileDescriptor, local_path: &Path) -> Decision {
        if file.is_locked() {
            return Decision::Locked;
        }
        match file.size {
            Some(size) => Self::compare(size, local_path),
            None if local_path.is_file() => Decision::Update,
            None => Decision::Create,
        }
    }

    /// Decision for rendered HTML. `rendered` must already have its asset references
    /// rewritten, since rewriting changes the byte count.
    pub fn for_content(rendered: &str, local_path: &Path) -> Decision {
        Self::compare(rendered.len() as u64, local_path)
    }
}

/// Suffix appended to a file name to form its lock sidecar name.
pub const LOCK_SIDECAR_SUFFIX: &str = "-locked.json";

/// Path of the lock sidecar for a file that would live at `file_path`.
pub fn lock_sidecar_path(file_path: &Path) -> PathBuf {
    let mut name = file_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(LOCK_SIDECAR_SUFFIX);
    file_path.with_file_name(name)
}

/// Write the full remote descriptor of a locked file next to where the file would be.
///
/// Returns `false` when an identical sidecar was already recorded by an earlier pass.
pub fn write_lock_sidecar(file: &FileDescriptor, file_path: &Path) -> Result<bool, ApiError> {
    let sidecar = lock_sidecar_path(file_path);
    let content = serde_json::to_string_pretty(&file.raw)?;

    if let Ok(existing) = fs::read_to_string(&sidecar) {
        if existing == content {
            debug!(path = %sidecar.display(), "lock sidecar already recorded");
            return Ok(false);
        }
    }

    if let Some(parent) = sidecar.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&sidecar, content)?;
    Ok(true)
}
