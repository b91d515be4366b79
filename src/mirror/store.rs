//! Local write primitives.
//!
//! Downloads stream into a `.part` file beside the target and are renamed into place
//! once complete, so an interrupted transfer never leaves a truncated artifact under the
//! final name.

use crate::error::ApiError;
use crate::remote::LmsApi;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Suffix of in-flight downloads.
pub const PARTIAL_SUFFIX: &str = ".part";

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<(), ApiError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Stream `url` to `path`. Returns the number of bytes written.
pub fn download_to(lms: &dyn LmsApi, url: &str, path: &Path) -> Result<u64, ApiError> {
    ensure_parent(path)?;
    let partial = partial_path(path);

    let result = (|| {
        let mut writer = BufWriter::new(File::create(&partial)?);
        let written = lms.download(url, &mut writer)?;
        writer.flush()?;
        Ok::<u64, ApiError>(written)
    })();

    match result {
        Ok(written) => {
            fs::rename(&partial, path)?;
            Ok(written)
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

/// Write UTF-8 text to `path`, replacing any previous content.
pub fn write_text(path: &Path, content: &str) -> Result<(), ApiError> {
    ensure_parent(path)?;
    let partial = partial_path(path);
    fs::write(&partial, content)?;
    fs::rename(&partial, path)?;
    Ok(())
}
