//! Writing merged output files.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{MergerError, Result};

/// Hidden sibling used as the write target before the final rename.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write several files, creating parent directories as needed.
///
/// Every file is staged to a synced temporary sibling before the first rename.
/// If staging fails, the staged temporaries are removed and the destinations
/// are left as they were.
pub fn write_outputs(files: &[(&Path, &str)]) -> Result<()> {
    let mut staged = Vec::with_capacity(files.len());

    for (path, content) in files {
        match stage(path, content) {
            Ok(temp_file) => staged.push((temp_file, *path)),
            Err(e) => {
                for (temp_file, _) in &staged {
                    let _ = fs::remove_file(temp_file);
                }
                return Err(e);
            }
        }
    }

    for ((temp_file, path), (_, content)) in staged.iter().zip(files) {
        let wrap = |source: std::io::Error| MergerError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        // On Windows, rename fails if the destination already exists
        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(path).map_err(wrap)?;
        }

        fs::rename(temp_file, path).map_err(wrap)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote output");
    }

    Ok(())
}

/// Write `content` to the temporary sibling of `path`.
fn stage(path: &Path, content: &str) -> Result<PathBuf> {
    let wrap = |source: std::io::Error| MergerError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }

    let temp_file = temp_path(path);
    let mut file = File::create(&temp_file).map_err(wrap)?;
    file.write_all(content.as_bytes()).map_err(wrap)?;
    file.sync_all().map_err(wrap)?;

    Ok(temp_file)
}
