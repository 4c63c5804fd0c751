pub mod validation;

use std::fs;
use std::path::Path;

use crate::error::{MailboardError, Result};

/// Ensure the parent directory of a path exists, creating it if necessary.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            MailboardError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory at {}: {}", parent.display(), e),
            ))
        })?;
    }
    Ok(())
}

/// Write `content` to `path` through a sibling temp file and rename.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, content).map_err(|e| {
        MailboardError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write {}: {}", tmp.display(), e),
        ))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        MailboardError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to replace {}: {}", path.display(), e),
        ))
    })
}
