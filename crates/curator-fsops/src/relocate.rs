//! Destination path resolution for relocated files.

use std::path::{Path, PathBuf};

use crate::error::{FsOpsError, FsOpsResult};

/// Compute where `file` lands beneath `destination`.
///
/// Files under `base` keep their path relative to `base`. Files outside it land
/// in a directory named after their parent.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] when `file` has no file name.
pub fn destination_for(file: &Path, base: &Path, destination: &Path) -> FsOpsResult<PathBuf> {
    let file_name = file.file_name().ok_or_else(|| FsOpsError::InvalidInput {
        field: "file",
        reason: "missing_file_name",
        value: Some(file.display().to_string()),
    })?;

    if let Ok(relative) = file.strip_prefix(base)
        && !relative.as_os_str().is_empty()
    {
        return Ok(destination.join(relative));
    }

    let target = match file.parent().and_then(Path::file_name) {
        Some(parent) => destination.join(parent).join(file_name),
        None => destination.join(file_name),
    };
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_layout_relative_to_base() -> FsOpsResult<()> {
        let target = destination_for(
            Path::new("/lib/incoming/Show/S01/ep1.mkv"),
            Path::new("/lib/incoming"),
            Path::new("/lib/uhd"),
        )?;
        assert_eq!(target, PathBuf::from("/lib/uhd/Show/S01/ep1.mkv"));
        Ok(())
    }

    #[test]
    fn files_outside_base_use_parent_name() -> FsOpsResult<()> {
        let target = destination_for(
            Path::new("/elsewhere/Movie/movie.mp4"),
            Path::new("/lib/incoming"),
            Path::new("/lib/uhd"),
        )?;
        assert_eq!(target, PathBuf::from("/lib/uhd/Movie/movie.mp4"));
        Ok(())
    }

    #[test]
    fn rejects_paths_without_file_name() {
        let err = destination_for(Path::new("/"), Path::new("/lib"), Path::new("/out"));
        assert!(matches!(
            err,
            Err(FsOpsError::InvalidInput {
                reason: "missing_file_name",
                ..
            })
        ));
    }
}
