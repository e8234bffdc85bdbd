//! On-disk library fixtures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary library with an `incoming` base and a `uhd` destination.
///
/// Everything is removed when the fixture is dropped.
#[derive(Debug)]
pub struct LibraryFixture {
    root: TempDir,
    base: PathBuf,
    destination: PathBuf,
}

impl LibraryFixture {
    /// Create the fixture with an empty base directory. The destination is not created.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        let root = tempfile::Builder::new().prefix("curator-").tempdir()?;
        let base = root.path().join("incoming");
        let destination = root.path().join("uhd");
        fs::create_dir_all(&base)?;
        Ok(Self {
            root,
            base,
            destination,
        })
    }

    /// Directory scanned for candidates.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory qualifying files are moved beneath.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Location for a ledger document outside both library roots.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.root.path().join("state").join("ledger.json")
    }

    /// Create a directory beneath the base.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn dir(&self, relative: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.base.join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Write a file beneath the base, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn file(&self, relative: impl AsRef<Path>, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.base.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Destination path a base-relative file is expected to land at.
    #[must_use]
    pub fn moved(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.destination.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_lays_out_library_roots() -> io::Result<()> {
        let fixture = LibraryFixture::new()?;
        assert!(fixture.base().is_dir());
        assert!(!fixture.destination().exists());

        let file = fixture.file("Movie/movie.mkv", b"frames")?;
        assert_eq!(fs::read(&file)?, b"frames");
        assert_eq!(
            fixture.moved("Movie/movie.mkv"),
            fixture.destination().join("Movie/movie.mkv")
        );
        assert!(!fixture.ledger_path().starts_with(fixture.base()));
        Ok(())
    }
}
