//! Temporary home directories laid out like a seedbox user's home.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Relative location of the service listing.
pub const SERVICES_AVAILABLE_PATH: &str = "seedbox-compose/includes/config/services-available";

/// Relative location of the frontend static directory.
pub const STATIC_DIR: &str = "projet-riven/riven-frontend/static";

/// Home directory removed when dropped.
#[derive(Debug)]
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    /// Empty home with the frontend static directory created.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary tree cannot be created.
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join(STATIC_DIR))?;
        Ok(Self { dir })
    }

    /// Home that also carries a services listing.
    ///
    /// # Errors
    ///
    /// Returns an error when the listing cannot be written.
    pub fn with_services(listing: &str) -> anyhow::Result<Self> {
        let home = Self::new()?;
        let source = home.path().join(SERVICES_AVAILABLE_PATH);
        if let Some(parent) = source.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(source, listing)?;
        Ok(home)
    }

    /// Root of the home directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the frontend static directory.
    #[must_use]
    pub fn static_file(&self, name: &str) -> PathBuf {
        self.path().join(STATIC_DIR).join(name)
    }

    /// Write raw contents into the frontend static directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write_static(&self, name: &str, contents: &str) -> anyhow::Result<()> {
        fs::write(self.static_file(name), contents)?;
        Ok(())
    }

    /// Parse a JSON file from the frontend static directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing or not JSON.
    pub fn read_static_json(&self, name: &str) -> anyhow::Result<serde_json::Value> {
        let raw = fs::read_to_string(self.static_file(name))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
