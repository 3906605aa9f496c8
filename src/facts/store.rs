//! JSON file store for the fact archive

use super::models::Archive;
use crate::error::{FactError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info, warn};

/// What to do when the archive file exists but cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptPolicy {
    /// Start from an empty archive; the old content is replaced on next save
    #[default]
    Reset,
    /// Refuse to continue with an `ArchiveRead` error
    Fail,
}

/// Archive store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Location of the JSON archive
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Handling of unparseable archive files
    #[serde(default)]
    pub on_corrupt: CorruptPolicy,

    /// Write through a temp file and rename instead of truncating in place
    #[serde(default = "default_atomic_write")]
    pub atomic_write: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("fact_archive.json")
}

fn default_atomic_write() -> bool {
    true
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            on_corrupt: CorruptPolicy::default(),
            atomic_write: default_atomic_write(),
        }
    }
}

impl ArchiveConfig {
    /// Config for an archive at `path` with default policies
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Loads and persists the archive file
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    config: ArchiveConfig,
}

impl ArchiveStore {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Read the whole archive.
    ///
    /// A missing or empty file yields an empty archive. Unreadable or
    /// malformed content follows the configured [`CorruptPolicy`].
    pub fn load(&self) -> Result<Archive> {
        let path = self.path();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Archive {} not found, starting empty", path.display());
                return Ok(Archive::new());
            }
            Err(e) => return self.recover(e.to_string()),
        };

        if contents.trim().is_empty() {
            debug!("Archive {} is empty", path.display());
            return Ok(Archive::new());
        }

        match serde_json::from_str::<Archive>(&contents) {
            Ok(archive) => {
                debug!("Loaded {} facts from {}", archive.len(), path.display());
                Ok(archive)
            }
            Err(e) => self.recover(e.to_string()),
        }
    }

    fn recover(&self, reason: String) -> Result<Archive> {
        match self.config.on_corrupt {
            CorruptPolicy::Reset => {
                warn!(
                    "Archive {} is unreadable ({}), starting with an empty archive",
                    self.path().display(),
                    reason
                );
                Ok(Archive::new())
            }
            CorruptPolicy::Fail => Err(FactError::ArchiveRead {
                path: self.config.path.clone(),
                reason,
            }),
        }
    }

    /// Replace the archive file with the full contents of `archive`
    pub fn save(&self, archive: &Archive) -> Result<()> {
        let path = self.path();
        let bytes = encode(archive)?;

        if let Some(parent) = parent_dir(path) {
            fs::create_dir_all(parent).map_err(|e| FactError::write(path, e))?;
        }

        if self.config.atomic_write {
            self.write_atomic(&bytes)?;
        } else {
            fs::write(path, &bytes).map_err(|e| FactError::write(path, e))?;
        }

        info!("Saved {} facts to {}", archive.len(), path.display());
        Ok(())
    }

    /// Temp file in the target directory, renamed over the archive once
    /// synced. An existing archive keeps its permissions.
    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path();
        let dir = parent_dir(path).unwrap_or_else(|| Path::new("."));

        let mut temp = temp_file_in(dir).map_err(|e| FactError::write(path, e))?;
        match fs::metadata(path) {
            Ok(existing) => temp
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| FactError::write(path, e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(FactError::write(path, e)),
        }

        temp.write_all(bytes).map_err(|e| FactError::write(path, e))?;
        temp.as_file().sync_all().map_err(|e| FactError::write(path, e))?;
        temp.persist(path).map_err(|e| FactError::write(path, e.error))?;

        Ok(())
    }
}

/// New temp files get the same umask-derived mode `fs::write` would use
/// instead of tempfile's owner-only default.
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Pretty JSON with four-space indentation
fn encode(archive: &Archive) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    archive.serialize(&mut serializer)?;
    Ok(buf)
}
