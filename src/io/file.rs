//! File-backed lines for development machines and tests.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HardwareError;

use super::{InputLine, OutputLine};

/// Input that reads `true` while a marker file exists.
#[derive(Debug, Clone)]
pub struct MarkerFileInput {
    path: PathBuf,
}

impl MarkerFileInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default marker for a sampler: `/tmp/firestation_gw_<name>_active`.
    pub fn default_for(name: &str) -> Self {
        Self::new(std::env::temp_dir().join(format!(
            "firestation_gw_{}_active",
            name.to_lowercase()
        )))
    }

    /// Marker shared by `genius` samplers: `/tmp/genius_active.tmp`.
    pub fn genius() -> Self {
        Self::new(std::env::temp_dir().join("genius_active.tmp"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InputLine for MarkerFileInput {
    fn read(&mut self) -> Result<bool, HardwareError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(HardwareError::Read {
                line: self.path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Output that writes `1` or `0` into a file.
#[derive(Debug)]
pub struct FileOutput {
    path: PathBuf,
}

impl FileOutput {
    /// Opens the output and writes the initial level.
    pub fn create(path: impl Into<PathBuf>, initial: bool) -> Result<Self, HardwareError> {
        let path = path.into();
        let mut out = Self { path };
        out.write(initial).map_err(|e| HardwareError::Open {
            line: out.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(out)
    }
}

impl OutputLine for FileOutput {
    fn write(&mut self, value: bool) -> Result<(), HardwareError> {
        let level = if value { "1\n" } else { "0\n" };
        fs::write(&self.path, level).map_err(|e| HardwareError::Write {
            line: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
