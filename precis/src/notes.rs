//! Scratch notes, kept in a small JSON key-value file in the data directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::config::project_dirs;

pub const NOTES_KEY: &str = "scratch_notes_v1";

#[derive(Debug, Clone)]
pub struct NotesStore {
    path: PathBuf,
}

impl NotesStore {
    /// Store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = project_dirs().ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(Self::at(dirs.data_dir().join("notes.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn get(&self) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(NOTES_KEY))
    }

    pub fn set(&self, notes: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(NOTES_KEY.to_string(), notes.to_string());
        self.write_all(&entries)
    }

    pub fn remove(&self) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(NOTES_KEY).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
