use crate::clock::ModeDurations;
use crate::models::Database;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn get_base_dir() -> Result<PathBuf> {
        let mut path =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        path.push(".focusdeck");
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn new() -> Result<Self> {
        let path = Self::get_base_dir()?;
        Self::from_path(path.join("db.json"))
    }

    pub fn from_path(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Could not create snapshot directory {}", parent.display())
                })?;
            }
        }
        Ok(Self { path })
    }

    /// Loads the snapshot and re-applies the clock invariants under
    /// `durations`. A missing file yields the seeded starter data.
    pub fn load(&self, durations: ModeDurations) -> Result<Database> {
        let mut db = if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data)
                .with_context(|| format!("Corrupt snapshot at {}", self.path.display()))?
        } else {
            Database::seeded()
        };
        db.clock.restore(durations);
        Ok(db)
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        let data = serde_json::to_string_pretty(db)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!("saved snapshot to {}", self.path.display());
        Ok(())
    }
}
