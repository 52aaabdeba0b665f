use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::recipe::PackageMeta;

/// Persistent mirror of the installation moment for one package. The
/// recipe is embedded in full so that `revdep --rebuild` and `upgrade`
/// work without access to the original recipe file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPkg {
    pub name: String,
    pub version: String,
    pub files: Vec<String>,
    pub depends: Vec<String>,
    pub recipe: PackageMeta,
}

/// Per-package JSON file database rooted at a single directory.
///
/// Writes are atomic: a temp file is written in the same directory and
/// renamed over the target, so a crash mid-write cannot leave a
/// half-populated record.
pub struct Database {
    dir: PathBuf,
}

impl Database {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Database {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn get(&self, name: &str) -> Result<Option<InstalledPkg>> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let record: InstalledPkg = serde_json::from_str(&data).map_err(Error::Json)?;
        Ok(Some(record))
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Persists `record`, replacing any existing record for the same name.
    pub fn put(&self, record: &InstalledPkg) -> Result<()> {
        let final_path = self.path_for(&record.name);
        let data = serde_json::to_string_pretty(record)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        use std::io::Write;
        tmp.write_all(data.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&final_path)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if path.is_file() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<InstalledPkg>> {
        let mut records = Vec::new();
        if !self.dir.is_dir() {
            return Ok(records);
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<InstalledPkg>(&data) {
                Ok(record) => records.push(record),
                Err(_) => continue,
            }
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}
