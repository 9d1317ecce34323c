use crate::error::StoreError;
use crate::ports;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

const HEADER: &str = "zwiftid";
/// Written to a fresh file so the check has someone to follow.
pub const SEED_RIDER: u64 = 399078;

/// Single-column CSV of opted-in rider ids.
#[derive(Debug, Clone)]
pub struct CsvMemberStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvMemberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds a rider at the end of the list, replacing an existing entry.
    pub fn add(&self, rider_id: u64) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().expect("member store lock");
        let mut ids = self.read_or_seed()?;
        ids.retain(|&id| id != rider_id);
        ids.push(rider_id);
        self.write(&ids)?;
        info!(rider_id, "tracking rider");
        Ok(())
    }

    /// Returns whether the rider was tracked.
    pub fn remove(&self, rider_id: u64) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().expect("member store lock");
        let mut ids = self.read_or_seed()?;
        let before = ids.len();
        ids.retain(|&id| id != rider_id);
        if ids.len() == before {
            return Ok(false);
        }
        self.write(&ids)?;
        info!(rider_id, "stopped tracking rider");
        Ok(true)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_or_seed(&self) -> Result<Vec<u64>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => parse_ids(&contents, &self.path),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let seeded = vec![SEED_RIDER];
                self.write(&seeded)?;
                info!(path = %self.path.display(), "created tracked member file");
                Ok(seeded)
            }
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn write(&self, ids: &[u64]) -> Result<(), StoreError> {
        let mut contents = String::from(HEADER);
        contents.push('\n');
        for id in ids {
            contents.push_str(&id.to_string());
            contents.push('\n');
        }
        std::fs::write(&self.path, contents).map_err(|err| self.io_error(err))
    }
}

fn parse_ids(contents: &str, path: &Path) -> Result<Vec<u64>, StoreError> {
    let mut ids = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let value = line.trim().trim_matches('"');
        if value.is_empty() || (index == 0 && value.eq_ignore_ascii_case(HEADER)) {
            continue;
        }
        let id = value.parse().map_err(|_| StoreError::InvalidId {
            path: path.display().to_string(),
            line: index + 1,
            value: value.to_string(),
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

impl ports::TrackedMembers for CsvMemberStore {
    fn load(&self) -> Result<Vec<u64>, StoreError> {
        let _guard = self.write_lock.lock().expect("member store lock");
        self.read_or_seed()
    }
}
