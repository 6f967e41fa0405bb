//! Snapshot persistence for the domain store.
//!
//! The whole store state is written as one versioned JSON document after
//! every mutation and read back once at startup.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use frontdesk_core::OrganizationId;

use crate::models::{Activity, Employee, Organization, User, Visitor};

pub const SNAPSHOT_VERSION: u32 = 1;
pub const SNAPSHOT_FILE_NAME: &str = "frontdesk-storage.json";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("could not resolve an application data directory")]
    NoDataDir,
}

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub current_user: Option<User>,
    pub current_organization: Option<OrganizationId>,
    pub organizations: Vec<Organization>,
    pub users: Vec<User>,
    pub visitors: Vec<Visitor>,
    pub employees: Vec<Employee>,
    pub activities: Vec<Activity>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a StoreState,
}

/// Read before the state so a newer layout reports its version instead of
/// a shape mismatch.
#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: StoreState,
}

fn encode(state: &StoreState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: SNAPSHOT_VERSION,
        state,
    })?)
}

fn decode(raw: &str) -> Result<StoreState, SnapshotError> {
    let header: Header = serde_json::from_str(raw)?;
    if header.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion { found: header.version });
    }
    let envelope: Envelope = serde_json::from_str(raw)?;
    Ok(envelope.state)
}

/// Where store snapshots live.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<StoreState>, SnapshotError>;

    fn save(&self, state: &StoreState) -> Result<(), SnapshotError>;

    /// Move an unreadable snapshot out of the way so the next save starts
    /// fresh without destroying it.
    fn set_aside(&self) -> Result<(), SnapshotError>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{data_dir}/frontdesk/frontdesk-storage.json`, or inside `dir` when given.
    pub fn in_data_dir(dir: Option<&Path>) -> Result<Self, SnapshotError> {
        let base = match dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir().ok_or(SnapshotError::NoDataDir)?,
        };
        Ok(Self::new(base.join(SNAPSHOT_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where [`SnapshotStore::set_aside`] moves an unreadable snapshot taken
    /// at `at`.
    pub fn set_aside_path(&self, at: DateTime<Utc>) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| SNAPSHOT_FILE_NAME.to_string());
        self.path
            .with_file_name(format!("{name}.unreadable-{}", at.format("%Y%m%dT%H%M%S")))
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn default_data_dir() -> Option<PathBuf> {
    let base = dirs::data_dir().or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))?;
    Some(base.join("frontdesk"))
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<StoreState>, SnapshotError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        decode(&raw).map(Some)
    }

    fn save(&self, state: &StoreState) -> Result<(), SnapshotError> {
        let encoded = encode(state)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        // Write then rename so a crash never leaves a half-written snapshot.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = ?self.path, "snapshot saved");
        Ok(())
    }

    fn set_aside(&self) -> Result<(), SnapshotError> {
        let target = self.set_aside_path(Utc::now());
        match std::fs::rename(&self.path, &target) {
            Ok(()) => {
                tracing::warn!(from = ?self.path, to = ?target, "unreadable snapshot moved aside");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory snapshot slot. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
    aside: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load raw snapshot text, e.g. to simulate a corrupt file.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
            ..Self::default()
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Text moved out of the slot by the last `set_aside`.
    pub fn set_aside_raw(&self) -> Option<String> {
        self.aside.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<StoreState>, SnapshotError> {
        match self.raw() {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, state: &StoreState) -> Result<(), SnapshotError> {
        let encoded = encode(state)?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        Ok(())
    }

    fn set_aside(&self) -> Result<(), SnapshotError> {
        let raw = self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if raw.is_some() {
            *self.aside.lock().unwrap_or_else(PoisonError::into_inner) = raw;
        }
        Ok(())
    }
}
