use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use super::error::{Result, StoreError};
use crate::model::CanonicalState;

const KEY_PREFIX: &str = "resource:";

fn encode_key(name: &str) -> Vec<u8> {
    format!("{}{}", KEY_PREFIX, name).into_bytes()
}

fn decode_key(key: &[u8]) -> Result<String> {
    std::str::from_utf8(key)
        .ok()
        .and_then(|key| key.strip_prefix(KEY_PREFIX))
        .map(String::from)
        .ok_or_else(|| StoreError::InvalidKey(String::from_utf8_lossy(key).into_owned()))
}

/// Fjall-backed store of canonical state
#[derive(Clone)]
pub struct StateStore {
    keyspace: Keyspace,
    resources: PartitionHandle,
}

impl StateStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening state store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let resources = keyspace.open_partition("resources", PartitionCreateOptions::default())?;

        Ok(Self {
            keyspace,
            resources,
        })
    }

    pub fn put(&self, name: &str, state: &CanonicalState) -> Result<()> {
        let value = serde_json::to_vec(state)?;
        self.resources.insert(encode_key(name), value)?;
        debug!(resource = name, app_id = %state.id, "Stored canonical state");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Option<CanonicalState>> {
        match self.resources.get(encode_key(name))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        self.resources.remove(encode_key(name))?;
        debug!(resource = name, "Removed canonical state");
        Ok(())
    }

    /// Every stored resource name, in key order
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for item in self.resources.iter() {
            let (key, _) = item?;
            names.push(decode_key(&key)?);
        }
        Ok(names)
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}
