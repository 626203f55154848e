//! Save/load for the state that outlives a session.
//!
//! Two formats:
//! - **Prefs**: flat name → scalar pairs (`debt`, `total_money`,
//!   `current_day`), the way a game stores player preferences. Backed by
//!   memory or a JSON file.
//! - **Snapshot**: a versioned bincode blob of the ledger state and the
//!   config it was played under.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopkeep_logic::config::ShopConfig;
use shopkeep_logic::ledger::LedgerState;

/// Version number for snapshot format (increment when format changes)
const SAVE_VERSION: u32 = 1;

pub const DEBT_KEY: &str = "debt";
pub const TOTAL_MONEY_KEY: &str = "total_money";
pub const CURRENT_DAY_KEY: &str = "current_day";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prefs JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot encoding error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

// ── Prefs ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Int(i32),
    Float(f32),
}

impl PrefValue {
    pub fn as_float(self) -> f32 {
        match self {
            PrefValue::Int(v) => v as f32,
            PrefValue::Float(v) => v,
        }
    }

    pub fn as_int(self) -> i32 {
        match self {
            PrefValue::Int(v) => v,
            PrefValue::Float(v) => v as i32,
        }
    }
}

/// Scalar key-value storage.
pub trait PrefsStore {
    fn get(&self, key: &str) -> Option<PrefValue>;
    fn set(&mut self, key: &str, value: PrefValue);

    fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).map(PrefValue::as_float)
    }

    fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).map(PrefValue::as_int)
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.set(key, PrefValue::Float(value));
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.set(key, PrefValue::Int(value));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPrefs {
    values: BTreeMap<String, PrefValue>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PrefsStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: PrefValue) {
        self.values.insert(key.to_string(), value);
    }
}

/// Prefs persisted as a JSON object. Changes stay in memory until `flush`.
#[derive(Debug, Clone)]
pub struct JsonPrefs {
    path: PathBuf,
    values: BTreeMap<String, PrefValue>,
}

impl JsonPrefs {
    /// Open `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn flush(&self) -> Result<(), PersistenceError> {
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrefsStore for JsonPrefs {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: PrefValue) {
        self.values.insert(key.to_string(), value);
    }
}

pub fn write_ledger_prefs(store: &mut dyn PrefsStore, state: &LedgerState) {
    store.set_float(DEBT_KEY, state.debt);
    store.set_float(TOTAL_MONEY_KEY, state.total_money);
    store.set_int(CURRENT_DAY_KEY, state.current_day as i32);
}

/// `None` if the store has never been written (fresh install).
pub fn read_ledger_prefs(store: &dyn PrefsStore) -> Option<LedgerState> {
    let debt = store.get_float(DEBT_KEY)?;
    let total_money = store.get_float(TOTAL_MONEY_KEY).unwrap_or(0.0);
    let current_day = store.get_int(CURRENT_DAY_KEY).unwrap_or(1).max(1) as u32;
    Some(LedgerState {
        debt,
        total_money,
        current_day,
    })
}

// ── Snapshot ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub ledger: LedgerState,
    pub config: ShopConfig,
}

pub fn save_snapshot<W: Write>(
    writer: W,
    ledger: &LedgerState,
    config: &ShopConfig,
) -> Result<(), PersistenceError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        ledger: *ledger,
        config: config.clone(),
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

pub fn load_snapshot<R: Read>(reader: R) -> Result<SaveData, PersistenceError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;
    if save_data.version != SAVE_VERSION {
        return Err(PersistenceError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }
    Ok(save_data)
}
