//! Embedded durable store backed by append-only MessagePack logs.
//!
//! Each collection lives in its own file inside the store directory. Every
//! upsert appends the full record; on open the log is replayed and the last
//! record written for a key wins. `compact` rewrites a log with one record per
//! key.

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Cursor, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Result,
    error::Error,
    identifiers::StateKey,
    ports::{EquivalenceRepository, ValueRepository},
    records::{EquivalenceRecord, ValueRecord},
};

const VALUES_FILE: &str = "values.msgpack";
const EQUIVALENCES_FILE: &str = "equivalences.msgpack";

trait Keyed {
    fn key(&self) -> &StateKey;
}

impl Keyed for ValueRecord {
    fn key(&self) -> &StateKey {
        &self.key
    }
}

impl Keyed for EquivalenceRecord {
    fn key(&self) -> &StateKey {
        &self.key
    }
}

fn unavailable(operation: impl Into<String>, error: impl ToString) -> Error {
    Error::StoreUnavailable {
        operation: operation.into(),
        message: error.to_string(),
    }
}

/// One append-only collection plus its replayed index.
struct Log<R> {
    path: PathBuf,
    writer: BufWriter<File>,
    records: HashMap<StateKey, R>,
}

impl<R: Keyed + Clone + Serialize + DeserializeOwned> Log<R> {
    fn open(path: PathBuf) -> Result<Self> {
        let records = if path.exists() {
            Self::replay(&path)?
        } else {
            HashMap::new()
        };
        let writer = Self::append_writer(&path)?;
        debug!("Opened {path:?} with {} records", records.len());
        Ok(Self {
            path,
            writer,
            records,
        })
    }

    fn append_writer(path: &Path) -> Result<BufWriter<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| unavailable(format!("open {path:?}"), e))?;
        Ok(BufWriter::new(file))
    }

    fn replay(path: &Path) -> Result<HashMap<StateKey, R>> {
        let bytes = fs::read(path).map_err(|e| unavailable(format!("read {path:?}"), e))?;
        let total = bytes.len() as u64;
        let mut cursor = Cursor::new(bytes.as_slice());
        let mut records = HashMap::new();

        while cursor.position() < total {
            let start = cursor.position();
            match rmp_serde::decode::from_read::<_, R>(&mut cursor) {
                Ok(record) => {
                    records.insert(record.key().clone(), record);
                }
                Err(e) => {
                    warn!(
                        "Ignoring unreadable tail of {path:?} at byte {start} of {total}: {e}"
                    );
                    let file = OpenOptions::new()
                        .write(true)
                        .open(path)
                        .map_err(|e| unavailable(format!("open {path:?}"), e))?;
                    file.set_len(start)
                        .map_err(|e| unavailable(format!("truncate {path:?}"), e))?;
                    break;
                }
            }
        }

        Ok(records)
    }

    fn encode(writer: &mut impl Write, record: &R) -> Result<()> {
        rmp_serde::encode::write_named(writer, record).map_err(|e| Error::SerializationContext {
            operation: "serialize record to MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    fn append(&mut self, records: &[R]) -> Result<()> {
        for record in records {
            Self::encode(&mut self.writer, record)?;
        }
        self.writer
            .flush()
            .map_err(|e| unavailable(format!("write {:?}", self.path), e))?;
        for record in records {
            self.records.insert(record.key().clone(), record.clone());
        }
        Ok(())
    }

    fn compact(&mut self) -> Result<usize> {
        let staging = self.path.with_extension("msgpack.compact");
        {
            let file = File::create(&staging)
                .map_err(|e| unavailable(format!("create {staging:?}"), e))?;
            let mut writer = BufWriter::new(file);
            for record in self.records.values() {
                Self::encode(&mut writer, record)?;
            }
            writer
                .flush()
                .map_err(|e| unavailable(format!("write {staging:?}"), e))?;
        }
        fs::rename(&staging, &self.path)
            .map_err(|e| unavailable(format!("replace {:?}", self.path), e))?;
        self.writer = Self::append_writer(&self.path)?;
        Ok(self.records.len())
    }
}

/// Durable store keeping both collections as MessagePack logs in a directory.
///
/// # Examples
///
/// ```no_run
/// use quarto_memory::adapters::MsgPackStore;
/// use quarto_memory::ports::ValueRepository;
///
/// let store = MsgPackStore::open("memory")?;
/// println!("{} states learned", store.keys()?.len());
/// # Ok::<(), quarto_memory::Error>(())
/// ```
pub struct MsgPackStore {
    directory: PathBuf,
    values: Mutex<Log<ValueRecord>>,
    equivalences: Mutex<Log<EquivalenceRecord>>,
}

impl MsgPackStore {
    /// Open (or create) the store rooted at `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the directory or its logs cannot
    /// be created or read.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)
            .map_err(|e| unavailable(format!("create directory {directory:?}"), e))?;

        let values = Log::open(directory.join(VALUES_FILE))?;
        let equivalences = Log::open(directory.join(EQUIVALENCES_FILE))?;
        info!(
            "Opened store at {directory:?}: {} value records, {} equivalences",
            values.records.len(),
            equivalences.records.len()
        );

        Ok(Self {
            directory,
            values: Mutex::new(values),
            equivalences: Mutex::new(equivalences),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Rewrite both logs so each key appears exactly once.
    pub fn compact(&self) -> Result<()> {
        let values = self.values.lock().compact()?;
        let equivalences = self.equivalences.lock().compact()?;
        info!(
            "Compacted store at {:?}: {values} value records, {equivalences} equivalences",
            self.directory
        );
        Ok(())
    }
}

impl ValueRepository for MsgPackStore {
    fn find_by_key(&self, key: &StateKey) -> Result<Option<ValueRecord>> {
        Ok(self.values.lock().records.get(key).cloned())
    }

    fn find_any_by_key(&self, keys: &[StateKey]) -> Result<Option<ValueRecord>> {
        let log = self.values.lock();
        Ok(keys.iter().find_map(|key| log.records.get(key).cloned()))
    }

    fn upsert(&self, record: &ValueRecord) -> Result<()> {
        self.values.lock().append(std::slice::from_ref(record))
    }

    fn bulk_upsert(&self, records: &[ValueRecord]) -> Result<()> {
        self.values.lock().append(records)
    }

    fn keys(&self) -> Result<Vec<StateKey>> {
        Ok(self.values.lock().records.keys().cloned().collect())
    }
}

impl EquivalenceRepository for MsgPackStore {
    fn find_equivalence(&self, key: &StateKey) -> Result<Option<EquivalenceRecord>> {
        Ok(self.equivalences.lock().records.get(key).cloned())
    }

    fn upsert_equivalence(&self, record: &EquivalenceRecord) -> Result<()> {
        self.equivalences
            .lock()
            .append(std::slice::from_ref(record))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        quarto::{Dimensions, Rotation, State, Transform},
        types::Value,
    };

    fn given_state() -> State {
        State::empty(Arc::new(Dimensions::quarto()))
            .with_given(0)
            .unwrap()
    }

    fn neutral_record() -> ValueRecord {
        let state = given_state();
        ValueRecord::new(&state, &state.legal_actions().unwrap())
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut record = neutral_record();
        let action = record.action_values[7].0.clone();

        {
            let store = MsgPackStore::open(temp_dir.path()).unwrap();
            store.upsert(&record).unwrap();
            record.set(&action, Value::new(0.25));
            store.bulk_upsert(std::slice::from_ref(&record)).unwrap();
            store
                .upsert_equivalence(&EquivalenceRecord {
                    key: StateKey::new("x"),
                    representative_key: record.key.clone(),
                    transform: Some(Transform::Rotation(Rotation::new(1, 4))),
                })
                .unwrap();
        }

        let store = MsgPackStore::open(temp_dir.path()).unwrap();
        let loaded = store.find_by_key(&record.key).unwrap().unwrap();
        assert_eq!(loaded.get(&action), Some(Value::new(0.25)));
        assert_eq!(store.keys().unwrap().len(), 1);
        let equivalence = store.find_equivalence(&StateKey::new("x")).unwrap().unwrap();
        assert_eq!(equivalence.representative_key, record.key);
        assert!(equivalence.transform.is_some());
    }

    #[test]
    fn test_truncated_tail_is_ignored() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let record = neutral_record();
        {
            let store = MsgPackStore::open(temp_dir.path()).unwrap();
            store.upsert(&record).unwrap();
        }

        let path = temp_dir.path().join(VALUES_FILE);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x83, 0xa3, b'k']).unwrap();
        drop(file);

        let store = MsgPackStore::open(temp_dir.path()).unwrap();
        assert!(store.find_by_key(&record.key).unwrap().is_some());
        store.upsert(&record).unwrap();
        drop(store);

        let reopened = MsgPackStore::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.keys().unwrap().len(), 1);
    }

    #[test]
    fn test_compact_keeps_latest_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut record = neutral_record();
        let action = record.action_values[0].0.clone();
        let store = MsgPackStore::open(temp_dir.path()).unwrap();
        for step in 1..=5 {
            record.set(&action, Value::new(step as f64 / 10.0));
            store.upsert(&record).unwrap();
        }
        let before = fs::metadata(temp_dir.path().join(VALUES_FILE)).unwrap().len();

        store.compact().unwrap();
        let after = fs::metadata(temp_dir.path().join(VALUES_FILE)).unwrap().len();
        assert!(after < before);
        drop(store);

        let store = MsgPackStore::open(temp_dir.path()).unwrap();
        let loaded = store.find_by_key(&record.key).unwrap().unwrap();
        assert_eq!(loaded.get(&action), Some(Value::new(0.5)));
    }

    #[test]
    fn test_open_under_a_file_is_unavailable() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("blocker");
        File::create(&blocker).unwrap();
        let result = MsgPackStore::open(blocker.join("store"));
        assert!(result.err().is_some_and(|e| e.is_store_unavailable()));
    }
}
