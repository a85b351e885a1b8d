use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;

use posgate_session::{SessionError, SessionRecord, SessionResult, SessionStore};

/// Session record persisted as a JSON document on disk.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash never leaves a half-written record.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> anyhow::Result<Option<SessionRecord>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {:?}", self.path));
            }
        };

        let record = serde_json::from_str(&raw)
            .with_context(|| format!("malformed session record at {:?}", self.path))?;
        Ok(Some(record))
    }

    fn write_record(&self, record: &SessionRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {:?}", parent))?;
            }
        }

        let body = serde_json::to_vec_pretty(record).context("failed to encode session record")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).with_context(|| format!("failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to move session record into {:?}", self.path))?;
        Ok(())
    }

    fn remove_record(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove {:?}", self.path)),
        }
    }
}

fn store_error(err: anyhow::Error) -> SessionError {
    SessionError::store(format!("{err:#}"))
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self) -> SessionResult<Option<SessionRecord>> {
        self.read_record().map_err(store_error)
    }

    fn save(&self, record: &SessionRecord) -> SessionResult<()> {
        self.write_record(record).map_err(store_error)
    }

    fn clear(&self) -> SessionResult<()> {
        self.remove_record().map_err(store_error)
    }
}
