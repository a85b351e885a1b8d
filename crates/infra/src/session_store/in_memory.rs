use std::sync::RwLock;

use posgate_session::{SessionRecord, SessionResult, SessionStore};

/// In-memory session store for tests/dev (lost on restart).
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    record: RwLock<Option<SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> SessionResult<Option<SessionRecord>> {
        Ok(self
            .record
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, record: &SessionRecord) -> SessionResult<()> {
        *self
            .record
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        *self
            .record
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}
