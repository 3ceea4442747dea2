use std::collections::HashMap;

use parking_lot::Mutex;

use crate::contract::error::PortalError;
use crate::domain::session::{SessionKey, SessionStore};

/// Process-local session store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, PortalError> {
        Ok(self.values.lock().get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), PortalError> {
        self.values.lock().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), PortalError> {
        self.values.lock().remove(&key);
        Ok(())
    }
}
