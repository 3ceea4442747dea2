use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::contract::error::PortalError;
use crate::domain::session::{SessionChange, SessionKey, SessionStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot access session file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode session file: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<StoreError> for PortalError {
    fn from(e: StoreError) -> Self {
        PortalError::storage(e.to_string())
    }
}

/// Session values persisted as a flat JSON object in a single file.
///
/// Writes go to a sibling temp file which then replaces the original. On Unix
/// the file is created with mode 0600 since it holds the bearer token.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    guard: Mutex<()>,
}

type Entries = BTreeMap<String, String>;

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Missing file reads as empty; an unreadable JSON body is discarded with a warning.
    fn read_entries(&self) -> Result<Entries, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }
        match serde_json::from_str::<Entries>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable session file");
                Ok(Entries::new())
            }
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp).map_err(|e| self.io_err(e))?;
        file.write_all(&body).map_err(|e| self.io_err(e))?;
        file.sync_all().map_err(|e| self.io_err(e))?;
        drop(file);

        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }

    fn update(&self, f: impl FnOnce(&mut Entries) -> bool) -> Result<(), StoreError> {
        let _held = self.guard.lock();
        let mut entries = self.read_entries()?;
        if f(&mut entries) {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, PortalError> {
        let _held = self.guard.lock();
        Ok(self.read_entries()?.remove(key.as_str()))
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), PortalError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
            true
        })?;
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), PortalError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| entries.remove(key.as_str()).is_some())?;
        Ok(())
    }

    fn set_many(&self, changes: &[SessionChange<'_>]) -> Result<(), PortalError> {
        self.update(|entries| {
            let mut changed = false;
            for (key, value) in changes {
                let key = key.as_str();
                changed |= match value {
                    Some(v) => entries.insert(key.to_string(), v.to_string()).as_deref() != Some(*v),
                    None => entries.remove(key).is_some(),
                };
            }
            changed
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{AccessToken, Session};
    use crate::domain::session::{clear_session, load_session, save_session};
    use tempfile::tempdir;

    #[test]
    fn values_survive_a_new_store_instance() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/session.json");

        let first = FileSessionStore::new(&path);
        save_session(
            &first,
            &Session::new(AccessToken::new("abc", Some("Bearer")), Some("ada@campus.edu".into())),
        )
        .unwrap();

        let second = FileSessionStore::new(&path);
        let session = load_session(&second).unwrap().unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user_email.as_deref(), Some("ada@campus.edu"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["jwt"], "abc");
        assert_eq!(raw["jwtType"], "Bearer");
        assert_eq!(raw["userEmail"], "ada@campus.edu");
    }

    #[test]
    fn missing_file_reads_as_empty_and_remove_is_a_noop() {
        let tmp = tempdir().unwrap();
        let store = FileSessionStore::new(tmp.path().join("session.json"));

        assert_eq!(store.get(SessionKey::Token).unwrap(), None);
        clear_session(&store).unwrap();
        assert!(load_session(&store).unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(load_session(&store).unwrap().is_none());

        store.set(SessionKey::Token, "fresh").unwrap();
        assert_eq!(store.get(SessionKey::Token).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn clear_removes_all_keys_from_disk() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("session.json");
        let store = FileSessionStore::new(&path);
        for key in SessionKey::ALL {
            store.set(key, "v").unwrap();
        }

        clear_session(&store).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({}));
    }

    #[test]
    fn batch_lands_in_one_write() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, r#"{"userEmail":"old@campus.edu","other":"kept"}"#).unwrap();
        let store = FileSessionStore::new(&path);

        store
            .set_many(&[
                (SessionKey::Token, Some("abc")),
                (SessionKey::TokenType, Some("Bearer")),
                (SessionKey::UserEmail, None),
            ])
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({ "jwt": "abc", "jwtType": "Bearer", "other": "kept" })
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn clearing_a_missing_file_does_not_create_it() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("session.json");

        clear_session(&FileSessionStore::new(&path)).unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let path = tmp.path().join("session.json");
        FileSessionStore::new(&path)
            .set(SessionKey::Token, "abc")
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
