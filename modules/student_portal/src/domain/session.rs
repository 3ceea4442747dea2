//! Session accessor over a persistent string key/value store.
//!
//! Three values make up a session: the token, its scheme and the email the
//! user signed in with. A non-empty token means "authenticated".

use crate::contract::error::PortalError;
use crate::contract::model::{AccessToken, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    Token,
    TokenType,
    UserEmail,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [Self::Token, Self::TokenType, Self::UserEmail];

    /// Storage key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "jwt",
            Self::TokenType => "jwtType",
            Self::UserEmail => "userEmail",
        }
    }
}

/// One pending change: `Some` stores the value, `None` removes the key.
pub type SessionChange<'a> = (SessionKey, Option<&'a str>);

/// Persistent string key/value storage for the session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Result<Option<String>, PortalError>;
    fn set(&self, key: SessionKey, value: &str) -> Result<(), PortalError>;
    fn remove(&self, key: SessionKey) -> Result<(), PortalError>;

    /// Apply several changes together. Stores backed by a single file should
    /// override this to persist once.
    fn set_many(&self, changes: &[SessionChange<'_>]) -> Result<(), PortalError> {
        for (key, value) in changes {
            match value {
                Some(v) => self.set(*key, v)?,
                None => self.remove(*key)?,
            }
        }
        Ok(())
    }
}

/// Current session, if a non-empty token is stored.
pub fn load_session(store: &dyn SessionStore) -> Result<Option<Session>, PortalError> {
    let token = match store.get(SessionKey::Token)? {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Ok(None),
    };
    let token_type = store.get(SessionKey::TokenType)?;
    let user_email = store
        .get(SessionKey::UserEmail)?
        .filter(|e| !e.trim().is_empty());

    Ok(Some(Session::new(
        AccessToken::new(token, token_type.as_deref()),
        user_email,
    )))
}

pub fn save_session(store: &dyn SessionStore, session: &Session) -> Result<(), PortalError> {
    store.set_many(&[
        (SessionKey::Token, Some(session.token.as_str())),
        (SessionKey::TokenType, Some(session.token_type.as_str())),
        (SessionKey::UserEmail, session.user_email.as_deref()),
    ])
}

/// Remove every session value.
pub fn clear_session(store: &dyn SessionStore) -> Result<(), PortalError> {
    store.set_many(&SessionKey::ALL.map(|key| (key, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::session::MemorySessionStore;
    use parking_lot::Mutex;

    /// Wraps a store and logs which trait methods were called.
    #[derive(Default)]
    struct CallLog {
        inner: MemorySessionStore,
        calls: Mutex<Vec<&'static str>>,
    }

    impl SessionStore for CallLog {
        fn get(&self, key: SessionKey) -> Result<Option<String>, PortalError> {
            self.inner.get(key)
        }
        fn set(&self, key: SessionKey, value: &str) -> Result<(), PortalError> {
            self.calls.lock().push("set");
            self.inner.set(key, value)
        }
        fn remove(&self, key: SessionKey) -> Result<(), PortalError> {
            self.calls.lock().push("remove");
            self.inner.remove(key)
        }
        fn set_many(&self, changes: &[SessionChange<'_>]) -> Result<(), PortalError> {
            self.calls.lock().push("set_many");
            self.inner.set_many(changes)
        }
    }

    #[test]
    fn empty_store_has_no_session() {
        let store = MemorySessionStore::default();
        assert!(load_session(&store).unwrap().is_none());
    }

    #[test]
    fn blank_token_is_not_a_session() {
        let store = MemorySessionStore::default();
        store.set(SessionKey::Token, "  ").unwrap();
        store.set(SessionKey::UserEmail, "ada@campus.edu").unwrap();
        assert!(load_session(&store).unwrap().is_none());
    }

    #[test]
    fn missing_scheme_defaults_to_bearer() {
        let store = MemorySessionStore::default();
        store.set(SessionKey::Token, "abc").unwrap();

        let session = load_session(&store).unwrap().unwrap();
        assert_eq!(session.token_type, "Bearer");
        assert_eq!(session.user_email, None);
        assert_eq!(session.access_token().header_value(), "Bearer abc");
    }

    #[test]
    fn save_then_load_and_clear() {
        let store = MemorySessionStore::default();
        let session = Session::new(
            AccessToken::new("abc", Some("Bearer")),
            Some("ada@campus.edu".into()),
        );

        save_session(&store, &session).unwrap();
        assert_eq!(store.get(SessionKey::Token).unwrap().as_deref(), Some("abc"));
        assert_eq!(load_session(&store).unwrap(), Some(session));

        clear_session(&store).unwrap();
        for key in SessionKey::ALL {
            assert_eq!(store.get(key).unwrap(), None, "{} should be cleared", key.as_str());
        }
    }

    #[test]
    fn save_and_clear_are_single_batches() {
        let store = CallLog::default();
        let session = Session::new(AccessToken::new("abc", None), Some("ada@campus.edu".into()));

        save_session(&store, &session).unwrap();
        clear_session(&store).unwrap();

        assert_eq!(*store.calls.lock(), vec!["set_many", "set_many"]);
        assert!(load_session(&store.inner).unwrap().is_none());
    }

    #[test]
    fn saving_without_email_drops_previous_email() {
        let store = MemorySessionStore::default();
        store.set(SessionKey::UserEmail, "old@campus.edu").unwrap();

        save_session(&store, &Session::new(AccessToken::new("t", None), None)).unwrap();
        assert_eq!(store.get(SessionKey::UserEmail).unwrap(), None);
    }
}
