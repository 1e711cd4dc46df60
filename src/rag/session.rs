//! Conversation sessions keyed by id.

use crate::error::{CoursemateError, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Default)]
struct Sessions {
    next_id: u64,
    history: HashMap<String, Vec<Exchange>>,
}

/// In-memory conversation history, bounded per session.
#[derive(Debug)]
pub struct SessionManager {
    max_history: usize,
    inner: Mutex<Sessions>,
}

impl SessionManager {
    /// Keep at most `max_history` exchanges per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            inner: Mutex::new(Sessions::default()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Sessions>> {
        self.inner
            .lock()
            .map_err(|e| CoursemateError::Session(format!("Session store poisoned: {}", e)))
    }

    /// Start an empty session and return its id.
    pub fn create_session(&self) -> Result<String> {
        let mut sessions = self.lock()?;
        sessions.next_id += 1;
        let id = format!("session_{}", sessions.next_id);
        sessions.history.insert(id.clone(), Vec::new());
        debug!("Created {}", id);
        Ok(id)
    }

    /// Record an exchange, creating the session if it is unknown.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> Result<()> {
        let mut sessions = self.lock()?;
        let history = sessions.history.entry(session_id.to_string()).or_default();
        history.push(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });

        if history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }
        Ok(())
    }

    /// History as `User: ...` / `Assistant: ...` lines, or `None` when empty.
    pub fn conversation_history(&self, session_id: &str) -> Result<Option<String>> {
        let sessions = self.lock()?;
        let Some(history) = sessions.history.get(session_id).filter(|h| !h.is_empty()) else {
            return Ok(None);
        };

        let lines: Vec<String> = history
            .iter()
            .flat_map(|e| [format!("User: {}", e.user), format!("Assistant: {}", e.assistant)])
            .collect();
        Ok(Some(lines.join("\n")))
    }

    /// Forget a session's history.
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.lock()?;
        match sessions.history.get_mut(session_id) {
            Some(history) => {
                history.clear();
                Ok(())
            }
            None => Err(CoursemateError::SessionNotFound(session_id.to_string())),
        }
    }

    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.history.len())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_sequential() {
        let sessions = SessionManager::default();
        assert_eq!(sessions.create_session().unwrap(), "session_1");
        assert_eq!(sessions.create_session().unwrap(), "session_2");
        assert_eq!(sessions.session_count().unwrap(), 2);
    }

    #[test]
    fn test_history_keeps_latest_exchanges() {
        let sessions = SessionManager::new(2);
        let id = sessions.create_session().unwrap();
        assert_eq!(sessions.conversation_history(&id).unwrap(), None);

        sessions.add_exchange(&id, "q1", "a1").unwrap();
        sessions.add_exchange(&id, "q2", "a2").unwrap();
        sessions.add_exchange(&id, "q3", "a3").unwrap();

        assert_eq!(
            sessions.conversation_history(&id).unwrap().as_deref(),
            Some("User: q2\nAssistant: a2\nUser: q3\nAssistant: a3")
        );
    }

    #[test]
    fn test_unknown_session_is_created_on_write() {
        let sessions = SessionManager::default();
        sessions.add_exchange("external-id", "hi", "hello").unwrap();
        assert!(sessions.conversation_history("external-id").unwrap().is_some());
    }

    #[test]
    fn test_poisoned_store_reports_session_error() {
        let sessions = std::sync::Arc::new(SessionManager::default());
        let holder = sessions.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.inner.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let err = sessions.create_session().unwrap_err();
        assert!(matches!(err, CoursemateError::Session(_)));
        assert!(err.to_string().starts_with("Session error: Session store poisoned"));
    }

    #[test]
    fn test_clear_session() {
        let sessions = SessionManager::default();
        let id = sessions.create_session().unwrap();
        sessions.add_exchange(&id, "q", "a").unwrap();

        sessions.clear_session(&id).unwrap();
        assert_eq!(sessions.conversation_history(&id).unwrap(), None);

        let err = sessions.clear_session("missing").unwrap_err();
        assert_eq!(err.to_string(), "Session not found: missing");
    }
}
