// storefront/src/services/sessions.rs

//! Server-side login sessions with sliding expiry.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

pub const USER_SESSION_COOKIE: &str = "storefront_sid";
pub const ADMIN_SESSION_COOKIE: &str = "storefront_admin_sid";

/// Who a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
  User {
    id: i64,
    username: String,
    email: String,
    full_name: Option<String>,
  },
  Admin {
    id: i64,
    name: String,
    email: String,
  },
}

#[derive(Debug, Clone)]
struct Session {
  principal: Principal,
  last_seen: DateTime<Utc>,
}

/// Process-wide session table, created at startup and shared through `AppState`.
pub struct SessionStore {
  ttl: ChronoDuration,
  sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::hours(24)),
      sessions: RwLock::new(HashMap::new()),
    }
  }

  /// Starts a session and returns its id.
  pub fn create(&self, principal: Principal) -> String {
    self.create_at(principal, Utc::now())
  }

  pub fn create_at(&self, principal: Principal, now: DateTime<Utc>) -> String {
    let session_id = Uuid::new_v4().to_string();
    self.sessions.write().insert(
      session_id.clone(),
      Session {
        principal,
        last_seen: now,
      },
    );
    debug!("Session created.");
    session_id
  }

  /// Returns the principal of a live session and refreshes its expiry.
  /// An expired session is destroyed.
  pub fn touch(&self, session_id: &str) -> Option<Principal> {
    self.touch_at(session_id, Utc::now())
  }

  pub fn touch_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<Principal> {
    let mut sessions = self.sessions.write();
    let expired = now - sessions.get(session_id)?.last_seen >= self.ttl;
    if expired {
      sessions.remove(session_id);
      debug!("Expired session destroyed.");
      return None;
    }
    let session = sessions.get_mut(session_id)?;
    session.last_seen = now;
    Some(session.principal.clone())
  }

  /// Replaces the principal of a live session (after a profile change).
  pub fn replace_principal(&self, session_id: &str, principal: Principal) -> bool {
    match self.sessions.write().get_mut(session_id) {
      Some(session) => {
        session.principal = principal;
        true
      }
      None => false,
    }
  }

  pub fn destroy(&self, session_id: &str) -> bool {
    self.sessions.write().remove(session_id).is_some()
  }

  /// Drops every expired session; returns how many were removed.
  pub fn purge_expired(&self) -> usize {
    let now = Utc::now();
    let mut sessions = self.sessions.write();
    let before = sessions.len();
    sessions.retain(|_, s| now - s.last_seen < self.ttl);
    before - sessions.len()
  }

  pub fn len(&self) -> usize {
    self.sessions.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.read().is_empty()
  }
}
