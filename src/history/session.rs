use log::{ debug, info, warn };
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::memory::ConversationMemory;

pub const DEFAULT_SESSION_ID: &str = "default";

struct SessionEntry {
    memory: Arc<Mutex<ConversationMemory>>,
    last_access: Instant,
}

impl SessionEntry {
    /// A request holds (or is waiting on) this memory when anything besides
    /// the store owns a handle to it.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.memory) > 1
    }
}

/// Conversations keyed by caller-supplied id. Each conversation sits behind
/// its own mutex so turns within one conversation are serialized while
/// different conversations run concurrently.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    greeting: String,
    ttl: Option<Duration>,
    max_sessions: usize,
}

impl SessionStore {
    /// `ttl` of `None` keeps idle sessions forever; `max_sessions` of 0 means unbounded.
    pub fn new(greeting: impl Into<String>, ttl: Option<Duration>, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            greeting: greeting.into(),
            ttl,
            max_sessions,
        }
    }

    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<ConversationMemory>> {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        if let Some(entry) = sessions.get_mut(session_id) {
            entry.last_access = now;
            return Arc::clone(&entry.memory);
        }

        while self.max_sessions > 0 && sessions.len() >= self.max_sessions {
            let oldest_idle = sessions
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| id.clone());
            match oldest_idle {
                Some(id) => {
                    sessions.remove(&id);
                    info!("Session capacity {} reached, evicted '{}'", self.max_sessions, id);
                }
                None => {
                    warn!(
                        "Session capacity {} reached but every session is in use, going over the limit",
                        self.max_sessions
                    );
                    break;
                }
            }
        }

        let memory = Arc::new(Mutex::new(ConversationMemory::new(&self.greeting)));
        sessions.insert(session_id.to_string(), SessionEntry {
            memory: Arc::clone(&memory),
            last_access: now,
        });
        info!("Created session '{}' ({} active)", session_id, sessions.len());
        memory
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<ConversationMemory>>> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).map(|entry| Arc::clone(&entry.memory))
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.lock().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now()).await
    }

    /// Drops sessions idle for longer than the TTL as of `now`. Sessions with a
    /// request in flight are kept regardless of age.
    pub async fn evict_expired_at(&self, now: Instant) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.in_use() || now.saturating_duration_since(entry.last_access) <= ttl;
            if !keep {
                debug!("Session '{}' expired", id);
            }
            keep
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} expired session(s), {} remaining", evicted, sessions.len());
        }
        evicted
    }
}

pub fn spawn_sweeper(store: Arc<SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            store.evict_expired().await;
        }
    })
}
