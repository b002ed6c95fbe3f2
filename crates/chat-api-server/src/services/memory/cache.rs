use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::models::chat::{ConversationTurn, MemoryStats};

/// One session's state: ordered turn history plus expiry/recency bookkeeping.
struct SessionEntry {
    turns: Vec<ConversationTurn>,
    /// Last touch time, drives TTL expiry.
    last_touched: Instant,
    /// Monotonic recency sequence, drives LRU eviction. Higher = more recent.
    recency: u64,
}

impl SessionEntry {
    fn new(recency: u64) -> Self {
        Self {
            turns: Vec::new(),
            last_touched: Instant::now(),
            recency,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_touched.elapsed() > ttl
    }

    fn touch(&mut self, recency: u64) {
        self.last_touched = Instant::now();
        self.recency = recency;
    }
}

struct Inner {
    sessions: HashMap<String, SessionEntry>,
    /// Incremented on every touch; ties broken deterministically.
    clock: u64,
}

impl Inner {
    fn next_recency(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drop entries whose TTL has elapsed so they never count toward capacity.
    fn purge_expired(&mut self, ttl: Duration) {
        self.sessions.retain(|_, entry| !entry.is_expired(ttl));
    }

    /// Evict the least-recently-touched live entry to admit a new session.
    fn evict_lru(&mut self) -> Option<String> {
        let victim = self
            .sessions
            .iter()
            .min_by_key(|(_, entry)| entry.recency)
            .map(|(id, _)| id.clone())?;
        self.sessions.remove(&victim);
        Some(victim)
    }
}

/// Thread-safe in-memory conversation cache.
///
/// One mutex guards the map and the recency bookkeeping so that the
/// admit/evict/touch path is atomic: a reader never observes a half-evicted
/// entry, and two concurrent admissions at capacity cannot pick the same
/// victim twice.
///
/// Reads refresh both TTL and recency (touch-on-read), so a session kept
/// alive by `get_history` alone will not expire or be evicted ahead of a
/// colder one.
pub struct SessionMemory {
    inner: Mutex<Inner>,
    max_sessions: usize,
    ttl: Duration,
}

impl SessionMemory {
    /// Create the cache. Zero capacity or zero TTL is a configuration error
    /// and refuses to start.
    pub fn new(max_sessions: usize, ttl: Duration) -> Result<Self> {
        if max_sessions == 0 {
            bail!("invalid configuration: memory.max_sessions must be greater than zero");
        }
        if ttl.is_zero() {
            bail!("invalid configuration: memory.ttl_seconds must be greater than zero");
        }
        info!(
            "Session memory initialized: ttl={}s, max_sessions={}",
            ttl.as_secs(),
            max_sessions
        );
        Ok(Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                clock: 0,
            }),
            max_sessions,
            ttl,
        })
    }

    /// Get the ordered turn history for a session.
    /// Unseen and expired sessions both return an empty sequence.
    pub fn get_history(&self, session_id: &str) -> Vec<ConversationTurn> {
        let mut inner = self.inner.lock();
        let recency = inner.next_recency();
        let ttl = self.ttl;

        let expired = match inner.sessions.get(session_id) {
            None => return Vec::new(),
            Some(entry) => entry.is_expired(ttl),
        };
        if expired {
            inner.sessions.remove(session_id);
            debug!("Session {} expired, removed from cache", session_id);
            return Vec::new();
        }

        let entry = inner
            .sessions
            .get_mut(session_id)
            .expect("presence checked above");
        entry.touch(recency);
        entry.turns.clone()
    }

    /// Append one turn, creating (and if necessary admitting) the session.
    pub fn append_turn(&self, session_id: &str, turn: ConversationTurn) {
        let mut inner = self.inner.lock();
        self.append_locked(&mut inner, session_id, vec![turn]);
    }

    /// Append a user turn and its assistant reply under one lock acquisition.
    ///
    /// The chat flow persists the user turn only together with a successful
    /// reply, so a failed provider call leaves the history untouched.
    pub fn append_exchange(
        &self,
        session_id: &str,
        user_turn: ConversationTurn,
        assistant_turn: ConversationTurn,
    ) {
        let mut inner = self.inner.lock();
        self.append_locked(&mut inner, session_id, vec![user_turn, assistant_turn]);
    }

    fn append_locked(&self, inner: &mut Inner, session_id: &str, turns: Vec<ConversationTurn>) {
        let recency = inner.next_recency();

        // An expired entry behaves as absent: drop its stale history before
        // the capacity check so it frees its slot rather than occupying one.
        let stale = inner
            .sessions
            .get(session_id)
            .is_some_and(|entry| entry.is_expired(self.ttl));
        if stale {
            inner.sessions.remove(session_id);
        }

        if !inner.sessions.contains_key(session_id) {
            inner.purge_expired(self.ttl);
            if inner.sessions.len() >= self.max_sessions {
                if let Some(victim) = inner.evict_lru() {
                    debug!(
                        "Cache full ({} sessions), evicted LRU session {}",
                        self.max_sessions, victim
                    );
                }
            }
            inner
                .sessions
                .insert(session_id.to_string(), SessionEntry::new(recency));
            info!("Created new memory for session: {}", session_id);
        }

        let entry = inner
            .sessions
            .get_mut(session_id)
            .expect("entry inserted above");
        entry.turns.extend(turns);
        entry.touch(recency);
    }

    /// Remove a session. Idempotent; returns whether a live entry existed.
    pub fn clear_session(&self, session_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let ttl = self.ttl;
        match inner.sessions.remove(session_id) {
            Some(entry) if !entry.is_expired(ttl) => {
                info!("Cleared memory for session: {}", session_id);
                true
            }
            _ => false,
        }
    }

    /// Remove every session. Returns the number of entries dropped.
    pub fn clear_all(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.sessions.len();
        inner.sessions.clear();
        info!("Cleared all {} sessions from memory", count);
        count
    }

    /// Snapshot for observability. Counts only entries that have not
    /// logically expired, regardless of whether lazy cleanup ran.
    pub fn stats(&self) -> MemoryStats {
        let inner = self.inner.lock();
        let ttl = self.ttl;
        let current_size = inner
            .sessions
            .values()
            .filter(|entry| !entry.is_expired(ttl))
            .count();
        MemoryStats {
            current_size,
            max_size: self.max_sessions,
            ttl_seconds: ttl.as_secs(),
        }
    }
}
