//! In-memory assessment sessions.
//!
//! A session owns one wizard behind an async mutex (so stage transitions for
//! the same session are serialized) and one `AnalysisSlot`. Nothing outlives
//! the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::supersede::AnalysisSlot;
use crate::assessment::wizard::Wizard;

pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Milliseconds since the epoch of the last request that touched the session.
    last_active_ms: AtomicI64,
    wizard: Mutex<Wizard>,
    analysis: AnalysisSlot,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
            wizard: Mutex::new(Wizard::new()),
            analysis: AnalysisSlot::new(),
        }
    }

    /// Exclusive access to the wizard for one request.
    pub async fn wizard(&self) -> MutexGuard<'_, Wizard> {
        self.wizard.lock().await
    }

    pub fn analysis(&self) -> &AnalysisSlot {
        &self.analysis
    }

    pub fn touch(&self, now: DateTime<Utc>) {
        self.last_active_ms
            .store(now.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.last_active_ms.load(Ordering::Relaxed))
            .unwrap_or(self.created_at)
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_active()
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Creates a session at stage Intro. Idle sessions past the TTL are purged first.
    pub async fn create(&self) -> Arc<Session> {
        let now = Utc::now();
        self.purge_expired(now).await;

        let session = Arc::new(Session::new(now));
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        info!("Created assessment session {}", session.id);
        session
    }

    /// Looks up a session and marks it active.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        session.touch(Utc::now());
        Some(session)
    }

    /// Removes a session and cancels any analysis still running for it.
    pub async fn remove(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.write().await.remove(&id)?;
        session.analysis().cancel();
        info!("Removed assessment session {id}");
        Some(session)
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| {
            let keep = s.idle_for(now) <= self.ttl;
            if !keep {
                s.analysis().cancel();
            }
            keep
        });
        let purged = before - sessions.len();
        if purged > 0 {
            debug!("Purged {purged} idle assessment session(s)");
        }
        purged
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
