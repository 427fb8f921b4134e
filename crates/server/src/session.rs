use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use axum::http::{header, HeaderMap, HeaderValue};
use dashboard_api::Dataset;
use shared::domain::SessionId;

pub const SESSION_COOKIE: &str = "dashboard_session";

struct SessionEntry {
    dataset: Arc<Dataset>,
    last_seen: Instant,
}

/// Current dataset of each browser session. Entries idle longer than the
/// TTL are dropped; at capacity the least recently used entry is evicted.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Dataset>> {
        self.get_at(id, Instant::now())
    }

    pub fn put(&self, id: SessionId, dataset: Dataset) -> Arc<Dataset> {
        self.put_at(id, dataset, Instant::now())
    }

    pub fn clear(&self, id: SessionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drops expired sessions and returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    fn get_at(&self, id: SessionId, now: Instant) -> Option<Arc<Dataset>> {
        let mut entries = self.lock();
        match entries.get_mut(&id) {
            Some(entry) if now.saturating_duration_since(entry.last_seen) < self.ttl => {
                entry.last_seen = now;
                return Some(entry.dataset.clone());
            }
            Some(_) => {}
            None => return None,
        }
        entries.remove(&id);
        None
    }

    fn put_at(&self, id: SessionId, dataset: Dataset, now: Instant) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        let mut entries = self.lock();
        Self::retain_live(&mut entries, now, self.ttl);
        if !entries.contains_key(&id) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            id,
            SessionEntry {
                dataset: dataset.clone(),
                last_seen: now,
            },
        );
        dataset
    }

    fn evict_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        Self::retain_live(&mut entries, now, self.ttl);
        before - entries.len()
    }

    fn retain_live(entries: &mut HashMap<SessionId, SessionEntry>, now: Instant, ttl: Duration) {
        entries.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < ttl);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Session id from the request cookie, or a fresh one. The flag is true when
/// the id is new and the response must set the cookie.
pub fn resolve_session(headers: &HeaderMap) -> (SessionId, bool) {
    match session_from_headers(headers) {
        Some(id) => (id, false),
        None => (SessionId::new_random(), true),
    }
}

pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name == SESSION_COOKIE {
                SessionId::parse(value)
            } else {
                None
            }
        })
}

pub fn session_cookie(id: SessionId) -> HeaderValue {
    // a UUID only contains cookie-safe characters
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("dashboard_session=; Path=/"))
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
