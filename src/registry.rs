//! # Session Registry
//!
//! Owns every live [`Session`]. Each session sits behind its own mutex so
//! concurrent requests for one game are serialized while different games
//! proceed independently; the table lock is only held for lookups and
//! inserts.
//!
//! Sessions are never deleted explicitly by the game protocol, so the
//! registry bounds memory itself: sessions idle for longer than the TTL are
//! purged, and beyond `max_sessions` the least recently touched one is
//! evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{FogError, Result};
use crate::session::{InitData, Session, SessionStats};

pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    session: SessionHandle,
    last_touched: Instant,
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    max_sessions: usize,
}

/// Locks a session, recovering the data if a previous holder panicked.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: config.session_ttl(),
            max_sessions: config.max_sessions.max(1),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a new session. An existing session with the same id is left
    /// untouched and reported as an error; use [`replace`](Self::replace)
    /// to restart a game.
    pub fn create(&self, id: &str, init: InitData) -> Result<SessionHandle> {
        let mut table = self.table();
        if table.contains_key(id) {
            return Err(FogError::InvalidInitialization(format!(
                "game {} already exists",
                id
            )));
        }
        Ok(self.insert(&mut table, id, init))
    }

    /// Creates the session `id`, restarting it from scratch if it already
    /// exists. The check and the insert happen under one table lock.
    pub fn replace(&self, id: &str, init: InitData) -> SessionHandle {
        let mut table = self.table();
        if table.remove(id).is_some() {
            warn!(game_id = id, "game already exists, restarting with new test case");
        }
        self.insert(&mut table, id, init)
    }

    fn insert(&self, table: &mut HashMap<String, Entry>, id: &str, init: InitData) -> SessionHandle {
        let now = Instant::now();
        self.purge_expired(table, now);
        while table.len() >= self.max_sessions {
            let Some(oldest) = table
                .iter()
                .min_by_key(|(_, e)| e.last_touched)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            info!(game_id = %oldest, "evicting least recently used game");
            table.remove(&oldest);
        }

        let session = Session::new(id, init);
        info!(
            game_id = id,
            crows = session.agents.len(),
            grid_size = session.grid_size,
            num_walls = session.wall_budget,
            move_budget = session.move_budget,
            "started new game"
        );
        let handle = Arc::new(Mutex::new(session));
        table.insert(
            id.to_string(),
            Entry {
                session: handle.clone(),
                last_touched: now,
            },
        );
        handle
    }

    fn purge_expired(&self, table: &mut HashMap<String, Entry>, now: Instant) {
        let before = table.len();
        table.retain(|_, e| now.duration_since(e.last_touched) < self.ttl);
        if table.len() < before {
            debug!(purged = before - table.len(), "purged idle games");
        }
    }

    /// Looks up a session and marks it as recently used.
    pub fn get(&self, id: &str) -> Result<SessionHandle> {
        let mut table = self.table();
        let now = Instant::now();
        match table.get_mut(id) {
            Some(e) if now.duration_since(e.last_touched) < self.ttl => {
                e.last_touched = now;
                Ok(e.session.clone())
            }
            Some(_) => {
                table.remove(id);
                Err(FogError::SessionNotFound(id.to_string()))
            }
            None => Err(FogError::SessionNotFound(id.to_string())),
        }
    }

    /// Runs `f` with exclusive access to the session `id`.
    pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> Result<T> {
        let handle = self.get(id)?;
        let mut session = lock_session(&handle);
        Ok(f(&mut session))
    }

    pub fn stats(&self, id: &str) -> Result<SessionStats> {
        self.with_session(id, |s| s.stats())
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(&RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Pos;
    use crate::session::Agent;
    use std::thread;

    fn init(x: i64) -> InitData {
        InitData {
            grid_size: 10,
            wall_budget: 2,
            agents: vec![Agent {
                id: "c".into(),
                pos: Pos::new(x, 0),
            }],
        }
    }

    #[test]
    fn create_then_get() {
        let r = SessionRegistry::default();
        r.create("g1", init(1)).unwrap();
        let s = r.get("g1").unwrap();
        assert_eq!(lock_session(&s).agents[0].pos, Pos::new(1, 0));
        assert_eq!(
            r.get("g2").unwrap_err(),
            FogError::SessionNotFound("g2".into())
        );
    }

    #[test]
    fn create_never_overwrites() {
        let r = SessionRegistry::default();
        r.create("g", init(1)).unwrap();
        assert!(matches!(
            r.create("g", init(2)),
            Err(FogError::InvalidInitialization(_))
        ));
        assert_eq!(r.with_session("g", |s| s.agents[0].pos.x).unwrap(), 1);

        r.replace("g", init(3));
        assert_eq!(r.with_session("g", |s| s.agents[0].pos.x).unwrap(), 3);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn concurrent_replace_keeps_one_game() {
        let r = Arc::new(SessionRegistry::default());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let r = r.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let handle = r.replace("g", init(i));
                        assert_eq!(lock_session(&handle).agents[0].pos, Pos::new(i, 0));
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(r.len(), 1);
        assert_eq!(r.stats("g").unwrap().move_count, 0);
    }

    #[test]
    fn evicts_least_recently_used() {
        let r = SessionRegistry::new(&RegistryConfig {
            session_ttl_secs: 3600,
            max_sessions: 2,
        });
        r.create("a", init(0)).unwrap();
        thread::sleep(Duration::from_millis(2));
        r.create("b", init(0)).unwrap();
        thread::sleep(Duration::from_millis(2));
        r.get("a").unwrap();
        r.create("c", init(0)).unwrap();
        assert_eq!(r.len(), 2);
        assert!(r.get("a").is_ok());
        assert!(r.get("b").is_err());
        assert!(r.get("c").is_ok());
    }

    #[test]
    fn expired_sessions_are_gone() {
        let r = SessionRegistry::new(&RegistryConfig {
            session_ttl_secs: 0,
            max_sessions: 10,
        });
        r.create("a", init(0)).unwrap();
        assert!(matches!(r.get("a"), Err(FogError::SessionNotFound(_))));
        assert!(r.is_empty());
    }

    #[test]
    fn concurrent_updates_are_serialized() {
        let r = Arc::new(SessionRegistry::default());
        r.create("g", init(0)).unwrap();
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let r = r.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        r.with_session("g", |s| s.tick()).unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(r.stats("g").unwrap().move_count, 800);
    }
}
