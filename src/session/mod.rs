use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::game::traits::PlayerId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("game is full ({0} seats taken)")]
    GameFull(usize),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub player_name: String,
    pub addr: SocketAddr,
    pub last_seen: Instant,
    pub last_ping: Option<Instant>,
    pub ping_count: u32,
}

/// Manages all connected player sessions
///
/// Seats are the ids `0..max_players`. A seat freed by a leaving player goes
/// to the back of the queue and is handed out again later.
pub struct SessionManager {
    /// Map from socket address to session
    sessions_by_addr: HashMap<SocketAddr, Session>,
    /// Map from player ID to socket address (for reverse lookup)
    addr_by_player_id: HashMap<PlayerId, SocketAddr>,
    /// Seats not taken by anyone
    free_seats: VecDeque<PlayerId>,
    max_players: usize,
    /// How long before a session is considered timed out
    timeout_duration: Duration,
}

impl SessionManager {
    pub fn new(max_players: usize, timeout_seconds: u64) -> Self {
        Self {
            sessions_by_addr: HashMap::new(),
            addr_by_player_id: HashMap::new(),
            free_seats: (0..max_players).map(|id| id as PlayerId).collect(),
            max_players,
            timeout_duration: Duration::from_secs(timeout_seconds),
        }
    }

    /// Registers `addr`, or refreshes it if it already holds a seat.
    pub fn register(&mut self, addr: SocketAddr, player_name: String) -> Result<&Session, SessionError> {
        match self.sessions_by_addr.entry(addr) {
            Entry::Occupied(entry) => {
                let session = entry.into_mut();
                session.last_seen = Instant::now();
                session.player_name = player_name;
                Ok(&*session)
            }
            Entry::Vacant(entry) => {
                let player_id = self
                    .free_seats
                    .pop_front()
                    .ok_or(SessionError::GameFull(self.max_players))?;
                self.addr_by_player_id.insert(player_id, addr);
                tracing::info!("New player registered: id={}, addr={}", player_id, addr);

                Ok(&*entry.insert(Session {
                    player_id,
                    player_name,
                    addr,
                    last_seen: Instant::now(),
                    last_ping: None,
                    ping_count: 0,
                }))
            }
        }
    }

    pub fn ping(&mut self, addr: &SocketAddr) {
        if let Some(session) = self.sessions_by_addr.get_mut(addr) {
            session.last_ping = Some(Instant::now());
            session.last_seen = Instant::now();
            session.ping_count += 1;
        }
    }

    pub fn update_last_seen(&mut self, addr: &SocketAddr) {
        if let Some(session) = self.sessions_by_addr.get_mut(addr) {
            session.last_seen = Instant::now();
        }
    }

    pub fn get_by_addr(&self, addr: &SocketAddr) -> Option<&Session> {
        self.sessions_by_addr.get(addr)
    }

    pub fn get_by_player_id(&self, player_id: PlayerId) -> Option<&Session> {
        self.addr_by_player_id
            .get(&player_id)
            .and_then(|addr| self.sessions_by_addr.get(addr))
    }

    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.sessions_by_addr.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions_by_addr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions_by_addr.is_empty()
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Session> {
        let session = self.sessions_by_addr.remove(addr)?;
        self.addr_by_player_id.remove(&session.player_id);
        self.free_seats.push_back(session.player_id);
        tracing::info!(
            "Player disconnected: id={}, addr={}",
            session.player_id,
            addr
        );
        Some(session)
    }

    pub fn cleanup_timed_out(&mut self) -> Vec<Session> {
        let now = Instant::now();
        let timeout = self.timeout_duration;

        let timed_out_addrs: Vec<SocketAddr> = self
            .sessions_by_addr
            .iter()
            .filter(|(_, session)| now.duration_since(session.last_seen) > timeout)
            .map(|(addr, _)| *addr)
            .collect();

        let mut removed = Vec::new();
        for addr in timed_out_addrs {
            if let Some(session) = self.remove(&addr) {
                tracing::info!(
                    "Player timed out: id={}, name={}",
                    session.player_id,
                    session.player_name
                );
                removed.push(session);
            }
        }

        removed
    }
}
