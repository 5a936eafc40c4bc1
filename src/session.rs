//! Stale-response guard for editing sessions.
//!
//! A network call started from one session carries that session's token back
//! with its result. Once the session is cancelled or finished, the token no
//! longer matches and the late result must be dropped.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

#[derive(Debug, Default)]
pub struct SessionGuard {
    next_id: u64,
    active: Option<u64>,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new session, superseding any active one.
    pub fn begin(&mut self) -> SessionToken {
        self.next_id += 1;
        self.active = Some(self.next_id);
        SessionToken(self.next_id)
    }

    pub fn end(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self, token: SessionToken) -> bool {
        self.active == Some(token.0)
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.active.map(SessionToken)
    }
}
