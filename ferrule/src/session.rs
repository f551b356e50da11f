//! Engine lifecycle and socket factory.
//!
//! A [`Session`] initializes the native engine exactly once and finalizes it
//! exactly once, no matter how many clones exist. Sockets opened through a
//! session hold their own engine reference, so dropping the session while
//! sockets are alive is safe: the engine is finalized only after the last
//! lifecycle guard goes away.

use std::sync::Arc;

use tracing::debug;

use ferrule_core::engine::RawEngine;
use ferrule_core::error::{check, Result};
use ferrule_core::protocol::Protocol;

use crate::socket::Socket;

/// Finalizes the engine when the last session clone is dropped.
struct LifecycleGuard {
    engine: Arc<dyn RawEngine>,
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        debug!("finalizing transport engine");
        self.engine.fini();
    }
}

/// A refcounted handle on an initialized transport engine.
///
/// Cloning is cheap; all clones share one lifecycle guard.
#[derive(Clone)]
pub struct Session {
    engine: Arc<dyn RawEngine>,
    _lifecycle: Arc<LifecycleGuard>,
}

impl Session {
    /// Initialize `engine` and return a session owning its lifecycle.
    pub fn new(engine: Arc<dyn RawEngine>) -> Result<Self> {
        let status = engine.init();
        check(&*engine, status)?;
        debug!("transport engine initialized");
        let lifecycle = Arc::new(LifecycleGuard {
            engine: Arc::clone(&engine),
        });
        Ok(Self {
            engine,
            _lifecycle: lifecycle,
        })
    }

    /// The underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn RawEngine> {
        &self.engine
    }

    /// Open a socket speaking `protocol` on this session's engine.
    pub fn socket(&self, protocol: Protocol) -> Result<Socket> {
        Socket::open(Arc::clone(&self.engine), protocol)
    }

    /// Open a pair (one-to-one) socket.
    pub fn pair(&self) -> Result<Socket> {
        self.socket(Protocol::Pair0)
    }

    /// Open a push (pipeline producer) socket.
    pub fn push(&self) -> Result<Socket> {
        self.socket(Protocol::Push0)
    }

    /// Open a pull (pipeline consumer) socket.
    pub fn pull(&self) -> Result<Socket> {
        self.socket(Protocol::Pull0)
    }

    /// Open a publisher socket.
    pub fn publisher(&self) -> Result<Socket> {
        self.socket(Protocol::Pub0)
    }

    /// Open a subscriber socket.
    pub fn subscriber(&self) -> Result<Socket> {
        self.socket(Protocol::Sub0)
    }

    /// Open a requester socket.
    pub fn requester(&self) -> Result<Socket> {
        self.socket(Protocol::Req0)
    }

    /// Open a replier socket.
    pub fn replier(&self) -> Result<Socket> {
        self.socket(Protocol::Rep0)
    }

    /// Open a surveyor socket.
    pub fn surveyor(&self) -> Result<Socket> {
        self.socket(Protocol::Surveyor0)
    }

    /// Open a respondent socket.
    pub fn respondent(&self) -> Result<Socket> {
        self.socket(Protocol::Respondent0)
    }

    /// Open a bus socket.
    pub fn bus(&self) -> Result<Socket> {
        self.socket(Protocol::Bus0)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("clones", &Arc::strong_count(&self._lifecycle))
            .finish()
    }
}
