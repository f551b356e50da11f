//! Listener and dialer endpoints.
//!
//! Both are created detached: they acquire a native endpoint identifier, a
//! back-reference to the owning socket and a bound option table only when a
//! `listen_with`/`dial_with` call naming them succeeds. Until then every
//! accessor fails with an invalid-state error.

use std::sync::Arc;

use ferrule_core::engine::{EndpointId, OptOwner, RawEngine, SocketId};
use ferrule_core::error::{FerruleError, Result};
use ferrule_core::options::{names, Options};

/// A passive endpoint bound by a successful `listen_with`.
#[derive(Debug, Default)]
pub struct Listener {
    id: EndpointId,
    socket: SocketId,
    options: Options,
}

impl Listener {
    /// Create a detached listener for a later `listen_with` call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a successful listen has populated this endpoint.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.id.is_none()
    }

    /// The native endpoint identifier.
    pub fn id(&self) -> Result<EndpointId> {
        if self.id.is_none() {
            Err(FerruleError::InvalidState("listener is not bound"))
        } else {
            Ok(self.id)
        }
    }

    /// The socket this endpoint was bound on.
    pub fn socket_id(&self) -> Result<SocketId> {
        self.id().map(|_| self.socket)
    }

    /// Option table scoped to this endpoint; unbound until listened.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The concrete local address the engine resolved, which differs from
    /// the requested address for wildcard listens.
    pub fn local_address(&self) -> Result<String> {
        self.id()?;
        self.options.get_string(names::LOCAL_ADDRESS)
    }

    pub(crate) fn on_listened(
        &mut self,
        engine: &Arc<dyn RawEngine>,
        socket: SocketId,
        id: EndpointId,
    ) {
        self.id = id;
        self.socket = socket;
        self.options = Options::bound_to(engine, OptOwner::Listener(id));
    }
}

/// An active endpoint connected by a successful `dial_with`.
#[derive(Debug, Default)]
pub struct Dialer {
    id: EndpointId,
    socket: SocketId,
    options: Options,
}

impl Dialer {
    /// Create a detached dialer for a later `dial_with` call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a successful dial has populated this endpoint.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.id.is_none()
    }

    /// The native endpoint identifier.
    pub fn id(&self) -> Result<EndpointId> {
        if self.id.is_none() {
            Err(FerruleError::InvalidState("dialer is not bound"))
        } else {
            Ok(self.id)
        }
    }

    /// The socket this endpoint was connected on.
    pub fn socket_id(&self) -> Result<SocketId> {
        self.id().map(|_| self.socket)
    }

    /// Option table scoped to this endpoint; unbound until dialed.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The remote address this dialer was connected to.
    pub fn remote_address(&self) -> Result<String> {
        self.id()?;
        self.options.get_string(names::REMOTE_ADDRESS)
    }

    pub(crate) fn on_dialed(
        &mut self,
        engine: &Arc<dyn RawEngine>,
        socket: SocketId,
        id: EndpointId,
    ) {
        self.id = id;
        self.socket = socket;
        self.options = Options::bound_to(engine, OptOwner::Dialer(id));
    }
}
