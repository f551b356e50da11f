//! The principal entity: a socket owning a native identifier.
//!
//! A [`Socket`] composes the sending, receiving and endpoint-attachment
//! surface over one native socket id, with an option table scoped to that
//! id. The identifier is 0 when the socket is closed or uninitialized; every
//! operation guards on it, and `close` resets it unconditionally so the
//! wrapper and the engine never disagree about liveness.

use std::sync::Arc;
use tracing::{debug, trace};

use ferrule_core::aio::Completion;
use ferrule_core::engine::{EndpointId, Flags, MsgHandle, OptOwner, RawEngine, SocketId};
use ferrule_core::error::{check, FerruleError, Result};
use ferrule_core::message::Message;
use ferrule_core::options::Options;
use ferrule_core::protocol::Protocol;

use crate::endpoint::{Dialer, Listener};

/// The sending half of the socket contract.
pub trait Sender {
    /// Send a raw buffer; the engine copies it, no handle semantics.
    fn send(&self, buf: &[u8], flags: Flags) -> Result<()>;

    /// Send a whole message, moving handle ownership on success only.
    fn send_msg(&self, msg: &mut Message, flags: Flags) -> Result<()>;
}

/// The receiving half of the socket contract.
pub trait Receiver {
    /// Receive a whole message, blocking per flags and socket options.
    fn recv_msg(&self, flags: Flags) -> Result<Message>;

    /// Receive into `msg`, reporting whether a usable payload resulted.
    /// "Nothing available" on a non-blocking call is `Ok(false)`, not a
    /// failure.
    fn try_recv_msg(&self, msg: &mut Message, flags: Flags) -> Result<bool>;

    /// Receive up to `capacity` raw bytes.
    fn recv_buf(&self, capacity: usize, flags: Flags) -> Result<Vec<u8>>;

    /// Receive raw bytes into `buf`, reporting whether anything arrived.
    fn try_recv_buf(&self, buf: &mut Vec<u8>, capacity: usize, flags: Flags) -> Result<bool>;
}

/// A socket over the native engine.
pub struct Socket {
    engine: Arc<dyn RawEngine>,
    id: SocketId,
    options: Options,
}

impl Socket {
    /// Open a socket speaking `protocol`.
    ///
    /// Protocol-specific constructors on [`crate::session::Session`] are
    /// thin wrappers over this.
    pub fn open(engine: Arc<dyn RawEngine>, protocol: Protocol) -> Result<Self> {
        let mut id = SocketId::NONE;
        let status = engine.socket_open(protocol, &mut id);
        check(&*engine, status)?;
        let options = Options::bound_to(&engine, OptOwner::Socket(id));
        debug!(socket = id.0, %protocol, "socket opened");
        Ok(Self {
            engine,
            id,
            options,
        })
    }

    fn require_open(&self) -> Result<SocketId> {
        if self.id.is_none() {
            Err(FerruleError::InvalidState("socket is closed"))
        } else {
            Ok(self.id)
        }
    }

    /// Whether the socket still owns a live native identifier.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.id.is_none()
    }

    /// The native identifier; `SocketId::NONE` once closed.
    #[must_use]
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// The engine this socket was opened against.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn RawEngine> {
        &self.engine
    }

    /// The option table scoped to this socket's identifier.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Build an empty message bound to this socket's engine.
    #[must_use]
    pub fn message(&self) -> Message {
        Message::new(self.engine.clone())
    }

    /// Build a message carrying a copy of `body`.
    pub fn message_with(&self, body: &[u8]) -> Result<Message> {
        Message::with_body(self.engine.clone(), body)
    }

    /// Bind a passive endpoint at `addr`.
    pub fn listen(&self, addr: &str, flags: Flags) -> Result<()> {
        let id = self.require_open()?;
        let status = self.engine.listen(id, addr, None, flags.bits());
        check(&*self.engine, status)?;
        debug!(socket = id.0, address = addr, "listening");
        Ok(())
    }

    /// Bind a passive endpoint at `addr` and populate `listener` on
    /// success. On failure the listener is left untouched.
    pub fn listen_with(&self, addr: &str, listener: &mut Listener, flags: Flags) -> Result<()> {
        let id = self.require_open()?;
        let mut endpoint = EndpointId::NONE;
        let status = self.engine.listen(id, addr, Some(&mut endpoint), flags.bits());
        check(&*self.engine, status)?;
        listener.on_listened(&self.engine, id, endpoint);
        debug!(socket = id.0, address = addr, endpoint = endpoint.0, "listening");
        Ok(())
    }

    /// Connect an active endpoint to `addr`.
    pub fn dial(&self, addr: &str, flags: Flags) -> Result<()> {
        let id = self.require_open()?;
        let status = self.engine.dial(id, addr, None, flags.bits());
        check(&*self.engine, status)?;
        debug!(socket = id.0, address = addr, "dialed");
        Ok(())
    }

    /// Connect an active endpoint to `addr` and populate `dialer` on
    /// success. On failure the dialer is left untouched.
    pub fn dial_with(&self, addr: &str, dialer: &mut Dialer, flags: Flags) -> Result<()> {
        let id = self.require_open()?;
        let mut endpoint = EndpointId::NONE;
        let status = self.engine.dial(id, addr, Some(&mut endpoint), flags.bits());
        check(&*self.engine, status)?;
        dialer.on_dialed(&self.engine, id, endpoint);
        debug!(socket = id.0, address = addr, endpoint = endpoint.0, "dialed");
        Ok(())
    }

    /// Receive a whole message asynchronously.
    ///
    /// The callback fires exactly once, with the populated message or the
    /// translated failure, even if a completion and a cancellation race.
    /// The returned completion can be queried or canceled.
    pub fn recv_async(
        &self,
        callback: impl FnOnce(Result<Message>) + Send + 'static,
    ) -> Result<Arc<Completion>> {
        let id = self.require_open()?;
        let engine = self.engine.clone();
        let completion = Completion::new(move |outcome| {
            let result = match outcome {
                Ok(handle) => {
                    let mut msg = Message::new(engine.clone());
                    msg.adopt(handle);
                    Ok(msg)
                }
                Err(status) => Err(FerruleError::transport(status, engine.strerror(status))),
            };
            callback(result);
        });
        self.engine.recv_msg_async(id, completion.clone());
        Ok(completion)
    }

    /// The protocol this socket speaks.
    pub fn protocol(&self) -> Result<Protocol> {
        let id = self.require_open()?;
        Ok(Protocol::from_raw(self.engine.protocol(id)))
    }

    /// The protocol this socket expects of its peers.
    pub fn peer_protocol(&self) -> Result<Protocol> {
        let id = self.require_open()?;
        Ok(Protocol::from_raw(self.engine.peer_protocol(id)))
    }

    /// Halt transfers without giving up the identifier; the socket stays
    /// valid for queries. Distinct from [`Socket::close`].
    pub fn shutdown(&self) -> Result<()> {
        let id = self.require_open()?;
        let status = self.engine.shutdown(id);
        check(&*self.engine, status)
    }

    /// Close the socket. Idempotent: a second call is a no-op.
    ///
    /// The native close runs first; the local identifier is then reset and
    /// the option table unbound whether or not the native call succeeded,
    /// so wrapper state never claims a liveness the engine has revoked. A
    /// native failure is still reported after the reset.
    pub fn close(&mut self) -> Result<()> {
        if self.id.is_none() {
            return Ok(());
        }
        let status = self.engine.close(self.id);
        trace!(socket = self.id.0, status, "socket closed");
        self.id = SocketId::NONE;
        self.options.unbind();
        check(&*self.engine, status)
    }
}

impl Sender for Socket {
    fn send(&self, buf: &[u8], flags: Flags) -> Result<()> {
        let id = self.require_open()?;
        let status = self.engine.send(id, buf, flags.bits());
        check(&*self.engine, status)
    }

    /// Whole-message send: ownership transfer point.
    ///
    /// The native call is issued first; the message clears its handle
    /// immediately after the call reports success and never before. On
    /// failure the engine has not taken ownership (documented contract),
    /// so the message keeps its handle and frees it as usual.
    fn send_msg(&self, msg: &mut Message, flags: Flags) -> Result<()> {
        let id = self.require_open()?;
        if !msg.has_handle() {
            // Nothing to transfer; mirrors the engine treating an absent
            // handle as a no-op rather than an error.
            return Ok(());
        }
        let status = self.engine.send_msg(id, msg.handle(), flags.bits());
        check(&*self.engine, status)?;
        msg.release_to_transport();
        Ok(())
    }
}

impl Receiver for Socket {
    fn recv_msg(&self, flags: Flags) -> Result<Message> {
        let mut msg = Message::new(self.engine.clone());
        self.try_recv_msg(&mut msg, flags)?;
        Ok(msg)
    }

    /// Whole-message receive: the wrapper takes ownership of a handle it
    /// did not allocate. If the native call populated a handle and still
    /// reported failure, that handle is freed before the failure is
    /// propagated; nothing leaks on any path.
    fn try_recv_msg(&self, msg: &mut Message, flags: Flags) -> Result<bool> {
        let id = self.require_open()?;
        let mut handle = MsgHandle::NONE;
        let status = self.engine.recv_msg(id, &mut handle, flags.bits());
        if let Err(err) = check(&*self.engine, status) {
            if !handle.is_none() {
                self.engine.msg_free(handle);
            }
            if err.is_try_again() {
                return Ok(false);
            }
            return Err(err);
        }
        msg.adopt(handle);
        Ok(msg.has_handle())
    }

    fn recv_buf(&self, capacity: usize, flags: Flags) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.try_recv_buf(&mut buf, capacity, flags)?;
        Ok(buf)
    }

    /// Raw-buffer receive: the buffer is sized to the declared capacity
    /// before the native call populates it, then truncated to the
    /// effective length. A zero-length result means "nothing received" and
    /// is not a failure.
    fn try_recv_buf(&self, buf: &mut Vec<u8>, capacity: usize, flags: Flags) -> Result<bool> {
        let id = self.require_open()?;
        buf.resize(capacity, 0);
        let mut len = capacity;
        let status = self.engine.recv(id, buf, &mut len, flags.bits());
        if let Err(err) = check(&*self.engine, status) {
            buf.clear();
            if err.is_try_again() {
                return Ok(false);
            }
            return Err(err);
        }
        buf.truncate(len);
        Ok(len > 0)
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        // Best effort; a close failure has nowhere to go from a destructor.
        let _ = self.close();
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket").field("id", &self.id).finish()
    }
}
