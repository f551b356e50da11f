//! The narrow C-style boundary to the native transport engine.
//!
//! Everything the wrapper does ultimately lands on [`RawEngine`]: a fixed
//! table of call signatures returning raw integer statuses, with `&mut`
//! out-parameters where the engine populates a handle or a length. The
//! wrapper never looks inside a handle; it only moves ownership of them
//! across this boundary and translates statuses through
//! [`crate::error::check`].

use bytes::Bytes;
use std::ops::BitOr;
use std::sync::Arc;

use crate::aio::Completion;
use crate::error::ErrorCode;
use crate::protocol::Protocol;

pub mod loopback;

macro_rules! handle_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// The value 0 means "no handle".
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);

        impl $name {
            /// The absent handle.
            pub const NONE: Self = Self(0);

            /// True when no live native resource is referenced.
            #[must_use]
            pub fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::NONE
            }
        }
    };
}

handle_type!(
    /// Opaque identifier of a native socket.
    SocketId
);
handle_type!(
    /// Opaque identifier of a native message.
    MsgHandle
);
handle_type!(
    /// Opaque identifier of a native listener or dialer endpoint.
    EndpointId
);
handle_type!(
    /// Opaque identifier of the pipe a message traveled.
    PipeId
);

/// Flags passed through to engine send/receive/listen/dial calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(i32);

impl Flags {
    /// No flags: the engine decides, which usually means blocking.
    pub const NONE: Flags = Flags(0);

    /// Do not block; report try-again when nothing can be done right now.
    pub const NONBLOCK: Flags = Flags(1);

    /// Raw bit pattern handed to the engine.
    #[must_use]
    pub fn bits(self) -> i32 {
        self.0
    }

    /// Whether all bits of `other` are set.
    #[must_use]
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// The entity a get/set option call is addressed to.
///
/// The engine keeps separate option tables for sockets and for the two
/// endpoint kinds; the owner selects the table, the string name selects the
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptOwner {
    /// Options scoped to a socket
    Socket(SocketId),
    /// Options scoped to a listener endpoint
    Listener(EndpointId),
    /// Options scoped to a dialer endpoint
    Dialer(EndpointId),
}

/// The function table of the native transport engine.
///
/// Calls return 0 for success or a non-zero status from the engine's code
/// table (see [`ErrorCode`]). Implementations must be safe to call from
/// multiple threads; the wrapper adds no locking of its own.
///
/// Ownership rules at this boundary:
///
/// - `send_msg` takes ownership of the message handle only when it returns 0.
/// - `recv_msg` hands ownership of the populated handle to the caller only
///   when it returns 0; on failure the out-slot must be left untouched or
///   point at a handle the engine has already reclaimed.
/// - `msg_free` is always safe to call on a handle the caller owns and must
///   tolerate handles the engine no longer knows.
pub trait RawEngine: Send + Sync {
    /// One-time engine initialization. Idempotency is not required; the
    /// session layer guarantees at-most-once.
    fn init(&self) -> i32;

    /// Final engine teardown. The session layer guarantees exactly-once.
    fn fini(&self);

    /// Open a socket speaking `protocol`, populating `out` on success.
    fn socket_open(&self, protocol: Protocol, out: &mut SocketId) -> i32;

    /// Close a socket, releasing its native resources.
    fn close(&self, socket: SocketId) -> i32;

    /// Halt a socket's transfers without releasing its identifier.
    fn shutdown(&self, socket: SocketId) -> i32;

    /// Raw protocol number the socket speaks.
    fn protocol(&self, socket: SocketId) -> i32;

    /// Raw protocol number expected of the socket's peers.
    fn peer_protocol(&self, socket: SocketId) -> i32;

    /// Bind a passive endpoint at `addr`, populating `endpoint` on success.
    fn listen(
        &self,
        socket: SocketId,
        addr: &str,
        endpoint: Option<&mut EndpointId>,
        flags: i32,
    ) -> i32;

    /// Connect an active endpoint to `addr`, populating `endpoint` on
    /// success.
    fn dial(
        &self,
        socket: SocketId,
        addr: &str,
        endpoint: Option<&mut EndpointId>,
        flags: i32,
    ) -> i32;

    /// Send a raw buffer; the engine copies it, no handle semantics.
    fn send(&self, socket: SocketId, buf: &[u8], flags: i32) -> i32;

    /// Receive into a caller-sized buffer. On entry `len` is the buffer
    /// capacity; on success it is the effective received length.
    fn recv(&self, socket: SocketId, buf: &mut [u8], len: &mut usize, flags: i32) -> i32;

    /// Send a whole message, transferring handle ownership on success only.
    fn send_msg(&self, socket: SocketId, msg: MsgHandle, flags: i32) -> i32;

    /// Receive a whole message, populating `msg` with an owned handle on
    /// success.
    fn recv_msg(&self, socket: SocketId, msg: &mut MsgHandle, flags: i32) -> i32;

    /// Receive a whole message asynchronously. The completion fires exactly
    /// once, with an owned handle or a raw status; if the completion reports
    /// that it already fired, the engine keeps ownership and frees the
    /// handle itself.
    fn recv_msg_async(&self, socket: SocketId, completion: Arc<Completion>);

    /// Allocate a fresh message of `size` zero bytes.
    fn msg_alloc(&self, out: &mut MsgHandle, size: usize) -> i32;

    /// Free a message handle. Tolerates handles already reclaimed.
    fn msg_free(&self, msg: MsgHandle);

    /// Append bytes to a message body.
    fn msg_append(&self, msg: MsgHandle, body: &[u8]) -> i32;

    /// Remove `len` bytes from the front of a message body.
    fn msg_trim(&self, msg: MsgHandle, len: usize) -> i32;

    /// Current body length; 0 for unknown handles.
    fn msg_len(&self, msg: MsgHandle) -> usize;

    /// Copy of the message body; empty for unknown handles.
    fn msg_body(&self, msg: MsgHandle) -> Bytes;

    /// The pipe a received message traveled, or `PipeId::NONE`.
    fn msg_pipe(&self, msg: MsgHandle) -> PipeId;

    /// Close a pipe, disconnecting the path it stands for.
    fn pipe_close(&self, pipe: PipeId) -> i32;

    /// Set a raw-bytes option.
    fn set_opt(&self, owner: OptOwner, name: &str, value: &[u8]) -> i32;

    /// Set an integer option.
    fn set_opt_int(&self, owner: OptOwner, name: &str, value: i32) -> i32;

    /// Set a size option.
    fn set_opt_size(&self, owner: OptOwner, name: &str, value: usize) -> i32;

    /// Set a duration option in signed milliseconds (negative = infinite).
    fn set_opt_ms(&self, owner: OptOwner, name: &str, value: i64) -> i32;

    /// Get a raw-bytes option.
    fn get_opt(&self, owner: OptOwner, name: &str, out: &mut Vec<u8>) -> i32;

    /// Get an integer option.
    fn get_opt_int(&self, owner: OptOwner, name: &str, out: &mut i32) -> i32;

    /// Get a size option.
    fn get_opt_size(&self, owner: OptOwner, name: &str, out: &mut usize) -> i32;

    /// Get a duration option in signed milliseconds (negative = infinite).
    fn get_opt_ms(&self, owner: OptOwner, name: &str, out: &mut i64) -> i32;

    /// Human-readable description for a status code.
    fn strerror(&self, status: i32) -> String {
        ErrorCode::from_raw(status).description().to_string()
    }
}
