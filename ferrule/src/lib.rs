//! # Ferrule
//!
//! A safety-oriented wrapper over a native message-transport engine.
//!
//! ## Architecture
//!
//! Ferrule is structured as a thin façade with clean layering:
//!
//! - **`ferrule-core`**: The C-style engine boundary, error translation,
//!   exclusively owned messages, the option table binder and a loopback
//!   engine for tests
//! - **`ferrule`**: Sockets, listeners, dialers and sessions (this crate)
//!
//! All state the native engine hands out is tracked by Rust types with
//! single-owner semantics: a [`Message`] frees its native buffer exactly
//! once, a successful send transfers ownership to the transport, and a
//! failed send leaves the caller holding the message.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ferrule::prelude::*;
//!
//! # fn main() -> ferrule::Result<()> {
//! let session = Session::new(Arc::new(LoopbackEngine::new()))?;
//!
//! let server = session.pair()?;
//! let mut listener = Listener::new();
//! server.listen_with("inproc://demo-*", &mut listener, Flags::NONE)?;
//!
//! let client = session.pair()?;
//! client.dial(&listener.local_address()?, Flags::NONE)?;
//!
//! client.send(b"hello", Flags::NONE)?;
//! let reply = server.recv_msg(Flags::NONE)?;
//! assert_eq!(&reply.body()[..], b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! - No `unsafe` code; the native boundary is a trait over raw status codes
//! - Every native handle has exactly one owning Rust value
//! - Failed operations never leak partially acquired native state

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export core types
pub use bytes::Bytes;

pub mod dev_tracing;
pub mod endpoint;
pub mod session;
pub mod socket;

pub use endpoint::{Dialer, Listener};
pub use session::Session;
pub use socket::{Receiver, Sender, Socket};

pub use ferrule_core::aio::{Completion, RawOutcome};
pub use ferrule_core::engine::loopback::LoopbackEngine;
pub use ferrule_core::engine::{
    EndpointId, Flags, MsgHandle, OptOwner, PipeId, RawEngine, SocketId,
};
pub use ferrule_core::error::{ErrorCode, FerruleError, Result};
pub use ferrule_core::message::Message;
pub use ferrule_core::options::{names as option_names, Options};
pub use ferrule_core::pipe::Pipe;
pub use ferrule_core::protocol::Protocol;

/// Common imports for wrapper users.
pub mod prelude {
    pub use crate::endpoint::{Dialer, Listener};
    pub use crate::session::Session;
    pub use crate::socket::{Receiver, Sender, Socket};
    pub use ferrule_core::prelude::*;
}
