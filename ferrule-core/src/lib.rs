//! Ferrule Core
//!
//! This crate contains the leaf building blocks of the Ferrule wrapper:
//! - The C-style function-table boundary to the native engine (`engine`),
//!   plus an in-memory loopback implementation for tests and demos
//! - Native status translation into typed errors (`error`)
//! - The exclusively owned binary message and its ownership rules (`message`)
//! - Weak pipe snapshots derived from received messages (`pipe`)
//! - The generic option table binder (`options`)
//! - The one-shot completion latch for asynchronous receives (`aio`)
//! - Protocol tags (`protocol`)
//!
//! The socket, endpoint and session layers live in the `ferrule` crate.

#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(missing_docs)]

pub mod aio;
pub mod engine;
pub mod error;
pub mod message;
pub mod options;
pub mod pipe;
pub mod protocol;

// Minimal prelude for downstream crates; kept small to avoid API lock-in.
pub mod prelude {
    //! Common imports.
    pub use crate::aio::{Completion, RawOutcome};
    pub use crate::engine::loopback::LoopbackEngine;
    pub use crate::engine::{EndpointId, Flags, MsgHandle, OptOwner, PipeId, RawEngine, SocketId};
    pub use crate::error::{ErrorCode, FerruleError, Result};
    pub use crate::message::Message;
    pub use crate::options::Options;
    pub use crate::pipe::Pipe;
    pub use crate::protocol::Protocol;
}
