//! Exclusively owned binary message.
//!
//! A [`Message`] is the wrapper-side owner of at most one native message
//! handle. The two states are Empty (no handle) and Owned (exactly one live
//! handle); every operation below preserves that invariant, including all
//! failure paths. Ownership leaves a message only through a successful send
//! (see the socket layer) or an explicit [`Message::free`]; `Drop` releases
//! a still-held handle exactly once.

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use crate::engine::{MsgHandle, RawEngine};
use crate::error::{check, FerruleError, Result};
use crate::pipe::Pipe;

/// An exclusively owned, possibly empty message buffer.
pub struct Message {
    engine: Arc<dyn RawEngine>,
    handle: MsgHandle,
}

impl Message {
    /// Create an empty message bound to `engine`. No native resources are
    /// allocated until the first append or a receive populates it.
    #[must_use]
    pub fn new(engine: Arc<dyn RawEngine>) -> Self {
        Self {
            engine,
            handle: MsgHandle::NONE,
        }
    }

    /// Create a message whose body is a copy of `body`.
    pub fn with_body(engine: Arc<dyn RawEngine>, body: &[u8]) -> Result<Self> {
        let mut msg = Self::new(engine);
        msg.append(body)?;
        Ok(msg)
    }

    /// Whether this message currently owns a live native handle.
    #[must_use]
    pub fn has_handle(&self) -> bool {
        !self.handle.is_none()
    }

    /// The native handle, `MsgHandle::NONE` when Empty. The message remains
    /// the owner; use [`Message::adopt`] / [`Message::release_to_transport`]
    /// to move ownership.
    #[must_use]
    pub fn handle(&self) -> MsgHandle {
        self.handle
    }

    /// Body length in bytes; 0 when Empty.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.handle.is_none() {
            0
        } else {
            self.engine.msg_len(self.handle)
        }
    }

    /// True when the logical body holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the body bytes; empty when Empty.
    #[must_use]
    pub fn body(&self) -> Bytes {
        if self.handle.is_none() {
            Bytes::new()
        } else {
            self.engine.msg_body(self.handle)
        }
    }

    /// Append bytes to the body, allocating the native handle on first use.
    ///
    /// If the handle was allocated by this very call and the append then
    /// fails, the fresh handle is freed before the failure is returned, so
    /// the message is back in the Empty state.
    pub fn append(&mut self, body: &[u8]) -> Result<()> {
        let allocated_here = self.handle.is_none();
        if allocated_here {
            let mut handle = MsgHandle::NONE;
            let status = self.engine.msg_alloc(&mut handle, 0);
            check(&*self.engine, status)?;
            self.handle = handle;
        }
        let status = self.engine.msg_append(self.handle, body);
        if let Err(err) = check(&*self.engine, status) {
            if allocated_here {
                self.free();
            }
            return Err(err);
        }
        Ok(())
    }

    /// Consume `len` bytes from the front of the body.
    pub fn trim(&mut self, len: usize) -> Result<()> {
        if self.handle.is_none() {
            return Err(FerruleError::InvalidState("message holds no handle"));
        }
        let status = self.engine.msg_trim(self.handle, len);
        check(&*self.engine, status)
    }

    /// Snapshot of the pipe this message traveled, if it was received.
    ///
    /// The snapshot is plain data: it does not keep the message alive and
    /// stops meaning anything once this message's handle changes owner or
    /// is released.
    #[must_use]
    pub fn pipe(&self) -> Option<Pipe> {
        if self.handle.is_none() {
            return None;
        }
        let pipe = self.engine.msg_pipe(self.handle);
        if pipe.is_none() {
            None
        } else {
            Some(Pipe::new(self.engine.clone(), pipe))
        }
    }

    /// Take ownership of `handle`, releasing any handle currently held
    /// first. The caller must actually own `handle`; after this call the
    /// message does.
    pub fn adopt(&mut self, handle: MsgHandle) {
        self.free();
        self.handle = handle;
    }

    /// Forget the handle without freeing it.
    ///
    /// Only correct immediately after a native call that took ownership
    /// reported success; the socket layer calls this after a successful
    /// whole-message send and never before.
    pub fn release_to_transport(&mut self) {
        self.handle = MsgHandle::NONE;
    }

    /// Release the native handle now. Safe to call in any state; the
    /// message ends up Empty either way.
    pub fn free(&mut self) {
        if !self.handle.is_none() {
            self.engine.msg_free(self.handle);
            self.handle = MsgHandle::NONE;
        }
    }
}

impl Drop for Message {
    fn drop(&mut self) {
        self.free();
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("handle", &self.handle)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::loopback::LoopbackEngine;

    fn engine() -> (LoopbackEngine, Arc<dyn RawEngine>) {
        let loopback = LoopbackEngine::new();
        let shared: Arc<dyn RawEngine> = Arc::new(loopback.clone());
        (loopback, shared)
    }

    #[test]
    fn starts_empty_and_owns_after_append() {
        let (probe, shared) = engine();
        let mut msg = Message::new(shared);
        assert!(!msg.has_handle());
        assert_eq!(msg.body(), Bytes::new());

        msg.append(b"hello").unwrap();
        assert!(msg.has_handle());
        assert_eq!(msg.body().as_ref(), b"hello");
        assert_eq!(probe.live_messages(), 1);
    }

    #[test]
    fn append_extends_and_trim_consumes() {
        let (_, shared) = engine();
        let mut msg = Message::with_body(shared, b"head").unwrap();
        msg.append(b"-tail").unwrap();
        assert_eq!(msg.body().as_ref(), b"head-tail");

        msg.trim(5).unwrap();
        assert_eq!(msg.body().as_ref(), b"tail");
        assert_eq!(msg.len(), 4);
    }

    #[test]
    fn trim_on_empty_message_is_invalid_state() {
        let (_, shared) = engine();
        let mut msg = Message::new(shared);
        assert!(matches!(
            msg.trim(1),
            Err(FerruleError::InvalidState(_))
        ));
    }

    #[test]
    fn free_is_idempotent() {
        let (probe, shared) = engine();
        let mut msg = Message::with_body(shared, b"x").unwrap();
        msg.free();
        msg.free();
        assert!(!msg.has_handle());
        assert_eq!(probe.live_messages(), 0);
    }

    #[test]
    fn drop_releases_the_handle() {
        let (probe, shared) = engine();
        {
            let _msg = Message::with_body(shared, b"scoped").unwrap();
            assert_eq!(probe.live_messages(), 1);
        }
        assert_eq!(probe.live_messages(), 0);
    }

    #[test]
    fn adopt_frees_the_previous_handle() {
        let (probe, shared) = engine();
        let mut replacement = MsgHandle::NONE;
        assert_eq!(shared.msg_alloc(&mut replacement, 0), 0);

        let mut msg = Message::with_body(shared, b"old").unwrap();
        assert_eq!(probe.live_messages(), 2);

        msg.adopt(replacement);
        assert_eq!(probe.live_messages(), 1);
        assert_eq!(msg.handle(), replacement);
    }

    #[test]
    fn release_to_transport_does_not_free() {
        let (probe, shared) = engine();
        let mut msg = Message::with_body(shared.clone(), b"moved").unwrap();
        let handle = msg.handle();

        msg.release_to_transport();
        assert!(!msg.has_handle());
        assert_eq!(probe.live_messages(), 1);

        // Still alive on the engine side; reclaim it by hand.
        shared.msg_free(handle);
        assert_eq!(probe.live_messages(), 0);
    }

    #[test]
    fn unsent_message_has_no_pipe() {
        let (_, shared) = engine();
        let msg = Message::with_body(shared, b"local").unwrap();
        assert!(msg.pipe().is_none());
    }
}
