//! In-memory engine speaking the [`RawEngine`] function table.
//!
//! Sockets live in a process-global style registry of handle tables; a dial
//! matches a listen by exact address and installs a pair of directed queues
//! (one pipe). Delivery fans out round-robin over connected pipes. This is
//! the collaborator the test suite and demos run against; it deliberately
//! skips wire encoding, reconnection and per-protocol state machines.
//!
//! Simplifications, all visible to callers as ordinary statuses:
//!
//! - a send with no connected peer reports try-again instead of queueing,
//! - an oversized buffer receive truncates to the declared capacity,
//! - subscriber sockets receive everything (no topic filtering).

use bytes::Bytes;
use dashmap::DashMap;
use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::aio::Completion;
use crate::engine::{EndpointId, Flags, MsgHandle, OptOwner, PipeId, RawEngine, SocketId};
use crate::error::{ErrorCode, OK};
use crate::options::names;
use crate::protocol::Protocol;

/// A typed option value in an engine-side option table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OptValue {
    Raw(Vec<u8>),
    Int(i32),
    Size(usize),
    Ms(i64),
}

struct MsgEntry {
    body: Vec<u8>,
    pipe: PipeId,
}

struct OutboundLink {
    pipe: PipeId,
    tx: Sender<MsgHandle>,
}

struct SocketEntry {
    protocol: Protocol,
    queue_tx: Sender<MsgHandle>,
    queue_rx: Receiver<MsgHandle>,
    outbound: Mutex<Vec<OutboundLink>>,
    round_robin: AtomicUsize,
    options: Mutex<HashMap<String, OptValue>>,
    shut_down: AtomicBool,
}

enum EndpointKind {
    Listener,
    Dialer,
}

struct EndpointEntry {
    socket: SocketId,
    kind: EndpointKind,
    options: Mutex<HashMap<String, OptValue>>,
}

struct Inner {
    next_handle: AtomicU64,
    next_port: AtomicU64,
    sockets: DashMap<u64, Arc<SocketEntry>>,
    messages: DashMap<u64, MsgEntry>,
    endpoints: DashMap<u64, EndpointEntry>,
    /// address -> listening socket
    registry: DashMap<String, SocketId>,
    live_messages: AtomicUsize,
    init_calls: AtomicUsize,
    fini_calls: AtomicUsize,
}

/// In-memory implementation of the engine function table.
#[derive(Clone)]
pub struct LoopbackEngine {
    inner: Arc<Inner>,
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackEngine {
    /// Create a fresh engine with empty handle tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_handle: AtomicU64::new(1),
                next_port: AtomicU64::new(40_000),
                sockets: DashMap::new(),
                messages: DashMap::new(),
                endpoints: DashMap::new(),
                registry: DashMap::new(),
                live_messages: AtomicUsize::new(0),
                init_calls: AtomicUsize::new(0),
                fini_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// A process-wide shared instance, convenient for demos.
    ///
    /// Tests that rely on the probes below should create their own engine
    /// instead, so counts are not shared across test threads.
    #[must_use]
    pub fn shared() -> LoopbackEngine {
        static SHARED: Lazy<LoopbackEngine> = Lazy::new(LoopbackEngine::new);
        SHARED.clone()
    }

    /// Number of message handles currently alive, including queued ones.
    #[must_use]
    pub fn live_messages(&self) -> usize {
        self.inner.live_messages.load(Ordering::SeqCst)
    }

    /// Number of times `init` ran.
    #[must_use]
    pub fn init_calls(&self) -> usize {
        self.inner.init_calls.load(Ordering::SeqCst)
    }

    /// Number of times `fini` ran.
    #[must_use]
    pub fn fini_calls(&self) -> usize {
        self.inner.fini_calls.load(Ordering::SeqCst)
    }
}

impl Inner {
    fn alloc_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    fn socket(&self, id: SocketId) -> Option<Arc<SocketEntry>> {
        self.sockets.get(&id.0).map(|entry| entry.clone())
    }

    fn new_message(&self, body: Vec<u8>) -> MsgHandle {
        let handle = self.alloc_handle();
        self.messages.insert(
            handle,
            MsgEntry {
                body,
                pipe: PipeId::NONE,
            },
        );
        self.live_messages.fetch_add(1, Ordering::SeqCst);
        MsgHandle(handle)
    }

    fn free_message(&self, msg: MsgHandle) {
        if self.messages.remove(&msg.0).is_some() {
            self.live_messages.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn recv_timeout_ms(&self, entry: &SocketEntry) -> i64 {
        match entry.options.lock().get(names::RECV_TIMEOUT) {
            Some(OptValue::Ms(ms)) => *ms,
            _ => -1,
        }
    }

    /// Pull one message handle off a socket queue, honoring flags and the
    /// socket's receive timeout.
    fn dequeue(&self, entry: &SocketEntry, flags: i32) -> Result<MsgHandle, i32> {
        if entry.shut_down.load(Ordering::SeqCst) {
            return Err(ErrorCode::Closed.raw());
        }
        if Flags(flags).contains(Flags::NONBLOCK) {
            return match entry.queue_rx.try_recv() {
                Ok(handle) => Ok(handle),
                Err(TryRecvError::Empty) => Err(ErrorCode::TryAgain.raw()),
                Err(TryRecvError::Disconnected) => Err(ErrorCode::Closed.raw()),
            };
        }
        match self.recv_timeout_ms(entry) {
            ms if ms < 0 => entry
                .queue_rx
                .recv()
                .map_err(|_| ErrorCode::Closed.raw()),
            0 => match entry.queue_rx.try_recv() {
                Ok(handle) => Ok(handle),
                Err(TryRecvError::Empty) => Err(ErrorCode::TryAgain.raw()),
                Err(TryRecvError::Disconnected) => Err(ErrorCode::Closed.raw()),
            },
            ms => match entry
                .queue_rx
                .recv_timeout(Duration::from_millis(ms as u64))
            {
                Ok(handle) => Ok(handle),
                Err(RecvTimeoutError::Timeout) => Err(ErrorCode::TimedOut.raw()),
                Err(RecvTimeoutError::Disconnected) => Err(ErrorCode::Closed.raw()),
            },
        }
    }

    /// Hand a message handle to the next connected peer, round-robin.
    /// Ownership of the handle moves only when this returns `OK`.
    fn deliver(&self, entry: &SocketEntry, msg: MsgHandle) -> i32 {
        if entry.shut_down.load(Ordering::SeqCst) {
            return ErrorCode::Closed.raw();
        }
        let mut outbound = entry.outbound.lock();
        while !outbound.is_empty() {
            let index = entry.round_robin.fetch_add(1, Ordering::Relaxed) % outbound.len();
            let link = &outbound[index];
            if let Some(mut msg_entry) = self.messages.get_mut(&msg.0) {
                msg_entry.pipe = link.pipe;
            }
            if link.tx.send(msg).is_ok() {
                return OK;
            }
            // Peer went away; drop the dead link and try the rest.
            outbound.remove(index);
        }
        ErrorCode::TryAgain.raw()
    }

    fn with_opts<R>(
        &self,
        owner: OptOwner,
        f: impl FnOnce(&mut HashMap<String, OptValue>) -> R,
    ) -> Result<R, i32> {
        match owner {
            OptOwner::Socket(id) => match self.socket(id) {
                Some(entry) => Ok(f(&mut entry.options.lock())),
                None => Err(ErrorCode::Closed.raw()),
            },
            OptOwner::Listener(id) => match self.endpoints.get(&id.0) {
                Some(entry) if matches!(entry.kind, EndpointKind::Listener) => {
                    Ok(f(&mut entry.options.lock()))
                }
                Some(_) => Err(ErrorCode::BadType.raw()),
                None => Err(ErrorCode::Closed.raw()),
            },
            OptOwner::Dialer(id) => match self.endpoints.get(&id.0) {
                Some(entry) if matches!(entry.kind, EndpointKind::Dialer) => {
                    Ok(f(&mut entry.options.lock()))
                }
                Some(_) => Err(ErrorCode::BadType.raw()),
                None => Err(ErrorCode::Closed.raw()),
            },
        }
    }

    fn set_value(&self, owner: OptOwner, name: &str, value: OptValue) -> i32 {
        if name == names::LOCAL_ADDRESS || name == names::REMOTE_ADDRESS {
            return ErrorCode::ReadOnly.raw();
        }
        match self.with_opts(owner, |opts| {
            opts.insert(name.to_string(), value);
        }) {
            Ok(()) => OK,
            Err(status) => status,
        }
    }

    fn get_value(&self, owner: OptOwner, name: &str) -> Result<OptValue, i32> {
        match self.with_opts(owner, |opts| opts.get(name).cloned()) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(ErrorCode::NotFound.raw()),
            Err(status) => Err(status),
        }
    }
}

/// The peer protocol a socket expects on the other end of a pipe.
fn peer_of(protocol: Protocol) -> Protocol {
    match protocol {
        Protocol::Unspecified => Protocol::Unspecified,
        Protocol::Pair0 => Protocol::Pair0,
        Protocol::Pair1 => Protocol::Pair1,
        Protocol::Pub0 => Protocol::Sub0,
        Protocol::Sub0 => Protocol::Pub0,
        Protocol::Req0 => Protocol::Rep0,
        Protocol::Rep0 => Protocol::Req0,
        Protocol::Push0 => Protocol::Pull0,
        Protocol::Pull0 => Protocol::Push0,
        Protocol::Surveyor0 => Protocol::Respondent0,
        Protocol::Respondent0 => Protocol::Surveyor0,
        Protocol::Bus0 => Protocol::Bus0,
    }
}

fn valid_address(addr: &str) -> bool {
    match addr.split_once("://") {
        Some((scheme, rest)) => !scheme.is_empty() && !rest.is_empty(),
        None => false,
    }
}

impl RawEngine for LoopbackEngine {
    fn init(&self) -> i32 {
        self.inner.init_calls.fetch_add(1, Ordering::SeqCst);
        debug!("loopback engine initialized");
        OK
    }

    fn fini(&self) {
        self.inner.fini_calls.fetch_add(1, Ordering::SeqCst);
        debug!("loopback engine torn down");
    }

    fn socket_open(&self, protocol: Protocol, out: &mut SocketId) -> i32 {
        if protocol == Protocol::Unspecified {
            return ErrorCode::InvalidArgument.raw();
        }
        let id = self.inner.alloc_handle();
        let (queue_tx, queue_rx) = flume::unbounded();
        let mut options = HashMap::new();
        options.insert(names::RECV_TIMEOUT.to_string(), OptValue::Ms(-1));
        options.insert(names::SEND_TIMEOUT.to_string(), OptValue::Ms(-1));
        options.insert(
            names::SOCKET_NAME.to_string(),
            OptValue::Raw(id.to_string().into_bytes()),
        );
        self.inner.sockets.insert(
            id,
            Arc::new(SocketEntry {
                protocol,
                queue_tx,
                queue_rx,
                outbound: Mutex::new(Vec::new()),
                round_robin: AtomicUsize::new(0),
                options: Mutex::new(options),
                shut_down: AtomicBool::new(false),
            }),
        );
        *out = SocketId(id);
        trace!(socket = id, %protocol, "socket opened");
        OK
    }

    fn close(&self, socket: SocketId) -> i32 {
        let Some((_, entry)) = self.inner.sockets.remove(&socket.0) else {
            return ErrorCode::Closed.raw();
        };
        self.inner.registry.retain(|_, owner| *owner != socket);
        self.inner
            .endpoints
            .retain(|_, endpoint| endpoint.socket != socket);
        // Free anything still queued so nothing leaks with the queue.
        while let Ok(handle) = entry.queue_rx.try_recv() {
            self.inner.free_message(handle);
        }
        trace!(socket = socket.0, "socket closed");
        OK
    }

    fn shutdown(&self, socket: SocketId) -> i32 {
        match self.inner.socket(socket) {
            Some(entry) => {
                entry.shut_down.store(true, Ordering::SeqCst);
                OK
            }
            None => ErrorCode::Closed.raw(),
        }
    }

    fn protocol(&self, socket: SocketId) -> i32 {
        self.inner
            .socket(socket)
            .map_or(0, |entry| entry.protocol.raw())
    }

    fn peer_protocol(&self, socket: SocketId) -> i32 {
        self.inner
            .socket(socket)
            .map_or(0, |entry| peer_of(entry.protocol).raw())
    }

    fn listen(
        &self,
        socket: SocketId,
        addr: &str,
        endpoint: Option<&mut EndpointId>,
        _flags: i32,
    ) -> i32 {
        if self.inner.socket(socket).is_none() {
            return ErrorCode::Closed.raw();
        }
        if !valid_address(addr) {
            return ErrorCode::AddressInvalid.raw();
        }
        let resolved = if addr.contains('*') {
            let port = self.inner.next_port.fetch_add(1, Ordering::SeqCst);
            addr.replacen('*', &port.to_string(), 1)
        } else {
            addr.to_string()
        };
        if self.inner.registry.contains_key(&resolved) {
            return ErrorCode::AddressInUse.raw();
        }

        let id = self.inner.alloc_handle();
        let mut options = HashMap::new();
        options.insert(
            names::LOCAL_ADDRESS.to_string(),
            OptValue::Raw(resolved.clone().into_bytes()),
        );
        self.inner.endpoints.insert(
            id,
            EndpointEntry {
                socket,
                kind: EndpointKind::Listener,
                options: Mutex::new(options),
            },
        );
        self.inner.registry.insert(resolved.clone(), socket);
        if let Some(out) = endpoint {
            *out = EndpointId(id);
        }
        debug!(socket = socket.0, address = %resolved, "listening");
        OK
    }

    fn dial(
        &self,
        socket: SocketId,
        addr: &str,
        endpoint: Option<&mut EndpointId>,
        _flags: i32,
    ) -> i32 {
        let Some(entry) = self.inner.socket(socket) else {
            return ErrorCode::Closed.raw();
        };
        if !valid_address(addr) || addr.contains('*') {
            return ErrorCode::AddressInvalid.raw();
        }
        let Some(peer_id) = self.inner.registry.get(addr).map(|owner| *owner) else {
            return ErrorCode::ConnectionRefused.raw();
        };
        let Some(peer) = self.inner.socket(peer_id) else {
            return ErrorCode::ConnectionRefused.raw();
        };
        if !entry.protocol.compatible_with(peer.protocol) {
            return ErrorCode::ProtocolError.raw();
        }

        let pipe = PipeId(self.inner.alloc_handle());
        entry.outbound.lock().push(OutboundLink {
            pipe,
            tx: peer.queue_tx.clone(),
        });
        peer.outbound.lock().push(OutboundLink {
            pipe,
            tx: entry.queue_tx.clone(),
        });

        let id = self.inner.alloc_handle();
        let mut options = HashMap::new();
        options.insert(
            names::REMOTE_ADDRESS.to_string(),
            OptValue::Raw(addr.as_bytes().to_vec()),
        );
        self.inner.endpoints.insert(
            id,
            EndpointEntry {
                socket,
                kind: EndpointKind::Dialer,
                options: Mutex::new(options),
            },
        );
        if let Some(out) = endpoint {
            *out = EndpointId(id);
        }
        debug!(socket = socket.0, address = %addr, pipe = pipe.0, "dialed");
        OK
    }

    fn send(&self, socket: SocketId, buf: &[u8], flags: i32) -> i32 {
        let Some(entry) = self.inner.socket(socket) else {
            return ErrorCode::Closed.raw();
        };
        let msg = self.inner.new_message(buf.to_vec());
        let status = self.inner.deliver(&entry, msg);
        if status != OK {
            // The copy never left the wrapper-side tables; reclaim it.
            self.inner.free_message(msg);
        }
        let _ = flags;
        status
    }

    fn recv(&self, socket: SocketId, buf: &mut [u8], len: &mut usize, flags: i32) -> i32 {
        let Some(entry) = self.inner.socket(socket) else {
            return ErrorCode::Closed.raw();
        };
        match self.inner.dequeue(&entry, flags) {
            Ok(handle) => {
                let copied = match self.inner.messages.get(&handle.0) {
                    Some(msg) => {
                        let n = msg.body.len().min(*len);
                        buf[..n].copy_from_slice(&msg.body[..n]);
                        n
                    }
                    None => 0,
                };
                self.inner.free_message(handle);
                *len = copied;
                OK
            }
            Err(status) => status,
        }
    }

    fn send_msg(&self, socket: SocketId, msg: MsgHandle, flags: i32) -> i32 {
        let Some(entry) = self.inner.socket(socket) else {
            return ErrorCode::Closed.raw();
        };
        if !self.inner.messages.contains_key(&msg.0) {
            return ErrorCode::InvalidArgument.raw();
        }
        let _ = flags;
        self.inner.deliver(&entry, msg)
    }

    fn recv_msg(&self, socket: SocketId, msg: &mut MsgHandle, flags: i32) -> i32 {
        let Some(entry) = self.inner.socket(socket) else {
            return ErrorCode::Closed.raw();
        };
        match self.inner.dequeue(&entry, flags) {
            Ok(handle) => {
                *msg = handle;
                OK
            }
            Err(status) => status,
        }
    }

    fn recv_msg_async(&self, socket: SocketId, completion: Arc<Completion>) {
        let Some(entry) = self.inner.socket(socket) else {
            completion.complete(Err(ErrorCode::Closed.raw()));
            return;
        };
        let inner = self.inner.clone();
        let timeout_ms = self.inner.recv_timeout_ms(&entry);
        let rx = entry.queue_rx.clone();
        std::thread::spawn(move || {
            let outcome = if timeout_ms < 0 {
                rx.recv().map_err(|_| ErrorCode::Closed.raw())
            } else {
                match rx.recv_timeout(Duration::from_millis(timeout_ms as u64)) {
                    Ok(handle) => Ok(handle),
                    Err(RecvTimeoutError::Timeout) => Err(ErrorCode::TimedOut.raw()),
                    Err(RecvTimeoutError::Disconnected) => Err(ErrorCode::Closed.raw()),
                }
            };
            let delivered_handle = outcome.ok();
            if !completion.complete(outcome) {
                // A cancellation won the race; the handle stays ours.
                if let Some(handle) = delivered_handle {
                    inner.free_message(handle);
                }
            }
        });
    }

    fn msg_alloc(&self, out: &mut MsgHandle, size: usize) -> i32 {
        *out = self.inner.new_message(vec![0; size]);
        OK
    }

    fn msg_free(&self, msg: MsgHandle) {
        self.inner.free_message(msg);
    }

    fn msg_append(&self, msg: MsgHandle, body: &[u8]) -> i32 {
        match self.inner.messages.get_mut(&msg.0) {
            Some(mut entry) => {
                entry.body.extend_from_slice(body);
                OK
            }
            None => ErrorCode::InvalidArgument.raw(),
        }
    }

    fn msg_trim(&self, msg: MsgHandle, len: usize) -> i32 {
        match self.inner.messages.get_mut(&msg.0) {
            Some(mut entry) => {
                if len > entry.body.len() {
                    return ErrorCode::InvalidArgument.raw();
                }
                entry.body.drain(..len);
                OK
            }
            None => ErrorCode::InvalidArgument.raw(),
        }
    }

    fn msg_len(&self, msg: MsgHandle) -> usize {
        self.inner
            .messages
            .get(&msg.0)
            .map_or(0, |entry| entry.body.len())
    }

    fn msg_body(&self, msg: MsgHandle) -> Bytes {
        self.inner
            .messages
            .get(&msg.0)
            .map_or_else(Bytes::new, |entry| Bytes::copy_from_slice(&entry.body))
    }

    fn msg_pipe(&self, msg: MsgHandle) -> PipeId {
        self.inner
            .messages
            .get(&msg.0)
            .map_or(PipeId::NONE, |entry| entry.pipe)
    }

    fn pipe_close(&self, pipe: PipeId) -> i32 {
        if pipe.is_none() {
            return ErrorCode::NotFound.raw();
        }
        let mut removed = false;
        for socket in self.inner.sockets.iter() {
            let mut outbound = socket.outbound.lock();
            let before = outbound.len();
            outbound.retain(|link| link.pipe != pipe);
            removed |= outbound.len() != before;
        }
        if removed {
            trace!(pipe = pipe.0, "pipe closed");
            OK
        } else {
            ErrorCode::NotFound.raw()
        }
    }

    fn set_opt(&self, owner: OptOwner, name: &str, value: &[u8]) -> i32 {
        self.inner
            .set_value(owner, name, OptValue::Raw(value.to_vec()))
    }

    fn set_opt_int(&self, owner: OptOwner, name: &str, value: i32) -> i32 {
        self.inner.set_value(owner, name, OptValue::Int(value))
    }

    fn set_opt_size(&self, owner: OptOwner, name: &str, value: usize) -> i32 {
        self.inner.set_value(owner, name, OptValue::Size(value))
    }

    fn set_opt_ms(&self, owner: OptOwner, name: &str, value: i64) -> i32 {
        self.inner.set_value(owner, name, OptValue::Ms(value))
    }

    fn get_opt(&self, owner: OptOwner, name: &str, out: &mut Vec<u8>) -> i32 {
        match self.inner.get_value(owner, name) {
            Ok(OptValue::Raw(value)) => {
                *out = value;
                OK
            }
            Ok(_) => ErrorCode::BadType.raw(),
            Err(status) => status,
        }
    }

    fn get_opt_int(&self, owner: OptOwner, name: &str, out: &mut i32) -> i32 {
        match self.inner.get_value(owner, name) {
            Ok(OptValue::Int(value)) => {
                *out = value;
                OK
            }
            Ok(_) => ErrorCode::BadType.raw(),
            Err(status) => status,
        }
    }

    fn get_opt_size(&self, owner: OptOwner, name: &str, out: &mut usize) -> i32 {
        match self.inner.get_value(owner, name) {
            Ok(OptValue::Size(value)) => {
                *out = value;
                OK
            }
            Ok(_) => ErrorCode::BadType.raw(),
            Err(status) => status,
        }
    }

    fn get_opt_ms(&self, owner: OptOwner, name: &str, out: &mut i64) -> i32 {
        match self.inner.get_value(owner, name) {
            Ok(OptValue::Ms(value)) => {
                *out = value;
                OK
            }
            Ok(_) => ErrorCode::BadType.raw(),
            Err(status) => status,
        }
    }
}

impl std::fmt::Debug for LoopbackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackEngine")
            .field("sockets", &self.inner.sockets.len())
            .field("live_messages", &self.live_messages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(engine: &LoopbackEngine, protocol: Protocol) -> SocketId {
        let mut id = SocketId::NONE;
        assert_eq!(engine.socket_open(protocol, &mut id), OK);
        id
    }

    #[test]
    fn wildcard_listen_resolves_to_concrete_address() {
        let engine = LoopbackEngine::new();
        let listener = open(&engine, Protocol::Pull0);
        let dialer = open(&engine, Protocol::Push0);

        let mut endpoint = EndpointId::NONE;
        assert_eq!(
            engine.listen(listener, "tcp://127.0.0.1:*", Some(&mut endpoint), 0),
            OK
        );

        let mut resolved = Vec::new();
        assert_eq!(
            engine.get_opt(
                OptOwner::Listener(endpoint),
                names::LOCAL_ADDRESS,
                &mut resolved
            ),
            OK
        );
        let resolved = String::from_utf8(resolved).unwrap();
        assert!(!resolved.contains('*'));
        assert_eq!(engine.dial(dialer, &resolved, None, 0), OK);
    }

    #[test]
    fn dialing_a_wildcard_is_address_invalid() {
        let engine = LoopbackEngine::new();
        let socket = open(&engine, Protocol::Push0);
        assert_eq!(
            engine.dial(socket, "tcp://127.0.0.1:*", None, 0),
            ErrorCode::AddressInvalid.raw()
        );
    }

    #[test]
    fn duplicate_listen_is_address_in_use() {
        let engine = LoopbackEngine::new();
        let a = open(&engine, Protocol::Pull0);
        let b = open(&engine, Protocol::Pull0);
        assert_eq!(engine.listen(a, "inproc://dup", None, 0), OK);
        assert_eq!(
            engine.listen(b, "inproc://dup", None, 0),
            ErrorCode::AddressInUse.raw()
        );
    }

    #[test]
    fn incompatible_protocols_cannot_connect() {
        let engine = LoopbackEngine::new();
        let publisher = open(&engine, Protocol::Pub0);
        let puller = open(&engine, Protocol::Pull0);
        assert_eq!(engine.listen(publisher, "inproc://mismatch", None, 0), OK);
        assert_eq!(
            engine.dial(puller, "inproc://mismatch", None, 0),
            ErrorCode::ProtocolError.raw()
        );
    }

    #[test]
    fn send_without_peer_is_try_again_and_leaks_nothing() {
        let engine = LoopbackEngine::new();
        let socket = open(&engine, Protocol::Push0);
        assert_eq!(
            engine.send(socket, b"orphan", Flags::NONBLOCK.bits()),
            ErrorCode::TryAgain.raw()
        );
        assert_eq!(engine.live_messages(), 0);
    }

    #[test]
    fn queued_messages_are_reclaimed_on_close() {
        let engine = LoopbackEngine::new();
        let rx = open(&engine, Protocol::Pair1);
        let tx = open(&engine, Protocol::Pair1);
        assert_eq!(engine.listen(rx, "inproc://reclaim", None, 0), OK);
        assert_eq!(engine.dial(tx, "inproc://reclaim", None, 0), OK);
        assert_eq!(engine.send(tx, b"queued", 0), OK);
        assert_eq!(engine.live_messages(), 1);

        assert_eq!(engine.close(rx), OK);
        assert_eq!(engine.live_messages(), 0);
    }

    #[test]
    fn shutdown_keeps_the_socket_queryable() {
        let engine = LoopbackEngine::new();
        let socket = open(&engine, Protocol::Rep0);
        assert_eq!(engine.shutdown(socket), OK);
        assert_eq!(engine.protocol(socket), Protocol::Rep0.raw());
        assert_eq!(
            engine.send(socket, b"late", 0),
            ErrorCode::Closed.raw()
        );
    }

    #[test]
    fn close_twice_reports_closed() {
        let engine = LoopbackEngine::new();
        let socket = open(&engine, Protocol::Bus0);
        assert_eq!(engine.close(socket), OK);
        assert_eq!(engine.close(socket), ErrorCode::Closed.raw());
    }
}
