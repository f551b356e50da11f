//! Generic key/value option binding.
//!
//! Every configurable entity (socket, listener, dialer) carries an
//! [`Options`] table: eight late-bound function slots, a setter and a getter
//! for each of the four value categories the engine understands (raw bytes,
//! integer, size, duration). The slots close over the owning entity's
//! current native identifier and are rebound wholesale whenever that
//! identifier changes; while unbound, every accessor fails with an
//! invalid-state error instead of touching an absent handle.
//!
//! Durations cross the native boundary as signed milliseconds (negative
//! means infinite) and are exposed here as `Option<Duration>`, `None` being
//! infinite. The conversion round-trips exactly for integral milliseconds.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{OptOwner, RawEngine};
use crate::error::{check, FerruleError, Result};

/// Stable, engine-defined option names.
pub mod names {
    /// Receive timeout, duration category.
    pub const RECV_TIMEOUT: &str = "recv-timeout";
    /// Send timeout, duration category.
    pub const SEND_TIMEOUT: &str = "send-timeout";
    /// Receive buffer depth, integer category.
    pub const RECV_BUFFER: &str = "recv-buffer";
    /// Send buffer depth, integer category.
    pub const SEND_BUFFER: &str = "send-buffer";
    /// Largest receivable message, size category.
    pub const RECV_MAX_SIZE: &str = "recv-size-max";
    /// Socket name, raw category.
    pub const SOCKET_NAME: &str = "socket-name";
    /// Resolved local address of a listener, raw category, read-only.
    pub const LOCAL_ADDRESS: &str = "local-address";
    /// Remote address of a dialer, raw category, read-only.
    pub const REMOTE_ADDRESS: &str = "remote-address";
    /// Minimum reconnect back-off, duration category.
    pub const RECONNECT_TIME_MIN: &str = "reconnect-time-min";
    /// Maximum reconnect back-off, duration category.
    pub const RECONNECT_TIME_MAX: &str = "reconnect-time-max";
}

/// Setter slot for raw-bytes options.
pub type RawSetFn = Box<dyn Fn(&str, &[u8]) -> Result<()> + Send + Sync>;
/// Setter slot for integer options.
pub type IntSetFn = Box<dyn Fn(&str, i32) -> Result<()> + Send + Sync>;
/// Setter slot for size options.
pub type SizeSetFn = Box<dyn Fn(&str, usize) -> Result<()> + Send + Sync>;
/// Setter slot for duration options, in signed milliseconds.
pub type MsSetFn = Box<dyn Fn(&str, i64) -> Result<()> + Send + Sync>;
/// Getter slot for raw-bytes options.
pub type RawGetFn = Box<dyn Fn(&str) -> Result<Vec<u8>> + Send + Sync>;
/// Getter slot for integer options.
pub type IntGetFn = Box<dyn Fn(&str) -> Result<i32> + Send + Sync>;
/// Getter slot for size options.
pub type SizeGetFn = Box<dyn Fn(&str) -> Result<usize> + Send + Sync>;
/// Getter slot for duration options, in signed milliseconds.
pub type MsGetFn = Box<dyn Fn(&str) -> Result<i64> + Send + Sync>;

/// An option table bound (or not) to one owning entity.
#[derive(Default)]
pub struct Options {
    set_raw: Option<RawSetFn>,
    set_int: Option<IntSetFn>,
    set_size: Option<SizeSetFn>,
    set_ms: Option<MsSetFn>,
    get_raw: Option<RawGetFn>,
    get_int: Option<IntGetFn>,
    get_size: Option<SizeGetFn>,
    get_ms: Option<MsGetFn>,
}

fn unbound() -> FerruleError {
    FerruleError::InvalidState("option table is not bound to a live handle")
}

impl Options {
    /// A table with every slot empty; all accessors fail until bound.
    #[must_use]
    pub fn new_unbound() -> Self {
        Self::default()
    }

    /// Build a table whose eight slots forward to `engine` for `owner`.
    #[must_use]
    pub fn bound_to(engine: &Arc<dyn RawEngine>, owner: OptOwner) -> Self {
        let mut options = Self::new_unbound();

        let e = engine.clone();
        let set_raw: RawSetFn =
            Box::new(move |name, value| check(&*e, e.set_opt(owner, name, value)));
        let e = engine.clone();
        let set_int: IntSetFn =
            Box::new(move |name, value| check(&*e, e.set_opt_int(owner, name, value)));
        let e = engine.clone();
        let set_size: SizeSetFn =
            Box::new(move |name, value| check(&*e, e.set_opt_size(owner, name, value)));
        let e = engine.clone();
        let set_ms: MsSetFn =
            Box::new(move |name, value| check(&*e, e.set_opt_ms(owner, name, value)));
        options.bind_setters(set_raw, set_int, set_size, set_ms);

        let e = engine.clone();
        let get_raw: RawGetFn = Box::new(move |name| {
            let mut out = Vec::new();
            check(&*e, e.get_opt(owner, name, &mut out))?;
            Ok(out)
        });
        let e = engine.clone();
        let get_int: IntGetFn = Box::new(move |name| {
            let mut out = 0;
            check(&*e, e.get_opt_int(owner, name, &mut out))?;
            Ok(out)
        });
        let e = engine.clone();
        let get_size: SizeGetFn = Box::new(move |name| {
            let mut out = 0;
            check(&*e, e.get_opt_size(owner, name, &mut out))?;
            Ok(out)
        });
        let e = engine.clone();
        let get_ms: MsGetFn = Box::new(move |name| {
            let mut out = 0;
            check(&*e, e.get_opt_ms(owner, name, &mut out))?;
            Ok(out)
        });
        options.bind_getters(get_raw, get_int, get_size, get_ms);

        options
    }

    /// Replace all four setter slots at once.
    pub fn bind_setters(
        &mut self,
        raw: RawSetFn,
        int: IntSetFn,
        size: SizeSetFn,
        ms: MsSetFn,
    ) {
        self.set_raw = Some(raw);
        self.set_int = Some(int);
        self.set_size = Some(size);
        self.set_ms = Some(ms);
    }

    /// Replace all four getter slots at once.
    pub fn bind_getters(
        &mut self,
        raw: RawGetFn,
        int: IntGetFn,
        size: SizeGetFn,
        ms: MsGetFn,
    ) {
        self.get_raw = Some(raw);
        self.get_int = Some(int);
        self.get_size = Some(size);
        self.get_ms = Some(ms);
    }

    /// Empty every slot; used when the owning identifier goes away.
    pub fn unbind(&mut self) {
        *self = Self::new_unbound();
    }

    /// Whether the table currently forwards anywhere.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.set_raw.is_some() && self.get_raw.is_some()
    }

    /// Set a raw-bytes option.
    pub fn set_raw(&self, name: &str, value: &[u8]) -> Result<()> {
        match &self.set_raw {
            Some(set) => set(name, value),
            None => Err(unbound()),
        }
    }

    /// Set a raw option from a string value.
    pub fn set_string(&self, name: &str, value: &str) -> Result<()> {
        self.set_raw(name, value.as_bytes())
    }

    /// Set an integer option.
    pub fn set_int(&self, name: &str, value: i32) -> Result<()> {
        match &self.set_int {
            Some(set) => set(name, value),
            None => Err(unbound()),
        }
    }

    /// Set a size option.
    pub fn set_size(&self, name: &str, value: usize) -> Result<()> {
        match &self.set_size {
            Some(set) => set(name, value),
            None => Err(unbound()),
        }
    }

    /// Set a duration option in raw signed milliseconds.
    pub fn set_ms(&self, name: &str, value: i64) -> Result<()> {
        match &self.set_ms {
            Some(set) => set(name, value),
            None => Err(unbound()),
        }
    }

    /// Set a duration option; `None` means infinite.
    ///
    /// Durations past `i64::MAX` milliseconds saturate.
    pub fn set_duration(&self, name: &str, value: Option<Duration>) -> Result<()> {
        let ms = match value {
            None => -1,
            Some(duration) => i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        };
        self.set_ms(name, ms)
    }

    /// Get a raw-bytes option.
    pub fn get_raw(&self, name: &str) -> Result<Vec<u8>> {
        match &self.get_raw {
            Some(get) => get(name),
            None => Err(unbound()),
        }
    }

    /// Get a raw option as a string (lossy for non-UTF-8 bytes).
    pub fn get_string(&self, name: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.get_raw(name)?).into_owned())
    }

    /// Get an integer option.
    pub fn get_int(&self, name: &str) -> Result<i32> {
        match &self.get_int {
            Some(get) => get(name),
            None => Err(unbound()),
        }
    }

    /// Get a size option.
    pub fn get_size(&self, name: &str) -> Result<usize> {
        match &self.get_size {
            Some(get) => get(name),
            None => Err(unbound()),
        }
    }

    /// Get a duration option in raw signed milliseconds.
    pub fn get_ms(&self, name: &str) -> Result<i64> {
        match &self.get_ms {
            Some(get) => get(name),
            None => Err(unbound()),
        }
    }

    /// Get a duration option; `None` means infinite.
    pub fn get_duration(&self, name: &str) -> Result<Option<Duration>> {
        let ms = self.get_ms(name)?;
        if ms < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_millis(ms as u64)))
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::loopback::LoopbackEngine;
    use crate::engine::SocketId;
    use crate::error::ErrorCode;
    use crate::protocol::Protocol;

    fn bound_socket_options() -> Options {
        let engine: Arc<dyn RawEngine> = Arc::new(LoopbackEngine::new());
        let mut id = SocketId::NONE;
        assert_eq!(engine.socket_open(Protocol::Pair1, &mut id), 0);
        Options::bound_to(&engine, OptOwner::Socket(id))
    }

    #[test]
    fn unbound_accessors_fail_without_touching_the_engine() {
        let options = Options::new_unbound();
        assert!(!options.is_bound());
        assert!(matches!(
            options.set_int(names::RECV_BUFFER, 8),
            Err(FerruleError::InvalidState(_))
        ));
        assert!(matches!(
            options.get_ms(names::RECV_TIMEOUT),
            Err(FerruleError::InvalidState(_))
        ));
    }

    #[test]
    fn duration_round_trips_for_integral_milliseconds() {
        let options = bound_socket_options();
        options
            .set_duration(names::RECV_TIMEOUT, Some(Duration::from_millis(10)))
            .unwrap();
        assert_eq!(
            options.get_duration(names::RECV_TIMEOUT).unwrap(),
            Some(Duration::from_millis(10))
        );
    }

    #[test]
    fn infinite_duration_maps_to_negative_milliseconds() {
        let options = bound_socket_options();
        options.set_duration(names::SEND_TIMEOUT, None).unwrap();
        assert_eq!(options.get_ms(names::SEND_TIMEOUT).unwrap(), -1);
        assert_eq!(options.get_duration(names::SEND_TIMEOUT).unwrap(), None);
    }

    #[test]
    fn typed_categories_are_enforced_by_the_engine() {
        let options = bound_socket_options();
        options.set_int("demand", 3).unwrap();
        match options.get_size("demand") {
            Err(FerruleError::Transport { code, .. }) => {
                assert_eq!(code, ErrorCode::BadType);
            }
            other => panic!("expected bad-type failure, got {other:?}"),
        }
    }

    #[test]
    fn unbind_empties_every_slot() {
        let mut options = bound_socket_options();
        assert!(options.is_bound());
        options.set_size(names::RECV_MAX_SIZE, 4096).unwrap();

        options.unbind();
        assert!(!options.is_bound());
        assert!(options.get_size(names::RECV_MAX_SIZE).is_err());
    }

    #[test]
    fn strings_pass_through_the_raw_category() {
        let options = bound_socket_options();
        options.set_string(names::SOCKET_NAME, "control").unwrap();
        assert_eq!(options.get_string(names::SOCKET_NAME).unwrap(), "control");
    }
}
