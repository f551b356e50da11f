//! Weak snapshot of the pipe a received message traveled.
//!
//! A [`Pipe`] is a value, not a live reference: it records the pipe
//! identifier a message carried at the moment [`crate::message::Message::pipe`]
//! was called. It holds no ownership of the message or the connection and
//! becomes meaningless once the originating handle is released; the engine
//! reports `not found` for identifiers it no longer knows.

use std::fmt;
use std::sync::Arc;

use crate::engine::{PipeId, RawEngine};
use crate::error::{check, Result};

/// Value snapshot of a message's transit path.
#[derive(Clone)]
pub struct Pipe {
    engine: Arc<dyn RawEngine>,
    id: PipeId,
}

impl Pipe {
    pub(crate) fn new(engine: Arc<dyn RawEngine>, id: PipeId) -> Self {
        Self { engine, id }
    }

    /// The recorded pipe identifier.
    #[must_use]
    pub fn id(&self) -> PipeId {
        self.id
    }

    /// Close the underlying pipe, disconnecting the path it stands for.
    ///
    /// This is independent of the message the snapshot came from; the
    /// message stays usable.
    pub fn close(self) -> Result<()> {
        let status = self.engine.pipe_close(self.id);
        check(&*self.engine, status)
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::loopback::LoopbackEngine;
    use crate::error::{ErrorCode, FerruleError};

    #[test]
    fn closing_an_unknown_pipe_reports_not_found() {
        let engine: Arc<dyn RawEngine> = Arc::new(LoopbackEngine::new());
        let pipe = Pipe::new(engine, PipeId(999));
        match pipe.close() {
            Err(FerruleError::Transport { code, .. }) => {
                assert_eq!(code, ErrorCode::NotFound);
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_is_plain_data() {
        let engine: Arc<dyn RawEngine> = Arc::new(LoopbackEngine::new());
        let pipe = Pipe::new(engine, PipeId(7));
        let copy = pipe.clone();
        assert_eq!(pipe.id(), copy.id());
    }
}
