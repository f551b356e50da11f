//! Protocol tags for scalability-protocol sockets.
//!
//! The numbering follows the engine's stable protocol table
//! (`major * 16 + minor`).

use std::fmt;

/// Scalability protocol identifiers understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Protocol {
    /// No protocol / not a live socket
    Unspecified = 0,

    /// PAIR v0, exclusive bidirectional link
    Pair0 = 16,

    /// PAIR v1, polyamorous pair
    Pair1 = 17,

    /// PUB v0, publisher side of pub/sub
    Pub0 = 32,

    /// SUB v0, subscriber side of pub/sub
    Sub0 = 33,

    /// REQ v0, request side of request/reply
    Req0 = 48,

    /// REP v0, reply side of request/reply
    Rep0 = 49,

    /// PUSH v0, sending side of a pipeline
    Push0 = 80,

    /// PULL v0, receiving side of a pipeline
    Pull0 = 81,

    /// SURVEYOR v0, survey originator
    Surveyor0 = 98,

    /// RESPONDENT v0, survey responder
    Respondent0 = 99,

    /// BUS v0, many-to-many mesh
    Bus0 = 112,
}

impl Protocol {
    /// Map a raw protocol number to a tag.
    ///
    /// Numbers the wrapper has no name for map to `Unspecified`; the engine
    /// remains the authority on what it actually speaks.
    #[must_use]
    pub fn from_raw(value: i32) -> Self {
        match value {
            16 => Self::Pair0,
            17 => Self::Pair1,
            32 => Self::Pub0,
            33 => Self::Sub0,
            48 => Self::Req0,
            49 => Self::Rep0,
            80 => Self::Push0,
            81 => Self::Pull0,
            98 => Self::Surveyor0,
            99 => Self::Respondent0,
            112 => Self::Bus0,
            _ => Self::Unspecified,
        }
    }

    /// The raw protocol number handed to the engine.
    #[must_use]
    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Protocol name as a string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "NONE",
            Self::Pair0 | Self::Pair1 => "PAIR",
            Self::Pub0 => "PUB",
            Self::Sub0 => "SUB",
            Self::Req0 => "REQ",
            Self::Rep0 => "REP",
            Self::Push0 => "PUSH",
            Self::Pull0 => "PULL",
            Self::Surveyor0 => "SURVEYOR",
            Self::Respondent0 => "RESPONDENT",
            Self::Bus0 => "BUS",
        }
    }

    /// Check whether a peer speaking `peer` can talk to this protocol.
    #[must_use]
    pub fn compatible_with(self, peer: Protocol) -> bool {
        matches!(
            (self, peer),
            (Self::Pair0, Self::Pair0)
                | (Self::Pair1, Self::Pair1)
                | (Self::Pub0, Self::Sub0)
                | (Self::Sub0, Self::Pub0)
                | (Self::Req0, Self::Rep0)
                | (Self::Rep0, Self::Req0)
                | (Self::Push0, Self::Pull0)
                | (Self::Pull0, Self::Push0)
                | (Self::Surveyor0, Self::Respondent0)
                | (Self::Respondent0, Self::Surveyor0)
                | (Self::Bus0, Self::Bus0)
        )
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
