use serde::{Deserialize, Serialize};
use std::fmt;

/// Synthetic code recorded when the request never completed (connect, TLS, send).
pub const TRANSPORT_FAILURE_CODE: u16 = 0o10;
/// Synthetic code recorded when the response arrived but its body could not be read.
pub const BODY_READ_FAILURE_CODE: u16 = 0o20;

/// Outcome bucket used as the key of the status counts.
///
/// Real HTTP codes live in 100-599; the two synthetic codes sit below that
/// range so they can never collide with a server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u16", from = "u16")]
pub enum StatusClass {
    TransportFailure,
    BodyReadFailure,
    Http(u16),
}

impl StatusClass {
    pub fn code(self) -> u16 {
        match self {
            StatusClass::TransportFailure => TRANSPORT_FAILURE_CODE,
            StatusClass::BodyReadFailure => BODY_READ_FAILURE_CODE,
            StatusClass::Http(code) => code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            TRANSPORT_FAILURE_CODE => StatusClass::TransportFailure,
            BODY_READ_FAILURE_CODE => StatusClass::BodyReadFailure,
            code => StatusClass::Http(code),
        }
    }

    pub fn is_failure(self) -> bool {
        !matches!(self, StatusClass::Http(_))
    }
}

impl From<StatusClass> for u16 {
    fn from(class: StatusClass) -> Self {
        class.code()
    }
}

impl From<u16> for StatusClass {
    fn from(code: u16) -> Self {
        StatusClass::from_code(code)
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusClass::TransportFailure => write!(f, "{} (transport error)", self.code()),
            StatusClass::BodyReadFailure => write!(f, "{} (body read error)", self.code()),
            StatusClass::Http(code) => write!(f, "{}", code),
        }
    }
}

/// Result of one GET attempt, before timing is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub class: StatusClass,
    /// Status line of the response, if one was received
    pub http_status: Option<u16>,
    pub body_size: usize,
}

impl RequestOutcome {
    pub fn success(status: u16, body_size: usize) -> Self {
        Self {
            class: StatusClass::Http(status),
            http_status: Some(status),
            body_size,
        }
    }

    pub fn transport_failure() -> Self {
        Self {
            class: StatusClass::TransportFailure,
            http_status: None,
            body_size: 0,
        }
    }

    pub fn body_read_failure(status: u16) -> Self {
        Self {
            class: StatusClass::BodyReadFailure,
            http_status: Some(status),
            body_size: 0,
        }
    }
}
