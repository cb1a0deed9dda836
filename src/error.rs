//! Error types

use crate::native::status;
use crate::protocol::{self, DecodeError, ViewKind};
use std::fmt;

/// Connection status codes reported by the native layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ConnectionErrorKind {
    Stream = status::CONN_ERROR,
    ExtensionNotSupported = status::CONN_CLOSED_EXT_NOTSUPPORTED,
    MemoryInsufficient = status::CONN_CLOSED_MEM_INSUFFICIENT,
    RequestLengthExceeded = status::CONN_CLOSED_REQ_LEN_EXCEED,
    DisplayParse = status::CONN_CLOSED_PARSE_ERR,
    InvalidScreen = status::CONN_CLOSED_INVALID_SCREEN,
    FdPassingFailed = status::CONN_CLOSED_FDPASSING_FAILED,
}

impl ConnectionErrorKind {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            status::CONN_ERROR => Some(ConnectionErrorKind::Stream),
            status::CONN_CLOSED_EXT_NOTSUPPORTED => Some(ConnectionErrorKind::ExtensionNotSupported),
            status::CONN_CLOSED_MEM_INSUFFICIENT => Some(ConnectionErrorKind::MemoryInsufficient),
            status::CONN_CLOSED_REQ_LEN_EXCEED => Some(ConnectionErrorKind::RequestLengthExceeded),
            status::CONN_CLOSED_PARSE_ERR => Some(ConnectionErrorKind::DisplayParse),
            status::CONN_CLOSED_INVALID_SCREEN => Some(ConnectionErrorKind::InvalidScreen),
            status::CONN_CLOSED_FDPASSING_FAILED => Some(ConnectionErrorKind::FdPassingFailed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionErrorKind::Stream => {
                "xcb connection errors because of socket, pipe and other stream errors."
            }
            ConnectionErrorKind::ExtensionNotSupported => {
                "xcb connection shutdown because extension not supported"
            }
            ConnectionErrorKind::MemoryInsufficient => {
                "malloc(), calloc() and realloc() error upon failure, for eg ENOMEM"
            }
            ConnectionErrorKind::RequestLengthExceeded => {
                "Connection closed, exceeding request length that server accepts."
            }
            ConnectionErrorKind::DisplayParse => {
                "Connection closed, error during parsing display string."
            }
            ConnectionErrorKind::InvalidScreen => {
                "Connection closed because the server does not have a screen matching the display."
            }
            ConnectionErrorKind::FdPassingFailed => {
                "Connection closed because some FD passing operation failed"
            }
        }
    }
}

/// Message for status codes missing from the table
pub const UNKNOWN_CONNECTION_ERROR: &str = "Unknown connection error.";

/// Non-zero status observed on a native connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionError {
    code: u32,
}

impl ConnectionError {
    pub fn new(code: u32) -> Self {
        ConnectionError { code }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn kind(&self) -> Option<ConnectionErrorKind> {
        ConnectionErrorKind::from_code(self.code)
    }

    pub fn reason(&self) -> &'static str {
        self.kind()
            .map_or(UNKNOWN_CONNECTION_ERROR, |kind| kind.as_str())
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

impl std::error::Error for ConnectionError {}

/// Extension registration rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    EmptyExtensionName,
    SetupNotStruct { name: &'static str, kind: ViewKind },
    EventKindMismatch { code: u8, kind: ViewKind },
    ErrorKindMismatch { code: u8, kind: ViewKind },
    AlreadyRegistered { name: String },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::EmptyExtensionName => {
                write!(f, "extension type has no name")
            }
            RegistrationError::SetupNotStruct { name, kind } => {
                write!(f, "setup type {} is a {}, not a struct", name, kind)
            }
            RegistrationError::EventKindMismatch { code, kind } => {
                write!(f, "event code {} is registered to a {} type", code, kind)
            }
            RegistrationError::ErrorKindMismatch { code, kind } => {
                write!(f, "error code {} is registered to a {} type", code, kind)
            }
            RegistrationError::AlreadyRegistered { name } => {
                write!(f, "core extension already registered, rejecting {}", name)
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// An error coming from the `xcbview` crate
#[derive(Debug)]
pub enum XcbError {
    /// Native handle is null or already disconnected.
    InvalidConnection,
    /// Auth credentials could not be parsed.
    InvalidAuth,
    /// Native layer reported a connection error.
    Connection(ConnectionError),
    /// Buffer did not fit the requested view.
    Decode(DecodeError),
    /// Server replied with an X11 error.
    Protocol(protocol::Error),
    /// Extension registration rejected.
    Registration(RegistrationError),
}

impl fmt::Display for XcbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConnection => write!(f, "Invalid connection."),
            Self::InvalidAuth => write!(f, "invalid xauth"),
            Self::Connection(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "decode error: {err}"),
            Self::Protocol(err) => write!(f, "{err}"),
            Self::Registration(err) => write!(f, "registration error: {err}"),
        }
    }
}

impl std::error::Error for XcbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Protocol(err) => Some(err),
            Self::Registration(err) => Some(err),
            Self::InvalidConnection | Self::InvalidAuth => None,
        }
    }
}

impl From<ConnectionError> for XcbError {
    fn from(err: ConnectionError) -> Self {
        Self::Connection(err)
    }
}

impl From<DecodeError> for XcbError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<protocol::Error> for XcbError {
    fn from(err: protocol::Error) -> Self {
        Self::Protocol(err)
    }
}

impl From<RegistrationError> for XcbError {
    fn from(err: RegistrationError) -> Self {
        Self::Registration(err)
    }
}

/// Result type for `xcbview` operations
pub type XcbResult<T> = Result<T, XcbError>;
