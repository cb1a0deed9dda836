//! Protocol error replies and decoding failures

use super::view::{Buffer, BufferView, Protobj, View, ViewKind};
use super::list::Format;
use std::fmt;

/// Failure to interpret a buffer as the requested view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// View offset lies past the end of the buffer
    OffsetOutOfBounds { offset: usize, len: usize },
    /// Explicit view size runs past the end of the buffer
    SizeOutOfBounds { offset: usize, size: usize, len: usize },
    /// Scalar list length is not a whole number of strides
    MalformedLength { length: usize, stride: usize },
    /// Stride is narrower than the scalar it is supposed to hold
    StrideTooNarrow { format: Format, stride: usize },
    /// List element claims more bytes than the list has left
    ElementOverrun { offset: usize, size: usize, end: usize },
    /// List element reported a size of zero
    EmptyElement { offset: usize },
    /// Field read past the end of its view
    FieldOutOfBounds { at: usize, width: usize, size: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::OffsetOutOfBounds { offset, len } => {
                write!(f, "offset {} is past the end of a {}-byte buffer", offset, len)
            }
            DecodeError::SizeOutOfBounds { offset, size, len } => write!(
                f,
                "{} bytes at offset {} overrun a {}-byte buffer",
                size, offset, len
            ),
            DecodeError::MalformedLength { length, stride } => write!(
                f,
                "list length {} is not a multiple of stride {}",
                length, stride
            ),
            DecodeError::StrideTooNarrow { format, stride } => write!(
                f,
                "stride {} cannot hold a {}-byte '{}' scalar",
                stride,
                format.size(),
                format.code()
            ),
            DecodeError::ElementOverrun { offset, size, end } => write!(
                f,
                "list element at offset {} ({} bytes) overruns list end {}",
                offset, size, end
            ),
            DecodeError::EmptyElement { offset } => {
                write!(f, "list element at offset {} has zero size", offset)
            }
            DecodeError::FieldOutOfBounds { at, width, size } => write!(
                f,
                "{}-byte field at {} lies outside a {}-byte view",
                width, at, size
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// X11 error reply.
///
/// This is both a view over the reply bytes and an error value: code that
/// receives an error-shaped reply returns it through `Err` as-is. The view
/// starts at the error-code byte, so `code` is its first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    view: BufferView,
    code: u8,
    name: Option<&'static str>,
}

impl Error {
    /// Wrap an already bounded view, tagging it with a registered name.
    pub fn from_view(view: BufferView, name: Option<&'static str>) -> Result<Self, DecodeError> {
        let code = view.read_u8(0)?;
        Ok(Error { view, code, name })
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    /// Name from the error table, if the code was registered
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl View for Error {
    fn view(&self) -> &BufferView {
        &self.view
    }
}

impl Protobj for Error {
    const KIND: ViewKind = ViewKind::Error;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
        Error::from_view(BufferView::new(parent, offset, None)?, None)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "X11 Error: {} (code {})", name, self.code),
            None => write!(f, "X11 Error: code {}", self.code),
        }
    }
}

impl std::error::Error for Error {}
