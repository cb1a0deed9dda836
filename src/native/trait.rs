//! Native transport trait definition
//!
//! The native layer owns the socket, performs the X11 handshake, marshals
//! requests and hands back reply, event and setup buffers. This module defines
//! the boundary a native client library has to provide.

use crate::protocol::Buffer;
use std::os::raw::c_int;

/// Connection status codes, as returned by `has_error`. Zero means healthy.
pub mod status {
    pub const CONN_OK: u32 = 0;
    /// Socket, pipe or other stream error
    pub const CONN_ERROR: u32 = 1;
    pub const CONN_CLOSED_EXT_NOTSUPPORTED: u32 = 2;
    pub const CONN_CLOSED_MEM_INSUFFICIENT: u32 = 3;
    pub const CONN_CLOSED_REQ_LEN_EXCEED: u32 = 4;
    pub const CONN_CLOSED_PARSE_ERR: u32 = 5;
    pub const CONN_CLOSED_INVALID_SCREEN: u32 = 6;
    pub const CONN_CLOSED_FDPASSING_FAILED: u32 = 7;
}

/// Authorization credentials for the connection handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

impl AuthInfo {
    /// Parse `NAME:DATA` credentials. The name ends at the first ':'; the
    /// data is taken verbatim and may contain any byte.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let sep = raw.iter().position(|&b| b == b':')?;
        Some(AuthInfo {
            name: raw[..sep].to_vec(),
            data: raw[sep + 1..].to_vec(),
        })
    }
}

/// Factory for native connection handles.
///
/// A returned `None` is a null handle. A handshake that fails is normally
/// reported as a handle whose `has_error` is non-zero.
pub trait Transport {
    type Handle: NativeHandle;

    /// Connect by display name, returning the preferred screen
    fn connect(&self, display: Option<&str>) -> (Option<Self::Handle>, i32);

    /// Connect over an already open socket
    fn connect_to_fd(&self, fd: c_int, auth: Option<&AuthInfo>) -> Option<Self::Handle>;

    /// Connect by display name with explicit credentials
    fn connect_to_display_with_auth(
        &self,
        display: Option<&str>,
        auth: &AuthInfo,
    ) -> (Option<Self::Handle>, i32);
}

/// A live native connection.
pub trait NativeHandle {
    /// Current status; see [`status`]
    fn has_error(&self) -> u32;

    /// Raw setup reply received during the handshake
    fn get_setup(&self) -> Buffer;

    fn get_file_descriptor(&self) -> c_int;

    /// Maximum request length in 4-byte units
    fn get_maximum_request_length(&self) -> u32;

    fn prefetch_maximum_request_length(&self);

    /// Positive on success
    fn flush(&self) -> c_int;

    fn generate_id(&self) -> u32;

    /// Block until the next event or error arrives; `None` on failure
    fn wait_for_event(&self) -> Option<Buffer>;

    /// Next queued event or error, if any
    fn poll_for_event(&self) -> Option<Buffer>;

    fn disconnect(self);
}
