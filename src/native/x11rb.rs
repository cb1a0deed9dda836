//! x11rb transport - native layer backed by x11rb's pure-Rust connection
//!
//! x11rb reports failures per call instead of through a sticky status. The
//! handle remembers the first failure and reports it from `has_error`, the
//! same way an errored xcb connection does, so the liveness guard sees it.

use super::*;
use crate::protocol::Buffer;
use ::x11rb::connection::{Connection as _, RequestConnection as _};
use ::x11rb::errors::{ConnectError, ConnectionError, ReplyOrIdError};
use ::x11rb::reexports::x11rb_protocol::parse_display::parse_display;
use ::x11rb::rust_connection::{DefaultStream, RustConnection};
use ::x11rb::x11_utils::Serialize;
use nix::sys::socket::{getsockopt, sockopt, SockType};
use std::cell::Cell;
use std::os::fd::{AsRawFd, FromRawFd};
use std::os::raw::c_int;
use std::os::unix::net::UnixStream;

/// Transport creating x11rb connections
#[derive(Debug, Clone, Copy, Default)]
pub struct X11rbTransport;

impl X11rbTransport {
    pub fn new() -> Self {
        X11rbTransport
    }
}

impl Transport for X11rbTransport {
    type Handle = X11rbHandle;

    fn connect(&self, display: Option<&str>) -> (Option<X11rbHandle>, i32) {
        match RustConnection::connect(display) {
            Ok((conn, screen)) => (Some(X11rbHandle::live(conn)), screen as i32),
            Err(e) => {
                log::debug!("x11rb connect to {:?} failed: {}", display, e);
                (Some(X11rbHandle::failed(connect_status(&e))), 0)
            }
        }
    }

    fn connect_to_fd(&self, fd: c_int, auth: Option<&AuthInfo>) -> Option<X11rbHandle> {
        // SAFETY: the caller hands over ownership of an open stream socket.
        let stream = unsafe { UnixStream::from_raw_fd(fd) };
        match getsockopt(&stream, sockopt::SockType) {
            Ok(SockType::Stream) => Some(connect_stream(stream, 0, auth)),
            Ok(other) => {
                log::debug!("fd {} is a {:?} socket, not a stream", fd, other);
                Some(X11rbHandle::failed(status::CONN_ERROR))
            }
            Err(e) => {
                log::debug!("fd {} is not a socket: {}", fd, e);
                Some(X11rbHandle::failed(status::CONN_ERROR))
            }
        }
    }

    fn connect_to_display_with_auth(
        &self,
        display: Option<&str>,
        auth: &AuthInfo,
    ) -> (Option<X11rbHandle>, i32) {
        let parsed = match parse_display(display) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("Failed to parse display {:?}: {}", display, e);
                return (Some(X11rbHandle::failed(status::CONN_CLOSED_PARSE_ERR)), 0);
            }
        };
        let screen = parsed.screen as usize;

        let mut last_error = None;
        for addr in parsed.connect_instruction() {
            match DefaultStream::connect(&addr) {
                Ok((stream, _peer)) => {
                    let handle = handshake(stream, screen, Some(auth));
                    return (Some(handle), screen as i32);
                }
                Err(e) => last_error = Some(e),
            }
        }

        log::debug!(
            "Failed to connect to display {:?}: {:?}",
            display,
            last_error
        );
        (Some(X11rbHandle::failed(status::CONN_ERROR)), screen as i32)
    }
}

fn connect_stream(stream: UnixStream, screen: usize, auth: Option<&AuthInfo>) -> X11rbHandle {
    match DefaultStream::from_unix_stream(stream) {
        Ok((stream, _peer)) => handshake(stream, screen, auth),
        Err(e) => {
            log::debug!("Failed to wrap socket: {}", e);
            X11rbHandle::failed(status::CONN_ERROR)
        }
    }
}

fn handshake(stream: DefaultStream, screen: usize, auth: Option<&AuthInfo>) -> X11rbHandle {
    let result = match auth {
        Some(auth) => RustConnection::connect_to_stream_with_auth_info(
            stream,
            screen,
            auth.name.clone(),
            auth.data.clone(),
        ),
        None => RustConnection::connect_to_stream(stream, screen),
    };

    match result {
        Ok(conn) => X11rbHandle::live(conn),
        Err(e) => {
            log::debug!("x11rb handshake failed: {}", e);
            X11rbHandle::failed(connect_status(&e))
        }
    }
}

fn connect_status(err: &ConnectError) -> u32 {
    match err {
        ConnectError::InsufficientMemory => status::CONN_CLOSED_MEM_INSUFFICIENT,
        ConnectError::DisplayParsingError(_) => status::CONN_CLOSED_PARSE_ERR,
        ConnectError::InvalidScreen => status::CONN_CLOSED_INVALID_SCREEN,
        _ => status::CONN_ERROR,
    }
}

fn connection_status(err: &ConnectionError) -> u32 {
    match err {
        ConnectionError::UnsupportedExtension => status::CONN_CLOSED_EXT_NOTSUPPORTED,
        ConnectionError::InsufficientMemory => status::CONN_CLOSED_MEM_INSUFFICIENT,
        ConnectionError::MaximumRequestLengthExceeded => status::CONN_CLOSED_REQ_LEN_EXCEED,
        ConnectionError::FdPassingFailed => status::CONN_CLOSED_FDPASSING_FAILED,
        _ => status::CONN_ERROR,
    }
}

/// Native handle over an x11rb connection
#[derive(Debug)]
pub struct X11rbHandle {
    conn: Option<RustConnection>,
    status: Cell<u32>,
}

impl X11rbHandle {
    fn live(conn: RustConnection) -> Self {
        X11rbHandle {
            conn: Some(conn),
            status: Cell::new(status::CONN_OK),
        }
    }

    /// Handle for a connection that never got established
    fn failed(code: u32) -> Self {
        X11rbHandle {
            conn: None,
            status: Cell::new(code),
        }
    }

    fn record(&self, err: &ConnectionError) {
        log::warn!("x11rb connection error: {}", err);
        if self.status.get() == status::CONN_OK {
            self.status.set(connection_status(err));
        }
    }
}

impl NativeHandle for X11rbHandle {
    fn has_error(&self) -> u32 {
        self.status.get()
    }

    fn get_setup(&self) -> Buffer {
        match &self.conn {
            Some(conn) => conn.setup().serialize().into(),
            None => Buffer::from(Vec::new()),
        }
    }

    fn get_file_descriptor(&self) -> c_int {
        match &self.conn {
            Some(conn) => conn.stream().as_raw_fd(),
            None => -1,
        }
    }

    fn get_maximum_request_length(&self) -> u32 {
        match &self.conn {
            Some(conn) => (conn.maximum_request_bytes() / 4) as u32,
            None => 0,
        }
    }

    fn prefetch_maximum_request_length(&self) {
        if let Some(conn) = &self.conn {
            conn.prefetch_maximum_request_bytes();
        }
    }

    fn flush(&self) -> c_int {
        let Some(conn) = &self.conn else {
            return 0;
        };
        match conn.flush() {
            Ok(()) => 1,
            Err(e) => {
                self.record(&e);
                0
            }
        }
    }

    fn generate_id(&self) -> u32 {
        let Some(conn) = &self.conn else {
            return u32::MAX;
        };
        match conn.generate_id() {
            Ok(id) => id,
            Err(ReplyOrIdError::ConnectionError(e)) => {
                self.record(&e);
                u32::MAX
            }
            Err(e) => {
                log::debug!("generate_id failed: {}", e);
                u32::MAX
            }
        }
    }

    fn wait_for_event(&self) -> Option<Buffer> {
        let conn = self.conn.as_ref()?;
        match conn.wait_for_raw_event() {
            Ok(packet) => Some(packet.into()),
            Err(e) => {
                self.record(&e);
                None
            }
        }
    }

    fn poll_for_event(&self) -> Option<Buffer> {
        let conn = self.conn.as_ref()?;
        match conn.poll_for_raw_event() {
            Ok(packet) => packet.map(Buffer::from),
            Err(e) => {
                self.record(&e);
                None
            }
        }
    }

    fn disconnect(self) {
        log::debug!("Closing x11rb connection");
        drop(self.conn);
    }
}
