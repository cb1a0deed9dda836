//! Mock transport - in-process native layer for testing
//!
//! Accepts every connection and serves a canned setup buffer and event queue.
//! The connection status is shared with the transport so tests can drive a
//! live connection into an error state.

use super::*;
use crate::protocol::Buffer;
use std::collections::VecDeque;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Which native connect entry point was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectPath {
    Display(Option<String>),
    Fd(c_int),
    DisplayWithAuth(Option<String>, AuthInfo),
}

#[derive(Debug)]
struct Shared {
    status: AtomicU32,
    flush_status: AtomicU32,
    next_id: AtomicU32,
    events: Mutex<VecDeque<Buffer>>,
    connects: Mutex<Vec<ConnectPath>>,
    disconnects: AtomicU32,
}

#[derive(Debug, Clone)]
pub struct MockTransport {
    setup: Buffer,
    screen: i32,
    null_handle: bool,
    quiet_wait: bool,
    max_request_length: u32,
    shared: Arc<Shared>,
}

impl MockTransport {
    pub fn new(setup: impl Into<Buffer>) -> Self {
        Self {
            setup: setup.into(),
            screen: 0,
            null_handle: false,
            quiet_wait: false,
            max_request_length: 65535,
            shared: Arc::new(Shared {
                status: AtomicU32::new(status::CONN_OK),
                flush_status: AtomicU32::new(status::CONN_OK),
                next_id: AtomicU32::new(0x0020_0000),
                events: Mutex::new(VecDeque::new()),
                connects: Mutex::new(Vec::new()),
                disconnects: AtomicU32::new(0),
            }),
        }
    }

    /// Preferred screen reported by display connects
    pub fn with_screen(mut self, screen: i32) -> Self {
        self.screen = screen;
        self
    }

    /// Hand out null handles, as a native library does when it cannot
    /// allocate a connection at all
    pub fn with_null_handle(mut self) -> Self {
        self.null_handle = true;
        self
    }

    /// Let a wait on an empty queue return nothing while the status stays
    /// healthy, instead of breaking the stream
    pub fn with_quiet_wait(mut self) -> Self {
        self.quiet_wait = true;
        self
    }

    pub fn with_max_request_length(mut self, length: u32) -> Self {
        self.max_request_length = length;
        self
    }

    /// Set the status every handle reports from now on
    pub fn set_status(&self, code: u32) {
        self.shared.status.store(code, Ordering::SeqCst);
    }

    /// Make the next flush put the connection into `code`
    pub fn fail_next_flush(&self, code: u32) {
        self.shared.flush_status.store(code, Ordering::SeqCst);
    }

    /// Queue an event or error packet
    pub fn push_event(&self, packet: impl Into<Buffer>) {
        self.shared.lock_events().push_back(packet.into());
    }

    /// Connect calls seen so far
    pub fn connects(&self) -> Vec<ConnectPath> {
        self.shared
            .connects
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn disconnects(&self) -> u32 {
        self.shared.disconnects.load(Ordering::SeqCst)
    }

    fn handle(&self, path: ConnectPath) -> Option<MockHandle> {
        if let Ok(mut connects) = self.shared.connects.lock() {
            connects.push(path);
        }
        if self.null_handle {
            return None;
        }
        Some(MockHandle {
            setup: self.setup.clone(),
            quiet_wait: self.quiet_wait,
            max_request_length: self.max_request_length,
            shared: Arc::clone(&self.shared),
        })
    }
}

impl Shared {
    fn lock_events(&self) -> std::sync::MutexGuard<'_, VecDeque<Buffer>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MockTransport {
    type Handle = MockHandle;

    fn connect(&self, display: Option<&str>) -> (Option<MockHandle>, i32) {
        let handle = self.handle(ConnectPath::Display(display.map(str::to_string)));
        (handle, self.screen)
    }

    fn connect_to_fd(&self, fd: c_int, _auth: Option<&AuthInfo>) -> Option<MockHandle> {
        self.handle(ConnectPath::Fd(fd))
    }

    fn connect_to_display_with_auth(
        &self,
        display: Option<&str>,
        auth: &AuthInfo,
    ) -> (Option<MockHandle>, i32) {
        let path = ConnectPath::DisplayWithAuth(display.map(str::to_string), auth.clone());
        (self.handle(path), self.screen)
    }
}

#[derive(Debug)]
pub struct MockHandle {
    setup: Buffer,
    quiet_wait: bool,
    max_request_length: u32,
    shared: Arc<Shared>,
}

impl NativeHandle for MockHandle {
    fn has_error(&self) -> u32 {
        self.shared.status.load(Ordering::SeqCst)
    }

    fn get_setup(&self) -> Buffer {
        self.setup.clone()
    }

    fn get_file_descriptor(&self) -> c_int {
        -1
    }

    fn get_maximum_request_length(&self) -> u32 {
        self.max_request_length
    }

    fn prefetch_maximum_request_length(&self) {}

    fn flush(&self) -> c_int {
        let code = self.shared.flush_status.swap(status::CONN_OK, Ordering::SeqCst);
        if code != status::CONN_OK {
            self.shared.status.store(code, Ordering::SeqCst);
            return 0;
        }
        1
    }

    fn generate_id(&self) -> u32 {
        self.shared.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn wait_for_event(&self) -> Option<Buffer> {
        let event = self.shared.lock_events().pop_front();
        if event.is_none() && !self.quiet_wait {
            // Nothing will ever arrive; a real library would block until the
            // stream broke.
            self.shared.status.store(status::CONN_ERROR, Ordering::SeqCst);
        }
        event
    }

    fn poll_for_event(&self) -> Option<Buffer> {
        self.shared.lock_events().pop_front()
    }

    fn disconnect(self) {
        self.shared.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}
