//! Connection layer
//!
//! A [`Connection`] owns one native handle. The native layer is the source of
//! truth for liveness, so every operation asks it before and after the call
//! instead of caching a state of its own. Once the handle reports an error the
//! connection stays errored; it has to be dropped and a new one made.

use crate::error::{ConnectionError, XcbError, XcbResult};
use crate::extension::{Extension, Registry};
use crate::native::{status, AuthInfo, NativeHandle, Transport};
use crate::protocol::{self, Buffer, BufferView, Event, Struct, View};
use std::fmt;
use std::os::raw::c_int;
use std::sync::Arc;

/// Inputs for [`Connection::connect`]
///
/// An explicit file descriptor wins over credentials, and credentials over a
/// plain display-name connect.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Display name; `None` uses the native layer's default
    pub display: Option<String>,
    /// Already connected socket
    pub fd: Option<c_int>,
    /// Raw `NAME:DATA` credentials
    pub auth: Option<Vec<u8>>,
}

impl ConnectOptions {
    pub fn display(display: impl Into<String>) -> Self {
        ConnectOptions {
            display: Some(display.into()),
            ..Default::default()
        }
    }

    pub fn fd(fd: c_int) -> Self {
        ConnectOptions {
            fd: Some(fd),
            ..Default::default()
        }
    }

    pub fn with_auth(mut self, auth: impl Into<Vec<u8>>) -> Self {
        self.auth = Some(auth.into());
        self
    }
}

/// Liveness as reported by the native layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Live,
    Errored(u32),
    Disconnected,
}

/// A connection to the X server
pub struct Connection<H: NativeHandle> {
    handle: Option<H>,
    pref_screen: i32,
    registry: Arc<Registry>,
}

impl<H: NativeHandle> Connection<H> {
    /// Connect through `transport`, using `registry` to decode replies.
    pub fn connect<T>(transport: &T, registry: Arc<Registry>, options: ConnectOptions) -> XcbResult<Self>
    where
        T: Transport<Handle = H>,
    {
        let auth = match options.auth.as_deref() {
            Some(raw) => Some(AuthInfo::parse(raw).ok_or(XcbError::InvalidAuth)?),
            None => None,
        };
        let display = options.display.as_deref();

        let (handle, pref_screen) = if let Some(fd) = options.fd.filter(|&fd| fd > 0) {
            log::debug!("Connecting over fd {}", fd);
            (transport.connect_to_fd(fd, auth.as_ref()), 0)
        } else if let Some(auth) = &auth {
            log::debug!("Connecting to display {:?} with auth", display);
            transport.connect_to_display_with_auth(display, auth)
        } else {
            log::debug!("Connecting to display {:?}", display);
            transport.connect(display)
        };

        let conn = Connection {
            handle,
            pref_screen,
            registry,
        };
        conn.check()?;
        log::debug!("Connected, preferred screen {}", pref_screen);
        Ok(conn)
    }

    /// Fail unless the native handle exists and reports no error.
    fn check(&self) -> XcbResult<&H> {
        let handle = self.handle.as_ref().ok_or(XcbError::InvalidConnection)?;
        match handle.has_error() {
            status::CONN_OK => Ok(handle),
            code => {
                log::warn!("Native connection reported error {}", code);
                Err(ConnectionError::new(code).into())
            }
        }
    }

    /// Run `f` against the native handle, checking liveness before and after.
    fn guarded<R>(&self, f: impl FnOnce(&H) -> R) -> XcbResult<R> {
        let out = f(self.check()?);
        self.check()?;
        Ok(out)
    }

    /// Current state, asked fresh from the native layer
    pub fn state(&self) -> ConnectionState {
        match &self.handle {
            None => ConnectionState::Disconnected,
            Some(handle) => match handle.has_error() {
                status::CONN_OK => ConnectionState::Live,
                code => ConnectionState::Errored(code),
            },
        }
    }

    /// Screen chosen by the display name
    pub fn pref_screen(&self) -> i32 {
        self.pref_screen
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The registered core protocol extension
    pub fn core(&self) -> Option<&Arc<dyn Extension>> {
        self.registry.core_extension()
    }

    pub fn has_error(&self) -> XcbResult<u32> {
        self.guarded(|h| h.has_error())
    }

    pub fn get_file_descriptor(&self) -> XcbResult<c_int> {
        self.guarded(|h| h.get_file_descriptor())
    }

    /// Maximum request length in 4-byte units
    pub fn get_maximum_request_length(&self) -> XcbResult<u32> {
        self.guarded(|h| h.get_maximum_request_length())
    }

    pub fn prefetch_maximum_request_length(&self) -> XcbResult<()> {
        self.guarded(|h| h.prefetch_maximum_request_length())
    }

    pub fn flush(&self) -> XcbResult<c_int> {
        self.guarded(|h| h.flush())
    }

    pub fn generate_id(&self) -> XcbResult<u32> {
        self.guarded(|h| h.generate_id())
    }

    /// Close the native connection. Every later call fails with
    /// [`XcbError::InvalidConnection`].
    pub fn disconnect(&mut self) -> XcbResult<()> {
        self.check()?;
        if let Some(handle) = self.handle.take() {
            log::debug!("Disconnecting");
            handle.disconnect();
        }
        Ok(())
    }

    /// Decode the setup reply with the registered setup type.
    ///
    /// The view comes back as a plain [`Struct`]; convert it with
    /// `xproto::Setup::from` to read the core setup fields. Without a
    /// registered core the whole buffer is returned as a struct.
    pub fn get_setup(&self) -> XcbResult<Struct> {
        let buf = self.guarded(|h| h.get_setup())?;
        let view = match self.registry.setup_type() {
            Some(setup) => setup.decode(&buf, 0)?,
            None => BufferView::new(&buf, 0, None)?,
        };
        Ok(Struct::from(view))
    }

    /// Block until the next event arrives. Error replies come back as
    /// [`XcbError::Protocol`].
    ///
    /// If the native layer returns nothing without flagging an error, the
    /// call fails with a `CONN_ERROR` connection error made up here. That
    /// error does not change [`Connection::state`], which keeps reporting
    /// what the native layer says.
    pub fn wait_for_event(&self) -> XcbResult<Event> {
        match self.guarded(|h| h.wait_for_event())? {
            Some(packet) => self.decode_event(packet),
            None => Err(ConnectionError::new(status::CONN_ERROR).into()),
        }
    }

    /// Next queued event, without blocking.
    pub fn poll_for_event(&self) -> XcbResult<Option<Event>> {
        match self.guarded(|h| h.poll_for_event())? {
            Some(packet) => self.decode_event(packet).map(Some),
            None => Ok(None),
        }
    }

    fn decode_event(&self, packet: Buffer) -> XcbResult<Event> {
        let response_type = BufferView::new(&packet, 0, None)?.read_u8(0)?;

        if response_type == 0 {
            let code = BufferView::new(&packet, 1, None)?.read_u8(0)?;
            let (view, name) = match self.registry.error_type(code) {
                Some(ty) => (ty.decode(&packet, 1)?, Some(ty.name)),
                None => (BufferView::new(&packet, 1, None)?, None),
            };
            let err = protocol::Error::from_view(view, name)?;
            log::debug!("Received {}", err);
            return Err(err.into());
        }

        let code = response_type & !protocol::SEND_EVENT_MASK;
        let (view, name) = match self.registry.event_type(code) {
            Some(ty) => (ty.decode(&packet, 0)?, Some(ty.name)),
            None => (BufferView::new(&packet, 0, None)?, None),
        };
        let event = Event::from_view(view, name)?;
        log::trace!("Received event {} ({} bytes)", code, event.bufsize());
        Ok(event)
    }
}

impl<H: NativeHandle> fmt::Debug for Connection<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("pref_screen", &self.pref_screen)
            .finish()
    }
}

impl<H: NativeHandle> Drop for Connection<H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::mock::{ConnectPath, MockTransport};

    fn connect(transport: &MockTransport, options: ConnectOptions) -> XcbResult<Connection<crate::native::mock::MockHandle>> {
        Connection::connect(transport, Arc::new(Registry::new()), options)
    }

    #[test]
    fn test_connect_path_precedence() {
        let transport = MockTransport::new(vec![0u8; 8]).with_screen(2);

        let conn = connect(&transport, ConnectOptions::display(":1").with_auth(b"A:B".to_vec())).unwrap();
        assert_eq!(conn.pref_screen(), 2);

        let mut options = ConnectOptions::fd(7).with_auth(b"A:B".to_vec());
        options.display = Some(":1".into());
        let conn = connect(&transport, options).unwrap();
        assert_eq!(conn.pref_screen(), 0);

        connect(&transport, ConnectOptions::default()).unwrap();

        let auth = AuthInfo::parse(b"A:B").unwrap();
        assert_eq!(
            transport.connects(),
            vec![
                ConnectPath::DisplayWithAuth(Some(":1".into()), auth),
                ConnectPath::Fd(7),
                ConnectPath::Display(None),
            ]
        );
    }

    #[test]
    fn test_non_positive_fd_falls_back_to_display() {
        let transport = MockTransport::new(vec![]);
        connect(&transport, ConnectOptions::fd(0)).unwrap();
        assert_eq!(transport.connects(), vec![ConnectPath::Display(None)]);
    }

    #[test]
    fn test_invalid_auth() {
        let transport = MockTransport::new(vec![]);
        let err = connect(&transport, ConnectOptions::default().with_auth(b"nocolon".to_vec()));
        assert!(matches!(err, Err(XcbError::InvalidAuth)));
        assert!(transport.connects().is_empty());
    }

    #[test]
    fn test_null_handle() {
        let transport = MockTransport::new(vec![]).with_null_handle();
        assert!(matches!(
            connect(&transport, ConnectOptions::default()),
            Err(XcbError::InvalidConnection)
        ));
    }

    #[test]
    fn test_failed_handshake() {
        let transport = MockTransport::new(vec![]);
        transport.set_status(status::CONN_CLOSED_INVALID_SCREEN);
        match connect(&transport, ConnectOptions::display(":0.9")) {
            Err(XcbError::Connection(err)) => assert_eq!(err.code(), status::CONN_CLOSED_INVALID_SCREEN),
            other => panic!("unexpected result: {:?}", other.map(|c| c.state())),
        }
    }

    #[test]
    fn test_post_call_check() {
        let transport = MockTransport::new(vec![]);
        let conn = connect(&transport, ConnectOptions::default()).unwrap();
        transport.fail_next_flush(status::CONN_CLOSED_REQ_LEN_EXCEED);

        match conn.flush() {
            Err(XcbError::Connection(err)) => assert_eq!(err.code(), status::CONN_CLOSED_REQ_LEN_EXCEED),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(conn.state(), ConnectionState::Errored(status::CONN_CLOSED_REQ_LEN_EXCEED));
    }

    #[test]
    fn test_disconnect() {
        let transport = MockTransport::new(vec![]);
        let mut conn = connect(&transport, ConnectOptions::default()).unwrap();
        conn.disconnect().unwrap();

        assert_eq!(transport.disconnects(), 1);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(matches!(conn.generate_id(), Err(XcbError::InvalidConnection)));
        drop(conn);
        assert_eq!(transport.disconnects(), 1);
    }

    #[test]
    fn test_empty_wait_on_healthy_stream() {
        let transport = MockTransport::new(vec![]).with_quiet_wait();
        let conn = connect(&transport, ConnectOptions::default()).unwrap();

        match conn.wait_for_event() {
            Err(XcbError::Connection(err)) => assert_eq!(err.code(), status::CONN_ERROR),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(conn.state(), ConnectionState::Live);
        assert!(conn.generate_id().is_ok());
    }

    #[test]
    fn test_setup_converts_to_core_setup() {
        let registry = Registry::new();
        protocol::xproto::register(&registry).unwrap();
        let mut reply = vec![0u8; 40];
        reply[0] = 1;
        reply[2] = 11;
        let transport = MockTransport::new(reply);
        let conn = Connection::connect(&transport, Arc::new(registry), ConnectOptions::default()).unwrap();

        let setup = protocol::xproto::Setup::from(conn.get_setup().unwrap());
        assert_eq!(setup.status().unwrap(), 1);
        assert_eq!(setup.bufsize(), 40);
    }

    #[test]
    fn test_drop_disconnects() {
        let transport = MockTransport::new(vec![]);
        let conn = connect(&transport, ConnectOptions::default()).unwrap();
        drop(conn);
        assert_eq!(transport.disconnects(), 1);
    }
}
