//! Connection lifecycle driven through the mock native layer

mod common;

use std::sync::Arc;
use xcbview::error::{ConnectionErrorKind, UNKNOWN_CONNECTION_ERROR};
use xcbview::native::mock::{ConnectPath, MockHandle, MockTransport};
use xcbview::native::status;
use xcbview::protocol::{xproto, View};
use xcbview::{ConnectOptions, Connection, ConnectionState, Registry, XcbError};

fn core_registry() -> Arc<Registry> {
    let registry = Registry::new();
    xproto::register(&registry).unwrap();
    Arc::new(registry)
}

fn live(transport: &MockTransport) -> Connection<MockHandle> {
    common::init_logger();
    Connection::connect(transport, core_registry(), ConnectOptions::default()).unwrap()
}

fn connection_error(result: Result<impl std::fmt::Debug, XcbError>) -> xcbview::ConnectionError {
    match result {
        Err(XcbError::Connection(err)) => err,
        other => panic!("expected a connection error, got {:?}", other),
    }
}

#[test]
fn test_setup_over_fd() {
    common::init_logger();
    let reply = common::setup_reply();
    let transport = MockTransport::new(reply.clone());

    let conn = Connection::connect(&transport, core_registry(), ConnectOptions::fd(3)).unwrap();
    assert_eq!(transport.connects(), vec![ConnectPath::Fd(3)]);

    let setup = conn.get_setup().unwrap();
    assert_eq!(setup.bufsize(), reply.len());
    assert_eq!(setup.view().offset(), 0);

    let setup = xproto::Setup::from(setup);
    assert_eq!(setup.protocol_major_version().unwrap(), 11);
    assert_eq!(setup.vendor().unwrap(), common::VENDOR.as_bytes());
}

#[test]
fn test_setup_without_registered_core() {
    let reply = common::setup_reply();
    let transport = MockTransport::new(reply.clone());
    let conn = Connection::connect(&transport, Arc::new(Registry::new()), ConnectOptions::default()).unwrap();

    assert!(conn.core().is_none());
    assert_eq!(conn.get_setup().unwrap().bufsize(), reply.len());
}

#[test]
fn test_passthrough_calls() {
    let transport = MockTransport::new(common::setup_reply()).with_max_request_length(4096);
    let conn = live(&transport);

    assert_eq!(conn.has_error().unwrap(), 0);
    assert_eq!(conn.get_maximum_request_length().unwrap(), 4096);
    conn.prefetch_maximum_request_length().unwrap();
    assert_eq!(conn.get_file_descriptor().unwrap(), -1);
    assert!(conn.flush().unwrap() > 0);
    let a = conn.generate_id().unwrap();
    let b = conn.generate_id().unwrap();
    assert_ne!(a, b);
    assert_eq!(conn.core().unwrap().key().name(), "xproto");
}

#[test]
fn test_every_operation_fails_once_errored() {
    let transport = MockTransport::new(common::setup_reply());
    let mut conn = live(&transport);
    transport.set_status(status::CONN_ERROR);

    let expected = ConnectionErrorKind::Stream.as_str();
    assert_eq!(connection_error(conn.has_error()).to_string(), expected);
    assert_eq!(connection_error(conn.get_file_descriptor()).to_string(), expected);
    assert_eq!(connection_error(conn.get_maximum_request_length()).to_string(), expected);
    assert_eq!(connection_error(conn.prefetch_maximum_request_length()).to_string(), expected);
    assert_eq!(connection_error(conn.flush()).to_string(), expected);
    assert_eq!(connection_error(conn.generate_id()).to_string(), expected);
    assert_eq!(connection_error(conn.get_setup()).to_string(), expected);
    assert_eq!(connection_error(conn.poll_for_event()).to_string(), expected);
    assert_eq!(connection_error(conn.wait_for_event()).to_string(), expected);
    assert_eq!(connection_error(conn.disconnect()).to_string(), expected);
    assert_eq!(conn.state(), ConnectionState::Errored(status::CONN_ERROR));
}

#[test]
fn test_each_known_status_code() {
    for code in 1..=7 {
        let transport = MockTransport::new(common::setup_reply());
        let conn = live(&transport);
        transport.set_status(code);

        let err = connection_error(conn.generate_id());
        assert_eq!(err.code(), code);
        assert_eq!(err.to_string(), ConnectionErrorKind::from_code(code).unwrap().as_str());
    }
}

#[test]
fn test_unknown_status_code() {
    let transport = MockTransport::new(common::setup_reply());
    let conn = live(&transport);
    transport.set_status(99);

    let err = connection_error(conn.flush());
    assert_eq!(err.code(), 99);
    assert_eq!(err.to_string(), UNKNOWN_CONNECTION_ERROR);
}

#[test]
fn test_events_are_named_from_registry() {
    let transport = MockTransport::new(common::setup_reply());
    transport.push_event(common::event_packet(12));
    transport.push_event(common::event_packet(33 | 0x80));
    transport.push_event(common::event_packet(99));
    let conn = live(&transport);

    let expose = conn.wait_for_event().unwrap();
    assert_eq!(expose.name(), Some("Expose"));
    assert_eq!(expose.bufsize(), xproto::PACKET_LEN);

    let message = conn.poll_for_event().unwrap().unwrap();
    assert_eq!(message.name(), Some("ClientMessage"));
    assert!(message.is_synthetic());

    let unknown = conn.poll_for_event().unwrap().unwrap();
    assert_eq!(unknown.code(), 99);
    assert_eq!(unknown.name(), None);

    assert!(conn.poll_for_event().unwrap().is_none());
    assert_eq!(conn.state(), ConnectionState::Live);
}

#[test]
fn test_error_packets_are_returned_as_errors() {
    let transport = MockTransport::new(common::setup_reply());
    transport.push_event(common::error_packet(3, 7));
    transport.push_event(common::error_packet(200, 8));
    let conn = live(&transport);

    match conn.wait_for_event() {
        Err(XcbError::Protocol(err)) => {
            assert_eq!(err.code(), 3);
            assert_eq!(err.name(), Some("Window"));
            assert_eq!(err.bufsize(), xproto::PACKET_LEN - 1);
        }
        other => panic!("expected a protocol error, got {:?}", other),
    }

    match conn.poll_for_event() {
        Err(XcbError::Protocol(err)) => {
            assert_eq!(err.code(), 200);
            assert_eq!(err.name(), None);
        }
        other => panic!("expected a protocol error, got {:?}", other),
    }

    // Protocol errors do not end the connection
    assert_eq!(conn.state(), ConnectionState::Live);
}

#[test]
fn test_short_event_packet() {
    let transport = MockTransport::new(common::setup_reply());
    transport.push_event(vec![12u8; 8]);
    let conn = live(&transport);

    assert!(matches!(conn.poll_for_event(), Err(XcbError::Decode(_))));
}

#[test]
fn test_wait_on_dead_stream() {
    let transport = MockTransport::new(common::setup_reply());
    let conn = live(&transport);

    let err = connection_error(conn.wait_for_event());
    assert_eq!(err.code(), status::CONN_ERROR);
    assert_eq!(conn.state(), ConnectionState::Errored(status::CONN_ERROR));
}
