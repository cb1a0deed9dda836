/// xcbview - X11 protocol objects over a native client connection
///
/// This library decodes the buffers a native X11 client library hands back
/// (setup, replies, events, errors) into zero-copy views, and wraps the native
/// connection in a guard that checks its liveness around every call.

pub mod protocol;
pub mod extension;
pub mod native;
pub mod connection;
pub mod error;

pub use connection::{ConnectOptions, Connection, ConnectionState};
pub use error::{ConnectionError, RegistrationError, XcbError, XcbResult};
pub use extension::{Extension, ExtensionKey, Registry};
pub use protocol::{Buffer, BufferView, List, Protobj, View};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version
pub const X_PROTOCOL: u16 = 11;
pub const X_PROTOCOL_REVISION: u16 = 0;

pub const NONE: u32 = 0;
pub const COPY_FROM_PARENT: u32 = 0;
pub const CURRENT_TIME: u32 = 0;
pub const NO_SYMBOL: u32 = 0;
