/// X11 protocol object model
///
/// This module implements zero-copy views over protocol buffers: plain
/// structs and unions, lists, replies, events and errors, plus the core
/// protocol descriptors built on top of them.

pub mod view;
pub mod list;
pub mod types;
pub mod events;
pub mod errors;
pub mod xproto;

pub use view::*;
pub use list::*;
pub use types::*;
pub use events::*;
pub use errors::*;

/// Padding helper - X11 requires data to be padded to 4-byte boundaries
pub fn pad(n: usize) -> usize {
    (4 - (n % 4)) % 4
}

/// Calculate padded length
pub fn padded_len(n: usize) -> usize {
    n + pad(n)
}
