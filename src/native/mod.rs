/// Native transport implementations
///
/// This module contains the native-layer trait and the transports that
/// implement it: an in-process mock and, on unix, one backed by x11rb.

mod r#trait;
pub use r#trait::*;

pub mod mock;

#[cfg(all(feature = "native-x11rb", unix))]
pub mod x11rb;

/// Get available transport names (features enabled + platform compatible)
#[allow(unused_mut)] // mut needed when features are enabled
pub fn available_transports() -> Vec<&'static str> {
    let mut transports = vec!["mock"];

    #[cfg(all(feature = "native-x11rb", unix))]
    transports.push("x11rb");

    transports
}
